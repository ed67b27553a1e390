//! Validation helpers for DTOs and feed filters.

use validator::ValidationError;

use crate::catalog::ReviewFilter;

/// Validates that a review filter names a game, an author, or both.
///
/// Blank identifiers count as absent.
pub fn validate_review_filter(filter: &ReviewFilter) -> Result<(), ValidationError> {
    let named = |id: &Option<String>| id.as_deref().is_some_and(|id| !id.trim().is_empty());

    if !named(&filter.game_id) && !named(&filter.author_id) {
        let mut err = ValidationError::new("review_filter_scope");
        err.message = Some("Review feeds need a game_id, an author_id, or both".into());
        return Err(err);
    }

    Ok(())
}

/// Validates a requested page size against the configured maximum.
pub fn validate_page_size(page_size: usize, max: usize) -> Result<(), ValidationError> {
    if page_size == 0 || page_size > max {
        let mut err = ValidationError::new("page_size_range");
        err.message = Some(format!("page_size must be between 1 and {max} (got {page_size})").into());
        return Err(err);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter(game_id: Option<&str>, author_id: Option<&str>) -> ReviewFilter {
        ReviewFilter {
            game_id: game_id.map(Into::into),
            author_id: author_id.map(Into::into),
        }
    }

    #[test]
    fn test_validate_review_filter_valid() {
        assert!(validate_review_filter(&filter(Some("g-1"), None)).is_ok());
        assert!(validate_review_filter(&filter(None, Some("u-1"))).is_ok());
        assert!(validate_review_filter(&filter(Some("g-1"), Some("u-1"))).is_ok());
    }

    #[test]
    fn test_validate_review_filter_unscoped() {
        assert!(validate_review_filter(&filter(None, None)).is_err());
        assert!(validate_review_filter(&filter(Some("  "), None)).is_err()); // blank
    }

    #[test]
    fn test_validate_page_size() {
        assert!(validate_page_size(1, 100).is_ok());
        assert!(validate_page_size(100, 100).is_ok());
        assert!(validate_page_size(0, 100).is_err());
        assert!(validate_page_size(101, 100).is_err());
    }
}
