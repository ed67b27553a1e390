use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use time::OffsetDateTime;
use utoipa::ToSchema;
use validator::Validate;

use super::{CatalogRecord, DecodeError, parse_document_id, raw_document, required_text, timestamp};
use crate::{
    dao::{
        models::ReviewDocument,
        query::{FieldFilter, QuerySpec, SortSpec},
    },
    dto::validation::validate_review_filter,
    paging::Record,
};

const KIND: &str = "reviews";

/// Review left by a user on a game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Review {
    /// Review identifier, without the kind prefix.
    pub id: String,
    /// Reviewed game.
    pub game_id: String,
    /// User who wrote the review.
    pub author_id: String,
    /// Display name of the author.
    pub author_name: String,
    /// Score between 1 and 10.
    pub rating: u8,
    /// Review text, possibly empty.
    pub body: String,
    /// Number of likes received.
    pub likes: u32,
    /// When the review was posted.
    #[serde(serialize_with = "super::rfc3339")]
    #[schema(value_type = String, format = DateTime)]
    pub created_at: OffsetDateTime,
}

/// Criteria of a review feed; at least one of the two ids is required.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, ToSchema, Validate)]
#[serde(default)]
#[validate(schema(function = "validate_review_filter"))]
pub struct ReviewFilter {
    /// Reviews of this game.
    pub game_id: Option<String>,
    /// Reviews written by this user.
    pub author_id: Option<String>,
}

impl Record for Review {
    type Id = String;
    type Filter = ReviewFilter;

    const KIND: &'static str = KIND;

    fn id(&self) -> String {
        self.id.clone()
    }
}

impl CatalogRecord for Review {
    fn query(filter: &ReviewFilter) -> QuerySpec {
        let equals = |field: &'static str, id: &Option<String>| {
            trimmed_id(id).map(|id| FieldFilter::Equals {
                field,
                value: json!(id),
            })
        };
        QuerySpec::new(KIND, SortSpec::descending("created_at"))
            .with_opt(equals("game_id", &filter.game_id))
            .with_opt(equals("author_id", &filter.author_id))
    }

    fn decode(document: Value) -> Result<Self, DecodeError> {
        raw_document::<ReviewDocument>(KIND, document)?.try_into()
    }
}

/// Stored ids are trimmed on decode, so blank ids filter nothing.
fn trimmed_id(id: &Option<String>) -> Option<&str> {
    id.as_deref().map(str::trim).filter(|id| !id.is_empty())
}

impl TryFrom<ReviewDocument> for Review {
    type Error = DecodeError;

    fn try_from(doc: ReviewDocument) -> Result<Self, Self::Error> {
        let id = parse_document_id(KIND, &doc.id)?;
        let rating = u8::try_from(doc.rating)
            .ok()
            .filter(|rating| (1..=10).contains(rating))
            .ok_or_else(|| {
                DecodeError::invalid(KIND, &id, format!("rating {} outside 1..=10", doc.rating))
            })?;

        Ok(Self {
            game_id: required_text(KIND, &id, "game_id", doc.game_id)?,
            author_id: required_text(KIND, &id, "author_id", doc.author_id)?,
            author_name: required_text(KIND, &id, "author_name", doc.author_name)?,
            rating,
            body: doc.body,
            likes: doc.likes,
            created_at: timestamp(KIND, &id, doc.created_at)?,
            id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document(rating: i64) -> Value {
        json!({
            "_id": "r-1",
            "game_id": "g-7",
            "author_id": "u-3",
            "author_name": "Sam",
            "rating": rating,
            "body": "Loved the ending.",
            "created_at": 1_700_000_000_000_i64
        })
    }

    #[test]
    fn decodes_a_stored_review() {
        let review = Review::decode(document(9)).unwrap();
        assert_eq!(review.game_id, "g-7");
        assert_eq!(review.rating, 9);
        assert_eq!(review.likes, 0);
    }

    #[test]
    fn ratings_outside_range_are_rejected() {
        assert!(Review::decode(document(0)).is_err());
        assert!(Review::decode(document(11)).is_err());
        assert!(Review::decode(document(-3)).is_err());
        assert!(Review::decode(document(1)).is_ok());
        assert!(Review::decode(document(10)).is_ok());
    }

    #[test]
    fn filter_requires_a_game_or_an_author() {
        assert!(ReviewFilter::default().validate().is_err());

        let by_author = ReviewFilter {
            author_id: Some("u-3".into()),
            ..ReviewFilter::default()
        };
        assert!(by_author.validate().is_ok());

        let query = Review::query(&by_author);
        assert_eq!(query.sort, SortSpec::descending("created_at"));
        assert_eq!(
            query.filters,
            vec![FieldFilter::Equals {
                field: "author_id",
                value: json!("u-3"),
            }]
        );
    }

    #[test]
    fn blank_ids_are_left_out_of_the_query() {
        let filter = ReviewFilter {
            game_id: Some("  ".into()),
            author_id: Some(" u-3 ".into()),
        };
        assert!(filter.validate().is_ok());

        assert_eq!(
            Review::query(&filter).filters,
            vec![FieldFilter::Equals {
                field: "author_id",
                value: json!("u-3"),
            }]
        );
    }
}
