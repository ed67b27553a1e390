//! Backend-neutral description of a paged query, translated by each page store.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    dao::storage::{StorageError, StorageResult},
    paging::PageCursor,
};

/// Name of the identifier field shared by every stored document.
pub const ID_FIELD: &str = "_id";
/// Suffix closing a string prefix range (`prefix <= value < prefix + END_SUFFIX`).
pub const END_SUFFIX: &str = "\u{ffff}";

/// Query for one record kind: filters plus the sort order pages are cut from.
#[derive(Debug, Clone, PartialEq)]
pub struct QuerySpec {
    /// Record kind, also the collection name.
    pub kind: &'static str,
    /// Conditions that every returned document satisfies.
    pub filters: Vec<FieldFilter>,
    /// Order of the result set. Ties are broken by [`ID_FIELD`] in the same direction.
    pub sort: SortSpec,
}

impl QuerySpec {
    /// Start a query on `kind` sorted by `sort`.
    pub fn new(kind: &'static str, sort: SortSpec) -> Self {
        Self {
            kind,
            filters: Vec::new(),
            sort,
        }
    }

    /// Add a filter condition.
    pub fn with(mut self, filter: FieldFilter) -> Self {
        self.filters.push(filter);
        self
    }

    /// Add a filter condition when present.
    pub fn with_opt(self, filter: Option<FieldFilter>) -> Self {
        match filter {
            Some(filter) => self.with(filter),
            None => self,
        }
    }
}

/// Single filter condition on a document field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldFilter {
    /// Field equals the value.
    Equals { field: &'static str, value: Value },
    /// Array field contains the value.
    Contains { field: &'static str, value: Value },
    /// String field starts with the prefix.
    Prefix { field: &'static str, prefix: String },
}

impl FieldFilter {
    /// Whether `document` satisfies this condition.
    pub fn matches(&self, document: &Value) -> bool {
        match self {
            FieldFilter::Equals { field, value } => document.get(field) == Some(value),
            FieldFilter::Contains { field, value } => document
                .get(field)
                .and_then(Value::as_array)
                .is_some_and(|values| values.contains(value)),
            FieldFilter::Prefix { field, prefix } => document
                .get(field)
                .and_then(Value::as_str)
                .is_some_and(|text| text.starts_with(prefix.as_str())),
        }
    }
}

/// Field and direction a result set is ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec {
    /// Document field the result set is ordered by.
    pub field: &'static str,
    /// Direction applied to the field and to the id tie-break.
    pub direction: SortDirection,
}

impl SortSpec {
    /// Smallest values first.
    pub fn ascending(field: &'static str) -> Self {
        Self {
            field,
            direction: SortDirection::Ascending,
        }
    }

    /// Largest values first.
    pub fn descending(field: &'static str) -> Self {
        Self {
            field,
            direction: SortDirection::Descending,
        }
    }

    /// Position of `a` relative to `b` in the result set ordered by this sort.
    pub fn order(&self, a: &Value, b: &Value) -> Ordering {
        self.order_keys(
            (sort_value(a, self.field), document_id(a)),
            (sort_value(b, self.field), document_id(b)),
        )
    }

    /// Whether `document` comes strictly after the record `cursor` points at.
    pub fn is_after(&self, document: &Value, cursor: &KeysetCursor) -> bool {
        self.order_keys(
            (sort_value(document, self.field), document_id(document)),
            (&cursor.value, cursor.id.as_str()),
        ) == Ordering::Greater
    }

    fn order_keys(&self, a: (&Value, &str), b: (&Value, &str)) -> Ordering {
        let natural = compare_values(a.0, b.0).then_with(|| a.1.cmp(b.1));
        match self.direction {
            SortDirection::Ascending => natural,
            SortDirection::Descending => natural.reverse(),
        }
    }
}

/// Direction of a [`SortSpec`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    /// Smallest first.
    Ascending,
    /// Largest first.
    Descending,
}

/// Keyset position: sort value and id of the last record of a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeysetCursor {
    /// Sort field value of the last record.
    #[serde(rename = "v")]
    pub value: Value,
    /// Identifier of the last record.
    pub id: String,
}

impl KeysetCursor {
    /// Cursor pointing at `document` for a result set sorted on `field`.
    pub fn from_document(document: &Value, field: &str) -> Option<Self> {
        let id = document.get(ID_FIELD)?.as_str()?.to_owned();
        Some(Self {
            value: sort_value(document, field).clone(),
            id,
        })
    }

    /// Serialise into an opaque page cursor.
    pub fn encode(&self) -> PageCursor {
        // Serialising a `Value` plus a `String` cannot fail.
        PageCursor::new(serde_json::to_string(self).unwrap_or_default())
    }

    /// Parse a page cursor produced by [`KeysetCursor::encode`].
    pub fn decode(cursor: &PageCursor) -> StorageResult<Self> {
        serde_json::from_str(cursor.as_str())
            .map_err(|err| StorageError::invalid_cursor(format!("malformed keyset cursor: {err}")))
    }
}

fn sort_value<'a>(document: &'a Value, field: &str) -> &'a Value {
    document.get(field).unwrap_or(&Value::Null)
}

fn document_id(document: &Value) -> &str {
    document
        .get(ID_FIELD)
        .and_then(Value::as_str)
        .unwrap_or_default()
}

/// Total order over JSON scalars: null < bool < number < string < anything else.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    fn rank(value: &Value) -> u8 {
        match value {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            Value::Array(_) | Value::Object(_) => 4,
        }
    }

    match (a, b) {
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        (Value::Number(a), Value::Number(b)) => {
            let (a, b) = (a.as_f64().unwrap_or(0.0), b.as_f64().unwrap_or(0.0));
            a.partial_cmp(&b).unwrap_or(Ordering::Equal)
        }
        (Value::String(a), Value::String(b)) => a.cmp(b),
        _ => rank(a).cmp(&rank(b)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn descending_order_breaks_ties_by_id() {
        let sort = SortSpec::descending("created_at");
        let older = json!({"_id": "b", "created_at": 10});
        let newer = json!({"_id": "a", "created_at": 20});
        let twin = json!({"_id": "c", "created_at": 20});

        assert_eq!(sort.order(&newer, &older), Ordering::Less);
        assert_eq!(sort.order(&twin, &newer), Ordering::Less);
    }

    #[test]
    fn cursor_round_trip_keeps_position() {
        let sort = SortSpec::ascending("search_title");
        let anchor = json!({"_id": "g2", "search_title": "hades"});
        let cursor = KeysetCursor::from_document(&anchor, sort.field).unwrap();
        let decoded = KeysetCursor::decode(&cursor.encode()).unwrap();
        assert_eq!(decoded, cursor);

        assert!(sort.is_after(&json!({"_id": "g3", "search_title": "hollow knight"}), &decoded));
        assert!(sort.is_after(&json!({"_id": "g9", "search_title": "hades"}), &decoded));
        assert!(!sort.is_after(&anchor, &decoded));
        assert!(!sort.is_after(&json!({"_id": "g1", "search_title": "celeste"}), &decoded));
    }

    #[test]
    fn garbage_cursor_is_rejected() {
        let err = KeysetCursor::decode(&PageCursor::new("not json")).unwrap_err();
        assert!(matches!(err, StorageError::InvalidCursor { .. }));
    }

    #[test]
    fn filters_match_documents() {
        let document = json!({
            "_id": "g1",
            "genres": ["rpg", "indie"],
            "search_title": "disco elysium",
            "release_year": 2019
        });

        assert!(FieldFilter::Contains { field: "genres", value: json!("rpg") }.matches(&document));
        assert!(!FieldFilter::Contains { field: "genres", value: json!("racing") }.matches(&document));
        assert!(FieldFilter::Prefix { field: "search_title", prefix: "disco".into() }.matches(&document));
        assert!(!FieldFilter::Prefix { field: "search_title", prefix: "elysium".into() }.matches(&document));
        assert!(FieldFilter::Equals { field: "release_year", value: json!(2019) }.matches(&document));
        assert!(!FieldFilter::Equals { field: "missing", value: json!(1) }.matches(&document));
    }

    #[test]
    fn values_compare_across_types() {
        assert_eq!(compare_values(&json!(null), &json!(1)), Ordering::Less);
        assert_eq!(compare_values(&json!(2.5), &json!(2)), Ordering::Greater);
        assert_eq!(compare_values(&json!("b"), &json!("a")), Ordering::Greater);
        assert_eq!(compare_values(&json!("a"), &json!(3)), Ordering::Greater);
    }
}
