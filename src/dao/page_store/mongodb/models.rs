//! Translation of [`QuerySpec`] into MongoDB filter and sort documents.

use mongodb::bson::{Bson, Document, doc};
use serde_json::Value;

use crate::dao::query::{
    END_SUFFIX, FieldFilter, ID_FIELD, KeysetCursor, QuerySpec, SortDirection, SortSpec,
};

/// Filter selecting the documents of `query` located after `after`.
pub fn filter_document(query: &QuerySpec, after: Option<&KeysetCursor>) -> Document {
    let mut clauses = query
        .filters
        .iter()
        .map(filter_clause)
        .collect::<Vec<_>>();
    if let Some(cursor) = after {
        clauses.push(keyset_clause(&query.sort, cursor));
    }

    match clauses.len() {
        0 => Document::new(),
        1 => clauses.remove(0),
        _ => doc! { "$and": clauses },
    }
}

/// Sort on the query field, then on `_id`, both in the query direction.
pub fn sort_document(sort: &SortSpec) -> Document {
    let order = direction(sort.direction);
    let mut document = Document::new();
    document.insert(sort.field, order);
    document.insert(ID_FIELD, order);
    document
}

/// Convert a fetched document into JSON (relaxed extended JSON for non-JSON BSON types).
pub fn into_json(document: Document) -> Value {
    Bson::Document(document).into_relaxed_extjson()
}

fn filter_clause(filter: &FieldFilter) -> Document {
    let mut clause = Document::new();
    match filter {
        // Matching a scalar against an array field tests membership in MongoDB.
        FieldFilter::Equals { field, value } | FieldFilter::Contains { field, value } => {
            clause.insert(*field, to_bson(value));
        }
        FieldFilter::Prefix { field, prefix } => {
            clause.insert(
                *field,
                doc! { "$gte": prefix.as_str(), "$lt": format!("{prefix}{END_SUFFIX}") },
            );
        }
    }
    clause
}

fn keyset_clause(sort: &SortSpec, cursor: &KeysetCursor) -> Document {
    let operator = match sort.direction {
        SortDirection::Ascending => "$gt",
        SortDirection::Descending => "$lt",
    };
    let value = to_bson(&cursor.value);

    let mut past_value = Document::new();
    past_value.insert(sort.field, doc! { operator: value.clone() });

    let mut same_value = Document::new();
    same_value.insert(sort.field, value);
    same_value.insert(ID_FIELD, doc! { operator: cursor.id.as_str() });

    doc! { "$or": [past_value, same_value] }
}

fn direction(direction: SortDirection) -> i32 {
    match direction {
        SortDirection::Ascending => 1,
        SortDirection::Descending => -1,
    }
}

fn to_bson(value: &Value) -> Bson {
    match value {
        Value::Null => Bson::Null,
        Value::Bool(flag) => Bson::Boolean(*flag),
        Value::Number(number) => match number.as_i64() {
            Some(integer) => Bson::Int64(integer),
            None => Bson::Double(number.as_f64().unwrap_or_default()),
        },
        Value::String(text) => Bson::String(text.clone()),
        Value::Array(values) => Bson::Array(values.iter().map(to_bson).collect()),
        Value::Object(map) => Bson::Document(
            map.iter()
                .map(|(key, value)| (key.clone(), to_bson(value)))
                .collect(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_query_matches_everything() {
        let query = QuerySpec::new("awards", SortSpec::descending("year"));
        assert_eq!(filter_document(&query, None), Document::new());
        assert_eq!(sort_document(&query.sort), doc! { "year": -1, "_id": -1 });
    }

    #[test]
    fn prefix_becomes_a_string_range() {
        let query = QuerySpec::new("games", SortSpec::ascending("search_title")).with(
            FieldFilter::Prefix {
                field: "search_title",
                prefix: "zel".into(),
            },
        );
        assert_eq!(
            filter_document(&query, None),
            doc! { "search_title": { "$gte": "zel", "$lt": "zel\u{ffff}" } }
        );
    }

    #[test]
    fn keyset_clause_is_combined_with_filters() {
        let query = QuerySpec::new("reviews", SortSpec::descending("created_at")).with(
            FieldFilter::Equals {
                field: "game_id",
                value: json!("g-1"),
            },
        );
        let cursor = KeysetCursor {
            value: json!(1_700_000_000_000_i64),
            id: "r-9".into(),
        };

        assert_eq!(
            filter_document(&query, Some(&cursor)),
            doc! {
                "$and": [
                    { "game_id": "g-1" },
                    { "$or": [
                        { "created_at": { "$lt": 1_700_000_000_000_i64 } },
                        { "created_at": 1_700_000_000_000_i64, "_id": { "$lt": "r-9" } },
                    ] },
                ]
            }
        );
    }

    #[test]
    fn fetched_documents_convert_to_plain_json() {
        let document = doc! { "_id": "g1", "title": "Celeste", "rating_count": 3_i32 };
        assert_eq!(
            into_json(document),
            json!({"_id": "g1", "title": "Celeste", "rating_count": 3})
        );
    }
}
