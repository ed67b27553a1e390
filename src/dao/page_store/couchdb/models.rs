//! Mango payloads exchanged with CouchDB and the translation of [`QuerySpec`] into them.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::dao::query::{END_SUFFIX, FieldFilter, QuerySpec, SortDirection};

/// Field naming the record kind of every document in the shared database.
pub const KIND_FIELD: &str = "kind";

/// Body of a `POST /{db}/_find` request.
#[derive(Debug, Serialize)]
pub struct FindRequest {
    pub selector: Value,
    pub sort: Vec<Value>,
    pub limit: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bookmark: Option<String>,
}

impl FindRequest {
    /// Request for one page of `query`, resuming at `bookmark`.
    pub fn new(query: &QuerySpec, limit: usize, bookmark: Option<String>) -> Self {
        let direction = direction(query.sort.direction);
        Self {
            selector: selector(query),
            sort: vec![
                json!({ KIND_FIELD: direction }),
                json!({ query.sort.field: direction }),
                json!({ "_id": direction }),
            ],
            limit,
            bookmark,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct FindResponse {
    pub docs: Vec<Value>,
    #[serde(default)]
    pub bookmark: Option<String>,
    #[serde(default)]
    pub warning: Option<String>,
}

/// Body of a `POST /{db}/_index` request.
#[derive(Debug, Serialize)]
pub struct IndexRequest {
    pub index: IndexFields,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
}

#[derive(Debug, Serialize)]
pub struct IndexFields {
    pub fields: Vec<&'static str>,
}

impl IndexRequest {
    /// JSON index on (`kind`, `field`, `_id`), usable in both sort directions.
    pub fn sort_index(field: &'static str) -> Self {
        Self {
            index: IndexFields {
                fields: vec![KIND_FIELD, field, "_id"],
            },
            name: format!("kind_{field}_id_idx"),
            kind: "json",
        }
    }
}

// Mango only picks the sort index when the selector names every indexed field.
fn selector(query: &QuerySpec) -> Value {
    let mut clauses = vec![
        json!({ KIND_FIELD: { "$eq": query.kind } }),
        json!({ query.sort.field: { "$exists": true } }),
    ];
    clauses.extend(query.filters.iter().map(filter_clause));
    json!({ "$and": clauses })
}

fn filter_clause(filter: &FieldFilter) -> Value {
    let (field, condition) = match filter {
        FieldFilter::Equals { field, value } => (field, json!({ "$eq": value })),
        FieldFilter::Contains { field, value } => {
            (field, json!({ "$elemMatch": { "$eq": value } }))
        }
        FieldFilter::Prefix { field, prefix } => (
            field,
            json!({ "$gte": prefix, "$lt": format!("{prefix}{END_SUFFIX}") }),
        ),
    };

    let mut clause = Map::new();
    clause.insert((*field).to_owned(), condition);
    Value::Object(clause)
}

fn direction(direction: SortDirection) -> &'static str {
    match direction {
        SortDirection::Ascending => "asc",
        SortDirection::Descending => "desc",
    }
}
