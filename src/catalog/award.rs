use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use utoipa::ToSchema;
use validator::Validate;

use super::{CatalogRecord, DecodeError, parse_document_id, raw_document, required_text};
use crate::{
    dao::{
        models::AwardDocument,
        query::{FieldFilter, QuerySpec, SortSpec},
    },
    paging::Record,
};

const KIND: &str = "awards";

/// Award granted to a game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Award {
    /// Award identifier, without the kind prefix.
    pub id: String,
    /// Awarded game.
    pub game_id: String,
    pub game_title: String,
    /// Award category, e.g. "Game of the Year".
    pub category: String,
    /// Year the award was granted for.
    pub year: i32,
    /// Organisation granting the award.
    pub granted_by: String,
}

/// Criteria of an award feed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, ToSchema, Validate)]
#[serde(default)]
pub struct AwardFilter {
    /// Only awards of this year.
    #[validate(range(min = 1970, max = 2100))]
    pub year: Option<i32>,
    /// Only awards of this category.
    pub category: Option<String>,
}

impl Record for Award {
    type Id = String;
    type Filter = AwardFilter;

    const KIND: &'static str = KIND;

    fn id(&self) -> String {
        self.id.clone()
    }
}

impl CatalogRecord for Award {
    fn query(filter: &AwardFilter) -> QuerySpec {
        QuerySpec::new(KIND, SortSpec::descending("year"))
            .with_opt(filter.year.map(|year| FieldFilter::Equals {
                field: "year",
                value: json!(year),
            }))
            .with_opt(filter.category.as_ref().map(|category| FieldFilter::Equals {
                field: "category",
                value: json!(category),
            }))
    }

    fn decode(document: Value) -> Result<Self, DecodeError> {
        raw_document::<AwardDocument>(KIND, document)?.try_into()
    }
}

impl TryFrom<AwardDocument> for Award {
    type Error = DecodeError;

    fn try_from(doc: AwardDocument) -> Result<Self, Self::Error> {
        let id = parse_document_id(KIND, &doc.id)?;
        Ok(Self {
            game_id: required_text(KIND, &id, "game_id", doc.game_id)?,
            game_title: required_text(KIND, &id, "game_title", doc.game_title)?,
            category: required_text(KIND, &id, "category", doc.category)?,
            year: doc.year,
            granted_by: required_text(KIND, &id, "granted_by", doc.granted_by)?,
            id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_award() {
        let award = Award::decode(json!({
            "_id": "awards::a-1",
            "game_id": "g-7",
            "game_title": "Outer Wilds",
            "category": "Best Narrative",
            "year": 2019,
            "granted_by": "BAFTA"
        }))
        .unwrap();
        assert_eq!(award.id, "a-1");
        assert_eq!(award.year, 2019);
    }

    #[test]
    fn year_filter_is_range_checked() {
        let filter = AwardFilter {
            year: Some(1890),
            category: None,
        };
        assert!(filter.validate().is_err());

        let query = Award::query(&AwardFilter {
            year: Some(2019),
            category: None,
        });
        assert_eq!(query.sort, SortSpec::descending("year"));
        assert_eq!(query.filters.len(), 1);
    }
}
