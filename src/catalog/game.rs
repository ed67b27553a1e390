use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use time::OffsetDateTime;
use utoipa::ToSchema;
use validator::Validate;

use super::{CatalogRecord, DecodeError, parse_document_id, raw_document, required_text, timestamp};
use crate::{
    dao::{
        models::GameDocument,
        query::{FieldFilter, QuerySpec, SortSpec},
    },
    paging::Record,
};

const KIND: &str = "games";
const MAX_RATING: f64 = 10.0;

/// Game of the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Game {
    /// Game identifier, without the kind prefix.
    pub id: String,
    pub title: String,
    /// Genre tags.
    pub genres: Vec<String>,
    /// Platforms the game was released on.
    pub platforms: Vec<String>,
    pub release_year: Option<i32>,
    /// Cover art location, if known.
    pub cover_url: Option<String>,
    /// Mean review rating, between 0 and 10.
    pub average_rating: f64,
    /// Number of reviews the average is computed from.
    pub rating_count: u32,
    /// When the game was added to the catalog.
    #[serde(serialize_with = "super::rfc3339")]
    #[schema(value_type = String, format = DateTime)]
    pub created_at: OffsetDateTime,
}

/// Order of a game feed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum GameSort {
    /// Most recently added first.
    #[default]
    Newest,
    /// Alphabetical on the title.
    Title,
    /// Highest average rating first.
    TopRated,
}

/// Criteria of a game feed.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, ToSchema, Validate)]
#[serde(default)]
pub struct GameFilter {
    /// Only games tagged with this genre.
    pub genre: Option<String>,
    /// Only games released on this platform.
    pub platform: Option<String>,
    /// Case-insensitive title prefix.
    #[validate(length(min = 1, max = 64))]
    pub title_prefix: Option<String>,
    /// Order of the feed.
    pub sort: GameSort,
}

impl Record for Game {
    type Id = String;
    type Filter = GameFilter;

    const KIND: &'static str = KIND;

    fn id(&self) -> String {
        self.id.clone()
    }
}

impl CatalogRecord for Game {
    fn query(filter: &GameFilter) -> QuerySpec {
        let sort = match filter.sort {
            GameSort::Newest => SortSpec::descending("created_at"),
            GameSort::Title => SortSpec::ascending("search_title"),
            GameSort::TopRated => SortSpec::descending("average_rating"),
        };

        QuerySpec::new(KIND, sort)
            .with_opt(filter.genre.as_ref().map(|genre| FieldFilter::Contains {
                field: "genres",
                value: json!(genre),
            }))
            .with_opt(filter.platform.as_ref().map(|platform| FieldFilter::Contains {
                field: "platforms",
                value: json!(platform),
            }))
            .with_opt(filter.title_prefix.as_ref().map(|prefix| FieldFilter::Prefix {
                field: "search_title",
                prefix: prefix.trim().to_lowercase(),
            }))
    }

    fn decode(document: Value) -> Result<Self, DecodeError> {
        raw_document::<GameDocument>(KIND, document)?.try_into()
    }
}

impl TryFrom<GameDocument> for Game {
    type Error = DecodeError;

    fn try_from(doc: GameDocument) -> Result<Self, Self::Error> {
        let id = parse_document_id(KIND, &doc.id)?;

        if !doc.average_rating.is_finite() || !(0.0..=MAX_RATING).contains(&doc.average_rating) {
            return Err(DecodeError::invalid(
                KIND,
                &id,
                format!("average rating {} outside 0..=10", doc.average_rating),
            ));
        }

        Ok(Self {
            title: required_text(KIND, &id, "title", doc.title)?,
            genres: doc.genres,
            platforms: doc.platforms,
            release_year: doc.release_year,
            cover_url: doc.cover_url.filter(|url| !url.trim().is_empty()),
            average_rating: doc.average_rating,
            rating_count: doc.rating_count,
            created_at: timestamp(KIND, &id, doc.created_at)?,
            id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::query::SortDirection;

    fn document() -> Value {
        json!({
            "_id": "games::g-7",
            "kind": "games",
            "title": "Outer Wilds",
            "search_title": "outer wilds",
            "genres": ["adventure"],
            "platforms": ["pc", "switch"],
            "release_year": 2019,
            "average_rating": 9.4,
            "rating_count": 12,
            "created_at": 1_700_000_000_000_i64
        })
    }

    #[test]
    fn decodes_and_serializes_a_stored_game() {
        let game = Game::decode(document()).unwrap();
        assert_eq!(game.id, "g-7");
        assert_eq!(game.platforms, vec!["pc", "switch"]);
        assert_eq!(game.cover_url, None);

        let json = serde_json::to_value(&game).unwrap();
        assert_eq!(json["created_at"], "2023-11-14T22:13:20Z");
        assert_eq!(json["title"], "Outer Wilds");
    }

    #[test]
    fn rejects_invalid_games() {
        let mut blank = document();
        blank["title"] = json!(" ");
        assert!(matches!(
            Game::decode(blank),
            Err(DecodeError::Invalid { .. })
        ));

        let mut rating = document();
        rating["average_rating"] = json!(11.5);
        assert!(Game::decode(rating).is_err());

        let mut missing = document();
        missing.as_object_mut().unwrap().remove("created_at");
        assert!(matches!(
            Game::decode(missing),
            Err(DecodeError::Malformed { .. })
        ));
    }

    #[test]
    fn filter_translates_into_query() {
        let filter = GameFilter {
            genre: Some("indie".into()),
            platform: None,
            title_prefix: Some(" HoLLow ".into()),
            sort: GameSort::Title,
        };

        let query = Game::query(&filter);
        assert_eq!(query.kind, "games");
        assert_eq!(query.sort.field, "search_title");
        assert_eq!(query.sort.direction, SortDirection::Ascending);
        assert_eq!(
            query.filters,
            vec![
                FieldFilter::Contains {
                    field: "genres",
                    value: json!("indie"),
                },
                FieldFilter::Prefix {
                    field: "search_title",
                    prefix: "hollow".into(),
                },
            ]
        );
    }

    #[test]
    fn title_prefix_length_is_validated() {
        let filter = GameFilter {
            title_prefix: Some("x".repeat(65)),
            ..GameFilter::default()
        };
        assert!(filter.validate().is_err());
        assert!(GameFilter::default().validate().is_ok());
    }

    #[test]
    fn sort_serializes_for_the_filter_schema() {
        assert_eq!(serde_json::to_value(GameSort::TopRated).unwrap(), json!("top_rated"));

        let schema = serde_json::to_value(<GameFilter as utoipa::PartialSchema>::schema()).unwrap();
        assert!(schema["properties"]["sort"].is_object());
    }
}
