use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use time::OffsetDateTime;
use utoipa::ToSchema;
use validator::Validate;

use super::{CatalogRecord, DecodeError, parse_document_id, raw_document, required_text, timestamp};
use crate::{
    dao::{
        models::JournalEntryDocument,
        query::{FieldFilter, QuerySpec, SortSpec},
    },
    paging::Record,
};

const KIND: &str = "journal";

/// Where a game stands in a user's journal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PlayStatus {
    Wishlist,
    Playing,
    Completed,
    Dropped,
}

impl PlayStatus {
    /// Stored representation.
    pub fn as_str(self) -> &'static str {
        match self {
            PlayStatus::Wishlist => "wishlist",
            PlayStatus::Playing => "playing",
            PlayStatus::Completed => "completed",
            PlayStatus::Dropped => "dropped",
        }
    }
}

impl FromStr for PlayStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "wishlist" => Ok(PlayStatus::Wishlist),
            "playing" => Ok(PlayStatus::Playing),
            "completed" => Ok(PlayStatus::Completed),
            "dropped" => Ok(PlayStatus::Dropped),
            other => Err(format!("unknown play status `{other}`")),
        }
    }
}

/// Entry of a user's play journal.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct JournalEntry {
    /// Entry identifier, without the kind prefix.
    pub id: String,
    /// User the journal belongs to.
    pub owner_id: String,
    /// Game the entry is about.
    pub game_id: String,
    /// Title of the game when the entry was written.
    pub game_title: String,
    /// Where the user stands with the game.
    pub status: PlayStatus,
    /// Free-form note, if any.
    pub note: Option<String>,
    /// Hours played so far.
    pub hours_played: f64,
    #[serde(serialize_with = "super::rfc3339")]
    #[schema(value_type = String, format = DateTime)]
    pub updated_at: OffsetDateTime,
}

/// Criteria of a journal feed.
#[derive(Debug, Clone, PartialEq, Deserialize, ToSchema, Validate)]
pub struct JournalFilter {
    /// Owner of the journal.
    #[validate(length(min = 1))]
    pub owner_id: String,
    /// Only entries in this state.
    #[serde(default)]
    pub status: Option<PlayStatus>,
}

impl Record for JournalEntry {
    type Id = String;
    type Filter = JournalFilter;

    const KIND: &'static str = KIND;

    fn id(&self) -> String {
        self.id.clone()
    }
}

impl CatalogRecord for JournalEntry {
    fn query(filter: &JournalFilter) -> QuerySpec {
        QuerySpec::new(KIND, SortSpec::descending("updated_at"))
            .with(FieldFilter::Equals {
                field: "owner_id",
                value: json!(filter.owner_id),
            })
            .with_opt(filter.status.map(|status| FieldFilter::Equals {
                field: "status",
                value: json!(status.as_str()),
            }))
    }

    fn decode(document: Value) -> Result<Self, DecodeError> {
        raw_document::<JournalEntryDocument>(KIND, document)?.try_into()
    }
}

impl TryFrom<JournalEntryDocument> for JournalEntry {
    type Error = DecodeError;

    fn try_from(doc: JournalEntryDocument) -> Result<Self, Self::Error> {
        let id = parse_document_id(KIND, &doc.id)?;
        let status = doc
            .status
            .parse::<PlayStatus>()
            .map_err(|reason| DecodeError::invalid(KIND, &id, reason))?;

        if !doc.hours_played.is_finite() || doc.hours_played < 0.0 {
            return Err(DecodeError::invalid(KIND, &id, "negative play time"));
        }

        Ok(Self {
            owner_id: required_text(KIND, &id, "owner_id", doc.owner_id)?,
            game_id: required_text(KIND, &id, "game_id", doc.game_id)?,
            game_title: required_text(KIND, &id, "game_title", doc.game_title)?,
            status,
            note: doc.note,
            hours_played: doc.hours_played,
            updated_at: timestamp(KIND, &id, doc.updated_at)?,
            id,
        })
    }
}
