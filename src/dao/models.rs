//! Raw shapes of the stored documents, as read back from any page store.
//!
//! These mirror the stored fields one to one. Validation happens when they are converted into
//! catalog records.

use serde::{Deserialize, Serialize};

/// Stored game catalog entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GameDocument {
    /// Document identifier, possibly prefixed with the record kind (`games::<id>`).
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub platforms: Vec<String>,
    #[serde(default)]
    pub release_year: Option<i32>,
    #[serde(default)]
    pub cover_url: Option<String>,
    /// Mean review rating.
    #[serde(default)]
    pub average_rating: f64,
    #[serde(default)]
    pub rating_count: u32,
    /// Epoch milliseconds.
    pub created_at: i64,
}

/// Stored review of a game.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReviewDocument {
    #[serde(rename = "_id")]
    pub id: String,
    pub game_id: String,
    pub author_id: String,
    pub author_name: String,
    /// Rating as stored, validated to 1..=10 on decode.
    pub rating: i64,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub likes: u32,
    /// Epoch milliseconds.
    pub created_at: i64,
}

/// Stored entry of a user's play journal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JournalEntryDocument {
    #[serde(rename = "_id")]
    pub id: String,
    pub owner_id: String,
    pub game_id: String,
    pub game_title: String,
    /// Play status name (`wishlist`, `playing`, `completed`, `dropped`).
    pub status: String,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub hours_played: f64,
    /// Epoch milliseconds.
    pub updated_at: i64,
}

/// Stored award granted to a game.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AwardDocument {
    #[serde(rename = "_id")]
    pub id: String,
    pub game_id: String,
    pub game_title: String,
    pub category: String,
    pub year: i32,
    pub granted_by: String,
}
