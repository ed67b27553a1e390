//! Record kinds served by the feeds: games, reviews, journal entries and awards.
//!
//! Each kind owns its filter, the query it translates to, and an explicit decoding step from the
//! raw stored document.

pub mod award;
pub mod game;
pub mod journal;
pub mod review;
mod source;

use serde::{Serialize, Serializer};
use serde_json::Value;
use thiserror::Error;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

use crate::{
    dao::query::QuerySpec,
    paging::{Record, RemoteError},
};

pub use self::award::{Award, AwardFilter};
pub use self::game::{Game, GameFilter, GameSort};
pub use self::journal::{JournalEntry, JournalFilter, PlayStatus};
pub use self::review::{Review, ReviewFilter};
pub use self::source::StorePageSource;

/// Record kind that can be queried from a page store and decoded from its documents.
pub trait CatalogRecord: Record<Id = String> + Serialize {
    /// Translate the kind's filter into a store query.
    fn query(filter: &Self::Filter) -> QuerySpec;

    /// Decode and validate one stored document.
    fn decode(document: Value) -> Result<Self, DecodeError>;
}

/// A stored document that does not describe a valid record.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed {kind} document")]
    Malformed {
        kind: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid {kind} document `{id}`: {reason}")]
    Invalid {
        kind: &'static str,
        id: String,
        reason: String,
    },
}

impl DecodeError {
    pub(crate) fn invalid(kind: &'static str, id: &str, reason: impl Into<String>) -> Self {
        DecodeError::Invalid {
            kind,
            id: id.to_owned(),
            reason: reason.into(),
        }
    }
}

impl From<DecodeError> for RemoteError {
    fn from(err: DecodeError) -> Self {
        RemoteError::new(err.to_string())
    }
}

/// Deserialize a stored document into its raw shape.
pub(crate) fn raw_document<T>(kind: &'static str, document: Value) -> Result<T, DecodeError>
where
    T: serde::de::DeserializeOwned,
{
    serde_json::from_value(document).map_err(|source| DecodeError::Malformed { kind, source })
}

/// Record identifier from a stored `_id`, without the optional `<kind>::` prefix.
pub(crate) fn parse_document_id(kind: &'static str, raw: &str) -> Result<String, DecodeError> {
    let id = raw
        .strip_prefix(kind)
        .and_then(|rest| rest.strip_prefix("::"))
        .unwrap_or(raw);

    if id.is_empty() || id.contains(char::is_whitespace) || id.contains("::") {
        return Err(DecodeError::invalid(kind, raw, "malformed identifier"));
    }
    Ok(id.to_owned())
}

/// Reject blank mandatory text fields.
pub(crate) fn required_text(
    kind: &'static str,
    id: &str,
    field: &str,
    value: String,
) -> Result<String, DecodeError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DecodeError::invalid(kind, id, format!("`{field}` is empty")));
    }
    Ok(trimmed.to_owned())
}

/// Convert stored epoch milliseconds into a timestamp.
pub(crate) fn timestamp(
    kind: &'static str,
    id: &str,
    millis: i64,
) -> Result<OffsetDateTime, DecodeError> {
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(millis) * 1_000_000)
        .map_err(|err| DecodeError::invalid(kind, id, format!("timestamp out of range: {err}")))
}

/// Serialize timestamps as RFC 3339 strings.
pub(crate) fn rfc3339<S>(value: &OffsetDateTime, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let formatted = value
        .format(&Rfc3339)
        .map_err(serde::ser::Error::custom)?;
    serializer.serialize_str(&formatted)
}
