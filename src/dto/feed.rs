use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::paging::{Dispatch, FetchStatus, IgnoreReason, Record, StatusPhase};

/// Query parameters accepted when opening a feed.
#[derive(Debug, Default, Deserialize, IntoParams, Validate)]
#[into_params(parameter_in = Query)]
pub struct OpenFeedQuery {
    /// Records per page; the configured default when absent.
    #[validate(range(min = 1))]
    pub page_size: Option<usize>,
}

#[derive(Debug, Serialize, ToSchema)]
/// Returned once a feed is open and its first page requested.
pub struct FeedOpened {
    /// Identifier of the feed in the registry.
    pub id: Uuid,
    /// Record kind served by the feed.
    pub kind: String,
    /// Records per page.
    pub page_size: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
/// Stage of a feed's last fetch.
pub enum FeedPhase {
    Idle,
    Loading,
    Success,
    Error,
}

impl From<StatusPhase> for FeedPhase {
    fn from(phase: StatusPhase) -> Self {
        match phase {
            StatusPhase::Idle => FeedPhase::Idle,
            StatusPhase::Loading => FeedPhase::Loading,
            StatusPhase::Success => FeedPhase::Success,
            StatusPhase::Error => FeedPhase::Error,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
/// Snapshot of a feed status, published on `GET /feeds/{id}` and the SSE stream.
pub struct FeedStatusResponse {
    /// Stage of the last fetch.
    pub phase: FeedPhase,
    /// Accumulated records, in fetch order.
    #[schema(value_type = Vec<Object>)]
    pub items: Vec<Value>,
    /// Set while loading: whether the fetch appends to `items`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub appending: Option<bool>,
    /// Set on success: whether the last page was reached.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_reached: Option<bool>,
    /// Set on error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<R> From<&FetchStatus<R>> for FeedStatusResponse
where
    R: Record + Serialize,
{
    fn from(status: &FetchStatus<R>) -> Self {
        let items = status
            .items()
            .iter()
            .filter_map(|item| match serde_json::to_value(item) {
                Ok(value) => Some(value),
                Err(err) => {
                    warn!(kind = R::KIND, id = ?item.id(), error = %err, "failed to serialize feed item");
                    None
                }
            })
            .collect();

        let (appending, end_reached, error) = match status {
            FetchStatus::Idle => (None, None, None),
            FetchStatus::Loading { appending, .. } => (Some(*appending), None, None),
            FetchStatus::Success { end_reached, .. } => (None, Some(*end_reached), None),
            FetchStatus::Error { error, .. } => (None, None, Some(error.message().to_owned())),
        };

        Self {
            phase: status.phase().into(),
            items,
            appending,
            end_reached,
            error,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// Full description of an open feed.
pub struct FeedSnapshot {
    /// Identifier of the feed.
    pub id: Uuid,
    /// Record kind served by the feed.
    pub kind: String,
    /// Records per page.
    pub page_size: usize,
    /// Latest status.
    pub status: FeedStatusResponse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
/// Why a command was dropped.
pub enum IgnoredBecause {
    Cooldown,
    InFlight,
    NotReady,
    EndReached,
}

/// Outcome of a feed command.
#[derive(Debug, PartialEq, Eq, Serialize, ToSchema)]
pub struct DispatchResponse {
    /// Whether a fetch was started.
    pub dispatched: bool,
    /// Why the command was dropped, when it was.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ignored: Option<IgnoredBecause>,
}

impl From<Dispatch> for DispatchResponse {
    fn from(dispatch: Dispatch) -> Self {
        let ignored = match dispatch {
            Dispatch::Dispatched => None,
            Dispatch::Ignored(IgnoreReason::Cooldown) => Some(IgnoredBecause::Cooldown),
            Dispatch::Ignored(IgnoreReason::InFlight) => Some(IgnoredBecause::InFlight),
            Dispatch::Ignored(IgnoreReason::NotReady) => Some(IgnoredBecause::NotReady),
            Dispatch::Ignored(IgnoreReason::EndReached) => Some(IgnoredBecause::EndReached),
        };
        Self {
            dispatched: ignored.is_none(),
            ignored,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::paging::RemoteError;

    #[derive(Debug, Clone, Serialize)]
    struct Row {
        id: u32,
    }

    impl Record for Row {
        type Id = u32;
        type Filter = ();

        const KIND: &'static str = "rows";

        fn id(&self) -> u32 {
            self.id
        }
    }

    #[test]
    fn error_status_keeps_items_and_message() {
        let status = FetchStatus::Error {
            items: Arc::from(vec![Row { id: 1 }, Row { id: 2 }]),
            error: RemoteError::new("connection reset"),
        };

        let response = FeedStatusResponse::from(&status);
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({
                "phase": "error",
                "items": [{"id": 1}, {"id": 2}],
                "error": "connection reset",
            })
        );
    }

    #[test]
    fn success_reports_end_of_pagination() {
        let status = FetchStatus::Success {
            items: Arc::from(Vec::<Row>::new()),
            end_reached: true,
        };
        let response = FeedStatusResponse::from(&status);
        assert_eq!(response.phase, FeedPhase::Success);
        assert_eq!(response.end_reached, Some(true));
        assert!(response.items.is_empty());
    }

    #[test]
    fn ignored_dispatch_names_the_reason() {
        assert_eq!(
            DispatchResponse::from(Dispatch::Ignored(IgnoreReason::Cooldown)),
            DispatchResponse {
                dispatched: false,
                ignored: Some(IgnoredBecause::Cooldown),
            }
        );
        assert!(DispatchResponse::from(Dispatch::Dispatched).dispatched);
    }
}
