use std::sync::Arc;

use super::source::RemoteError;

/// Status published by a paginated feed to its observers.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchStatus<R> {
    /// Nothing requested yet, or the feed was reset.
    Idle,
    /// A fetch is in flight. `items` holds what was accumulated before it started.
    Loading {
        /// Records already accumulated (empty for a first-page load).
        items: Arc<[R]>,
        /// True when the fetch appends a next page rather than reloading.
        appending: bool,
    },
    /// The last fetch succeeded.
    Success {
        /// Every accumulated record, in fetch order.
        items: Arc<[R]>,
        /// True once a page shorter than the page size (or without cursor) was received.
        end_reached: bool,
    },
    /// The last fetch failed. Previously accumulated records are kept.
    Error {
        /// Records accumulated before the failing fetch.
        items: Arc<[R]>,
        /// Failure reported by the remote source.
        error: RemoteError,
    },
}

/// Name of a [`FetchStatus`] variant, without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusPhase {
    /// [`FetchStatus::Idle`].
    Idle,
    /// [`FetchStatus::Loading`].
    Loading,
    /// [`FetchStatus::Success`].
    Success,
    /// [`FetchStatus::Error`].
    Error,
}

impl<R> FetchStatus<R> {
    /// Records carried by the status (empty when idle).
    pub fn items(&self) -> &[R] {
        match self {
            FetchStatus::Idle => &[],
            FetchStatus::Loading { items, .. }
            | FetchStatus::Success { items, .. }
            | FetchStatus::Error { items, .. } => items.as_ref(),
        }
    }

    /// Variant name of the status.
    pub fn phase(&self) -> StatusPhase {
        match self {
            FetchStatus::Idle => StatusPhase::Idle,
            FetchStatus::Loading { .. } => StatusPhase::Loading,
            FetchStatus::Success { .. } => StatusPhase::Success,
            FetchStatus::Error { .. } => StatusPhase::Error,
        }
    }

    /// Whether a fetch is in flight.
    pub fn is_loading(&self) -> bool {
        matches!(self, FetchStatus::Loading { .. })
    }

    /// Whether the last fetch succeeded.
    pub fn is_success(&self) -> bool {
        matches!(self, FetchStatus::Success { .. })
    }

    /// Whether the last fetch failed.
    pub fn is_error(&self) -> bool {
        matches!(self, FetchStatus::Error { .. })
    }

    /// Error of the last fetch, if it failed.
    pub fn error(&self) -> Option<&RemoteError> {
        match self {
            FetchStatus::Error { error, .. } => Some(error),
            _ => None,
        }
    }
}
