use std::{fmt, hash::Hash};

use futures::future::BoxFuture;
use thiserror::Error;

use super::cursor::PageCursor;

/// Domain record that can be accumulated by a paginated feed.
pub trait Record: Clone + Send + Sync + 'static {
    /// Stable identifier used to de-duplicate merged pages.
    type Id: Clone + Eq + Hash + fmt::Debug + Send + Sync + 'static;
    /// Filter criteria forwarded verbatim to the page source.
    type Filter: Clone + fmt::Debug + Send + Sync + 'static;

    /// Short name of the record kind, used in logs and routes.
    const KIND: &'static str;

    /// Identifier of this record.
    fn id(&self) -> Self::Id;
}

/// Parameters of a single page fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest<F> {
    /// Filter criteria of the owning feed.
    pub filter: F,
    /// Maximum number of records the source should return.
    pub page_size: usize,
    /// Continuation token returned by the previous page, `None` for page 1.
    pub after: Option<PageCursor>,
}

/// One page of records as returned by a [`PageSource`].
#[derive(Debug, Clone, PartialEq)]
pub struct Page<R> {
    /// Records in the remote sort order.
    pub items: Vec<R>,
    /// Token to request the following page, `None` when the source knows there is none.
    pub next_cursor: Option<PageCursor>,
}

impl<R> Page<R> {
    /// Build a page from its records and continuation token.
    pub fn new(items: Vec<R>, next_cursor: Option<PageCursor>) -> Self {
        Self { items, next_cursor }
    }

    /// Whether this page is known to be the last one for `page_size`.
    ///
    /// Short pages and pages without a continuation token end the pagination. An empty page is
    /// always the last one.
    pub fn is_last(&self, page_size: usize) -> bool {
        self.items.len() < page_size || self.next_cursor.is_none()
    }
}

/// Failure reported by a remote page source.
///
/// Network, authorization and decoding failures all share this type and end up as the same
/// error status.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("remote fetch failed: {message}")]
pub struct RemoteError {
    message: String,
}

impl RemoteError {
    /// Create a remote error carrying a human-readable message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Message describing the failure.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Remote collaborator able to serve paged query results.
pub trait PageSource<R: Record>: Send + Sync {
    /// Fetch one page of records matching `request`.
    fn fetch_page(
        &self,
        request: PageRequest<R::Filter>,
    ) -> BoxFuture<'static, Result<Page<R>, RemoteError>>;
}
