use futures::{
    StreamExt,
    future::BoxFuture,
    stream::BoxStream,
};
use serde::Serialize;
use tokio_stream::wrappers::WatchStream;

use crate::{
    dto::feed::FeedStatusResponse,
    paging::{Dispatch, PaginatedFetchController, Record},
};

/// Object-safe view of a live feed, whatever record kind it loads.
pub trait FeedHandle: Send + Sync {
    /// Record kind of the feed.
    fn kind(&self) -> &'static str;
    fn page_size(&self) -> usize;
    fn load_first_page(&self) -> BoxFuture<'_, Dispatch>;
    fn load_next_page(&self) -> BoxFuture<'_, Dispatch>;
    fn reset(&self) -> BoxFuture<'_, ()>;
    /// Latest status, with records serialised.
    fn status(&self) -> FeedStatusResponse;
    /// Current status followed by every later one; ends when the feed is dropped.
    fn updates(&self) -> BoxStream<'static, FeedStatusResponse>;
}

impl<R> FeedHandle for PaginatedFetchController<R>
where
    R: Record + Serialize,
{
    fn kind(&self) -> &'static str {
        R::KIND
    }

    fn page_size(&self) -> usize {
        PaginatedFetchController::page_size(self)
    }

    fn load_first_page(&self) -> BoxFuture<'_, Dispatch> {
        Box::pin(PaginatedFetchController::load_first_page(self))
    }

    fn load_next_page(&self) -> BoxFuture<'_, Dispatch> {
        Box::pin(PaginatedFetchController::load_next_page(self))
    }

    fn reset(&self) -> BoxFuture<'_, ()> {
        Box::pin(PaginatedFetchController::reset(self))
    }

    fn status(&self) -> FeedStatusResponse {
        FeedStatusResponse::from(&PaginatedFetchController::status(self))
    }

    fn updates(&self) -> BoxStream<'static, FeedStatusResponse> {
        WatchStream::new(self.subscribe())
            .map(|status| FeedStatusResponse::from(&status))
            .boxed()
    }
}
