use std::marker::PhantomData;

use futures::future::BoxFuture;
use tracing::debug;

use super::CatalogRecord;
use crate::{
    dao::page_store::StoreHandle,
    paging::{Page, PageRequest, PageSource, RemoteError},
};

/// Page source reading one record kind from whichever page store is installed.
pub struct StorePageSource<R> {
    store: StoreHandle,
    _record: PhantomData<fn() -> R>,
}

impl<R> StorePageSource<R> {
    /// Page source reading `R` records from whatever store `store` holds.
    pub fn new(store: StoreHandle) -> Self {
        Self {
            store,
            _record: PhantomData,
        }
    }
}

impl<R> Clone for StorePageSource<R> {
    fn clone(&self) -> Self {
        Self::new(self.store.clone())
    }
}

impl<R: CatalogRecord> PageSource<R> for StorePageSource<R> {
    fn fetch_page(
        &self,
        request: PageRequest<R::Filter>,
    ) -> BoxFuture<'static, Result<Page<R>, RemoteError>> {
        let store = self.store.clone();
        Box::pin(async move {
            // Resolved per fetch so a reconnected store is picked up by open feeds.
            let backend = store.require().await?;
            let raw = backend
                .fetch_documents(R::query(&request.filter), request.page_size, request.after)
                .await?;

            let items = raw
                .documents
                .into_iter()
                .map(R::decode)
                .collect::<Result<Vec<_>, _>>()?;

            debug!(kind = R::KIND, count = items.len(), "page fetched from store");
            Ok(Page::new(items, raw.next_cursor))
        })
    }
}
