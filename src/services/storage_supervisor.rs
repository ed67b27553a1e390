use std::{future::Future, sync::Arc, time::Duration};

use tokio::time::sleep;
use tracing::{info, warn};

use crate::{
    dao::{page_store::PageStore, storage::StorageError},
    state::SharedState,
};

const INITIAL_DELAY: Duration = Duration::from_millis(1_000);
const MAX_DELAY: Duration = Duration::from_secs(10);
const HEALTH_POLL_INTERVAL: Duration = Duration::from_secs(5);
const MAX_RECONNECT_ATTEMPTS: u32 = 3;

/// Connect to the page store and keep the shared state in degraded mode while it is unavailable.
pub async fn run<F, Fut>(state: SharedState, mut connect: F)
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<Arc<dyn PageStore>, StorageError>> + Send,
{
    let mut delay = INITIAL_DELAY;

    loop {
        match connect().await {
            Ok(store) => {
                state.install_store(store.clone()).await;
                info!(
                    backend = state.backend().name(),
                    "page store connected; leaving degraded mode"
                );
                delay = INITIAL_DELAY;

                supervise(&state, store.as_ref()).await;

                warn!("exhausted page store reconnect attempts; staying in degraded mode");
                state.clear_store().await;
                sleep(delay).await;
                delay = (delay * 2).min(MAX_DELAY);
            }
            Err(err) => {
                warn!(error = %err, "page store connection attempt failed");
                sleep(delay).await;
                delay = (delay * 2).min(MAX_DELAY);
            }
        }
    }
}

/// Poll the store until it fails and cannot be reconnected.
async fn supervise(state: &SharedState, store: &dyn PageStore) {
    loop {
        if store.health_check().await.is_ok() {
            if state.is_degraded() {
                info!("page store healthy again; leaving degraded mode");
                state.update_degraded(false);
            }
            sleep(HEALTH_POLL_INTERVAL).await;
            continue;
        }

        if !reconnect(state, store).await {
            return;
        }
        state.update_degraded(false);
        sleep(HEALTH_POLL_INTERVAL).await;
    }
}

async fn reconnect(state: &SharedState, store: &dyn PageStore) -> bool {
    let mut delay = INITIAL_DELAY;

    for attempt in 0..MAX_RECONNECT_ATTEMPTS {
        match store.try_reconnect().await {
            Ok(()) => {
                info!(attempt, "page store reconnection succeeded after health check failure");
                return true;
            }
            Err(err) => {
                if attempt == 0 {
                    warn!(
                        attempt, error = %err,
                        "page store reconnect first attempt failed; entering degraded mode"
                    );
                    state.update_degraded(true);
                } else {
                    warn!(attempt, error = %err, "page store reconnect attempt failed");
                }
                sleep(delay).await;
                delay = (delay * 2).min(MAX_DELAY);
            }
        }
    }

    false
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

    use futures::future::BoxFuture;

    use super::*;
    use crate::{
        config::{AppConfig, StoreBackend},
        dao::{page_store::RawPage, query::QuerySpec},
        paging::PageCursor,
        state::AppState,
    };

    #[derive(Default)]
    struct FlakyStore {
        healthy: AtomicBool,
        reconnects: AtomicU32,
    }

    impl PageStore for FlakyStore {
        fn fetch_documents(
            &self,
            _query: QuerySpec,
            _limit: usize,
            _after: Option<PageCursor>,
        ) -> BoxFuture<'static, Result<RawPage, StorageError>> {
            Box::pin(async { Ok(RawPage::default()) })
        }

        fn health_check(&self) -> BoxFuture<'static, Result<(), StorageError>> {
            let healthy = self.healthy.load(Ordering::SeqCst);
            Box::pin(async move {
                if healthy {
                    Ok(())
                } else {
                    Err(StorageError::Degraded)
                }
            })
        }

        fn try_reconnect(&self) -> BoxFuture<'static, Result<(), StorageError>> {
            self.reconnects.fetch_add(1, Ordering::SeqCst);
            Box::pin(async { Err(StorageError::Degraded) })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn failing_store_is_cleared_after_reconnect_attempts() {
        let state = AppState::new(AppConfig::default(), StoreBackend::Memory);
        let store = Arc::new(FlakyStore::default());
        store.healthy.store(true, Ordering::SeqCst);

        let connected = store.clone();
        let task = tokio::spawn(run(state.clone(), move || {
            let store: Arc<dyn PageStore> = connected.clone();
            async move { Ok(store) }
        }));

        sleep(Duration::from_millis(10)).await;
        assert!(!state.is_degraded());
        assert!(state.store().current().await.is_some());

        store.healthy.store(false, Ordering::SeqCst);
        sleep(HEALTH_POLL_INTERVAL + Duration::from_millis(10)).await;
        assert!(state.is_degraded());

        // 1s + 2s + 4s of reconnect backoff
        sleep(Duration::from_secs(7)).await;
        assert_eq!(store.reconnects.load(Ordering::SeqCst), MAX_RECONNECT_ATTEMPTS);
        assert!(state.store().current().await.is_none());

        task.abort();
    }
}
