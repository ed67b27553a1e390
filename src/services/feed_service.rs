use std::sync::Arc;

use futures::stream::BoxStream;
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    catalog::{CatalogRecord, StorePageSource},
    dto::{
        feed::{DispatchResponse, FeedOpened, FeedSnapshot, FeedStatusResponse},
        validation::validate_page_size,
    },
    error::ServiceError,
    paging::{Dispatch, PaginatedFetchController},
    state::{FeedHandle, SharedState},
};

/// Open a feed of `R` records and request its first page.
pub async fn open_feed<R: CatalogRecord>(
    state: &SharedState,
    filter: R::Filter,
    page_size: Option<usize>,
) -> Result<FeedOpened, ServiceError> {
    let config = state.config();
    if let Some(page_size) = page_size {
        validate_page_size(page_size, config.max_page_size)?;
    }
    if !state.reserve_feed_slot(config.max_open_feeds) {
        return Err(ServiceError::TooManyFeeds {
            limit: config.max_open_feeds,
        });
    }

    let source = Arc::new(StorePageSource::<R>::new(state.store().clone()));
    let controller = Arc::new(PaginatedFetchController::new(
        source,
        filter,
        config.feed_settings(page_size),
    ));
    controller.load_first_page().await;

    let id = Uuid::new_v4();
    let page_size = controller.page_size();
    state.insert_feed(id, controller);
    info!(feed_id = %id, kind = R::KIND, page_size, "feed opened");

    Ok(FeedOpened {
        id,
        kind: R::KIND.to_owned(),
        page_size,
    })
}

/// Describe an open feed and its latest status.
pub fn snapshot(state: &SharedState, id: Uuid) -> Result<FeedSnapshot, ServiceError> {
    let feed = require_feed(state, id)?;
    Ok(FeedSnapshot {
        id,
        kind: feed.kind().to_owned(),
        page_size: feed.page_size(),
        status: feed.status(),
    })
}

/// Ask the feed for its next page.
pub async fn next_page(state: &SharedState, id: Uuid) -> Result<DispatchResponse, ServiceError> {
    let feed = require_feed(state, id)?;
    let dispatch = feed.load_next_page().await;
    debug!(feed_id = %id, ?dispatch, "next page requested");
    Ok(dispatch.into())
}

/// Drop the feed's records and load its first page again.
pub async fn reload(state: &SharedState, id: Uuid) -> Result<DispatchResponse, ServiceError> {
    let feed = require_feed(state, id)?;
    Ok(feed.load_first_page().await.into())
}

/// Bring the feed back to idle, cancelling any running fetch.
pub async fn reset(state: &SharedState, id: Uuid) -> Result<DispatchResponse, ServiceError> {
    let feed = require_feed(state, id)?;
    feed.reset().await;
    Ok(Dispatch::Dispatched.into())
}

/// Close the feed. Its running fetch is cancelled once the last handle is dropped.
pub fn close(state: &SharedState, id: Uuid) -> Result<(), ServiceError> {
    state
        .remove_feed(id)
        .ok_or(ServiceError::FeedNotFound(id))?;
    info!(feed_id = %id, "feed closed");
    Ok(())
}

/// Status updates of the feed, starting with the current one.
pub fn updates(
    state: &SharedState,
    id: Uuid,
) -> Result<BoxStream<'static, FeedStatusResponse>, ServiceError> {
    Ok(require_feed(state, id)?.updates())
}

fn require_feed(state: &SharedState, id: Uuid) -> Result<Arc<dyn FeedHandle>, ServiceError> {
    state.feed(id).ok_or(ServiceError::FeedNotFound(id))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use futures::StreamExt;
    use serde_json::json;

    use super::*;
    use crate::{
        catalog::{Game, GameFilter},
        config::{AppConfig, StoreBackend},
        dao::page_store::memory::MemoryPageStore,
        dto::feed::{FeedPhase, IgnoredBecause},
        state::AppState,
    };

    async fn state_with_games(count: i64, config: AppConfig) -> SharedState {
        let store = MemoryPageStore::new();
        for index in 0..count {
            store
                .insert(
                    "games",
                    json!({
                        "_id": format!("g-{index}"),
                        "title": format!("Game {index}"),
                        "created_at": 1_700_000_000_000_i64 + index,
                    }),
                )
                .await;
        }
        let state = AppState::new(config, StoreBackend::Memory);
        state.install_store(Arc::new(store)).await;
        state
    }

    async fn settled(state: &SharedState, id: Uuid) -> FeedStatusResponse {
        let mut updates = updates(state, id).unwrap();
        while let Some(status) = updates.next().await {
            if status.phase != FeedPhase::Loading {
                return status;
            }
        }
        panic!("feed closed while loading");
    }

    #[tokio::test(start_paused = true)]
    async fn feed_pages_through_the_store() {
        let state = state_with_games(3, AppConfig::default()).await;
        let opened = open_feed::<Game>(&state, GameFilter::default(), Some(2))
            .await
            .unwrap();
        assert_eq!(opened.kind, "games");

        let first = settled(&state, opened.id).await;
        assert_eq!(first.items.len(), 2);
        assert_eq!(first.items[0]["id"], "g-2");
        assert_eq!(first.end_reached, Some(false));

        let dispatch = next_page(&state, opened.id).await.unwrap();
        assert!(dispatch.dispatched);
        let second = settled(&state, opened.id).await;
        assert_eq!(second.items.len(), 3);
        assert_eq!(second.end_reached, Some(true));

        tokio::time::advance(Duration::from_secs(1)).await;
        let after_end = next_page(&state, opened.id).await.unwrap();
        assert_eq!(after_end.ignored, Some(IgnoredBecause::EndReached));
    }

    #[tokio::test(start_paused = true)]
    async fn degraded_store_surfaces_as_error_status() {
        let state = AppState::new(AppConfig::default(), StoreBackend::Memory);
        let opened = open_feed::<Game>(&state, GameFilter::default(), None)
            .await
            .unwrap();

        let status = settled(&state, opened.id).await;
        assert_eq!(status.phase, FeedPhase::Error);
        assert!(status.error.unwrap().contains("degraded"));
    }

    #[tokio::test]
    async fn page_size_and_registry_limits_are_enforced() {
        let config = AppConfig {
            max_open_feeds: 1,
            ..AppConfig::default()
        };
        let state = state_with_games(1, config).await;

        let too_big = open_feed::<Game>(&state, GameFilter::default(), Some(1_000)).await;
        assert!(matches!(too_big, Err(ServiceError::InvalidInput(_))));

        open_feed::<Game>(&state, GameFilter::default(), None)
            .await
            .unwrap();
        let full = open_feed::<Game>(&state, GameFilter::default(), None).await;
        assert!(matches!(full, Err(ServiceError::TooManyFeeds { limit: 1 })));
    }

    #[tokio::test]
    async fn closed_feeds_are_gone() {
        let state = state_with_games(1, AppConfig::default()).await;
        let opened = open_feed::<Game>(&state, GameFilter::default(), None)
            .await
            .unwrap();

        close(&state, opened.id).unwrap();
        assert!(matches!(
            snapshot(&state, opened.id),
            Err(ServiceError::FeedNotFound(_))
        ));
        assert!(matches!(
            close(&state, opened.id),
            Err(ServiceError::FeedNotFound(_))
        ));
    }

    #[tokio::test]
    async fn concurrent_opens_respect_the_registry_limit() {
        let config = AppConfig {
            max_open_feeds: 3,
            ..AppConfig::default()
        };
        let state = state_with_games(2, config).await;

        let opens = (0..10).map(|_| open_feed::<Game>(&state, GameFilter::default(), None));
        let results = futures::future::join_all(opens).await;

        let opened = results.iter().filter(|result| result.is_ok()).count();
        assert_eq!(opened, 3);
        assert_eq!(state.feeds().len(), 3);

        let first = results.into_iter().flatten().next().unwrap();
        close(&state, first.id).unwrap();
        open_feed::<Game>(&state, GameFilter::default(), None)
            .await
            .unwrap();
        assert_eq!(state.feeds().len(), 3);
    }
}
