mod feed;

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use dashmap::DashMap;
use tokio::sync::watch;
use uuid::Uuid;

use crate::{
    config::{AppConfig, StoreBackend},
    dao::page_store::{PageStore, StoreHandle},
};

pub use self::feed::FeedHandle;

/// Application state shared by handlers and background tasks.
pub type SharedState = Arc<AppState>;

/// Central application state: configuration, the page store slot and the live feeds.
pub struct AppState {
    config: AppConfig,
    backend: StoreBackend,
    store: StoreHandle,
    feeds: DashMap<Uuid, Arc<dyn FeedHandle>>,
    /// Registered feeds plus reservations for feeds still being opened.
    feed_slots: AtomicUsize,
    degraded: watch::Sender<bool>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a page store is installed.
    pub fn new(config: AppConfig, backend: StoreBackend) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        Arc::new(Self {
            config,
            backend,
            store: StoreHandle::new(),
            feeds: DashMap::new(),
            feed_slots: AtomicUsize::new(0),
            degraded: degraded_tx,
        })
    }

    /// Settings loaded at startup.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Backend the supervisor connects to.
    pub fn backend(&self) -> StoreBackend {
        self.backend
    }

    /// Slot shared with every page source.
    pub fn store(&self) -> &StoreHandle {
        &self.store
    }

    /// Install a new page store and leave degraded mode.
    pub async fn install_store(&self, store: Arc<dyn PageStore>) {
        self.store.install(store).await;
        self.update_degraded(false);
    }

    /// Remove the current page store and enter degraded mode.
    pub async fn clear_store(&self) {
        self.store.clear().await;
        self.update_degraded(true);
    }

    /// Current degraded flag.
    pub fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Update and broadcast the degraded flag when the value changes.
    pub fn update_degraded(&self, value: bool) {
        self.degraded.send_if_modified(|current| {
            let changed = *current != value;
            *current = value;
            changed
        });
    }

    /// Registry of open feeds keyed by their identifier.
    pub fn feeds(&self) -> &DashMap<Uuid, Arc<dyn FeedHandle>> {
        &self.feeds
    }

    /// Reserve room for one more feed, unless `limit` feeds are already open or being opened.
    pub fn reserve_feed_slot(&self, limit: usize) -> bool {
        self.feed_slots
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |slots| {
                (slots < limit).then_some(slots + 1)
            })
            .is_ok()
    }

    /// Register a feed in a slot obtained from [`AppState::reserve_feed_slot`].
    pub fn insert_feed(&self, id: Uuid, feed: Arc<dyn FeedHandle>) {
        self.feeds.insert(id, feed);
    }

    /// Unregister a feed and free its slot.
    pub fn remove_feed(&self, id: Uuid) -> Option<Arc<dyn FeedHandle>> {
        let (_, feed) = self.feeds.remove(&id)?;
        self.feed_slots.fetch_sub(1, Ordering::AcqRel);
        Some(feed)
    }

    /// Look up an open feed.
    pub fn feed(&self, id: Uuid) -> Option<Arc<dyn FeedHandle>> {
        self.feeds.get(&id).map(|entry| entry.value().clone())
    }
}
