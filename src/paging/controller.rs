use std::{
    sync::{Arc, Weak},
    time::Duration,
};

use tokio::{
    sync::{Mutex, watch},
    task::AbortHandle,
};
use tracing::{debug, warn};

use super::{
    collection::ItemCollection,
    cooldown::Cooldown,
    cursor::PageCursor,
    source::{Page, PageRequest, PageSource, Record, RemoteError},
    status::FetchStatus,
};

/// Page size used when a feed does not ask for a specific one.
pub const DEFAULT_PAGE_SIZE: usize = 20;
/// Minimum interval between two accepted "load more" triggers.
pub const DEFAULT_COOLDOWN: Duration = Duration::from_millis(500);

/// Tuning knobs of a [`PaginatedFetchController`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedSettings {
    /// Number of records requested per page (at least 1).
    pub page_size: usize,
    /// Cooldown applied to [`PaginatedFetchController::load_next_page`].
    pub cooldown: Duration,
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            cooldown: DEFAULT_COOLDOWN,
        }
    }
}

/// Outcome of a controller command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// A fetch was started.
    Dispatched,
    /// The command was dropped without side effects on the fetch state.
    Ignored(IgnoreReason),
}

/// Why a "load more" trigger was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// The previous trigger happened less than one cooldown window ago.
    Cooldown,
    /// Another fetch is still running.
    InFlight,
    /// The last load did not complete successfully (or nothing was loaded yet).
    NotReady,
    /// The last page received was the final one.
    EndReached,
}

/// Debounced, cancellable, cursor-based loader of remote pages.
///
/// Fetches run on spawned tokio tasks. Each fetch is tagged with a generation number; starting
/// a new first-page load (or resetting) aborts the running task and bumps the generation, so a
/// completion that slips through is discarded before it can touch the accumulated state.
pub struct PaginatedFetchController<R: Record> {
    shared: Arc<Shared<R>>,
}

struct Shared<R: Record> {
    source: Arc<dyn PageSource<R>>,
    page_size: usize,
    state: Mutex<ControllerState<R>>,
    status: watch::Sender<FetchStatus<R>>,
}

struct ControllerState<R: Record> {
    filter: R::Filter,
    items: ItemCollection<R>,
    cursor: Option<PageCursor>,
    end_reached: bool,
    generation: u64,
    in_flight: Option<AbortHandle>,
    cooldown: Cooldown,
}

impl<R: Record> ControllerState<R> {
    fn next_generation(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    fn cancel_in_flight(&mut self) {
        if let Some(handle) = self.in_flight.take() {
            handle.abort();
            debug!(
                kind = R::KIND,
                generation = self.generation,
                "cancelled in-flight page fetch"
            );
        }
    }

    fn clear(&mut self) {
        self.items.clear();
        self.cursor = None;
        self.end_reached = false;
    }
}

impl<R: Record> PaginatedFetchController<R> {
    /// Create an idle controller reading from `source` with the given filter.
    pub fn new(source: Arc<dyn PageSource<R>>, filter: R::Filter, settings: FeedSettings) -> Self {
        let (status, _receiver) = watch::channel(FetchStatus::Idle);
        let state = ControllerState {
            filter,
            items: ItemCollection::new(),
            cursor: None,
            end_reached: false,
            generation: 0,
            in_flight: None,
            cooldown: Cooldown::new(settings.cooldown),
        };

        Self {
            shared: Arc::new(Shared {
                source,
                page_size: settings.page_size.max(1),
                state: Mutex::new(state),
                status,
            }),
        }
    }

    /// Drop accumulated records and fetch the first page again.
    ///
    /// Any running fetch is cancelled first. Always dispatches.
    pub async fn load_first_page(&self) -> Dispatch {
        let mut state = self.shared.state.lock().await;
        self.restart(&mut state);
        Dispatch::Dispatched
    }

    /// Fetch the page following the last successful one and append it.
    ///
    /// Dropped when called within the cooldown window of the previous call, while a fetch is
    /// running, when the last load did not succeed, or when the end was already reached.
    pub async fn load_next_page(&self) -> Dispatch {
        let mut state = self.shared.state.lock().await;

        if !state.cooldown.trigger() {
            return ignored(R::KIND, IgnoreReason::Cooldown);
        }
        if state.in_flight.is_some() {
            return ignored(R::KIND, IgnoreReason::InFlight);
        }
        if !self.shared.status.borrow().is_success() {
            return ignored(R::KIND, IgnoreReason::NotReady);
        }
        if state.end_reached {
            return ignored(R::KIND, IgnoreReason::EndReached);
        }

        self.shared.publish(FetchStatus::Loading {
            items: state.items.snapshot(),
            appending: true,
        });
        let request = PageRequest {
            filter: state.filter.clone(),
            page_size: self.shared.page_size,
            after: state.cursor.clone(),
        };
        self.spawn_fetch(&mut state, request);
        Dispatch::Dispatched
    }

    /// Replace the filter criteria and reload from the first page.
    pub async fn set_filter(&self, filter: R::Filter) -> Dispatch {
        let mut state = self.shared.state.lock().await;
        state.filter = filter;
        self.restart(&mut state);
        Dispatch::Dispatched
    }

    /// Cancel any running fetch, forget every record and the cursor, and go back to idle.
    pub async fn reset(&self) {
        let mut state = self.shared.state.lock().await;
        state.cancel_in_flight();
        state.next_generation();
        state.clear();
        state.cooldown.clear();
        self.shared.publish(FetchStatus::Idle);
    }

    /// Latest published status.
    pub fn status(&self) -> FetchStatus<R> {
        self.shared.status.borrow().clone()
    }

    /// Observe every status published from now on.
    pub fn subscribe(&self) -> watch::Receiver<FetchStatus<R>> {
        self.shared.status.subscribe()
    }

    /// Effective page size.
    pub fn page_size(&self) -> usize {
        self.shared.page_size
    }

    /// Current filter criteria.
    pub async fn filter(&self) -> R::Filter {
        self.shared.state.lock().await.filter.clone()
    }

    fn restart(&self, state: &mut ControllerState<R>) {
        state.cancel_in_flight();
        state.clear();
        state.cooldown.clear();
        self.shared.publish(FetchStatus::Loading {
            items: state.items.snapshot(),
            appending: false,
        });
        let request = PageRequest {
            filter: state.filter.clone(),
            page_size: self.shared.page_size,
            after: None,
        };
        self.spawn_fetch(state, request);
    }

    fn spawn_fetch(&self, state: &mut ControllerState<R>, request: PageRequest<R::Filter>) {
        let generation = state.next_generation();
        debug!(
            kind = R::KIND,
            generation,
            filter = ?request.filter,
            after = ?request.after,
            "dispatching page fetch"
        );

        let fetch = self.shared.source.fetch_page(request);
        let shared: Weak<Shared<R>> = Arc::downgrade(&self.shared);
        let task = tokio::spawn(async move {
            let outcome = fetch.await;
            if let Some(shared) = shared.upgrade() {
                shared.complete(generation, outcome).await;
            }
        });
        state.in_flight = Some(task.abort_handle());
    }
}

impl<R: Record> Shared<R> {
    fn publish(&self, status: FetchStatus<R>) {
        self.status.send_replace(status);
    }

    async fn complete(&self, generation: u64, outcome: Result<Page<R>, RemoteError>) {
        let mut state = self.state.lock().await;
        if state.generation != generation {
            debug!(
                kind = R::KIND,
                generation,
                current = state.generation,
                "discarding superseded page fetch"
            );
            return;
        }
        state.in_flight = None;

        match outcome {
            Ok(page) => {
                let end_reached = page.is_last(self.page_size);
                let received = page.items.len();
                if received > 0 {
                    state.cursor = page.next_cursor;
                }
                let appended = state.items.merge(page.items);
                state.end_reached = end_reached;
                debug!(
                    kind = R::KIND,
                    generation,
                    received,
                    appended,
                    total = state.items.len(),
                    end_reached,
                    "page fetch completed"
                );
                self.publish(FetchStatus::Success {
                    items: state.items.snapshot(),
                    end_reached,
                });
            }
            Err(error) => {
                warn!(kind = R::KIND, generation, error = %error, "page fetch failed");
                self.publish(FetchStatus::Error {
                    items: state.items.snapshot(),
                    error,
                });
            }
        }
    }
}

impl<R: Record> Drop for PaginatedFetchController<R> {
    fn drop(&mut self) {
        if let Ok(mut state) = self.shared.state.try_lock() {
            state.cancel_in_flight();
        }
    }
}

fn ignored(kind: &'static str, reason: IgnoreReason) -> Dispatch {
    debug!(kind, ?reason, "load-more trigger dropped");
    Dispatch::Ignored(reason)
}
