//! Incremental list loading shared by every feed: cursor-based page fetches merged into an
//! ordered, de-duplicated collection and published as a [`FetchStatus`].

mod collection;
pub mod controller;
mod cooldown;
mod cursor;
pub mod source;
mod status;

pub use self::collection::ItemCollection;
pub use self::controller::{Dispatch, FeedSettings, IgnoreReason, PaginatedFetchController};
pub use self::cooldown::Cooldown;
pub use self::cursor::PageCursor;
pub use self::source::{Page, PageRequest, PageSource, Record, RemoteError};
pub use self::status::{FetchStatus, StatusPhase};
