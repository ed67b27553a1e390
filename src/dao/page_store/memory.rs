//! In-process page store used for local runs and as a reference for keyset semantics.

use std::{collections::HashMap, env, path::Path, sync::Arc};

use futures::future::BoxFuture;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::info;

use super::{PageStore, RawPage};
use crate::{
    dao::{
        query::{KeysetCursor, QuerySpec},
        storage::{StorageError, StorageResult},
    },
    paging::PageCursor,
};

/// Environment variable pointing at a JSON seed file (`{"games": [...], "reviews": [...]}`).
const SEED_PATH_ENV: &str = "RAYVUE_MEMORY_SEED";

/// Documents kept in memory, grouped by record kind.
#[derive(Clone, Default)]
pub struct MemoryPageStore {
    collections: Arc<RwLock<HashMap<String, Vec<Value>>>>,
}

impl MemoryPageStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from the seed file named by `RAYVUE_MEMORY_SEED`, or an empty one.
    pub async fn from_env() -> StorageResult<Self> {
        match env::var_os(SEED_PATH_ENV).filter(|path| !path.is_empty()) {
            Some(path) => Self::from_seed_file(Path::new(&path)).await,
            None => {
                info!("no memory seed configured; starting with an empty store");
                Ok(Self::new())
            }
        }
    }

    /// Load every collection from a JSON seed file.
    pub async fn from_seed_file(path: &Path) -> StorageResult<Self> {
        let contents = tokio::fs::read_to_string(path).await.map_err(|source| {
            StorageError::unavailable(format!("failed to read seed `{}`", path.display()), source)
        })?;
        let collections: HashMap<String, Vec<Value>> = serde_json::from_str(&contents)
            .map_err(|source| {
                StorageError::unavailable(format!("failed to parse seed `{}`", path.display()), source)
            })?;

        info!(
            path = %path.display(),
            collections = collections.len(),
            documents = collections.values().map(Vec::len).sum::<usize>(),
            "loaded memory store seed"
        );

        Ok(Self {
            collections: Arc::new(RwLock::new(collections)),
        })
    }

    /// Add a document to the collection of `kind`.
    pub async fn insert(&self, kind: &str, document: Value) {
        let mut guard = self.collections.write().await;
        guard.entry(kind.to_owned()).or_default().push(document);
    }

    async fn fetch(
        &self,
        query: QuerySpec,
        limit: usize,
        after: Option<PageCursor>,
    ) -> StorageResult<RawPage> {
        let after = after.as_ref().map(KeysetCursor::decode).transpose()?;

        let guard = self.collections.read().await;
        let mut matching = guard
            .get(query.kind)
            .map(|documents| {
                documents
                    .iter()
                    .filter(|document| query.filters.iter().all(|filter| filter.matches(document)))
                    .filter(|document| {
                        after
                            .as_ref()
                            .is_none_or(|cursor| query.sort.is_after(document, cursor))
                    })
                    .cloned()
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();
        drop(guard);

        matching.sort_by(|a, b| query.sort.order(a, b));

        // One extra document tells whether another page exists.
        let has_more = matching.len() > limit;
        matching.truncate(limit);
        let next_cursor = if has_more {
            matching
                .last()
                .and_then(|last| KeysetCursor::from_document(last, query.sort.field))
                .map(|cursor| cursor.encode())
        } else {
            None
        };

        Ok(RawPage {
            documents: matching,
            next_cursor,
        })
    }
}

impl PageStore for MemoryPageStore {
    fn fetch_documents(
        &self,
        query: QuerySpec,
        limit: usize,
        after: Option<PageCursor>,
    ) -> BoxFuture<'static, StorageResult<RawPage>> {
        let store = self.clone();
        Box::pin(async move { store.fetch(query, limit, after).await })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::query::{FieldFilter, SortSpec};
    use serde_json::json;

    async fn seeded() -> MemoryPageStore {
        let store = MemoryPageStore::new();
        let games = [
            ("g1", "celeste", 50, vec!["platformer", "indie"]),
            ("g2", "hades", 40, vec!["roguelike", "indie"]),
            ("g3", "halo", 40, vec!["shooter"]),
            ("g4", "hollow knight", 30, vec!["metroidvania", "indie"]),
            ("g5", "outer wilds", 20, vec!["adventure", "indie"]),
        ];
        for (id, title, created_at, genres) in games {
            store
                .insert(
                    "games",
                    json!({"_id": id, "search_title": title, "created_at": created_at, "genres": genres}),
                )
                .await;
        }
        store
    }

    fn ids(page: &RawPage) -> Vec<&str> {
        page.documents
            .iter()
            .filter_map(|document| document["_id"].as_str())
            .collect()
    }

    #[tokio::test]
    async fn keyset_pages_cover_everything_once() {
        let store = seeded().await;
        let query = QuerySpec::new("games", SortSpec::descending("created_at"));

        let first = store.fetch_documents(query.clone(), 2, None).await.unwrap();
        assert_eq!(ids(&first), vec!["g1", "g3"]);

        let second = store
            .fetch_documents(query.clone(), 2, first.next_cursor.clone())
            .await
            .unwrap();
        assert_eq!(ids(&second), vec!["g2", "g4"]);

        let third = store
            .fetch_documents(query, 2, second.next_cursor.clone())
            .await
            .unwrap();
        assert_eq!(ids(&third), vec!["g5"]);
        assert!(third.next_cursor.is_none());
    }

    #[tokio::test]
    async fn exact_fit_page_has_no_cursor() {
        let store = seeded().await;
        let query = QuerySpec::new("games", SortSpec::ascending("search_title"));
        let page = store.fetch_documents(query, 5, None).await.unwrap();
        assert_eq!(page.documents.len(), 5);
        assert!(page.next_cursor.is_none());
    }

    #[tokio::test]
    async fn prefix_and_contains_filters_apply() {
        let store = seeded().await;
        let query = QuerySpec::new("games", SortSpec::ascending("search_title"))
            .with(FieldFilter::Prefix {
                field: "search_title",
                prefix: "h".into(),
            })
            .with(FieldFilter::Contains {
                field: "genres",
                value: json!("indie"),
            });

        let page = store.fetch_documents(query, 10, None).await.unwrap();
        assert_eq!(ids(&page), vec!["g2", "g4"]);
    }

    #[tokio::test]
    async fn unknown_kind_yields_empty_page() {
        let store = seeded().await;
        let query = QuerySpec::new("awards", SortSpec::descending("year"));
        let page = store.fetch_documents(query, 10, None).await.unwrap();
        assert_eq!(page, RawPage::default());
    }

    #[tokio::test]
    async fn foreign_cursor_is_rejected() {
        let store = seeded().await;
        let query = QuerySpec::new("games", SortSpec::descending("created_at"));
        let err = store
            .fetch_documents(query, 2, Some(PageCursor::new("g1P2")))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::InvalidCursor { .. }));
    }
}
