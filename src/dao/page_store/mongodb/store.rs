use std::sync::Arc;

use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{
    Client, Collection, Database, IndexModel,
    bson::{Bson, Document},
    options::IndexOptions,
};
use tokio::sync::RwLock;
use tracing::debug;

use super::{
    config::MongoConfig,
    connection::{establish_connection, ping},
    error::{MongoDaoError, MongoResult},
    models::{filter_document, into_json, sort_document},
};
use crate::{
    dao::{
        page_store::{PageStore, RawPage},
        query::{KeysetCursor, QuerySpec},
        storage::StorageResult,
    },
    paging::PageCursor,
};

/// Secondary indexes backing the sort orders of each record kind.
const INDEXES: &[(&str, &str, &[(&str, i32)])] = &[
    ("games", "game_created_idx", &[("created_at", -1), ("_id", -1)]),
    ("games", "game_title_idx", &[("search_title", 1), ("_id", 1)]),
    ("games", "game_rating_idx", &[("average_rating", -1), ("_id", -1)]),
    ("reviews", "review_game_idx", &[("game_id", 1), ("created_at", -1)]),
    ("journal", "journal_owner_idx", &[("owner_id", 1), ("updated_at", -1)]),
    ("awards", "award_year_idx", &[("year", -1), ("_id", -1)]),
];

/// Page store backed by MongoDB, one collection per record kind.
#[derive(Clone)]
pub struct MongoPageStore {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    state: RwLock<MongoState>,
    config: MongoConfig,
}

struct MongoState {
    client: Client,
    database: Database,
}

impl MongoInner {
    async fn ping(&self) -> MongoResult<()> {
        let database = {
            let guard = self.state.read().await;
            guard.database.clone()
        };

        ping(&database)
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })
    }

    async fn reconnect(&self) -> MongoResult<()> {
        let (client, database) =
            establish_connection(&self.config).await?;
        let mut guard = self.state.write().await;
        guard.client = client;
        guard.database = database;
        Ok(())
    }
}

impl MongoPageStore {
    /// Establish a connection to MongoDB and ensure indexes are present.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let (client, database) =
            establish_connection(&config).await?;

        let inner = Arc::new(MongoInner {
            state: RwLock::new(MongoState { client, database }),
            config,
        });

        let store = Self { inner };
        store.ensure_indexes().await?;
        Ok(store)
    }

    async fn ensure_indexes(&self) -> MongoResult<()> {
        for &(collection_name, index_name, keys) in INDEXES {
            let collection = self.collection(collection_name).await;
            let keys = keys
                .iter()
                .map(|&(field, order)| (field.to_owned(), Bson::Int32(order)))
                .collect::<Document>();
            let index = IndexModel::builder()
                .keys(keys)
                .options(
                    IndexOptions::builder()
                        .name(Some(index_name.to_owned()))
                        .build(),
                )
                .build();

            collection
                .create_index(index)
                .await
                .map_err(|source| MongoDaoError::EnsureIndex {
                    collection: collection_name,
                    index: index_name,
                    source,
                })?;
        }

        debug!(count = INDEXES.len(), "MongoDB indexes ensured");
        Ok(())
    }

    async fn collection(&self, name: &str) -> Collection<Document> {
        let guard = self.inner.state.read().await;
        guard.database.collection::<Document>(name)
    }

    async fn fetch(
        &self,
        query: QuerySpec,
        limit: usize,
        after: Option<PageCursor>,
    ) -> StorageResult<RawPage> {
        let after = after.as_ref().map(KeysetCursor::decode).transpose()?;
        let collection = self.collection(query.kind).await;

        // One extra document tells whether another page exists.
        let fetch_limit = i64::try_from(limit.saturating_add(1)).unwrap_or(i64::MAX);
        let documents: Vec<Document> = collection
            .find(filter_document(&query, after.as_ref()))
            .sort(sort_document(&query.sort))
            .limit(fetch_limit)
            .await
            .map_err(|source| MongoDaoError::Query {
                collection: query.kind,
                source,
            })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::Query {
                collection: query.kind,
                source,
            })?;

        let has_more = documents.len() > limit;
        let documents = documents
            .into_iter()
            .take(limit)
            .map(into_json)
            .collect::<Vec<_>>();
        let next_cursor = if has_more {
            documents
                .last()
                .and_then(|last| KeysetCursor::from_document(last, query.sort.field))
                .map(|cursor| cursor.encode())
        } else {
            None
        };

        Ok(RawPage {
            documents,
            next_cursor,
        })
    }
}

impl PageStore for MongoPageStore {
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
        let store = self.clone();
        Box::pin(async move { store.inner.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.reconnect().await.map_err(Into::into) })
    }
}
