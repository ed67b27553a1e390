use std::sync::Arc;

use futures::future::BoxFuture;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, warn};

use super::{
    config::CouchConfig,
    error::{CouchDaoError, CouchResult},
    models::{FindRequest, FindResponse, IndexRequest},
};
use crate::{
    dao::{
        page_store::{PageStore, RawPage},
        query::QuerySpec,
        storage::StorageResult,
    },
    paging::PageCursor,
};

/// Fields queries sort on; each gets a (`kind`, field) index.
const SORT_FIELDS: &[&str] = &["created_at", "search_title", "average_rating", "updated_at", "year"];

const FIND: &str = "_find";
const INDEX: &str = "_index";

/// Page store backed by one CouchDB database, queried with Mango.
#[derive(Clone)]
pub struct CouchPageStore {
    client: Client,
    base_url: Arc<str>,
    database: Arc<str>,
    auth: Option<(Arc<str>, Arc<str>)>,
}

impl CouchPageStore {
    /// Connect to CouchDB, creating the database and its sort indexes when missing.
    pub async fn connect(config: CouchConfig) -> CouchResult<Self> {
        let client = Client::builder()
            .build()
            .map_err(|source| CouchDaoError::ClientBuilder { source })?;

        let store = Self {
            client,
            base_url: Arc::from(config.base_url.trim_end_matches('/')),
            database: Arc::from(config.database),
            auth: config
                .credentials
                .map(|(user, pass)| (Arc::<str>::from(user), Arc::<str>::from(pass))),
        };

        store.ensure_database().await?;
        store.ensure_indexes().await?;
        Ok(store)
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        match self.auth {
            Some((ref user, ref pass)) => builder.basic_auth(user.as_ref(), Some(pass.as_ref())),
            None => builder,
        }
    }

    fn database_url(&self) -> String {
        format!("{}/{}", self.base_url, self.database)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}/{}", self.database_url(), path);
        self.authorized(self.client.request(method, url))
    }

    async fn ensure_database(&self) -> CouchResult<()> {
        let database = self.database.to_string();
        let url = self.database_url();

        let response = self
            .authorized(self.client.get(&url))
            .send()
            .await
            .map_err(|source| CouchDaoError::DatabaseQuery {
                database: database.clone(),
                source,
            })?;

        match response.status() {
            StatusCode::OK => Ok(()),
            StatusCode::NOT_FOUND => {
                let create = self
                    .authorized(self.client.put(&url))
                    .send()
                    .await
                    .map_err(|source| CouchDaoError::DatabaseCreate {
                        database: database.clone(),
                        source,
                    })?;
                if create.status().is_success() {
                    debug!(%database, "CouchDB database created");
                    Ok(())
                } else {
                    Err(CouchDaoError::DatabaseStatus {
                        database,
                        status: create.status(),
                    })
                }
            }
            other => Err(CouchDaoError::DatabaseStatus {
                database,
                status: other,
            }),
        }
    }

    async fn ensure_indexes(&self) -> CouchResult<()> {
        for &field in SORT_FIELDS {
            // `_index` answers 200 when the index already exists.
            let _: serde_json::Value = self.post(INDEX, &IndexRequest::sort_index(field)).await?;
        }
        debug!(count = SORT_FIELDS.len(), "CouchDB indexes ensured");
        Ok(())
    }

    async fn post<B, T>(&self, path: &str, body: &B) -> CouchResult<T>
    where
        B: ?Sized + Serialize,
        T: DeserializeOwned,
    {
        let response = self
            .request(Method::POST, path)
            .json(body)
            .send()
            .await
            .map_err(|source| CouchDaoError::RequestSend {
                path: path.to_owned(),
                source,
            })?;

        if !response.status().is_success() {
            return Err(CouchDaoError::RequestStatus {
                path: path.to_owned(),
                status: response.status(),
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|source| CouchDaoError::DecodeResponse {
                path: path.to_owned(),
                source,
            })
    }

    async fn fetch(
        &self,
        query: QuerySpec,
        limit: usize,
        after: Option<PageCursor>,
    ) -> CouchResult<RawPage> {
        let request = FindRequest::new(&query, limit, after.map(|cursor| cursor.as_str().to_owned()));
        let response: FindResponse = self.post(FIND, &request).await?;

        if let Some(warning) = response.warning.as_deref() {
            warn!(kind = query.kind, warning, "CouchDB reported a query warning");
        }

        // A short page is the last one; a full page may still be followed by an empty one.
        let next_cursor = if response.docs.len() == limit {
            response.bookmark.map(PageCursor::new)
        } else {
            None
        };

        Ok(RawPage {
            documents: response.docs,
            next_cursor,
        })
    }
}

impl PageStore for CouchPageStore {
    fn fetch_documents(
        &self,
        query: QuerySpec,
        limit: usize,
        after: Option<PageCursor>,
    ) -> BoxFuture<'static, StorageResult<RawPage>> {
        let store = self.clone();
        Box::pin(async move { store.fetch(query, limit, after).await.map_err(Into::into) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let url = store.database_url();
            let response = store
                .authorized(store.client.get(&url))
                .send()
                .await
                .map_err(|source| CouchDaoError::RequestSend {
                    path: url.clone(),
                    source,
                })?;

            if response.status().is_success() {
                Ok(())
            } else {
                Err(CouchDaoError::RequestStatus {
                    path: url,
                    status: response.status(),
                }
                .into())
            }
        })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store.ensure_database().await?;
            store.ensure_indexes().await.map_err(Into::into)
        })
    }
}
