use axum::Router;

use crate::state::SharedState;

pub mod docs;
pub mod feeds;
pub mod health;

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    let api_router = health::router().merge(feeds::router());

    let docs_router = docs::router(state.clone());

    api_router.merge(docs_router).with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{Body, to_bytes},
        http::{Request, StatusCode},
    };
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;
    use crate::{
        config::{AppConfig, StoreBackend},
        dao::page_store::memory::MemoryPageStore,
        state::AppState,
    };

    async fn app() -> (SharedState, Router<()>) {
        let store = MemoryPageStore::new();
        store
            .insert(
                "awards",
                json!({
                    "_id": "award-1",
                    "game_id": "g-1",
                    "game_title": "Outer Wilds",
                    "category": "Game of the Year",
                    "year": 2019,
                    "granted_by": "Critics",
                }),
            )
            .await;
        let state = AppState::new(AppConfig::default(), StoreBackend::Memory);
        state.install_store(Arc::new(store)).await;
        (state.clone(), router(state))
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn opening_a_feed_returns_its_identifier() {
        let (state, app) = app().await;

        let response = app
            .oneshot(post_json("/feeds/awards?page_size=5", json!({ "year": 2019 })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let body = json_body(response).await;
        assert_eq!(body["kind"], "awards");
        assert_eq!(body["page_size"], 5);
        assert_eq!(state.feeds().len(), 1);
    }

    #[tokio::test]
    async fn invalid_filters_are_rejected() {
        let (state, app) = app().await;

        let response = app
            .clone()
            .oneshot(post_json("/feeds/awards", json!({ "year": 1800 })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app
            .oneshot(post_json("/feeds/journal", json!({ "owner_id": "" })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(state.feeds().is_empty());
    }

    #[tokio::test]
    async fn unknown_feeds_are_not_found() {
        let (_, app) = app().await;

        let response = app
            .oneshot(
                Request::get(format!("/feeds/{}", uuid::Uuid::nil()))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = json_body(response).await;
        assert!(body["message"].as_str().unwrap().contains("not found"));
    }
}
