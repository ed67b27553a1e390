use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Respond with the service health while logging connectivity issues.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    match state.store().current().await {
        Some(store) => {
            if let Err(err) = store.health_check().await {
                warn!(error = %err, "page store health check failed");
            }
        }
        None => warn!("page store unavailable (degraded mode)"),
    }

    HealthResponse::new(
        state.is_degraded(),
        state.backend().name(),
        state.feeds().len(),
    )
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        config::{AppConfig, StoreBackend},
        dao::page_store::memory::MemoryPageStore,
        state::AppState,
    };

    #[tokio::test]
    async fn reports_degraded_until_a_store_is_installed() {
        let state = AppState::new(AppConfig::default(), StoreBackend::Memory);
        let health = health_status(&state).await;
        assert_eq!(health.status, "degraded");
        assert_eq!(health.store, "memory");

        state.install_store(Arc::new(MemoryPageStore::new())).await;
        let health = health_status(&state).await;
        assert_eq!(health.status, "ok");
        assert_eq!(health.open_feeds, 0);
    }
}
