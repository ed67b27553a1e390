use serde::Serialize;
use utoipa::ToSchema;

/// Health payload returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// "ok", or "degraded" while no healthy page store is installed.
    pub status: String,
    /// Configured page store backend.
    pub store: String,
    /// Number of feeds currently open.
    pub open_feeds: usize,
}

impl HealthResponse {
    /// Report for the given degraded flag, backend name and feed count.
    pub fn new(degraded: bool, store: &str, open_feeds: usize) -> Self {
        Self {
            status: if degraded { "degraded" } else { "ok" }.to_owned(),
            store: store.to_owned(),
            open_feeds,
        }
    }
}
