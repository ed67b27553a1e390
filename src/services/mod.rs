/// OpenAPI documentation generation.
pub mod documentation;
/// Feed registry operations: opening, driving and closing feeds.
pub mod feed_service;
/// Health check service.
pub mod health_service;
/// Server-Sent Events streaming of feed statuses.
pub mod sse_service;
/// Page store connection supervisor with reconnect backoff.
pub mod storage_supervisor;
