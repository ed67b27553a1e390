/// Raw stored document shapes.
pub mod models;
/// Page store backends and the shared store handle.
pub mod page_store;
/// Backend-neutral query description.
pub mod query;
/// Storage error types shared by every backend.
pub mod storage;
