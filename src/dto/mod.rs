pub mod feed;
pub mod health;
pub mod sse;
pub mod validation;
