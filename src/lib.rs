//! Library crate for rayvue: paginated fetch controllers over the game catalog,
//! exposed for the server binary, the OpenAPI generator and tests.

pub mod catalog;
pub mod config;
pub mod dao;
mod dto;
mod error;
pub mod paging;
pub mod routes;
pub mod services;
pub mod state;
