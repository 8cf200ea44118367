//! lexiplan-server: vocabulary dictionary and spaced-learning REST service
//!
//! - [`db`]: resilient PostgreSQL pool, retrying executor, repositories
//! - [`models`]: validated request inputs
//! - [`http`]: axum router, extractors and JSON error mapping

pub mod db;
pub mod http;
pub mod models;

pub use db::{Database, DatabaseConfig, DbError};
pub use http::{run_server, ServerConfig};
