//! Database layer - connection pool, executor and repositories
//!
//! # Design Principles
//!
//! - One owned [`PoolManager`], rebuilt in place on connection failures
//! - Every repository call goes through [`QueryExecutor`] (retry on transient errors)
//! - List operations load children with a fixed number of queries - no N+1
//! - Rely on DB constraints, map violations to conflicts - no check-then-insert
//! - Transactions for multi-step writes

pub mod classify;
pub mod config;
pub mod error;
pub mod executor;
pub mod migrations;
pub mod pool;
pub mod repos;

pub use classify::{classify_error, ErrorClass, ErrorInfo};
pub use config::{ConfigError, DatabaseConfig};
pub use error::DbError;
pub use executor::{QueryExecutor, RetryPolicy};
pub use pool::{PgBackend, PoolBackend, PoolManager};
pub use repos::*;

/// Executor over the PostgreSQL backend, as used by the HTTP layer.
pub type Database = QueryExecutor<PgBackend>;

/// Connect using `config`, validating the first pool.
pub async fn connect(config: DatabaseConfig) -> Result<Database, DbError> {
    let retry = config.retry;
    tracing::info!(
        host = %config.host,
        port = config.port,
        database = %config.database,
        connection_limit = config.connection_limit,
        "Connecting to database"
    );
    let pool = PoolManager::init(PgBackend::new(config)).await?;
    Ok(QueryExecutor::new(pool, retry))
}

/// Database handle over a lazily connecting pool.
pub fn connect_lazy(config: DatabaseConfig) -> Database {
    let retry = config.retry;
    let backend = PgBackend::new(config);
    let pool = backend.connect_lazy();
    QueryExecutor::new(PoolManager::from_pool(backend, pool), retry)
}
