//! Query executor with bounded retry on transient errors
//!
//! An operation receives an owned connection; the connection goes back to
//! the pool when the operation's future finishes, whether it succeeded or
//! not, so no handle survives into the next attempt.
//!
//! ```ignore
//! let word = db
//!     .run(|mut conn| async move {
//!         sqlx::query_scalar::<_, String>("SELECT word FROM words WHERE id = $1")
//!             .bind(id)
//!             .fetch_one(&mut *conn)
//!             .await
//!             .map_err(DbError::from)
//!     })
//!     .await?;
//! ```

use std::future::Future;
use std::time::Duration;

use super::error::DbError;
use super::pool::{PgBackend, PoolBackend, PoolManager};

/// Retry budget for one logical operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Additional attempts after the first one
    pub retries: u32,
    /// Base delay; attempt `n` waits `retry_delay * n`
    pub retry_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: 2,
            retry_delay: Duration::from_millis(200),
        }
    }
}

/// Runs database operations against a [`PoolManager`]
pub struct QueryExecutor<B: PoolBackend = PgBackend> {
    pool: PoolManager<B>,
    policy: RetryPolicy,
}

impl<B: PoolBackend> Clone for QueryExecutor<B> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            policy: self.policy,
        }
    }
}

impl<B: PoolBackend> QueryExecutor<B> {
    pub fn new(pool: PoolManager<B>, policy: RetryPolicy) -> Self {
        Self { pool, policy }
    }

    pub fn pool(&self) -> &PoolManager<B> {
        &self.pool
    }

    /// Run `op` with the default retry policy.
    pub async fn run<T, F, Fut>(&self, op: F) -> Result<T, DbError>
    where
        F: FnMut(B::Conn) -> Fut,
        Fut: Future<Output = Result<T, DbError>>,
    {
        self.run_with(self.policy, op).await
    }

    /// Run `op`, retrying transient failures per `policy`.
    ///
    /// The error of the last attempt is returned as is.
    pub async fn run_with<T, F, Fut>(&self, policy: RetryPolicy, mut op: F) -> Result<T, DbError>
    where
        F: FnMut(B::Conn) -> Fut,
        Fut: Future<Output = Result<T, DbError>>,
    {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;

            let (err, generation) = match self.pool.acquire_tagged().await {
                Ok((conn, generation)) => match op(conn).await {
                    Ok(value) => return Ok(value),
                    Err(err) => (err, Some(generation)),
                },
                Err(err) => (err, None),
            };

            if !err.is_transient() || attempt > policy.retries {
                if err.is_transient() {
                    tracing::error!(error = %err, attempts = attempt, "database retries exhausted");
                }
                return Err(err);
            }

            tracing::warn!(
                error = %err,
                attempt,
                retries = policy.retries,
                "transient database error, retrying"
            );
            // acquire failures already went through a rebuild
            if let Some(generation) = generation {
                self.pool.observe(generation).await;
            }
            tokio::time::sleep(policy.retry_delay * attempt).await;
        }
    }

    /// Close the pool; later operations fail with [`DbError::Shutdown`].
    pub async fn shutdown(&self) {
        self.pool.shutdown().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::pool::testing::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    async fn executor() -> QueryExecutor<FakeBackend> {
        let pool = PoolManager::init(FakeBackend::default()).await.unwrap();
        QueryExecutor::new(pool, RetryPolicy::default())
    }

    async fn fail_times(db: &QueryExecutor<FakeBackend>, failures: u32) -> (Result<u32, DbError>, u32) {
        let attempts = AtomicU32::new(0);
        let result = db
            .run(|_conn| {
                let attempts = &attempts;
                async move {
                    let n = attempts.fetch_add(1, Ordering::SeqCst);
                    if n < failures {
                        Err(transient())
                    } else {
                        Ok(42)
                    }
                }
            })
            .await;
        (result, attempts.load(Ordering::SeqCst))
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_first_time() {
        let db = executor().await;
        let (result, attempts) = fail_times(&db, 0).await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(attempts, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn retries_until_success() {
        for k in 1..=2 {
            let db = executor().await;
            let (result, attempts) = fail_times(&db, k).await;
            assert_eq!(result.unwrap(), 42);
            assert_eq!(attempts, k + 1);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_retries_return_original_error() {
        let db = executor().await;
        let (result, attempts) = fail_times(&db, 10).await;
        assert_eq!(attempts, 3);
        match result.unwrap_err() {
            DbError::Sqlx(sqlx::Error::Io(e)) => {
                assert_eq!(e.kind(), std::io::ErrorKind::ConnectionReset)
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn non_transient_error_is_not_retried() {
        let db = executor().await;
        let attempts = AtomicU32::new(0);
        let result: Result<(), DbError> = db
            .run(|_conn| {
                let attempts = &attempts;
                async move {
                    attempts.fetch_add(1, Ordering::SeqCst);
                    Err(DbError::not_found("word", 3))
                }
            })
            .await;
        assert!(matches!(result, Err(DbError::NotFound { resource: "word", .. })));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn backoff_grows_with_attempt() {
        let db = executor().await;
        let start = tokio::time::Instant::now();
        let _ = fail_times(&db, 2).await;
        // 200ms after the first failure, 400ms after the second
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(600), "{elapsed:?}");
        assert!(elapsed < Duration::from_millis(700), "{elapsed:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn transient_error_rebuilds_pool() {
        let db = executor().await;
        let (result, _) = fail_times(&db, 1).await;
        assert!(result.is_ok());
        assert_eq!(db.pool().rebuild_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn unreachable_database_returns_driver_error() {
        let backend = FakeBackend::default();
        backend.ping_fails.store(true, Ordering::SeqCst);
        let db = QueryExecutor::new(
            PoolManager::from_pool(backend, broken_pool()),
            RetryPolicy::default(),
        );

        let calls = AtomicU32::new(0);
        let err = db
            .run(|_conn| {
                let calls = &calls;
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
            })
            .await
            .unwrap_err();

        match err {
            DbError::Sqlx(sqlx::Error::Io(e)) => {
                assert_eq!(e.kind(), std::io::ErrorKind::ConnectionReset)
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(db.pool().generation(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn custom_policy() {
        let db = executor().await;
        let policy = RetryPolicy {
            retries: 0,
            retry_delay: Duration::from_millis(10),
        };
        let attempts = AtomicU32::new(0);
        let result: Result<(), DbError> = db
            .run_with(policy, |_conn| {
                let attempts = &attempts;
                async move {
                    attempts.fetch_add(1, Ordering::SeqCst);
                    Err(transient())
                }
            })
            .await;
        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn connection_is_released_each_attempt() {
        let db = executor().await;
        let seen = std::sync::Mutex::new(Vec::new());
        let _ = db
            .run(|conn| {
                let seen = &seen;
                async move {
                    seen.lock().unwrap().push(conn.pool_id);
                    drop(conn);
                    if seen.lock().unwrap().len() < 2 {
                        Err(transient())
                    } else {
                        Ok(())
                    }
                }
            })
            .await;
        // second attempt runs on the rebuilt pool
        assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
    }
}
