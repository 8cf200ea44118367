//! Database connection pool management
//!
//! [`PoolManager`] owns the active pool and replaces it when connections
//! turn out to be unusable:
//!
//! - transient errors (see [`super::classify`]) trigger a rebuild
//! - concurrent callers share one in-flight rebuild, never start a second
//! - a candidate pool must answer a ping before it is swapped in
//! - the previous pool is closed gracefully in the background
//!
//! Each swap bumps a generation counter. Errors are reported against the
//! generation they were observed on, so a caller that hit a pool which has
//! already been replaced does not cause another rebuild.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt, Shared};
use sqlx::pool::PoolConnection;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{Connection, Postgres};

use super::config::DatabaseConfig;
use super::error::DbError;

/// Driver seam for [`PoolManager`].
#[async_trait]
pub trait PoolBackend: Send + Sync + 'static {
    type Pool: Clone + Send + Sync + 'static;
    type Conn: Send + 'static;

    /// Build a new pool.
    async fn build(&self) -> Result<Self::Pool, DbError>;

    /// Cheap liveness check run before a pool is put into service.
    async fn ping(&self, pool: &Self::Pool) -> Result<(), DbError>;

    /// Check out one exclusive connection. Dropping it returns it.
    async fn acquire(&self, pool: &Self::Pool) -> Result<Self::Conn, DbError>;

    /// Close a pool, letting checked out connections finish.
    async fn close(&self, pool: Self::Pool) -> Result<(), DbError>;
}

/// PostgreSQL backend on top of sqlx
#[derive(Debug, Clone)]
pub struct PgBackend {
    config: DatabaseConfig,
}

impl PgBackend {
    pub fn new(config: DatabaseConfig) -> Self {
        Self { config }
    }

    fn pool_options(&self) -> PgPoolOptions {
        PgPoolOptions::new()
            .max_connections(self.config.connection_limit)
            .acquire_timeout(self.config.acquire_timeout)
    }

    /// Pool that connects on first use. Used where no database is needed
    /// up front (router tests).
    pub fn connect_lazy(&self) -> PgPool {
        self.pool_options()
            .connect_lazy_with(self.config.connect_options())
    }
}

#[async_trait]
impl PoolBackend for PgBackend {
    type Pool = PgPool;
    type Conn = PoolConnection<Postgres>;

    async fn build(&self) -> Result<PgPool, DbError> {
        let connect = self
            .pool_options()
            .connect_with(self.config.connect_options());

        tokio::time::timeout(self.config.connect_timeout, connect)
            .await
            .map_err(|_| DbError::Timeout {
                operation: "connect",
                after: self.config.connect_timeout,
            })?
            .map_err(DbError::from)
    }

    async fn ping(&self, pool: &PgPool) -> Result<(), DbError> {
        let mut conn = pool.acquire().await?;
        conn.ping().await?;
        Ok(())
    }

    async fn acquire(&self, pool: &PgPool) -> Result<PoolConnection<Postgres>, DbError> {
        Ok(pool.acquire().await?)
    }

    async fn close(&self, pool: PgPool) -> Result<(), DbError> {
        pool.close().await;
        Ok(())
    }
}

type RebuildFuture = Shared<BoxFuture<'static, Result<(), Arc<DbError>>>>;

#[derive(Clone)]
struct Active<P> {
    pool: P,
    generation: u64,
}

struct Inner<B: PoolBackend> {
    backend: B,
    active: RwLock<Active<B::Pool>>,
    rebuild: Mutex<Option<RebuildFuture>>,
    rebuilds: AtomicU64,
    shut_down: AtomicBool,
}

/// Owner of the active connection pool
pub struct PoolManager<B: PoolBackend = PgBackend> {
    inner: Arc<Inner<B>>,
}

impl<B: PoolBackend> Clone for PoolManager<B> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<B: PoolBackend> PoolManager<B> {
    /// Build and validate the first pool.
    pub async fn init(backend: B) -> Result<Self, DbError> {
        let pool = build_validated(&backend).await?;
        tracing::info!("database pool ready");
        Ok(Self::from_pool(backend, pool))
    }

    /// Wrap an existing pool without validating it.
    pub fn from_pool(backend: B, pool: B::Pool) -> Self {
        Self {
            inner: Arc::new(Inner {
                backend,
                active: RwLock::new(Active {
                    pool,
                    generation: 0,
                }),
                rebuild: Mutex::new(None),
                rebuilds: AtomicU64::new(0),
                shut_down: AtomicBool::new(false),
            }),
        }
    }

    pub fn backend(&self) -> &B {
        &self.inner.backend
    }

    /// Generation of the active pool (0 for the first one).
    pub fn generation(&self) -> u64 {
        self.current().generation
    }

    /// Number of successful rebuilds since start.
    pub fn rebuild_count(&self) -> u64 {
        self.inner.rebuilds.load(Ordering::Relaxed)
    }

    fn current(&self) -> Active<B::Pool> {
        self.inner
            .active
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Check out a connection, rebuilding the pool once on a transient failure.
    pub async fn acquire(&self) -> Result<B::Conn, DbError> {
        self.acquire_tagged().await.map(|(conn, _)| conn)
    }

    /// Like [`acquire`](Self::acquire), also returning the pool generation the
    /// connection came from.
    pub(crate) async fn acquire_tagged(&self) -> Result<(B::Conn, u64), DbError> {
        if self.inner.shut_down.load(Ordering::Acquire) {
            return Err(DbError::Shutdown);
        }

        let active = self.current();
        match self.inner.backend.acquire(&active.pool).await {
            Ok(conn) => Ok((conn, active.generation)),
            Err(err) if err.is_transient() => {
                tracing::warn!(
                    error = %err,
                    generation = active.generation,
                    "transient error acquiring connection, rebuilding pool"
                );
                if let Err(rebuild_err) = self.rebuild_from(active.generation).await {
                    tracing::warn!(error = %rebuild_err, "pool rebuild after acquire error failed");
                    return Err(err);
                }

                let active = self.current();
                let conn = self.inner.backend.acquire(&active.pool).await?;
                Ok((conn, active.generation))
            }
            Err(err) => Err(err),
        }
    }

    /// Report a transient error seen on a connection of `generation`.
    ///
    /// Rebuild failures are logged; the caller's own retry will surface them.
    pub async fn observe(&self, generation: u64) {
        if let Err(err) = self.rebuild_from(generation).await {
            tracing::warn!(error = %err, "pool rebuild after connection error failed");
        }
    }

    /// Rebuild the active pool.
    pub async fn rebuild(&self) -> Result<(), DbError> {
        self.rebuild_from(self.generation()).await
    }

    async fn rebuild_from(&self, observed: u64) -> Result<(), DbError> {
        let pending = {
            let mut slot = self
                .inner
                .rebuild
                .lock()
                .unwrap_or_else(PoisonError::into_inner);

            if self.generation() != observed {
                // already replaced since the caller saw the error
                return Ok(());
            }

            match slot.as_ref() {
                Some(pending) => pending.clone(),
                None => {
                    let pending = run_rebuild(Arc::clone(&self.inner)).boxed().shared();
                    *slot = Some(pending.clone());
                    pending
                }
            }
        };

        pending.await.map_err(DbError::Rebuild)
    }

    /// Stop handing out connections and close the active pool.
    pub async fn shutdown(&self) {
        if self.inner.shut_down.swap(true, Ordering::AcqRel) {
            return;
        }
        let active = self.current();
        if let Err(err) = self.inner.backend.close(active.pool).await {
            tracing::warn!(error = %err, "error closing database pool");
        }
        tracing::info!("database pool shut down");
    }
}

async fn build_validated<B: PoolBackend>(backend: &B) -> Result<B::Pool, DbError> {
    let candidate = backend.build().await?;
    if let Err(err) = backend.ping(&candidate).await {
        if let Err(close_err) = backend.close(candidate).await {
            tracing::warn!(error = %close_err, "error closing rejected pool");
        }
        return Err(err);
    }
    Ok(candidate)
}

async fn run_rebuild<B: PoolBackend>(inner: Arc<Inner<B>>) -> Result<(), Arc<DbError>> {
    let outcome = match build_validated(&inner.backend).await {
        Ok(pool) => {
            let previous = {
                let mut active = inner.active.write().unwrap_or_else(PoisonError::into_inner);
                let generation = active.generation + 1;
                std::mem::replace(&mut *active, Active { pool, generation })
            };
            inner.rebuilds.fetch_add(1, Ordering::Relaxed);
            tracing::info!(generation = previous.generation + 1, "database pool rebuilt");

            let closer = Arc::clone(&inner);
            tokio::spawn(async move {
                if let Err(err) = closer.backend.close(previous.pool).await {
                    tracing::warn!(
                        error = %err,
                        generation = previous.generation,
                        "error closing previous pool"
                    );
                }
            });
            Ok(())
        }
        Err(err) => {
            tracing::error!(error = %err, "pool rebuild failed, keeping previous pool");
            Err(Arc::new(err))
        }
    };

    // cleared after the swap so late callers see the new generation first
    *inner.rebuild.lock().unwrap_or_else(PoisonError::into_inner) = None;
    outcome
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn init_builds_and_pings() {
        let manager = PoolManager::init(FakeBackend::default()).await.unwrap();
        assert_eq!(manager.backend().builds.load(Ordering::SeqCst), 1);
        assert_eq!(manager.generation(), 0);
        let conn = manager.acquire().await.unwrap();
        assert_eq!(conn.pool_id, 1);
    }

    #[tokio::test]
    async fn init_fails_when_ping_fails() {
        let backend = FakeBackend::default();
        backend.ping_fails.store(true, Ordering::SeqCst);
        let result = PoolManager::init(backend).await;
        assert!(result.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_failures_rebuild_once() {
        let manager = PoolManager::from_pool(
            FakeBackend::slow(Duration::from_millis(50)),
            broken_pool(),
        );

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let manager = manager.clone();
                tokio::spawn(async move { manager.acquire().await })
            })
            .collect();

        for handle in handles {
            let conn = handle.await.expect("task panicked").expect("acquire failed");
            assert_eq!(conn.pool_id, 1);
        }

        assert_eq!(manager.backend().builds.load(Ordering::SeqCst), 1);
        assert_eq!(manager.rebuild_count(), 1);
        assert_eq!(manager.generation(), 1);

        // subsequent acquires go straight to the new pool
        let conn = manager.acquire().await.unwrap();
        assert_eq!(conn.pool_id, 1);
        assert_eq!(manager.backend().builds.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn old_pool_is_closed_after_swap() {
        let manager = PoolManager::from_pool(FakeBackend::default(), broken_pool());
        manager.acquire().await.unwrap();

        // let the background close task run
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(manager.backend().closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_ping_keeps_previous_pool() {
        let manager = PoolManager::from_pool(FakeBackend::default(), broken_pool());
        manager.backend().ping_fails.store(true, Ordering::SeqCst);

        let err = manager.rebuild().await.unwrap_err();
        assert!(matches!(err, DbError::Rebuild(_)));
        assert!(err.is_transient());
        assert_eq!(manager.generation(), 0);
        assert_eq!(manager.rebuild_count(), 0);
        // the rejected candidate was closed
        assert_eq!(manager.backend().closes.load(Ordering::SeqCst), 1);

        // acquire returns its own error, not the rebuild failure
        let err = manager.acquire().await.unwrap_err();
        assert!(matches!(err, DbError::Sqlx(sqlx::Error::Io(_))), "{err:?}");

        // once the database is back, the next failure recovers
        manager.backend().ping_fails.store(false, Ordering::SeqCst);
        let conn = manager.acquire().await.unwrap();
        assert_eq!(manager.generation(), 1);
        assert!(conn.pool_id > 0);
    }

    #[tokio::test]
    async fn stale_generation_does_not_rebuild() {
        let manager = PoolManager::from_pool(FakeBackend::default(), broken_pool());
        manager.rebuild().await.unwrap();
        assert_eq!(manager.generation(), 1);

        // an error observed on generation 0 arrives late
        manager.observe(0).await;
        assert_eq!(manager.rebuild_count(), 1);
        assert_eq!(manager.backend().builds.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn non_transient_acquire_error_is_returned() {
        struct Refusing;

        #[async_trait]
        impl PoolBackend for Refusing {
            type Pool = ();
            type Conn = ();

            async fn build(&self) -> Result<(), DbError> {
                Ok(())
            }
            async fn ping(&self, _pool: &()) -> Result<(), DbError> {
                Ok(())
            }
            async fn acquire(&self, _pool: &()) -> Result<(), DbError> {
                Err(DbError::conflict("no"))
            }
            async fn close(&self, _pool: ()) -> Result<(), DbError> {
                Ok(())
            }
        }

        let manager = PoolManager::from_pool(Refusing, ());
        let err = manager.acquire().await.unwrap_err();
        assert!(matches!(err, DbError::Conflict { .. }));
        assert_eq!(manager.rebuild_count(), 0);
    }

    #[tokio::test]
    async fn acquire_after_shutdown_fails() {
        let manager = PoolManager::init(FakeBackend::default()).await.unwrap();
        manager.shutdown().await;
        assert!(matches!(manager.acquire().await, Err(DbError::Shutdown)));
        assert_eq!(manager.backend().closes.load(Ordering::SeqCst), 1);

        // idempotent
        manager.shutdown().await;
        assert_eq!(manager.backend().closes.load(Ordering::SeqCst), 1);
    }
}
