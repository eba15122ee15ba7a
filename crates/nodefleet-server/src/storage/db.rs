//! Store handle and transactions.
//!
//! All repository operations are methods on [`Tx`]. A `Tx` is opened either
//! explicitly ([`Store::begin_read`] / [`Store::begin_write`]) or through the
//! closure entry points [`Store::read`] / [`Store::write`], which commit when
//! the closure returns `Ok` and roll back otherwise.
//!
//! Dropping an uncommitted `Tx` rolls it back. That covers panics inside the
//! closure and callers whose future is dropped mid-transaction.

use std::future::Future;
use std::path::Path;
use std::pin::Pin;

use sqlx::{Pool, Sqlite, SqliteConnection, Transaction};
use tracing::{info, warn};

pub use nodefleet_core::db::DatabaseError;
use nodefleet_core::db::{open_pool, open_pool_in_memory};

/// Future returned by the closures passed to [`Store::read`] and [`Store::write`].
pub type TxFuture<'c, T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'c>>;

/// Whether a transaction may mutate the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxMode {
    Read,
    Write,
}

/// Handle to the backing `SQLite` database.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Clone)]
pub struct Store {
    pool: Pool<Sqlite>,
}

impl Store {
    /// Open or create a store at the given path, applying pending migrations.
    pub async fn open(path: &Path) -> Result<Self, DatabaseError> {
        let pool = open_pool(path).await?;
        let store = Self { pool };
        store.run_migrations().await?;
        Ok(store)
    }

    /// Open an ephemeral store that lives as long as the returned handle.
    pub async fn open_in_memory() -> Result<Self, DatabaseError> {
        let pool = open_pool_in_memory().await?;
        let store = Self { pool };
        store.run_migrations().await?;
        Ok(store)
    }

    async fn run_migrations(&self) -> Result<(), DatabaseError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| DatabaseError::Migration(e.to_string()))?;

        info!("Store migrations complete");
        Ok(())
    }

    /// Close all pooled connections. Further use of the store fails.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Start a read-only transaction.
    pub async fn begin_read(&self) -> Result<Tx, DatabaseError> {
        let inner = self.pool.begin().await?;
        Ok(Tx {
            inner,
            mode: TxMode::Read,
        })
    }

    /// Start a write transaction.
    ///
    /// Takes the database write lock up front (`BEGIN IMMEDIATE`) so that
    /// write transactions queue behind each other instead of failing when a
    /// read inside the transaction is later upgraded to a write.
    pub async fn begin_write(&self) -> Result<Tx, DatabaseError> {
        let inner = self.pool.begin_with("BEGIN IMMEDIATE").await?;
        Ok(Tx {
            inner,
            mode: TxMode::Write,
        })
    }

    /// Run `f` inside a read-only transaction.
    pub async fn read<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: for<'c> FnOnce(&'c mut Tx) -> TxFuture<'c, T, E>,
        E: From<DatabaseError>,
    {
        let tx = self.begin_read().await?;
        Self::run(tx, f).await
    }

    /// Run `f` inside a write transaction.
    pub async fn write<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: for<'c> FnOnce(&'c mut Tx) -> TxFuture<'c, T, E>,
        E: From<DatabaseError>,
    {
        let tx = self.begin_write().await?;
        Self::run(tx, f).await
    }

    async fn run<T, E, F>(mut tx: Tx, f: F) -> Result<T, E>
    where
        F: for<'c> FnOnce(&'c mut Tx) -> TxFuture<'c, T, E>,
        E: From<DatabaseError>,
    {
        match f(&mut tx).await {
            Ok(value) => {
                tx.commit().await?;
                Ok(value)
            }
            Err(e) => {
                if let Err(rollback_err) = tx.rollback().await {
                    warn!(error = %rollback_err, "Transaction rollback failed");
                }
                Err(e)
            }
        }
    }
}

/// An open transaction exposing every repository operation.
pub struct Tx {
    inner: Transaction<'static, Sqlite>,
    mode: TxMode,
}

impl Tx {
    pub const fn mode(&self) -> TxMode {
        self.mode
    }

    /// Connection for queries that only read.
    pub(crate) fn conn(&mut self) -> &mut SqliteConnection {
        &mut self.inner
    }

    /// Connection for queries that mutate; refused in read transactions.
    pub(crate) fn writer(&mut self, op: &'static str) -> Result<&mut SqliteConnection, DatabaseError> {
        match self.mode {
            TxMode::Write => Ok(&mut self.inner),
            TxMode::Read => Err(DatabaseError::ReadOnly(op)),
        }
    }

    pub async fn commit(self) -> Result<(), DatabaseError> {
        self.inner.commit().await?;
        Ok(())
    }

    pub async fn rollback(self) -> Result<(), DatabaseError> {
        self.inner.rollback().await?;
        Ok(())
    }
}
