//! SQLite-backed persistence for comics, the inverted keyword index, and
//! user accounts. Implements the repository traits from
//! `comicdex_core::interfaces` over a pooled `sqlx::SqlitePool`.
//!
//! Every operation is transactional over its batch (commit-or-rollback)
//! and honors the passed [`CancellationToken`] by racing the underlying
//! query against it, returning [`Error::Cancelled`] if cancellation wins.

mod comics;
mod keywords;
mod users;

pub use comics::SqliteComicStore;
pub use keywords::SqliteKeywordStore;
pub use users::SqliteUserStore;

use comicdex_core::error::{Error, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use tokio_util::sync::CancellationToken;

/// Opens a pooled connection to the SQLite DSN and applies every pending
/// migration before returning.
pub async fn connect(dsn: &str) -> Result<SqlitePool> {
    connect_with_pool_size(dsn, 5).await
}

/// Like [`connect`] but with an explicit pool size. Tests use a single
/// connection so an in-memory DSN keeps its schema across queries.
pub async fn connect_with_pool_size(dsn: &str, max_connections: u32) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(dsn)
        .map_err(Error::internal)?
        .create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await
        .map_err(|err| {
            log::error!("[ storage.connect ] failed to open '{dsn}': {err}");
            Error::internal(err)
        })?;

    migrate(&pool).await?;

    Ok(pool)
}

/// Applies every SQL migration under `migrations/` against `pool`.
/// Idempotent: running it twice against the same database is a no-op.
pub async fn migrate(pool: &SqlitePool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await.map_err(|err| {
        log::error!("[ storage.migrate ] migration failed: {err}");
        Error::internal(err)
    })
}

/// Races `fut` against `cancel`, mapping a cancellation win to
/// [`Error::Cancelled`].
async fn cancellable<T>(
    cancel: &CancellationToken,
    fut: impl std::future::Future<Output = Result<T>>,
) -> Result<T> {
    if cancel.is_cancelled() {
        log::debug!("[ storage ] operation cancelled before it started");
        return Err(Error::Cancelled);
    }

    tokio::select! {
        result = fut => result,
        _ = cancel.cancelled() => {
            log::debug!("[ storage ] operation cancelled");
            Err(Error::Cancelled)
        }
    }
}
