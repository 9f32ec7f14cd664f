//! This module is responsible for reading, writing and managing the SQLite database.
//!
//! `Db` is the storage collaborator of the engine. Each table group has its own file with an
//! `impl Db` block. Every method that touches another owner's data takes the `OwnerId` and filters
//! by it in SQL.

mod accounts;
mod categories;
mod migrations;
mod owners;
mod rules;
mod transactions;

use crate::error::{ErrorType, PubError};
use crate::Result;
use anyhow::{bail, Context};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

/// The schema version this build of the program expects.
pub(crate) const CURRENT_VERSION: i32 = 1;

/// The on-disk date format. Lexicographic order of these strings is chronological order.
const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone)]
pub struct Db {
    pool: SqlitePool,
}

impl Db {
    /// - Validates that no file currently exists at `path`
    /// - Creates a new SQLite file at `path`
    /// - Initializes the database schema
    /// - Returns a constructed `Db` object for further operations
    pub(crate) async fn init(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            bail!("A database already exists at '{}'", path.display());
        }
        let pool = connect(path, true).await?;
        migrations::bootstrap(&pool).await?;
        migrations::run(&pool, 0, CURRENT_VERSION).await?;
        info!("Created database at '{}'", path.display());
        Ok(Self { pool })
    }

    /// - Validates that there is a SQLite file at `path`
    /// - Creates a SQLite client
    /// - Updates the database schema with migrations if it is out-of-date
    /// - Returns a constructed `Db` object for further operations
    pub(crate) async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            bail!("The database file is missing '{}'", path.display());
        }
        let pool = connect(path, false).await?;
        let version = migrations::schema_version(&pool).await?;
        if version > CURRENT_VERSION {
            bail!(
                "The database schema is at version {version} but this program only understands \
                up to version {CURRENT_VERSION}"
            );
        }
        migrations::run(&pool, version, CURRENT_VERSION).await?;
        debug!("Loaded database at '{}'", path.display());
        Ok(Self { pool })
    }
}

async fn connect(path: &Path, create: bool) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", path.display()))
        .context("Failed to parse SQLite connection string")?
        .create_if_missing(create)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5));

    SqlitePoolOptions::new()
        .max_connections(4)
        .connect_with(options)
        .await
        .with_context(|| format!("Failed to open SQLite database '{}'", path.display()))
}

/// Marks a failed query as a storage failure. The caller sees `what`; the underlying `sqlx` error
/// stays in the chain for logging.
trait Storage<T> {
    fn storage(self, what: &str) -> Result<T>;
}

impl<T> Storage<T> for std::result::Result<T, sqlx::Error> {
    fn storage(self, what: &str) -> Result<T> {
        self.map_err(|e| anyhow::Error::new(e).context(PubError::new(ErrorType::Storage, what)))
    }
}

/// True if `e` was caused by a `UNIQUE` constraint.
fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_unique_violation())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::find_pub_error;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_init_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("expenses.sqlite");
        let db = Db::init(&path).await.unwrap();
        let owner = db.insert_owner("alice", "token-a").await.unwrap();
        drop(db);

        let db = Db::load(&path).await.unwrap();
        let found = db.owner_by_token("token-a").await.unwrap();
        assert_eq!(found, Some((owner, "alice".to_string())));
    }

    #[tokio::test]
    async fn test_init_refuses_existing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("expenses.sqlite");
        Db::init(&path).await.unwrap();
        assert!(Db::init(&path).await.is_err());
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        let e = Db::load(dir.path().join("nope.sqlite")).await.unwrap_err();
        assert!(e.to_string().contains("missing"));
    }

    #[tokio::test]
    async fn test_storage_errors_are_retryable() {
        let dir = TempDir::new().unwrap();
        let db = Db::init(dir.path().join("expenses.sqlite")).await.unwrap();
        db.pool.close().await;
        let e = db.list_categories(1).await.unwrap_err();
        let p = find_pub_error(&e).unwrap();
        assert_eq!(p.error_type(), ErrorType::Storage);
        assert!(p.is_retryable());
    }
}
