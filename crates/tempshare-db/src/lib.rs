#[cfg(feature = "postgres")]
pub mod postgres;
#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "postgres")]
pub use postgres::PostgresDatabase;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use tempshare_core::file::{FileRecord, NewFileRecord};

#[derive(Debug, Error)]
pub enum DbError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("database error: {0}")]
    Internal(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Repository for file records, keyed by access id.
///
/// Records are immutable once written; the only mutation is deletion.
#[async_trait]
pub trait Database: Send + Sync {
    /// Insert a record. `DbError::Conflict` if the access id is taken.
    async fn create_file(&self, input: &NewFileRecord) -> Result<FileRecord, DbError>;

    /// Look up by access id. `DbError::NotFound` if absent.
    async fn get_file(&self, access_id: &str) -> Result<FileRecord, DbError>;

    /// Every record with `expires_at < now`, oldest first.
    async fn list_expired(&self, now: DateTime<Utc>) -> Result<Vec<FileRecord>, DbError>;

    /// Delete by access id. Returns `false` when nothing was there.
    async fn delete_file(&self, access_id: &str) -> Result<bool, DbError>;

    async fn count_files(&self) -> Result<i64, DbError>;
}

/// Which backend to open and where.
#[derive(Debug, Clone, Default)]
pub struct DbConfig {
    /// `postgres://` URL. Takes precedence over `sqlite_path`.
    pub database_url: Option<String>,
    /// SQLite file. Defaults to `<data_dir>/tempshare.db`.
    pub sqlite_path: Option<String>,
}

impl DbConfig {
    pub fn from_env() -> Self {
        Self {
            database_url: std::env::var("DATABASE_URL").ok().filter(|s| !s.is_empty()),
            sqlite_path: std::env::var("TEMPSHARE_SQLITE_PATH").ok(),
        }
    }

    pub fn is_postgres(&self) -> bool {
        self.database_url
            .as_deref()
            .is_some_and(|u| u.starts_with("postgres://") || u.starts_with("postgresql://"))
    }
}

/// Open the configured backend once at startup.
pub async fn open_database(config: &DbConfig) -> Result<Arc<dyn Database>, DbError> {
    if config.is_postgres() {
        #[cfg(feature = "postgres")]
        {
            let url = config.database_url.as_deref().unwrap_or_default();
            let db = PostgresDatabase::connect(url).await?;
            tracing::info!("connected to postgres");
            return Ok(Arc::new(db));
        }
        #[cfg(not(feature = "postgres"))]
        {
            return Err(DbError::Internal(
                "postgres DATABASE_URL set but the 'postgres' feature is not enabled".into(),
            ));
        }
    }

    #[cfg(feature = "sqlite")]
    {
        let db = SqliteDatabase::open(config)?;
        Ok(Arc::new(db))
    }
    #[cfg(not(feature = "sqlite"))]
    {
        Err(DbError::Internal("no database backend enabled".into()))
    }
}

/// `$XDG_DATA_HOME/tempshare`, falling back to `~/.local/share/tempshare`.
pub fn data_dir() -> PathBuf {
    let base = if let Ok(xdg) = std::env::var("XDG_DATA_HOME") {
        PathBuf::from(xdg)
    } else if let Some(home) = std::env::var_os("HOME") {
        PathBuf::from(home).join(".local/share")
    } else {
        PathBuf::from(".")
    };
    base.join("tempshare")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn postgres_detection() {
        let config = DbConfig {
            database_url: Some("postgres://u:p@localhost/db".into()),
            sqlite_path: None,
        };
        assert!(config.is_postgres());

        let config = DbConfig {
            database_url: Some("postgresql://localhost/db".into()),
            sqlite_path: None,
        };
        assert!(config.is_postgres());

        let config = DbConfig {
            database_url: Some("mongodb://localhost".into()),
            sqlite_path: None,
        };
        assert!(!config.is_postgres());

        assert!(!DbConfig::default().is_postgres());
    }

    #[cfg(feature = "sqlite")]
    #[tokio::test]
    async fn open_database_falls_back_to_sqlite() {
        let tmp = tempfile::tempdir().unwrap();
        let config = DbConfig {
            database_url: None,
            sqlite_path: Some(tmp.path().join("t.db").to_string_lossy().to_string()),
        };
        let db = open_database(&config).await.unwrap();
        assert_eq!(db.count_files().await.unwrap(), 0);
    }
}
