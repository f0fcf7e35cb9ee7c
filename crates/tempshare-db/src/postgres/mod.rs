pub(crate) mod migrations;
pub mod queries;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use tempshare_core::file::{FileRecord, NewFileRecord};

use crate::{Database, DbError};

/// Map a sqlx::Error, surfacing unique-key violations as `Conflict`.
pub(crate) fn pg_err(e: sqlx::Error) -> DbError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => DbError::Conflict(e.to_string()),
        _ => DbError::Internal(e.to_string()),
    }
}

pub(crate) fn pg_not_found(entity: &str) -> DbError {
    DbError::NotFound(entity.to_string())
}

#[derive(Clone)]
pub struct PostgresDatabase {
    pub(crate) pool: PgPool,
}

impl PostgresDatabase {
    /// Connect to a Postgres database and run migrations.
    pub async fn connect(url: &str) -> Result<Self, DbError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(url)
            .await
            .map_err(pg_err)?;

        let db = Self { pool };
        migrations::run(&db.pool).await?;
        Ok(db)
    }
}

#[async_trait]
impl Database for PostgresDatabase {
    async fn create_file(&self, input: &NewFileRecord) -> Result<FileRecord, DbError> {
        self.pg_create_file(input).await
    }
    async fn get_file(&self, access_id: &str) -> Result<FileRecord, DbError> {
        self.pg_get_file(access_id).await
    }
    async fn list_expired(&self, now: DateTime<Utc>) -> Result<Vec<FileRecord>, DbError> {
        self.pg_list_expired(now).await
    }
    async fn delete_file(&self, access_id: &str) -> Result<bool, DbError> {
        self.pg_delete_file(access_id).await
    }
    async fn count_files(&self) -> Result<i64, DbError> {
        self.pg_count_files().await
    }
}
