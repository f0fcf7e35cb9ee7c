use chrono::{DateTime, Utc};

use tempshare_core::file::{FileRecord, NewFileRecord, StoragePointer};

use super::super::{pg_err, pg_not_found, PostgresDatabase};
use crate::DbError;

#[derive(sqlx::FromRow)]
struct FileRow {
    access_id: String,
    file_name: String,
    file_size: i64,
    file_type: String,
    storage_id: Option<String>,
    blob_url: Option<String>,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl TryFrom<FileRow> for FileRecord {
    type Error = DbError;

    fn try_from(r: FileRow) -> Result<Self, DbError> {
        let storage = StoragePointer::from_columns(r.storage_id, r.blob_url).ok_or_else(|| {
            DbError::Internal(format!("file {} has no single storage pointer", r.access_id))
        })?;
        Ok(FileRecord {
            access_id: r.access_id,
            file_name: r.file_name,
            file_size: r.file_size,
            file_type: r.file_type,
            storage,
            created_at: r.created_at,
            expires_at: r.expires_at,
        })
    }
}

impl PostgresDatabase {
    pub(crate) async fn pg_create_file(
        &self,
        input: &NewFileRecord,
    ) -> Result<FileRecord, DbError> {
        let (storage_id, blob_url) = input.storage.to_columns();

        let row = sqlx::query_as::<_, FileRow>(
            "INSERT INTO files
                (access_id, file_name, file_size, file_type, storage_id, blob_url, created_at, expires_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING *",
        )
        .bind(&input.access_id)
        .bind(&input.file_name)
        .bind(input.file_size)
        .bind(&input.file_type)
        .bind(storage_id)
        .bind(blob_url)
        .bind(input.created_at)
        .bind(input.expires_at)
        .fetch_one(&self.pool)
        .await
        .map_err(pg_err)?;

        row.try_into()
    }

    pub(crate) async fn pg_get_file(&self, access_id: &str) -> Result<FileRecord, DbError> {
        sqlx::query_as::<_, FileRow>("SELECT * FROM files WHERE access_id = $1")
            .bind(access_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(pg_err)?
            .ok_or_else(|| pg_not_found(&format!("file {access_id}")))?
            .try_into()
    }

    pub(crate) async fn pg_list_expired(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<FileRecord>, DbError> {
        let rows = sqlx::query_as::<_, FileRow>(
            "SELECT * FROM files WHERE expires_at < $1 ORDER BY expires_at ASC",
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await
        .map_err(pg_err)?;

        rows.into_iter().map(FileRecord::try_from).collect()
    }

    pub(crate) async fn pg_delete_file(&self, access_id: &str) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM files WHERE access_id = $1")
            .bind(access_id)
            .execute(&self.pool)
            .await
            .map_err(pg_err)?;

        Ok(result.rows_affected() > 0)
    }

    pub(crate) async fn pg_count_files(&self) -> Result<i64, DbError> {
        sqlx::query_scalar("SELECT count(*) FROM files")
            .fetch_one(&self.pool)
            .await
            .map_err(pg_err)
    }
}
