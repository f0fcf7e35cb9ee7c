use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};

use tempshare_core::file::{FileRecord, NewFileRecord, StoragePointer};

use super::super::{SqliteDatabase, SqliteResultExt};
use crate::DbError;

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

fn row_to_file(row: &Row) -> rusqlite::Result<FileRow> {
    Ok(FileRow {
        access_id: row.get("access_id")?,
        file_name: row.get("file_name")?,
        file_size: row.get("file_size")?,
        file_type: row.get("file_type")?,
        storage_id: row.get("storage_id")?,
        blob_url: row.get("blob_url")?,
        created_at: row.get("created_at")?,
        expires_at: row.get("expires_at")?,
    })
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

impl SqliteDatabase {
    pub fn create_file_sync(&self, input: &NewFileRecord) -> Result<FileRecord, DbError> {
        let (storage_id, blob_url) = input.storage.to_columns();
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO files
                    (access_id, file_name, file_size, file_type, storage_id, blob_url, created_at, expires_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    input.access_id,
                    input.file_name,
                    input.file_size,
                    input.file_type,
                    storage_id,
                    blob_url,
                    input.created_at,
                    input.expires_at,
                ],
            )
            .to_db()?;
            conn.query_row(
                "SELECT * FROM files WHERE access_id = ?1",
                params![input.access_id],
                row_to_file,
            )
            .to_db()?
            .try_into()
        })
    }

    pub fn get_file_sync(&self, access_id: &str) -> Result<FileRecord, DbError> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT * FROM files WHERE access_id = ?1",
                params![access_id],
                row_to_file,
            )
            .optional()
            .to_db()?
            .ok_or_else(|| DbError::NotFound(format!("file {access_id}")))?
            .try_into()
        })
    }

    pub fn list_expired_sync(&self, now: DateTime<Utc>) -> Result<Vec<FileRecord>, DbError> {
        self.with_conn(|conn| {
            let mut stmt = conn
                .prepare("SELECT * FROM files WHERE expires_at < ?1 ORDER BY expires_at ASC")
                .to_db()?;
            let rows = stmt
                .query_map(params![now], row_to_file)
                .to_db()?
                .collect::<Result<Vec<_>, _>>()
                .to_db()?;
            rows.into_iter().map(FileRecord::try_from).collect()
        })
    }

    pub fn delete_file_sync(&self, access_id: &str) -> Result<bool, DbError> {
        self.with_conn(|conn| {
            let n = conn
                .execute("DELETE FROM files WHERE access_id = ?1", params![access_id])
                .to_db()?;
            Ok(n > 0)
        })
    }

    pub fn count_files_sync(&self) -> Result<i64, DbError> {
        self.with_conn(|conn| {
            conn.query_row("SELECT count(*) FROM files", [], |row| row.get(0))
                .to_db()
        })
    }
}
