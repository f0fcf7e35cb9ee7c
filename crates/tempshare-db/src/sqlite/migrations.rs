use rusqlite::Connection;

use crate::DbError;

pub fn run(conn: &Connection) -> Result<(), DbError> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS schema_version (
            version    INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS files (
            access_id   TEXT PRIMARY KEY,
            file_name   TEXT NOT NULL,
            file_size   INTEGER NOT NULL CHECK(file_size > 0),
            file_type   TEXT NOT NULL DEFAULT '',
            storage_id  TEXT,
            blob_url    TEXT,
            created_at  TEXT NOT NULL,
            expires_at  TEXT NOT NULL,
            CHECK ((storage_id IS NULL) <> (blob_url IS NULL))
        );
        CREATE INDEX IF NOT EXISTS idx_files_expires_at ON files(expires_at);

        INSERT OR IGNORE INTO schema_version (version, applied_at)
            VALUES (1, strftime('%Y-%m-%dT%H:%M:%SZ', 'now'));
        ",
    )
    .map_err(|e| DbError::Internal(format!("migration: {e}")))?;
    Ok(())
}
