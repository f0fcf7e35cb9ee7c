use sqlx::{Connection, PgConnection, PgPool};

use crate::DbError;

/// Fixed key for the advisory lock that serialises migration runs across
/// server instances starting at the same time.
const MIGRATION_LOCK_KEY: i64 = 0x7465_6D70_7368_6172; // "tempshar"

pub async fn run(pool: &PgPool) -> Result<(), DbError> {
    // Advisory locks belong to a session, so lock, migrate and unlock all
    // happen on one connection.
    let mut conn = pool
        .acquire()
        .await
        .map_err(|e| DbError::Internal(e.to_string()))?;

    sqlx::query("SELECT pg_advisory_lock($1)")
        .bind(MIGRATION_LOCK_KEY)
        .execute(&mut *conn)
        .await
        .map_err(|e| DbError::Internal(e.to_string()))?;

    let result = run_inner(&mut conn).await;

    if let Err(e) = sqlx::query("SELECT pg_advisory_unlock($1)")
        .bind(MIGRATION_LOCK_KEY)
        .execute(&mut *conn)
        .await
    {
        // Postgres drops the lock when the session ends.
        tracing::warn!(error = %e, "failed to release migration lock, closing connection");
        let _ = conn.detach().close().await;
    }

    result
}

async fn run_inner(conn: &mut PgConnection) -> Result<(), DbError> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version    INTEGER PRIMARY KEY,
            applied_at TIMESTAMPTZ NOT NULL
        )",
    )
    .execute(&mut *conn)
    .await
    .map_err(|e| DbError::Internal(e.to_string()))?;

    let current: i32 = sqlx::query_scalar("SELECT COALESCE(MAX(version), 0) FROM schema_version")
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| DbError::Internal(e.to_string()))?;

    if current < 1 {
        sqlx::raw_sql(include_str!("sql/V1__initial.sql"))
            .execute(&mut *conn)
            .await
            .map_err(|e| DbError::Internal(e.to_string()))?;
        tracing::info!("applied postgres migration V1");
    }

    Ok(())
}
