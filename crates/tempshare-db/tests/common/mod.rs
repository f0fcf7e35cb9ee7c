// Backend-agnostic integration tests for the Database trait.
//
// Each public async function accepts `&dyn Database` so the same logic runs
// against both the SQLite and Postgres backends.

use chrono::{Duration, Utc};
use tempshare_core::file::{NewFileRecord, StoragePointer};
use tempshare_db::{Database, DbError};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn make_file(access_id: &str, expires_in: Duration) -> NewFileRecord {
    let now = Utc::now();
    NewFileRecord {
        access_id: access_id.to_string(),
        file_name: format!("{access_id}.txt"),
        file_size: 11,
        file_type: "text/plain".into(),
        storage: StoragePointer::Internal {
            id: format!("storage-{access_id}"),
        },
        created_at: now,
        expires_at: now + expires_in,
    }
}

// ---------------------------------------------------------------------------
// File record tests
// ---------------------------------------------------------------------------

/// Create, get, count, delete.
pub async fn test_file_crud(db: &dyn Database) {
    let input = make_file("crud-1", Duration::hours(48));
    let created = db.create_file(&input).await.unwrap();
    assert_eq!(created.access_id, "crud-1");
    assert_eq!(created.file_name, "crud-1.txt");
    assert_eq!(created.file_size, 11);
    assert_eq!(created.file_type, "text/plain");
    assert_eq!(
        created.storage,
        StoragePointer::Internal {
            id: "storage-crud-1".into()
        }
    );

    let fetched = db.get_file("crud-1").await.unwrap();
    assert_eq!(fetched.access_id, created.access_id);
    assert_eq!(fetched.expires_at, created.expires_at);
    assert_eq!(db.count_files().await.unwrap(), 1);

    assert!(db.delete_file("crud-1").await.unwrap());
    assert_eq!(db.count_files().await.unwrap(), 0);
    let err = db.get_file("crud-1").await.unwrap_err();
    assert!(matches!(err, DbError::NotFound(_)));
}

/// External pointers round-trip through the two-column layout.
pub async fn test_external_pointer(db: &dyn Database) {
    let mut input = make_file("ext-1", Duration::hours(48));
    input.storage = StoragePointer::External {
        url: "https://abc.public.blob.vercel-storage.com/ext-1.txt".into(),
    };
    db.create_file(&input).await.unwrap();

    let fetched = db.get_file("ext-1").await.unwrap();
    assert_eq!(fetched.storage, input.storage);
}

/// The access id is a unique key.
pub async fn test_duplicate_access_id(db: &dyn Database) {
    db.create_file(&make_file("dup-1", Duration::hours(1)))
        .await
        .unwrap();
    let err = db
        .create_file(&make_file("dup-1", Duration::hours(2)))
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::Conflict(_)), "got {err:?}");
    assert_eq!(db.count_files().await.unwrap(), 1);
}

pub async fn test_get_missing(db: &dyn Database) {
    let err = db.get_file("nope").await.unwrap_err();
    assert!(matches!(err, DbError::NotFound(_)));
}

/// Only strictly past expirations are listed, oldest first.
pub async fn test_list_expired(db: &dyn Database) {
    db.create_file(&make_file("old-2", Duration::hours(-1)))
        .await
        .unwrap();
    db.create_file(&make_file("old-1", Duration::hours(-3)))
        .await
        .unwrap();
    db.create_file(&make_file("fresh", Duration::hours(47)))
        .await
        .unwrap();

    let expired = db.list_expired(Utc::now()).await.unwrap();
    let ids: Vec<_> = expired.iter().map(|f| f.access_id.as_str()).collect();
    assert_eq!(ids, vec!["old-1", "old-2"]);

    // Looking far enough ahead includes the fresh one too
    let later = db
        .list_expired(Utc::now() + Duration::hours(48))
        .await
        .unwrap();
    assert_eq!(later.len(), 3);
}

/// Deleting twice is harmless.
pub async fn test_delete_idempotent(db: &dyn Database) {
    db.create_file(&make_file("del-1", Duration::hours(1)))
        .await
        .unwrap();
    assert!(db.delete_file("del-1").await.unwrap());
    assert!(!db.delete_file("del-1").await.unwrap());
    assert!(!db.delete_file("never-existed").await.unwrap());
}
