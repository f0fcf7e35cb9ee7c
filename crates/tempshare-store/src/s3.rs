use async_trait::async_trait;
use bytes::Bytes;
use futures_util::{StreamExt, TryStreamExt};
use s3::creds::Credentials;
use s3::error::S3Error;
use s3::region::Region;
use s3::Bucket;

use crate::{ByteStream, ObjectStore, StoreConfig, StoreError};

const CONTENT_TYPE: &str = "application/octet-stream";
const DEFAULT_REGION: &str = "us-east-1";

/// Uploaded bytes in an S3-compatible bucket, path-style addressed.
pub struct S3Store {
    bucket: Box<Bucket>,
}

impl std::fmt::Debug for S3Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3Store")
            .field("bucket", &self.bucket.name())
            .finish_non_exhaustive()
    }
}

impl S3Store {
    pub fn new(config: &StoreConfig) -> Result<Self, StoreError> {
        let bucket_name = config
            .bucket
            .as_deref()
            .filter(|b| !b.is_empty())
            .ok_or_else(|| StoreError::Internal("bucket name required".into()))?;
        let endpoint = config
            .endpoint_url
            .clone()
            .ok_or_else(|| StoreError::Internal("s3 endpoint required".into()))?;
        let region = Region::Custom {
            region: config
                .region
                .clone()
                .unwrap_or_else(|| DEFAULT_REGION.into()),
            endpoint,
        };
        let credentials = Credentials::new(
            config.access_key_id.as_deref(),
            config.secret_access_key.as_deref(),
            None,
            None,
            None,
        )
        .map_err(|e| StoreError::Internal(format!("s3 credentials: {e}")))?;

        let mut bucket = Bucket::new(bucket_name, region, credentials)
            .map_err(|e| StoreError::Internal(format!("s3 bucket: {e}")))?;
        bucket.set_path_style();
        Ok(Self { bucket })
    }
}

/// Object keys are relative paths with no empty, `.` or `..` segments.
fn check_key(key: &str) -> Result<(), StoreError> {
    let bad = key.is_empty()
        || key.starts_with('/')
        || key.split('/').any(|seg| seg.is_empty() || seg == "." || seg == "..");
    if bad {
        return Err(StoreError::InvalidId(key.to_string()));
    }
    Ok(())
}

/// Fold both error shapes rust-s3 uses for HTTP failures into a status.
fn status_of(result: Result<u16, S3Error>) -> Result<u16, StoreError> {
    match result {
        Ok(status) => Ok(status),
        Err(S3Error::HttpFailWithBody(status, _)) => Ok(status),
        Err(e) => Err(StoreError::Internal(format!("s3: {e}"))),
    }
}

fn check_status(op: &str, key: &str, status: u16) -> Result<(), StoreError> {
    match status {
        404 => Err(StoreError::NotFound(key.to_string())),
        s if s >= 400 => Err(StoreError::Internal(format!("s3 {op} {key}: status {s}"))),
        _ => Ok(()),
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    // A single PUT is atomic on S3: the object appears whole or not at all.
    async fn put(&self, key: &str, data: Bytes) -> Result<(), StoreError> {
        check_key(key)?;
        let status = status_of(
            self.bucket
                .put_object_with_content_type(key, &data, CONTENT_TYPE)
                .await
                .map(|r| r.status_code()),
        )?;
        check_status("put", key, status)?;
        tracing::debug!(key, bytes = data.len(), "s3 put");
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Bytes, StoreError> {
        check_key(key)?;
        match self.bucket.get_object(key).await {
            Ok(response) => {
                check_status("get", key, response.status_code())?;
                Ok(Bytes::from(response.to_vec()))
            }
            Err(e) => {
                let status = status_of(Err(e))?;
                check_status("get", key, status)?;
                Err(StoreError::Internal(format!("s3 get {key}: status {status}")))
            }
        }
    }

    /// Streams the object body as S3 sends it.
    async fn open_stream(&self, key: &str) -> Result<ByteStream, StoreError> {
        check_key(key)?;
        let response = match self.bucket.get_object_stream(key).await {
            Ok(response) => response,
            Err(e) => {
                let status = status_of(Err(e))?;
                check_status("get", key, status)?;
                return Err(StoreError::Internal(format!("s3 get {key}: status {status}")));
            }
        };
        check_status("get", key, response.status_code)?;
        Ok(response
            .bytes
            .map_err(|e| StoreError::Internal(format!("s3 read chunk: {e}")))
            .boxed())
    }

    /// Missing objects count as deleted.
    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        check_key(key)?;
        let status = status_of(self.bucket.delete_object(key).await.map(|r| r.status_code()))?;
        match check_status("delete", key, status) {
            Ok(()) | Err(StoreError::NotFound(_)) => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// HEAD instead of the default full read.
    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        check_key(key)?;
        let status = status_of(self.bucket.head_object(key).await.map(|(_, status)| status))?;
        match check_status("head", key, status) {
            Ok(()) => Ok(true),
            Err(StoreError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(bucket: Option<&str>) -> StoreConfig {
        StoreConfig {
            endpoint_url: Some("http://localhost:3900".into()),
            region: Some("garage".into()),
            bucket: bucket.map(Into::into),
            access_key_id: Some("key".into()),
            secret_access_key: Some("secret".into()),
            local_data_dir: None,
        }
    }

    #[test]
    fn bucket_name_is_required() {
        for bucket in [None, Some("")] {
            let err = S3Store::new(&config(bucket)).unwrap_err();
            assert!(err.to_string().contains("bucket name required"));
        }
        assert!(S3Store::new(&config(Some("tempshare"))).is_ok());
    }

    #[test]
    fn keys_must_be_relative_paths() {
        assert!(check_key("objects/0b6f3c1e-5d0c-4a5e-9d1f-2f9f4c6b7a10").is_ok());
        for key in ["", "/objects/x", "objects//x", "objects/../x", "./x", "objects/"] {
            assert!(
                matches!(check_key(key), Err(StoreError::InvalidId(_))),
                "{key}"
            );
        }
    }

    #[test]
    fn status_mapping() {
        assert!(check_status("get", "k", 200).is_ok());
        assert!(matches!(
            check_status("get", "k", 404),
            Err(StoreError::NotFound(_))
        ));
        assert!(matches!(
            check_status("put", "k", 503),
            Err(StoreError::Internal(_))
        ));
        assert_eq!(
            status_of(Err(S3Error::HttpFailWithBody(404, String::new()))).unwrap(),
            404
        );
    }

    #[tokio::test]
    async fn invalid_keys_never_reach_the_bucket() {
        let store = S3Store::new(&config(Some("tempshare"))).unwrap();
        assert!(matches!(
            store.exists("../secret").await,
            Err(StoreError::InvalidId(_))
        ));
        assert!(matches!(
            store.open_stream("").await.err(),
            Some(StoreError::InvalidId(_))
        ));
    }

    // -- Integration tests (require a running S3-compatible service) --

    fn s3_config() -> Option<StoreConfig> {
        let config = StoreConfig::from_env();
        config.is_s3().then_some(config)
    }

    #[tokio::test]
    #[ignore]
    async fn s3_object_lifecycle() {
        let config = s3_config().expect("S3 not configured; run with TEMPSHARE_S3_* set");
        let store = S3Store::new(&config).unwrap();
        let key = crate::object_key(&crate::new_storage_id());
        let data = vec![0x42u8; 1_000_000];

        assert!(!store.exists(&key).await.unwrap());
        store.put(&key, Bytes::from(data.clone())).await.unwrap();
        assert!(store.exists(&key).await.unwrap());

        let chunks: Vec<Bytes> = store.open_stream(&key).await.unwrap().try_collect().await.unwrap();
        assert_eq!(chunks.concat(), data);

        store.delete(&key).await.unwrap();
        assert!(!store.exists(&key).await.unwrap());
        // Deleting again is a no-op.
        store.delete(&key).await.unwrap();
        assert!(matches!(
            store.open_stream(&key).await.err(),
            Some(StoreError::NotFound(_))
        ));
    }
}
