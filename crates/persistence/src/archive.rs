//! Shutdown archive
//!
//! Uploads the finished CSV artifact to object storage once, after the
//! final drain. Not a sink: nothing streams through it, and a failure here
//! never undoes local persistence. The object key is fixed, so each run
//! overwrites the previous archive.

use std::path::Path;
use std::sync::Arc;

use contracts::{ArchiveConfig, ArchiveError};
use object_store::aws::AmazonS3Builder;
use object_store::path::Path as ObjectPath;
use object_store::{ObjectStore, PutPayload};
use tracing::{info, instrument};

/// One-shot uploader of the local CSV artifact
pub struct Archiver {
    store: Arc<dyn ObjectStore>,
    bucket: String,
    object_key: ObjectPath,
}

impl Archiver {
    /// Build against S3 using ambient environment credentials
    ///
    /// Fails with a setup error when credentials are absent; callers treat
    /// that as "skip the archive", not as a pipeline failure.
    pub fn from_env(config: &ArchiveConfig) -> Result<Self, ArchiveError> {
        for var in ["AWS_ACCESS_KEY_ID", "AWS_SECRET_ACCESS_KEY"] {
            if std::env::var(var).is_err() {
                return Err(ArchiveError::Setup {
                    message: format!("{var} not set"),
                });
            }
        }

        let store = AmazonS3Builder::from_env()
            .with_bucket_name(&config.bucket)
            .build()
            .map_err(|e| ArchiveError::Setup {
                message: e.to_string(),
            })?;

        Ok(Self::new(Arc::new(store), &config.bucket, &config.object_key))
    }

    /// Build over any object store (in-memory store in tests)
    pub fn new(store: Arc<dyn ObjectStore>, bucket: &str, object_key: &str) -> Self {
        Self {
            store,
            bucket: bucket.to_string(),
            object_key: ObjectPath::from(object_key),
        }
    }

    /// Upload the artifact at `local_path`, overwriting the previous object
    #[instrument(skip(self), fields(bucket = %self.bucket, key = %self.object_key))]
    pub async fn archive(&self, local_path: &Path) -> Result<(), ArchiveError> {
        let bytes = tokio::fs::read(local_path)
            .await
            .map_err(|e| ArchiveError::LocalRead {
                path: local_path.display().to_string(),
                message: e.to_string(),
            })?;
        let size = bytes.len();

        self.store
            .put(&self.object_key, PutPayload::from(bytes))
            .await
            .map_err(|e| ArchiveError::Upload {
                bucket: self.bucket.clone(),
                message: e.to_string(),
            })?;

        info!(bytes = size, "artifact archived");
        Ok(())
    }
}
