use crate::bucket::{Bucket, Progress};
use crate::error::VodError;
use crate::types::{StorageConfig, UploadOutcome};
use async_trait::async_trait;
use std::path::Path;
use tracing::debug;

/// Object storage that receives the actual file bytes.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Uploads `file` to `key` in the bucket described by `config`.
    async fn multipart_upload(
        &self,
        config: &StorageConfig,
        key: &str,
        file: &Path,
        progress: Progress,
    ) -> Result<UploadOutcome, VodError>;
}

/// Aliyun OSS through [Bucket]
#[derive(Debug, Default, Clone)]
pub struct OssStore;

#[async_trait]
impl ObjectStore for OssStore {
    async fn multipart_upload(
        &self,
        config: &StorageConfig,
        key: &str,
        file: &Path,
        progress: Progress,
    ) -> Result<UploadOutcome, VodError> {
        let bucket = Bucket::new(config.clone())?;
        debug!("uploading {} to bucket {}", key, bucket.name);
        bucket.put_file(key, file, progress).await
    }
}
