//! Video pitch uploads.

use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use tracing::info;

use crate::errors::AppError;

pub mod handlers;

/// Object storage for user media.
#[async_trait]
pub trait MediaStorage: Send + Sync {
    /// Stores `body` under `key` and returns the public URL of the object.
    async fn put(&self, key: &str, content_type: &str, body: Bytes) -> Result<String, AppError>;
}

/// S3 / MinIO implementation.
pub struct S3MediaStorage {
    client: aws_sdk_s3::Client,
    bucket: String,
    public_base_url: String,
}

impl S3MediaStorage {
    pub fn new(client: aws_sdk_s3::Client, bucket: String, endpoint: &str) -> Self {
        let public_base_url = format!("{}/{}", endpoint.trim_end_matches('/'), bucket);
        Self {
            client,
            bucket,
            public_base_url,
        }
    }
}

#[async_trait]
impl MediaStorage for S3MediaStorage {
    async fn put(&self, key: &str, content_type: &str, body: Bytes) -> Result<String, AppError> {
        let size = body.len();
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(body))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("S3 upload failed: {e}")))?;

        info!("Uploaded {size} bytes to s3://{}/{}", self.bucket, key);
        Ok(format!("{}/{}", self.public_base_url, key))
    }
}

#[cfg(test)]
pub mod testing {
    use std::sync::Mutex;

    use super::*;

    /// Keeps uploads in memory.
    #[derive(Default)]
    pub struct MemoryMediaStorage {
        pub objects: Mutex<Vec<(String, String, usize)>>,
    }

    #[async_trait]
    impl MediaStorage for MemoryMediaStorage {
        async fn put(&self, key: &str, content_type: &str, body: Bytes) -> Result<String, AppError> {
            self.objects
                .lock()
                .unwrap()
                .push((key.to_string(), content_type.to_string(), body.len()));
            Ok(format!("memory://{key}"))
        }
    }
}
