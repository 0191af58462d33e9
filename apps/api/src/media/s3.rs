use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;
use tracing::{debug, info};

use crate::errors::AppError;
use crate::media::{ImageKind, MediaStore};

/// S3-compatible bucket (MinIO locally, S3 in production).
#[derive(Clone)]
pub struct S3MediaStore {
    client: S3Client,
    bucket: String,
    public_url: String,
}

impl S3MediaStore {
    pub fn new(client: S3Client, bucket: impl Into<String>, public_url: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            public_url: public_url.into(),
        }
    }

    fn url_for(&self, key: &str) -> String {
        format!("{}/{}", self.public_url, key)
    }

    fn key_for<'a>(&self, url: &'a str) -> Option<&'a str> {
        url.strip_prefix(self.public_url.as_str())?
            .strip_prefix('/')
            .filter(|key| !key.is_empty())
    }
}

#[async_trait]
impl MediaStore for S3MediaStore {
    async fn put(&self, key: &str, bytes: Vec<u8>, kind: ImageKind) -> Result<String, AppError> {
        let size = bytes.len();
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(kind.content_type())
            .body(ByteStream::from(bytes))
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("upload of {key} failed: {e}")))?;

        info!("Uploaded {size} bytes to s3://{}/{}", self.bucket, key);
        Ok(self.url_for(key))
    }

    async fn delete_url(&self, url: &str) -> Result<(), AppError> {
        let Some(key) = self.key_for(url) else {
            debug!("Skipping delete of foreign media URL {url}");
            return Ok(());
        };
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("delete of {key} failed: {e}")))?;
        info!("Deleted s3://{}/{}", self.bucket, key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> S3MediaStore {
        let config = aws_sdk_s3::Config::builder()
            .behavior_version(aws_sdk_s3::config::BehaviorVersion::latest())
            .region(aws_sdk_s3::config::Region::new("us-east-1"))
            .build();
        S3MediaStore::new(
            S3Client::from_conf(config),
            "folio",
            "http://localhost:9000/folio",
        )
    }

    #[test]
    fn test_url_and_key_round_trip() {
        let store = store();
        let url = store.url_for("thumbnails/u/1.png");
        assert_eq!(url, "http://localhost:9000/folio/thumbnails/u/1.png");
        assert_eq!(store.key_for(&url), Some("thumbnails/u/1.png"));
    }

    #[test]
    fn test_foreign_urls_have_no_key() {
        let store = store();
        assert_eq!(store.key_for("https://cdn.example.com/x.png"), None);
        assert_eq!(store.key_for("http://localhost:9000/folio/"), None);
        assert_eq!(store.key_for("http://localhost:9000/folio-other/x.png"), None);
    }
}
