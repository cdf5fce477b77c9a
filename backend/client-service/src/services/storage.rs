/// Avatar blob storage backed by S3
///
/// Uploads a local temp file and returns its public URL. When no bucket is
/// configured the service runs in disabled mode and uploads are skipped.
use crate::config::StorageSettings;
use crate::error::{ApiError, Result};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;
use std::path::Path;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Clone)]
pub struct AvatarStorage {
    client: Option<S3Client>,
    bucket: Option<String>,
    public_base_url: Option<String>,
}

impl AvatarStorage {
    pub fn new(client: Option<S3Client>, settings: &StorageSettings) -> Self {
        Self {
            client,
            bucket: settings.bucket.clone(),
            public_base_url: settings.public_base_url.clone(),
        }
    }

    /// Check if a client and bucket are configured
    pub fn is_enabled(&self) -> bool {
        self.client.is_some() && self.bucket.is_some()
    }

    /// Upload a local file and return its public URL
    ///
    /// Returns `None` in disabled mode; real upload failures are fatal to
    /// the calling flow.
    pub async fn upload(&self, path: &Path, content_type: Option<&str>) -> Result<Option<String>> {
        let (client, bucket) = match (&self.client, &self.bucket) {
            (Some(client), Some(bucket)) => (client, bucket),
            _ => {
                warn!("Avatar storage not configured; skipping upload");
                return Ok(None);
            }
        };

        let key = format!("avatars/{}", Uuid::new_v4());
        let body = ByteStream::from_path(path)
            .await
            .map_err(|e| ApiError::Internal(format!("Failed to read avatar file: {}", e)))?;

        client
            .put_object()
            .bucket(bucket)
            .key(&key)
            .content_type(content_type.unwrap_or("application/octet-stream"))
            .body(body)
            .send()
            .await
            .map_err(|e| ApiError::Internal(format!("Failed to upload avatar: {}", e)))?;

        let url = object_url(bucket, self.public_base_url.as_deref(), &key);
        info!(key = %key, "avatar uploaded");
        Ok(Some(url))
    }
}

fn object_url(bucket: &str, public_base_url: Option<&str>, key: &str) -> String {
    match public_base_url {
        Some(base) if !base.is_empty() => format!("{}/{}", base.trim_end_matches('/'), key),
        _ => format!("https://{}.s3.amazonaws.com/{}", bucket, key),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn disabled_mode_skips_upload() {
        let settings = StorageSettings {
            bucket: None,
            public_base_url: None,
        };
        let storage = AvatarStorage::new(None, &settings);
        assert!(!storage.is_enabled());

        let result = storage.upload(Path::new("/tmp/does-not-exist"), None).await;
        assert!(matches!(result, Ok(None)));
    }

    #[test]
    fn object_url_prefers_configured_base() {
        assert_eq!(
            object_url("avatars-bucket", Some("https://cdn.clientbase.dev/"), "avatars/abc"),
            "https://cdn.clientbase.dev/avatars/abc"
        );
        assert_eq!(
            object_url("avatars-bucket", None, "avatars/abc"),
            "https://avatars-bucket.s3.amazonaws.com/avatars/abc"
        );
    }
}
