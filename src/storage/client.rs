use super::mime::{content_type_for, extension_for};
use super::ImageStore;
use crate::models::{ImagePayload, ImageRef};
use crate::{Error, Result};
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::{config::Region, types::ObjectCannedAcl, Client as S3Client};
use uuid::Uuid;

const KEY_PREFIX: &str = "products";

/// Connection settings for an S3-compatible bucket.
#[derive(Debug, Clone)]
pub struct S3Settings {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub endpoint: String,
    pub region: String,
    pub bucket: String,
    pub base_url: String,
}

pub struct S3ImageStore {
    client: S3Client,
    bucket: String,
    base_url: String,
}

impl S3ImageStore {
    pub async fn new(settings: S3Settings) -> Result<Self> {
        let credentials = aws_sdk_s3::config::Credentials::new(
            settings.access_key_id,
            settings.secret_access_key,
            None,
            None,
            "product-catalog",
        );

        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .credentials_provider(credentials)
            .region(Region::new(settings.region))
            .endpoint_url(settings.endpoint)
            .load()
            .await;

        // Path-style addressing keeps non-AWS providers (MinIO, Spaces) working.
        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(true)
            .build();

        Ok(Self {
            client: S3Client::from_conf(s3_config),
            bucket: settings.bucket,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn object_key(content_type: &str) -> String {
        match extension_for(content_type) {
            Some(ext) => format!("{}/{}.{}", KEY_PREFIX, Uuid::new_v4(), ext),
            None => format!("{}/{}", KEY_PREFIX, Uuid::new_v4()),
        }
    }

    fn get_public_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url, key)
    }
}

#[async_trait]
impl ImageStore for S3ImageStore {
    async fn upload(&self, payload: &ImagePayload) -> Result<ImageRef> {
        let content_type = content_type_for(payload);
        let key = Self::object_key(&content_type);
        let body = ByteStream::from(payload.data.clone());

        tracing::debug!(
            "Uploading {} bytes to {}/{} ({})",
            payload.data.len(),
            self.bucket,
            key,
            content_type
        );

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(body)
            .content_type(content_type)
            .acl(ObjectCannedAcl::PublicRead)
            .send()
            .await
            .map_err(|e| Error::S3(format!("Failed to upload image: {}", e)))?;

        Ok(ImageRef::new(self.get_public_url(&key), key))
    }

    async fn delete(&self, provider_id: &str) -> Result<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(provider_id)
            .send()
            .await
            .map_err(|e| Error::S3(format!("Failed to delete image: {}", e)))?;

        Ok(())
    }
}
