//! Remote image hosting
//!
//! Uploads product images to S3-compatible object storage and removes them
//! again when their product is deleted.

pub mod client;
pub mod mime;
pub mod mock;

pub use client::S3ImageStore;
pub use mock::MockImageStore;

use crate::models::{ImagePayload, ImageRef};
use crate::Result;
use async_trait::async_trait;

#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Stores the payload and returns where it can be fetched from.
    async fn upload(&self, payload: &ImagePayload) -> Result<ImageRef>;

    /// Removes a previously uploaded object. May fail if it is already gone.
    async fn delete(&self, provider_id: &str) -> Result<()>;
}
