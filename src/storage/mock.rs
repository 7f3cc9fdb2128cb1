use super::ImageStore;
use crate::models::{ImagePayload, ImageRef};
use crate::Result;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// In-memory image store.
///
/// Uploads are numbered from 1 in call order: the n-th upload yields
/// `{base_url}/img{n}` with provider id `pid{n}`. Failures and delays are
/// keyed by payload bytes so they stay deterministic under concurrent calls.
#[derive(Clone)]
pub struct MockImageStore {
    base_url: String,
    objects: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    upload_count: Arc<Mutex<usize>>,
    deleted: Arc<Mutex<Vec<String>>>,
    failing_uploads: Arc<Mutex<HashSet<Vec<u8>>>>,
    failing_deletes: Arc<Mutex<HashSet<String>>>,
    upload_delays: Arc<Mutex<HashMap<Vec<u8>, Duration>>>,
}

impl MockImageStore {
    pub fn new() -> Self {
        Self {
            base_url: "https://mock-images.example.com".to_string(),
            objects: Arc::new(Mutex::new(HashMap::new())),
            upload_count: Arc::new(Mutex::new(0)),
            deleted: Arc::new(Mutex::new(Vec::new())),
            failing_uploads: Arc::new(Mutex::new(HashSet::new())),
            failing_deletes: Arc::new(Mutex::new(HashSet::new())),
            upload_delays: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    /// Uploads of exactly these bytes fail.
    pub fn with_failing_upload(self, data: Vec<u8>) -> Self {
        self.failing_uploads.lock().unwrap().insert(data);
        self
    }

    /// Deleting this provider id fails.
    pub fn with_failing_delete(self, provider_id: String) -> Self {
        self.failing_deletes.lock().unwrap().insert(provider_id);
        self
    }

    /// Uploads of exactly these bytes take `delay` before completing.
    pub fn with_upload_delay(self, data: Vec<u8>, delay: Duration) -> Self {
        self.upload_delays.lock().unwrap().insert(data, delay);
        self
    }

    pub fn get_upload_count(&self) -> usize {
        *self.upload_count.lock().unwrap()
    }

    pub fn get_deleted(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }

    pub fn get_objects(&self) -> HashMap<String, Vec<u8>> {
        self.objects.lock().unwrap().clone()
    }
}

impl Default for MockImageStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ImageStore for MockImageStore {
    async fn upload(&self, payload: &ImagePayload) -> Result<ImageRef> {
        let n = {
            let mut count = self.upload_count.lock().unwrap();
            *count += 1;
            *count
        };

        let delay = self.upload_delays.lock().unwrap().get(&payload.data).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.failing_uploads.lock().unwrap().contains(&payload.data) {
            return Err(crate::Error::S3(format!("Mock upload {} failed", n)));
        }

        let provider_id = format!("pid{}", n);
        self.objects
            .lock()
            .unwrap()
            .insert(provider_id.clone(), payload.data.clone());

        Ok(ImageRef::new(
            format!("{}/img{}", self.base_url, n),
            provider_id,
        ))
    }

    async fn delete(&self, provider_id: &str) -> Result<()> {
        self.deleted.lock().unwrap().push(provider_id.to_string());

        if self.failing_deletes.lock().unwrap().contains(provider_id) {
            return Err(crate::Error::S3(format!(
                "Mock delete of {} failed",
                provider_id
            )));
        }

        self.objects.lock().unwrap().remove(provider_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_upload_numbers_images() {
        let store = MockImageStore::new().with_base_url("https://x".to_string());

        let first = store.upload(&ImagePayload::new(vec![1])).await.unwrap();
        let second = store.upload(&ImagePayload::new(vec![2])).await.unwrap();

        assert_eq!(first, ImageRef::new("https://x/img1", "pid1"));
        assert_eq!(second, ImageRef::new("https://x/img2", "pid2"));
        assert_eq!(store.get_upload_count(), 2);
        assert_eq!(store.get_objects().len(), 2);
    }

    #[tokio::test]
    async fn test_mock_failing_upload() {
        let store = MockImageStore::new().with_failing_upload(vec![9]);

        assert!(store.upload(&ImagePayload::new(vec![9])).await.is_err());
        assert!(store.upload(&ImagePayload::new(vec![1])).await.is_ok());
        assert_eq!(store.get_upload_count(), 2);
    }

    #[tokio::test]
    async fn test_mock_delete_records_attempts() {
        let store = MockImageStore::new().with_failing_delete("pid2".to_string());
        store.upload(&ImagePayload::new(vec![1])).await.unwrap();

        assert!(store.delete("pid1").await.is_ok());
        assert!(store.delete("pid2").await.is_err());
        assert_eq!(store.get_deleted(), vec!["pid1", "pid2"]);
        assert!(store.get_objects().is_empty());
    }
}
