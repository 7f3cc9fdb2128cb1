//! Product create/read/update/delete orchestration.
//!
//! The write path validates input, derives the slug, uploads the image batch
//! concurrently and only persists when every upload in the batch succeeded.
//! Uploads that succeeded inside a failed batch are left in remote storage,
//! and images replaced by an update are not removed either.

use crate::error::{CleanupFailure, DeleteError, WriteError};
use crate::models::{ImagePayload, ImageRef, NewProduct, Product, ProductFields};
use crate::repository::ProductRepository;
use crate::slug::slugify;
use crate::storage::ImageStore;
use crate::Result;
use futures_util::future::join_all;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

/// Result of one upload within a batch.
#[derive(Debug)]
pub enum UploadOutcome {
    Uploaded(ImageRef),
    Failed(String),
}

/// A removed product and any of its remote images that could not be cleaned up.
#[derive(Debug)]
pub struct DeletedProduct {
    pub product: Product,
    pub cleanup_failures: Vec<CleanupFailure>,
}

#[derive(Clone)]
pub struct ProductService {
    repository: Arc<dyn ProductRepository>,
    images: Arc<dyn ImageStore>,
}

impl ProductService {
    pub fn new(repository: Arc<dyn ProductRepository>, images: Arc<dyn ImageStore>) -> Self {
        Self { repository, images }
    }

    #[instrument(skip_all, fields(images = images.len()))]
    pub async fn create(
        &self,
        fields: ProductFields,
        images: Vec<ImagePayload>,
    ) -> std::result::Result<Product, WriteError> {
        let name = fields.name().ok_or(WriteError::MissingField("name"))?;
        let description = fields
            .description()
            .ok_or(WriteError::MissingField("description"))?;
        let price = fields.price.ok_or(WriteError::MissingField("price"))?;
        let quantity = fields.quantity.ok_or(WriteError::MissingField("quantity"))?;

        let new_product = NewProduct {
            name: name.to_string(),
            slug: slugify(name),
            description: description.to_string(),
            price,
            quantity,
            images: self.upload_batch(&images).await?,
        };

        let product = self.repository.create(new_product).await.map_err(|e| {
            error!("Failed to persist new product: {}", e);
            WriteError::PersistenceFailed(e.to_string())
        })?;

        info!("Created product {} ({})", product.id, product.slug);
        Ok(product)
    }

    #[instrument(skip(self, fields, images), fields(images = images.len()))]
    pub async fn update(
        &self,
        id: Uuid,
        fields: ProductFields,
        images: Vec<ImagePayload>,
    ) -> std::result::Result<Product, WriteError> {
        let mut product = self
            .repository
            .find_by_id(id)
            .await
            .map_err(|e| WriteError::PersistenceFailed(e.to_string()))?
            .ok_or(WriteError::NotFound(id))?;

        if let Some(name) = fields.name() {
            product.name = name.to_string();
            product.slug = slugify(name);
        }
        if let Some(description) = fields.description() {
            product.description = description.to_string();
        }
        if let Some(price) = fields.price {
            product.price = price;
        }
        if let Some(quantity) = fields.quantity {
            product.quantity = quantity;
        }

        if !images.is_empty() {
            product.images = self.upload_batch(&images).await?;
        }

        let product = self.repository.update(&product).await.map_err(|e| {
            error!("Failed to persist product {}: {}", id, e);
            WriteError::PersistenceFailed(e.to_string())
        })?;

        info!("Updated product {} ({})", product.id, product.slug);
        Ok(product)
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<Product>> {
        self.repository.find_by_id(id).await
    }

    pub async fn list(&self) -> Result<(usize, Vec<Product>)> {
        let products = self.repository.find_all().await?;
        Ok((products.len(), products))
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> std::result::Result<DeletedProduct, DeleteError> {
        let product = self
            .repository
            .delete_by_id(id)
            .await
            .map_err(|e| DeleteError::PersistenceFailed(e.to_string()))?
            .ok_or(DeleteError::NotFound(id))?;

        let results = join_all(
            product
                .images
                .iter()
                .map(|image| self.images.delete(&image.provider_id)),
        )
        .await;

        let cleanup_failures: Vec<CleanupFailure> = product
            .images
            .iter()
            .zip(results)
            .filter_map(|(image, result)| {
                result.err().map(|e| {
                    warn!("Failed to delete image {}: {}", image.provider_id, e);
                    CleanupFailure {
                        provider_id: image.provider_id.clone(),
                        reason: e.to_string(),
                    }
                })
            })
            .collect();

        info!(
            "Deleted product {} ({} of {} images cleaned up)",
            id,
            product.images.len() - cleanup_failures.len(),
            product.images.len()
        );
        Ok(DeletedProduct {
            product,
            cleanup_failures,
        })
    }

    /// Uploads every payload concurrently and accepts the batch only if all
    /// of them succeed. The returned refs follow the payload order.
    async fn upload_batch(
        &self,
        payloads: &[ImagePayload],
    ) -> std::result::Result<Vec<ImageRef>, WriteError> {
        if payloads.is_empty() {
            return Ok(Vec::new());
        }

        let outcomes: Vec<UploadOutcome> =
            join_all(payloads.iter().map(|payload| self.upload_one(payload))).await;

        let total = outcomes.len();
        let mut uploaded = Vec::with_capacity(total);
        let mut failures = Vec::new();
        for outcome in outcomes {
            match outcome {
                UploadOutcome::Uploaded(image) => uploaded.push(image),
                UploadOutcome::Failed(reason) => failures.push(reason),
            }
        }

        if !failures.is_empty() {
            warn!(
                "{} of {} image uploads failed ({}); {} uploaded images are left in storage",
                failures.len(),
                total,
                failures.join("; "),
                uploaded.len()
            );
            return Err(WriteError::ImageUploadFailed {
                failed: failures.len(),
                total,
            });
        }

        Ok(uploaded)
    }

    async fn upload_one(&self, payload: &ImagePayload) -> UploadOutcome {
        match self.images.upload(payload).await {
            Ok(image) => UploadOutcome::Uploaded(image),
            Err(e) => {
                error!(
                    "Error uploading image {}: {}",
                    payload.file_name.as_deref().unwrap_or("<unnamed>"),
                    e
                );
                UploadOutcome::Failed(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::InMemoryProductRepository;
    use crate::storage::MockImageStore;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    fn service_with(
        repo: &InMemoryProductRepository,
        store: &MockImageStore,
    ) -> ProductService {
        ProductService::new(Arc::new(repo.clone()), Arc::new(store.clone()))
    }

    fn red_mug() -> ProductFields {
        ProductFields {
            name: Some("Red Mug".to_string()),
            description: Some("Ceramic".to_string()),
            price: Some(9.0),
            quantity: Some(5),
        }
    }

    #[tokio::test]
    async fn test_create_without_images() {
        let repo = InMemoryProductRepository::new();
        let store = MockImageStore::new();
        let service = service_with(&repo, &store);

        let product = service.create(red_mug(), Vec::new()).await.unwrap();

        assert_eq!(product.slug, slugify("Red Mug"));
        assert!(product.images.is_empty());
        assert_eq!(repo.get_products(), vec![product]);
        assert_eq!(store.get_upload_count(), 0);
    }

    #[tokio::test]
    async fn test_create_validates_fields_in_order() {
        let cases = [
            (ProductFields { name: None, ..red_mug() }, "name"),
            (ProductFields { name: Some(String::new()), description: None, ..red_mug() }, "name"),
            (ProductFields { description: Some(" ".to_string()), ..red_mug() }, "description"),
            (ProductFields { price: None, quantity: None, ..red_mug() }, "price"),
            (ProductFields { quantity: None, ..red_mug() }, "quantity"),
        ];

        for (fields, expected) in cases {
            let repo = InMemoryProductRepository::new();
            let store = MockImageStore::new();
            let service = service_with(&repo, &store);

            let err = service
                .create(fields, vec![ImagePayload::new(vec![1])])
                .await
                .unwrap_err();

            assert!(matches!(err, WriteError::MissingField(field) if field == expected));
            assert_eq!(store.get_upload_count(), 0);
            assert_eq!(repo.get_create_count(), 0);
        }
    }

    #[tokio::test]
    async fn test_create_keeps_input_order_regardless_of_completion() {
        let repo = InMemoryProductRepository::new();
        let store = MockImageStore::new()
            .with_upload_delay(vec![1], Duration::from_millis(50))
            .with_upload_delay(vec![2], Duration::from_millis(20));
        let service = service_with(&repo, &store);

        let payloads = vec![
            ImagePayload::new(vec![1]),
            ImagePayload::new(vec![2]),
            ImagePayload::new(vec![3]),
        ];
        let product = service.create(red_mug(), payloads).await.unwrap();

        let objects = store.get_objects();
        let stored_bytes: Vec<Vec<u8>> = product
            .images
            .iter()
            .map(|image| objects[&image.provider_id].clone())
            .collect();
        assert_eq!(stored_bytes, vec![vec![1], vec![2], vec![3]]);
    }

    #[tokio::test]
    async fn test_create_rejects_batch_with_failed_upload() {
        let repo = InMemoryProductRepository::new();
        let store = MockImageStore::new().with_failing_upload(vec![2]);
        let service = service_with(&repo, &store);

        let payloads = vec![
            ImagePayload::new(vec![1]),
            ImagePayload::new(vec![2]),
            ImagePayload::new(vec![3]),
        ];
        let err = service.create(red_mug(), payloads).await.unwrap_err();

        assert!(matches!(
            err,
            WriteError::ImageUploadFailed { failed: 1, total: 3 }
        ));
        assert_eq!(repo.get_create_count(), 0);
        // Siblings run to completion and are not rolled back.
        assert_eq!(store.get_upload_count(), 3);
        assert_eq!(store.get_objects().len(), 2);
        assert!(store.get_deleted().is_empty());
    }

    #[tokio::test]
    async fn test_create_surfaces_persistence_failure() {
        let repo = InMemoryProductRepository::new().with_failure(true);
        let store = MockImageStore::new();
        let service = service_with(&repo, &store);

        let err = service.create(red_mug(), Vec::new()).await.unwrap_err();

        match err {
            WriteError::PersistenceFailed(detail) => {
                assert!(detail.contains("Mock storage failure"))
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_update_surfaces_persistence_failure() {
        let seeded = InMemoryProductRepository::new();
        let store = MockImageStore::new();
        let existing = service_with(&seeded, &store)
            .create(red_mug(), Vec::new())
            .await
            .unwrap();

        let repo = InMemoryProductRepository::new()
            .with_product(existing.clone())
            .with_failure(true);
        let service = service_with(&repo, &store);

        let fields = ProductFields {
            name: Some("Blue Mug".to_string()),
            ..Default::default()
        };
        let err = service
            .update(existing.id, fields, Vec::new())
            .await
            .unwrap_err();

        match err {
            WriteError::PersistenceFailed(detail) => {
                assert!(detail.contains("Mock storage failure"))
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(repo.get_update_count(), 1);
        assert_eq!(repo.get_products(), vec![existing]);
    }

    #[tokio::test]
    async fn test_update_unknown_id_is_not_found() {
        let repo = InMemoryProductRepository::new();
        let store = MockImageStore::new();
        let service = service_with(&repo, &store);

        let id = Uuid::new_v4();
        let err = service
            .update(id, red_mug(), vec![ImagePayload::new(vec![1])])
            .await
            .unwrap_err();

        assert!(matches!(err, WriteError::NotFound(missing) if missing == id));
        assert_eq!(repo.get_update_count(), 0);
        assert_eq!(store.get_upload_count(), 0);
    }

    #[tokio::test]
    async fn test_update_name_only_recomputes_slug() {
        let repo = InMemoryProductRepository::new();
        let store = MockImageStore::new().with_base_url("https://x".to_string());
        let service = service_with(&repo, &store);
        let created = service
            .create(red_mug(), vec![ImagePayload::new(vec![1])])
            .await
            .unwrap();

        let fields = ProductFields {
            name: Some("Blue Mug".to_string()),
            ..Default::default()
        };
        let updated = service.update(created.id, fields, Vec::new()).await.unwrap();

        assert_eq!(updated.slug, "blue-mug");
        assert_eq!(updated.description, "Ceramic");
        assert_eq!(updated.price, 9.0);
        assert_eq!(updated.quantity, 5);
        assert_eq!(updated.images, created.images);
    }

    #[tokio::test]
    async fn test_update_replaces_images_without_deleting_old_ones() {
        let repo = InMemoryProductRepository::new();
        let store = MockImageStore::new().with_base_url("https://x".to_string());
        let service = service_with(&repo, &store);
        let created = service
            .create(red_mug(), vec![ImagePayload::new(vec![1])])
            .await
            .unwrap();

        let updated = service
            .update(
                created.id,
                ProductFields::default(),
                vec![ImagePayload::new(vec![2]), ImagePayload::new(vec![3])],
            )
            .await
            .unwrap();

        assert_eq!(
            updated.images,
            vec![
                ImageRef::new("https://x/img2", "pid2"),
                ImageRef::new("https://x/img3", "pid3"),
            ]
        );
        assert!(store.get_deleted().is_empty());
    }

    #[tokio::test]
    async fn test_update_with_failed_upload_leaves_record_untouched() {
        let repo = InMemoryProductRepository::new();
        let store = MockImageStore::new().with_failing_upload(vec![9]);
        let service = service_with(&repo, &store);
        let created = service.create(red_mug(), Vec::new()).await.unwrap();

        let fields = ProductFields {
            name: Some("Blue Mug".to_string()),
            ..Default::default()
        };
        let err = service
            .update(created.id, fields, vec![ImagePayload::new(vec![9])])
            .await
            .unwrap_err();

        assert!(matches!(err, WriteError::ImageUploadFailed { failed: 1, total: 1 }));
        assert_eq!(repo.get_update_count(), 0);
        assert_eq!(repo.get_products(), vec![created]);
    }

    #[tokio::test]
    async fn test_delete_cleans_up_every_image() {
        let repo = InMemoryProductRepository::new();
        let store = MockImageStore::new();
        let service = service_with(&repo, &store);
        let created = service
            .create(
                red_mug(),
                vec![ImagePayload::new(vec![1]), ImagePayload::new(vec![2])],
            )
            .await
            .unwrap();

        let deleted = service.delete(created.id).await.unwrap();

        assert_eq!(deleted.product.id, created.id);
        assert!(deleted.cleanup_failures.is_empty());
        assert_eq!(store.get_deleted(), vec!["pid1", "pid2"]);
        assert!(repo.get_products().is_empty());
    }

    #[tokio::test]
    async fn test_delete_succeeds_when_cleanup_fails() {
        let repo = InMemoryProductRepository::new();
        let store = MockImageStore::new().with_failing_delete("pid1".to_string());
        let service = service_with(&repo, &store);
        let created = service
            .create(
                red_mug(),
                vec![ImagePayload::new(vec![1]), ImagePayload::new(vec![2])],
            )
            .await
            .unwrap();

        let deleted = service.delete(created.id).await.unwrap();

        assert_eq!(deleted.cleanup_failures.len(), 1);
        assert_eq!(deleted.cleanup_failures[0].provider_id, "pid1");
        assert_eq!(store.get_deleted().len(), 2);
        assert!(service.get_by_id(created.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_unknown_id_is_not_found() {
        let repo = InMemoryProductRepository::new();
        let store = MockImageStore::new();
        let service = service_with(&repo, &store);

        let err = service.delete(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, DeleteError::NotFound(_)));
        assert!(store.get_deleted().is_empty());
    }

    #[tokio::test]
    async fn test_list_reports_count() {
        let repo = InMemoryProductRepository::new();
        let store = MockImageStore::new();
        let service = service_with(&repo, &store);
        service.create(red_mug(), Vec::new()).await.unwrap();
        service.create(red_mug(), Vec::new()).await.unwrap();

        let (count, products) = service.list().await.unwrap();
        assert_eq!(count, 2);
        assert_eq!(products.len(), 2);
    }
}
