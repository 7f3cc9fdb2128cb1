use super::ProductRepository;
use crate::models::{NewProduct, Product};
use crate::{Error, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// Vec-backed repository preserving insertion order.
///
/// `with_failure` makes every write fail, which is how tests exercise the
/// persistence error path.
#[derive(Clone)]
pub struct InMemoryProductRepository {
    products: Arc<Mutex<Vec<Product>>>,
    create_count: Arc<Mutex<usize>>,
    update_count: Arc<Mutex<usize>>,
    should_fail: Arc<Mutex<bool>>,
}

impl InMemoryProductRepository {
    pub fn new() -> Self {
        Self {
            products: Arc::new(Mutex::new(Vec::new())),
            create_count: Arc::new(Mutex::new(0)),
            update_count: Arc::new(Mutex::new(0)),
            should_fail: Arc::new(Mutex::new(false)),
        }
    }

    pub fn with_failure(self, should_fail: bool) -> Self {
        *self.should_fail.lock().unwrap() = should_fail;
        self
    }

    pub fn with_product(self, product: Product) -> Self {
        self.products.lock().unwrap().push(product);
        self
    }

    pub fn get_create_count(&self) -> usize {
        *self.create_count.lock().unwrap()
    }

    pub fn get_update_count(&self) -> usize {
        *self.update_count.lock().unwrap()
    }

    pub fn get_products(&self) -> Vec<Product> {
        self.products.lock().unwrap().clone()
    }

    fn check_failure(&self) -> Result<()> {
        if *self.should_fail.lock().unwrap() {
            return Err(Error::Generic("Mock storage failure".to_string()));
        }
        Ok(())
    }
}

impl Default for InMemoryProductRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProductRepository for InMemoryProductRepository {
    async fn create(&self, product: NewProduct) -> Result<Product> {
        *self.create_count.lock().unwrap() += 1;
        self.check_failure()?;

        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4(),
            name: product.name,
            slug: product.slug,
            description: product.description,
            price: product.price,
            quantity: product.quantity,
            images: product.images,
            created_at: now,
            updated_at: now,
        };

        self.products.lock().unwrap().push(product.clone());
        Ok(product)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Product>> {
        Ok(self
            .products
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.id == id)
            .cloned())
    }

    async fn find_all(&self) -> Result<Vec<Product>> {
        Ok(self.get_products())
    }

    async fn update(&self, product: &Product) -> Result<Product> {
        *self.update_count.lock().unwrap() += 1;
        self.check_failure()?;

        let mut products = self.products.lock().unwrap();
        let stored = products
            .iter_mut()
            .find(|p| p.id == product.id)
            .ok_or_else(|| Error::Generic(format!("Product {} not found", product.id)))?;

        *stored = Product {
            created_at: stored.created_at,
            updated_at: Utc::now(),
            ..product.clone()
        };
        Ok(stored.clone())
    }

    async fn delete_by_id(&self, id: Uuid) -> Result<Option<Product>> {
        self.check_failure()?;

        let mut products = self.products.lock().unwrap();
        Ok(products
            .iter()
            .position(|p| p.id == id)
            .map(|index| products.remove(index)))
    }
}
