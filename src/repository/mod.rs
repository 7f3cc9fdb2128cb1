//! Product persistence
//!
//! `ProductRepository` is the single serialization point for product records.
//! PostgreSQL backs production; the in-memory repository serves tests and
//! dry runs.

pub mod memory;
pub mod postgres;

pub use memory::InMemoryProductRepository;
pub use postgres::PgProductRepository;

use crate::models::{NewProduct, Product};
use crate::Result;
use async_trait::async_trait;
use uuid::Uuid;

#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Inserts the product, assigning its id and timestamps.
    async fn create(&self, product: NewProduct) -> Result<Product>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Product>>;
    async fn find_all(&self) -> Result<Vec<Product>>;
    /// Overwrites the mutable fields of an existing record.
    async fn update(&self, product: &Product) -> Result<Product>;
    /// Removes the record and returns it, or `None` when it did not exist.
    async fn delete_by_id(&self, id: Uuid) -> Result<Option<Product>>;
}
