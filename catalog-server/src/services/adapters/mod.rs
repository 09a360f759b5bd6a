//! Record stores for products.
//!
//! [`ProductStore`] is the only thing the product workflow knows about
//! persistence. Lookups by id return `None` when the row is absent; the
//! service turns that into a `NotFound`.

use anyhow::Result;
use async_trait::async_trait;

use crate::services::types::{NewProduct, Product, ProductChanges};

pub mod memory_store;
#[cfg(feature = "postgres")]
pub mod postgres_store;

pub use memory_store::MemoryProductStore;
#[cfg(feature = "postgres")]
pub use postgres_store::PgProductStore;

#[async_trait]
pub trait ProductStore: Send + Sync {
    async fn create(&self, product: NewProduct) -> Result<Product>;

    async fn find_all(&self) -> Result<Vec<Product>>;

    async fn find_one(&self, id: i64) -> Result<Option<Product>>;

    /// Apply `changes` to the row. `None` when there is no such row.
    async fn update(&self, id: i64, changes: ProductChanges) -> Result<Option<Product>>;

    /// Delete and return the row. `None` when there is no such row.
    async fn delete(&self, id: i64) -> Result<Option<Product>>;
}
