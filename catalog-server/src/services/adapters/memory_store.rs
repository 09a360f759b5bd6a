use std::collections::BTreeMap;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::RwLock;

use super::ProductStore;
use crate::services::types::{NewProduct, Product, ProductChanges};

#[derive(Default)]
struct Rows {
    last_id: i64,
    by_id: BTreeMap<i64, Product>,
}

/// In-process product table. Ids start at 1 and are never reused.
#[derive(Default)]
pub struct MemoryProductStore {
    rows: RwLock<Rows>,
}

impl MemoryProductStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.rows.read().await.by_id.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl ProductStore for MemoryProductStore {
    async fn create(&self, product: NewProduct) -> Result<Product> {
        let mut rows = self.rows.write().await;
        rows.last_id += 1;

        let row = Product {
            id: rows.last_id,
            name: product.name,
            description: product.description,
            price: product.price,
            image: product.image,
        };
        rows.by_id.insert(row.id, row.clone());
        Ok(row)
    }

    async fn find_all(&self) -> Result<Vec<Product>> {
        Ok(self.rows.read().await.by_id.values().cloned().collect())
    }

    async fn find_one(&self, id: i64) -> Result<Option<Product>> {
        Ok(self.rows.read().await.by_id.get(&id).cloned())
    }

    async fn update(&self, id: i64, changes: ProductChanges) -> Result<Option<Product>> {
        let mut rows = self.rows.write().await;
        let Some(row) = rows.by_id.get_mut(&id) else {
            return Ok(None);
        };

        if let Some(name) = changes.name {
            row.name = name;
        }
        if let Some(description) = changes.description {
            row.description = description;
        }
        if let Some(price) = changes.price {
            row.price = price;
        }
        if let Some(image) = changes.image {
            row.image = Some(image);
        }
        Ok(Some(row.clone()))
    }

    async fn delete(&self, id: i64) -> Result<Option<Product>> {
        Ok(self.rows.write().await.by_id.remove(&id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn lamp() -> NewProduct {
        NewProduct {
            name: "Lamp".into(),
            description: "Warm light".into(),
            price: Decimal::new(1999, 2),
            image: None,
        }
    }

    #[tokio::test]
    async fn ids_start_at_one_and_are_not_reused() {
        let store = MemoryProductStore::new();
        let a = store.create(lamp()).await.unwrap();
        let b = store.create(lamp()).await.unwrap();
        assert_eq!((a.id, b.id), (1, 2));

        store.delete(b.id).await.unwrap();
        let c = store.create(lamp()).await.unwrap();
        assert_eq!(c.id, 3);
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn update_leaves_absent_fields_alone() {
        let store = MemoryProductStore::new();
        let row = store.create(lamp()).await.unwrap();

        let updated = store
            .update(
                row.id,
                ProductChanges {
                    price: Some(Decimal::new(5, 0)),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.name, "Lamp");
        assert_eq!(updated.price, Decimal::new(5, 0));

        assert!(store.update(42, ProductChanges::default()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_returns_the_row_once() {
        let store = MemoryProductStore::new();
        let row = store.create(lamp()).await.unwrap();

        assert_eq!(store.delete(row.id).await.unwrap(), Some(row.clone()));
        assert!(store.delete(row.id).await.unwrap().is_none());
        assert!(store.find_one(row.id).await.unwrap().is_none());
        assert!(store.is_empty().await);
    }
}
