//! Runs against a live PostgreSQL: `DATABASE_URL=... cargo test -- --ignored`.
#![cfg(feature = "postgres")]

use catalog_server::services::adapters::{PgProductStore, ProductStore};
use catalog_server::services::{NewProduct, ProductChanges};
use rust_decimal::Decimal;

async fn store() -> PgProductStore {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for postgres tests");
    PgProductStore::connect(&url, 2).await.unwrap()
}

#[tokio::test]
#[ignore = "needs DATABASE_URL"]
async fn rows_round_trip_through_postgres() {
    let store = store().await;

    let created = store
        .create(NewProduct {
            name: "Pg lamp".into(),
            description: "Warm light".into(),
            price: Decimal::new(1999, 2),
            image: Some("https://res.cloudinary.com/demo/image/upload/v1/products/lamp.jpg".into()),
        })
        .await
        .unwrap();
    assert!(created.id > 0);
    assert_eq!(created.price, Decimal::new(1999, 2));

    let all = store.find_all().await.unwrap();
    assert!(all.iter().any(|p| p.id == created.id));

    // Absent fields keep their stored values.
    let updated = store
        .update(
            created.id,
            ProductChanges {
                description: Some("Brighter".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.name, "Pg lamp");
    assert_eq!(updated.description, "Brighter");
    assert_eq!(updated.price, created.price);
    assert_eq!(updated.image, created.image);

    let removed = store.delete(created.id).await.unwrap().unwrap();
    assert_eq!(removed, updated);

    assert!(store.find_one(created.id).await.unwrap().is_none());
    assert!(store.delete(created.id).await.unwrap().is_none());
    assert!(store
        .update(created.id, ProductChanges::default())
        .await
        .unwrap()
        .is_none());
}
