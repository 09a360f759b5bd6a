use catalog_media::{
    recover_public_id, DeleteOutcome, MediaStore, MediaUpload, MemoryMediaStore, PublicIdSource,
};

fn png(name: &str) -> MediaUpload {
    MediaUpload::new(vec![0x89, b'P', b'N', b'G'])
        .with_filename(name)
        .with_content_type("image/png")
}

#[tokio::test]
async fn uploaded_urls_round_trip_through_public_id_recovery() {
    let store = MemoryMediaStore::new();

    let asset = store.upload(png("lamp.png"), "products").await.unwrap();
    assert!(asset.url.starts_with("http://media.localhost/catalog/image/upload/v1/products/"));
    assert!(asset.url.ends_with(".png"));
    assert_eq!(asset.bytes, 4);
    assert!(store.owns_url(&asset.url));

    let id = recover_public_id(&asset.url, "products").unwrap();
    assert_eq!(id.source, PublicIdSource::Canonical);
    assert_eq!(id.value, asset.public_id);
    assert!(store.contains(&id.value));
}

#[tokio::test]
async fn versions_increase_per_upload() {
    let store = MemoryMediaStore::new();
    let first = store.upload(png("a.png"), "products").await.unwrap();
    let second = store.upload(png("b.png"), "products").await.unwrap();

    assert!(first.url.contains("/upload/v1/"));
    assert!(second.url.contains("/upload/v2/"));
    assert_ne!(first.public_id, second.public_id);
    assert_eq!(store.len(), 2);
}

#[tokio::test]
async fn delete_reports_missing_assets() {
    let store = MemoryMediaStore::new();
    let asset = store.upload(png("a.png"), "products").await.unwrap();

    assert_eq!(store.delete(&asset.public_id).await.unwrap(), DeleteOutcome::Deleted);
    assert_eq!(store.delete(&asset.public_id).await.unwrap(), DeleteOutcome::NotFound);
    assert!(store.is_empty());
}

#[tokio::test]
async fn foreign_urls_and_empty_files() {
    let store = MemoryMediaStore::with_base_url("http://media.test/acct/");
    assert!(!store.owns_url("http://media.test/acctx/image/upload/a.png"));
    assert!(!store.owns_url("https://res.cloudinary.com/demo/image/upload/a.png"));

    let err = store
        .upload(MediaUpload::new(Vec::<u8>::new()), "products")
        .await
        .unwrap_err();
    assert!(err.to_string().contains("empty file"));
}
