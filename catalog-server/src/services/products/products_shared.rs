use std::sync::Arc;

use catalog_axum::MultipartConfig;
use catalog_core::{CatalogApp, ServiceCapabilities, ServiceMethodKind};

use crate::services::types::{CatalogParams, Product, ProductPayload};

pub const SERVICE_NAME: &str = "products";
pub const IMAGE_FIELD: &str = "image";
pub const IMAGE_TYPES: [&str; 4] = ["image/jpeg", "image/jpg", "image/png", "image/gif"];

pub fn crud_capabilities() -> ServiceCapabilities {
    ServiceCapabilities::from_methods(vec![
        ServiceMethodKind::Create,
        ServiceMethodKind::Find,
        ServiceMethodKind::Get,
        ServiceMethodKind::Patch,
        ServiceMethodKind::Remove,
    ])
}

/// One optional `image` part, images only.
pub fn multipart_config(max_file_bytes: u64, max_total_bytes: u64) -> MultipartConfig {
    MultipartConfig::new()
        .max_file_size(max_file_bytes)
        .max_total_size(max_total_bytes)
        .file_field(IMAGE_FIELD)
        .allow_content_types(IMAGE_TYPES)
}

pub fn register_hooks(app: &CatalogApp<Product, ProductPayload, CatalogParams>) -> anyhow::Result<()> {
    app.service(SERVICE_NAME)?.hooks(|h| {
        h.before_create(Arc::new(super::products_hooks::ValidateCreate));
        h.before_patch(Arc::new(super::products_hooks::ValidatePatch));
    });
    Ok(())
}
