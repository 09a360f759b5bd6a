use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use catalog_core::{CatalogError, CatalogService, FieldErrors, RequestContext, ServiceCapabilities};
use catalog_media::{recover_public_id, DeleteOutcome, MediaStore, MediaUpload};
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::services::adapters::ProductStore;
use crate::services::types::{
    parse_price, CatalogParams, NewProduct, Product, ProductChanges, ProductPayload,
};

use super::products_schema::VALIDATION_MESSAGE;
use super::products_shared;

pub const DEFAULT_FOLDER: &str = catalog_media::config::DEFAULT_FOLDER;

/// Product rows plus the images they point at.
///
/// Uploads happen before the row is written, so a failed upload leaves the
/// table untouched. Deleting a superseded or removed image is best-effort:
/// failures are logged and the asset is left behind.
pub struct ProductsService {
    store: Arc<dyn ProductStore>,
    media: Arc<dyn MediaStore>,
    folder: String,
}

impl ProductsService {
    pub fn new(store: Arc<dyn ProductStore>, media: Arc<dyn MediaStore>) -> Self {
        Self {
            store,
            media,
            folder: DEFAULT_FOLDER.to_string(),
        }
    }

    pub fn with_folder(mut self, folder: impl Into<String>) -> Self {
        self.folder = folder.into();
        self
    }

    pub fn folder(&self) -> &str {
        &self.folder
    }

    fn parse_id(id: &str) -> Result<i64> {
        id.trim().parse::<i64>().map_err(|_| {
            CatalogError::bad_request(format!("Invalid product id '{id}'")).into_anyhow()
        })
    }

    fn not_found(id: i64) -> anyhow::Error {
        CatalogError::not_found(format!("Product with ID {id} not found")).into_anyhow()
    }

    fn price(raw: &str) -> Result<Decimal> {
        parse_price(raw).ok_or_else(|| {
            let mut errors = FieldErrors::new();
            errors.push_field("price", "price must be a number");
            errors.into_bad_request(VALIDATION_MESSAGE)
        })
    }

    async fn upload_image(&self, upload: MediaUpload) -> Result<String> {
        let asset = self.media.upload(upload, &self.folder).await.map_err(|e| {
            CatalogError::bad_request(format!("Failed to upload image: {e}"))
                .with_source(e)
                .into_anyhow()
        })?;

        debug!(
            backend = self.media.backend_name(),
            public_id = %asset.public_id,
            bytes = asset.bytes,
            "image uploaded"
        );
        Ok(asset.url)
    }

    /// Best-effort removal of the asset behind `url`. Never fails.
    async fn discard_image(&self, url: &str) {
        if !self.media.owns_url(url) {
            warn!(url, "image is not hosted by this media account, leaving it");
            return;
        }

        let public_id = match recover_public_id(url, &self.folder) {
            Ok(id) => id,
            Err(e) => {
                warn!(url, error = %e, "cannot derive a public id, asset left behind");
                return;
            }
        };

        match self.media.delete(public_id.as_str()).await {
            Ok(DeleteOutcome::Deleted) => {
                debug!(public_id = public_id.as_str(), guessed = public_id.is_guess(), "old image deleted")
            }
            Ok(DeleteOutcome::NotFound) => {
                warn!(public_id = public_id.as_str(), guessed = public_id.is_guess(), "old image was already gone")
            }
            Err(e) => {
                warn!(public_id = public_id.as_str(), error = %e, "failed to delete old image")
            }
        }
    }
}

#[async_trait]
impl CatalogService<Product, ProductPayload, CatalogParams> for ProductsService {
    fn capabilities(&self) -> ServiceCapabilities {
        products_shared::crud_capabilities()
    }

    async fn find(&self, _ctx: &RequestContext, _params: CatalogParams) -> Result<Vec<Product>> {
        self.store.find_all().await
    }

    async fn get(&self, _ctx: &RequestContext, id: &str, _params: CatalogParams) -> Result<Product> {
        let id = Self::parse_id(id)?;
        self.store
            .find_one(id)
            .await?
            .ok_or_else(|| Self::not_found(id))
    }

    async fn create(
        &self,
        ctx: &RequestContext,
        data: ProductPayload,
        _params: CatalogParams,
    ) -> Result<Product> {
        let mut errors = FieldErrors::new();
        for (field, value) in [
            ("name", &data.name),
            ("description", &data.description),
            ("price", &data.price),
        ] {
            if value.as_deref().map_or(true, |v| v.trim().is_empty()) {
                errors.push_field(field, format!("{field} is required"));
            }
        }
        errors.into_result(VALIDATION_MESSAGE)?;

        let price = Self::price(data.price.as_deref().unwrap_or_default())?;

        let image = match data.image {
            Some(upload) => Some(self.upload_image(upload).await?),
            None => None,
        };

        let product = self
            .store
            .create(NewProduct {
                name: data.name.unwrap_or_default(),
                description: data.description.unwrap_or_default(),
                price,
                image,
            })
            .await?;

        info!(
            request_id = %ctx.request_id,
            product_id = product.id,
            with_image = product.image.is_some(),
            "product created"
        );
        Ok(product)
    }

    async fn patch(
        &self,
        ctx: &RequestContext,
        id: &str,
        data: ProductPayload,
        _params: CatalogParams,
    ) -> Result<Product> {
        let id = Self::parse_id(id)?;
        let existing = self
            .store
            .find_one(id)
            .await?
            .ok_or_else(|| Self::not_found(id))?;

        let mut changes = ProductChanges {
            name: data.name,
            description: data.description,
            price: data.price.as_deref().map(Self::price).transpose()?,
            image: None,
        };

        if let Some(upload) = data.image {
            let url = self.upload_image(upload).await?;
            if let Some(old) = existing.image.as_deref() {
                self.discard_image(old).await;
            }
            changes.image = Some(url);
        }

        if changes.is_empty() {
            return Ok(existing);
        }

        let product = self
            .store
            .update(id, changes)
            .await?
            .ok_or_else(|| Self::not_found(id))?;

        info!(request_id = %ctx.request_id, product_id = id, "product updated");
        Ok(product)
    }

    async fn remove(&self, ctx: &RequestContext, id: &str, _params: CatalogParams) -> Result<Product> {
        let id = Self::parse_id(id)?;
        let existing = self
            .store
            .find_one(id)
            .await?
            .ok_or_else(|| Self::not_found(id))?;

        if let Some(url) = existing.image.as_deref() {
            self.discard_image(url).await;
        }

        let product = self
            .store
            .delete(id)
            .await?
            .ok_or_else(|| Self::not_found(id))?;

        info!(request_id = %ctx.request_id, product_id = id, "product removed");
        Ok(product)
    }
}
