//! catalog-server: the product catalog backend.
//!
//! [`build`] reads configuration, picks record and media backends and
//! returns an [`AxumApp`] ready to listen. [`build_with`] takes the backends
//! explicitly, which is what the tests use.

pub mod config;
pub mod hooks;
pub mod services;

use std::sync::Arc;

use anyhow::Result;
use catalog_axum::{axum, AxumApp};
use catalog_core::CatalogApp;
use catalog_media::{CloudinaryStore, MediaStore, MemoryMediaStore};
use tracing::{info, warn};

use crate::config::ServerSettings;
use crate::services::adapters::{MemoryProductStore, ProductStore};
use crate::services::products::{products_shared, ProductsService};
use crate::services::{uploads, CatalogParams, Product, ProductPayload};

pub type CatalogServerApp = CatalogApp<Product, ProductPayload, CatalogParams>;
pub type CatalogAxumApp = AxumApp<Product, ProductPayload, CatalogParams>;

/// Where products and their images are kept.
#[derive(Clone)]
pub struct Backends {
    pub products: Arc<dyn ProductStore>,
    pub media: Arc<dyn MediaStore>,
}

impl Backends {
    pub fn in_memory() -> Self {
        Self {
            products: Arc::new(MemoryProductStore::new()),
            media: Arc::new(MemoryMediaStore::new()),
        }
    }

    /// PostgreSQL when a database URL is set, Cloudinary when credentials
    /// are complete; in-memory stand-ins otherwise.
    pub async fn from_settings(settings: &ServerSettings) -> Result<Self> {
        let products: Arc<dyn ProductStore> = match settings.database_url.as_deref() {
            Some(url) => connect_products(url, settings.database_max_connections).await?,
            None => {
                warn!("DATABASE_URL not set, products are kept in memory");
                Arc::new(MemoryProductStore::new())
            }
        };

        let media: Arc<dyn MediaStore> = if settings.media.is_configured() {
            Arc::new(CloudinaryStore::new(settings.media.clone()))
        } else {
            warn!("Cloudinary credentials not set, images are kept in memory");
            Arc::new(MemoryMediaStore::new())
        };

        info!(media = media.backend_name(), "backends ready");
        Ok(Self { products, media })
    }
}

#[cfg(feature = "postgres")]
async fn connect_products(url: &str, max_connections: u32) -> Result<Arc<dyn ProductStore>> {
    let store = services::adapters::PgProductStore::connect(url, max_connections).await?;
    info!("products are kept in PostgreSQL");
    Ok(Arc::new(store))
}

#[cfg(not(feature = "postgres"))]
async fn connect_products(_url: &str, _max_connections: u32) -> Result<Arc<dyn ProductStore>> {
    anyhow::bail!("DATABASE_URL is set but this build has no PostgreSQL support (feature `postgres`)")
}

/// Configure from the environment and wire the real backends.
pub async fn build() -> Result<CatalogAxumApp> {
    let app = CatalogServerApp::new();
    config::load(&app);

    let settings = ServerSettings::from_app(&app)?;
    let backends = Backends::from_settings(&settings).await?;
    build_with(app, backends)
}

/// Mount products, the upload endpoint and `/health` under `http.prefix`.
pub fn build_with(app: CatalogServerApp, backends: Backends) -> Result<CatalogAxumApp> {
    config::defaults(&app);
    let settings = ServerSettings::from_app(&app)?;
    hooks::global_hooks(&app);

    let prefix = settings.prefix.as_str();
    let products = ProductsService::new(backends.products, Arc::clone(&backends.media))
        .with_folder(settings.media_folder.clone());

    let ax = axum(app)
        .body_limit(usize::try_from(settings.body_limit_bytes).unwrap_or(usize::MAX))
        .use_service_with(
            &format!("{prefix}/products"),
            Arc::new(products),
            products_shared::multipart_config(settings.max_file_bytes, settings.body_limit_bytes),
        )?;
    products_shared::register_hooks(&ax.app)?;

    let uploads = uploads::router(
        &format!("{prefix}/upload/image"),
        backends.media,
        &settings.media_folder,
        settings.max_file_bytes,
        settings.body_limit_bytes,
    );

    Ok(ax
        .use_router("", uploads)
        .use_get(&format!("{prefix}/health"), || async { "ok" }))
}
