//! catalog-axum: Axum adapter for catalog services.
//!
//! [`AxumApp`] mounts a [`catalog_core::CatalogService`] as REST routes,
//! parses JSON and multipart bodies into service payloads, and maps
//! [`catalog_core::CatalogError`] to Feathers-style JSON responses.

pub mod app;
pub mod middlewares;
pub mod params;
pub mod payload;
pub mod rest;
pub mod state;
mod error;

pub use app::{axum, AxumApp};
pub use error::CatalogAxumError;
pub use middlewares::multipart::{FormData, MultipartConfig, UploadedFile};
pub use params::{FromRestParams, RestParams};
pub use payload::FromRestPayload;
pub use state::RestState;
