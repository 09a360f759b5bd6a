//! `POST /upload/image`: push a single image to the media store and hand
//! back where it landed, without touching any product.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::routing::post;
use axum::{Json, Router};
use catalog_axum::middlewares::multipart::{is_multipart, read_multipart};
use catalog_axum::rest::method_not_allowed;
use catalog_axum::{CatalogAxumError, MultipartConfig};
use catalog_core::CatalogError;
use catalog_media::{MediaStore, MediaUpload};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::services::products::products_shared::{IMAGE_FIELD, IMAGE_TYPES};

pub const UPLOAD_TYPES: [&str; 1] = ["image/webp"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadReceipt {
    pub success: bool,
    pub url: String,
    pub public_id: String,
    pub message: String,
}

#[derive(Clone)]
struct UploadState {
    media: Arc<dyn MediaStore>,
    folder: Arc<str>,
    multipart: Arc<MultipartConfig>,
}

fn no_file() -> CatalogAxumError {
    CatalogError::bad_request("No file uploaded").into()
}

async fn upload_image(
    State(state): State<UploadState>,
    req: Request,
) -> Result<Json<UploadReceipt>, CatalogAxumError> {
    if !is_multipart(req.headers()) {
        return Err(no_file());
    }

    let (parts, body) = req.into_parts();
    let mut form = read_multipart(&parts.headers, body, &state.multipart).await?;
    let file = form.take_file(IMAGE_FIELD).ok_or_else(no_file)?;

    let mut upload = MediaUpload::new(file.data);
    if let Some(name) = file.filename {
        upload = upload.with_filename(name);
    }
    if let Some(ct) = file.content_type {
        upload = upload.with_content_type(ct);
    }

    let asset = state.media.upload(upload, &state.folder).await.map_err(|e| {
        CatalogError::bad_request(format!("Failed to upload image: {e}")).with_source(e)
    })?;

    info!(public_id = %asset.public_id, bytes = asset.bytes, "standalone image uploaded");
    Ok(Json(UploadReceipt {
        success: true,
        url: asset.url,
        public_id: asset.public_id,
        message: "Image uploaded successfully".to_string(),
    }))
}

/// Router serving the upload endpoint at `path`.
pub fn router(
    path: &str,
    media: Arc<dyn MediaStore>,
    folder: &str,
    max_file_bytes: u64,
    max_total_bytes: u64,
) -> Router<()> {
    let multipart = MultipartConfig::new()
        .max_file_size(max_file_bytes)
        .max_total_size(max_total_bytes)
        .file_field(IMAGE_FIELD)
        .allow_content_types(IMAGE_TYPES)
        .allow_content_types(UPLOAD_TYPES);

    let state = UploadState {
        media,
        folder: Arc::from(folder),
        multipart: Arc::new(multipart),
    };

    Router::new()
        .route(path, post(upload_image).fallback(method_not_allowed))
        .with_state(state)
}
