use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use catalog_core::CatalogError;

#[derive(Debug)]
pub struct CatalogAxumError(pub anyhow::Error);

impl From<anyhow::Error> for CatalogAxumError {
    fn from(e: anyhow::Error) -> Self {
        Self(e)
    }
}

impl From<CatalogError> for CatalogAxumError {
    fn from(e: CatalogError) -> Self {
        Self(e.into_anyhow())
    }
}

impl IntoResponse for CatalogAxumError {
    fn into_response(self) -> Response {
        // context layers may wrap the CatalogError, look through them
        let safe = match CatalogError::find(&self.0) {
            Some(err) => err.sanitize_for_client(),
            None => CatalogError::general_error(self.0.to_string()),
        };

        if safe.kind.is_client_error() {
            tracing::debug!(code = safe.code(), message = %safe.message, "request rejected");
        } else {
            tracing::error!(code = safe.code(), error = ?self.0, "request failed");
        }

        let status = StatusCode::from_u16(safe.code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(safe.to_json())).into_response()
    }
}
