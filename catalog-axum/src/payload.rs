//! Turning request bodies into service payloads.
//!
//! JSON bodies, urlencoded forms and multipart forms all end up in a type
//! implementing [`FromRestPayload`].

use std::collections::HashMap;

use axum::body::Body;
use axum::extract::{FromRequest, Request};
use axum::http::header::CONTENT_TYPE;
use axum::Form;
use catalog_core::{CatalogError, FieldErrors};
use serde_json::{Map, Value};

use crate::middlewares::multipart::{is_multipart, read_multipart, FormData, MultipartConfig};

pub trait FromRestPayload: Sized + Send {
    fn from_json(value: Value) -> anyhow::Result<Self>;

    fn from_form(form: FormData) -> anyhow::Result<Self>;
}

/// Plain JSON values take form fields as strings; files are described, not
/// embedded.
impl FromRestPayload for Value {
    fn from_json(value: Value) -> anyhow::Result<Self> {
        Ok(value)
    }

    fn from_form(form: FormData) -> anyhow::Result<Self> {
        let mut map: Map<String, Value> = form
            .fields
            .into_iter()
            .map(|(k, v)| (k, Value::String(v)))
            .collect();
        for file in form.files {
            map.insert(
                file.field.clone(),
                serde_json::json!({
                    "filename": file.filename,
                    "contentType": file.content_type,
                    "size": file.data.len(),
                }),
            );
        }
        Ok(Value::Object(map))
    }
}

fn schema_error(message: &str, detail: impl Into<String>) -> CatalogError {
    let mut errors = FieldErrors::new();
    errors.push_schema(detail);
    CatalogError::bad_request(message).with_errors(errors.into_value())
}

fn content_type(req: &Request) -> String {
    req.headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_ascii_lowercase()
}

async fn read_json(body: Body, limit: usize) -> Result<Value, CatalogError> {
    let bytes = axum::body::to_bytes(body, limit)
        .await
        .map_err(|e| CatalogError::payload_too_large(format!("Failed to read request body: {e}")))?;

    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Object(Map::new()));
    }

    serde_json::from_slice(&bytes)
        .map_err(|e| schema_error("Failed to parse the request body as JSON", e.to_string()))
}

/// Parse the body by content type and hand it to `D`.
pub async fn read_payload<D: FromRestPayload>(
    req: Request,
    config: &MultipartConfig,
) -> anyhow::Result<D> {
    let ct = content_type(&req);
    let limit = config
        .max_total_size
        .and_then(|n| usize::try_from(n).ok())
        .unwrap_or(usize::MAX);

    if is_multipart(req.headers()) {
        let (parts, body) = req.into_parts();
        let form = read_multipart(&parts.headers, body, config).await?;
        return D::from_form(form);
    }

    if ct.starts_with("application/x-www-form-urlencoded") {
        let Form(fields) = Form::<HashMap<String, String>>::from_request(req, &())
            .await
            .map_err(|e| schema_error("Failed to parse the form body", e.body_text()))?;
        return D::from_form(FormData {
            fields,
            files: Vec::new(),
        });
    }

    if !ct.is_empty() && !ct.starts_with("application/json") {
        return Err(CatalogError::bad_request(format!("Unsupported content type '{ct}'")).into_anyhow());
    }

    let value = read_json(req.into_body(), limit).await?;
    D::from_json(value)
}
