//! Reading `multipart/form-data` bodies with per-file and whole-body limits.
//!
//! Text parts end up in [`FormData::fields`], file parts in
//! [`FormData::files`]. Oversized parts are a `PayloadTooLarge`, file parts
//! with a content type outside the allow-list are a `BadRequest`.

use std::collections::{HashMap, HashSet};

use axum::body::Body;
use axum::http::HeaderMap;
use bytes::Bytes;
use catalog_core::CatalogError;
use multer::{Constraints, Multipart, SizeLimit};

pub const DISALLOWED_TYPE_MESSAGE: &str = "Only image files are allowed!";

#[derive(Debug, Clone)]
pub struct MultipartConfig {
    /// Per file part, in bytes.
    pub max_file_size: Option<u64>,
    /// Whole body, in bytes.
    pub max_total_size: Option<u64>,
    /// Accepted file content types (empty = anything).
    pub allowed_content_types: HashSet<String>,
    /// Field names that may carry files (empty = any field with a filename).
    pub file_fields: HashSet<String>,
}

impl Default for MultipartConfig {
    fn default() -> Self {
        Self {
            max_file_size: Some(5 * 1024 * 1024),
            max_total_size: Some(10 * 1024 * 1024),
            allowed_content_types: HashSet::new(),
            file_fields: HashSet::new(),
        }
    }
}

impl MultipartConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_file_size(mut self, size: u64) -> Self {
        self.max_file_size = Some(size);
        self
    }

    pub fn max_total_size(mut self, size: u64) -> Self {
        self.max_total_size = Some(size);
        self
    }

    pub fn allow_content_type(mut self, content_type: &str) -> Self {
        self.allowed_content_types.insert(content_type.to_ascii_lowercase());
        self
    }

    pub fn allow_content_types<'a>(mut self, types: impl IntoIterator<Item = &'a str>) -> Self {
        for ct in types {
            self = self.allow_content_type(ct);
        }
        self
    }

    pub fn file_field(mut self, field_name: &str) -> Self {
        self.file_fields.insert(field_name.to_string());
        self
    }

    fn is_file_field(&self, name: &str, has_filename: bool) -> bool {
        if self.file_fields.is_empty() {
            has_filename
        } else {
            self.file_fields.contains(name)
        }
    }

    fn allows(&self, content_type: &str) -> bool {
        self.allowed_content_types.is_empty()
            || self.allowed_content_types.contains(&content_type.to_ascii_lowercase())
    }

    fn constraints(&self) -> Constraints {
        let mut limit = SizeLimit::new();
        if let Some(total) = self.max_total_size {
            limit = limit.whole_stream(total);
        }
        if let Some(per_file) = self.max_file_size {
            for field in &self.file_fields {
                limit = limit.for_field(field.clone(), per_file);
            }
        }
        Constraints::new().size_limit(limit)
    }
}

#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub field: String,
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub data: Bytes,
}

#[derive(Debug, Clone, Default)]
pub struct FormData {
    pub fields: HashMap<String, String>,
    pub files: Vec<UploadedFile>,
}

impl FormData {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(|s| s.as_str())
    }

    pub fn file(&self, field: &str) -> Option<&UploadedFile> {
        self.files.iter().find(|f| f.field == field)
    }

    pub fn take_file(&mut self, field: &str) -> Option<UploadedFile> {
        let idx = self.files.iter().position(|f| f.field == field)?;
        Some(self.files.remove(idx))
    }
}

pub fn is_multipart(headers: &HeaderMap) -> bool {
    headers
        .get(axum::http::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.to_ascii_lowercase().starts_with("multipart/form-data"))
}

fn map_multer_error(err: multer::Error) -> CatalogError {
    match err {
        multer::Error::FieldSizeExceeded { limit, field_name } => CatalogError::payload_too_large(
            format!(
                "File '{}' exceeds the maximum size of {limit} bytes",
                field_name.unwrap_or_default()
            ),
        ),
        multer::Error::StreamSizeExceeded { limit } => {
            CatalogError::payload_too_large(format!("Request body exceeds {limit} bytes"))
        }
        other => CatalogError::bad_request(format!("Failed to parse multipart data: {other}")),
    }
}

/// Read a whole multipart body into memory, enforcing `config`.
pub async fn read_multipart(
    headers: &HeaderMap,
    body: Body,
    config: &MultipartConfig,
) -> Result<FormData, CatalogError> {
    let content_type = headers
        .get(axum::http::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    let boundary = multer::parse_boundary(content_type)
        .map_err(|_| CatalogError::bad_request("Missing boundary in multipart content-type"))?;

    let mut multipart =
        Multipart::with_constraints(body.into_data_stream(), boundary, config.constraints());
    let mut form = FormData::default();

    while let Some(mut field) = multipart.next_field().await.map_err(map_multer_error)? {
        let name = field.name().unwrap_or_default().to_string();
        let filename = field.file_name().map(str::to_string);

        if !config.is_file_field(&name, filename.is_some()) {
            if filename.is_some() {
                return Err(CatalogError::bad_request(format!("Unexpected file field '{name}'")));
            }
            let value = field.text().await.map_err(map_multer_error)?;
            form.fields.insert(name, value);
            continue;
        }

        let content_type = field
            .content_type()
            .map(|m| m.essence_str().to_string())
            .unwrap_or_else(|| "application/octet-stream".to_string());

        let mut data = Vec::new();
        while let Some(chunk) = field.chunk().await.map_err(map_multer_error)? {
            data.extend_from_slice(&chunk);
            if let Some(max) = config.max_file_size {
                if data.len() as u64 > max {
                    return Err(CatalogError::payload_too_large(format!(
                        "File '{name}' exceeds the maximum size of {max} bytes"
                    )));
                }
            }
        }

        // browsers send an empty part when no file was chosen
        if data.is_empty() && filename.as_deref().unwrap_or_default().is_empty() {
            continue;
        }

        if !config.allows(&content_type) {
            let mut errors = serde_json::Map::new();
            errors.insert(
                name,
                serde_json::json!([format!("content type '{content_type}' is not accepted")]),
            );
            return Err(CatalogError::bad_request(DISALLOWED_TYPE_MESSAGE)
                .with_errors(serde_json::Value::Object(errors)));
        }

        form.files.push(UploadedFile {
            field: name,
            filename,
            content_type: Some(content_type),
            data: Bytes::from(data),
        });
    }

    Ok(form)
}
