//! Field rules for product payloads.
//!
//! Text is trimmed before it is checked. On create a blank value counts as
//! missing; on patch a blank value is rejected, an absent one is left alone.

use catalog_core::FieldErrors;
use validator::Validate;

use crate::services::types::{parse_price, ProductPayload};

pub const VALIDATION_MESSAGE: &str = "Product validation failed";

#[derive(Debug, Validate)]
pub struct CreateProduct {
    #[validate(required(message = "name is required"))]
    pub name: Option<String>,

    #[validate(required(message = "description is required"))]
    pub description: Option<String>,

    #[validate(required(message = "price is required"))]
    pub price: Option<String>,
}

#[derive(Debug, Validate)]
pub struct PatchProduct {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: Option<String>,

    #[validate(length(min = 1, message = "description must not be empty"))]
    pub description: Option<String>,

    #[validate(length(min = 1, message = "price must not be empty"))]
    pub price: Option<String>,
}

fn trimmed(value: Option<&String>) -> Option<String> {
    value.map(|s| s.trim().to_string())
}

fn present(value: Option<&String>) -> Option<String> {
    trimmed(value).filter(|s| !s.is_empty())
}

impl CreateProduct {
    pub fn from_payload(payload: &ProductPayload) -> Self {
        Self {
            name: present(payload.name.as_ref()),
            description: present(payload.description.as_ref()),
            price: present(payload.price.as_ref()),
        }
    }
}

impl PatchProduct {
    pub fn from_payload(payload: &ProductPayload) -> Self {
        Self {
            name: trimmed(payload.name.as_ref()),
            description: trimmed(payload.description.as_ref()),
            price: trimmed(payload.price.as_ref()),
        }
    }
}

fn collect<T: Validate>(schema: &T) -> FieldErrors {
    match schema.validate() {
        Ok(()) => FieldErrors::new(),
        Err(e) => FieldErrors::from(&e),
    }
}

fn check_price(errors: &mut FieldErrors, price: Option<&str>) {
    if let Some(raw) = price.filter(|s| !s.is_empty()) {
        if parse_price(raw).is_none() {
            errors.push_field("price", "price must be a number");
        }
    }
}

pub fn check_create(payload: &ProductPayload) -> anyhow::Result<()> {
    let schema = CreateProduct::from_payload(payload);
    let mut errors = collect(&schema);
    check_price(&mut errors, schema.price.as_deref());
    errors.into_result(VALIDATION_MESSAGE)
}

pub fn check_patch(payload: &ProductPayload) -> anyhow::Result<()> {
    let schema = PatchProduct::from_payload(payload);
    let mut errors = collect(&schema);
    check_price(&mut errors, schema.price.as_deref());
    errors.into_result(VALIDATION_MESSAGE)
}

/// Trim the text fields in place.
pub fn normalize(payload: &mut ProductPayload) {
    for field in [&mut payload.name, &mut payload.description, &mut payload.price] {
        if let Some(value) = field.as_mut() {
            let t = value.trim();
            if t.len() != value.len() {
                *value = t.to_string();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog_core::CatalogError;

    fn payload(name: Option<&str>, description: Option<&str>, price: Option<&str>) -> ProductPayload {
        ProductPayload {
            name: name.map(str::to_string),
            description: description.map(str::to_string),
            price: price.map(str::to_string),
            image: None,
        }
    }

    fn field_errors(err: anyhow::Error) -> serde_json::Value {
        let err = CatalogError::find(&err).unwrap();
        assert_eq!(err.code(), 400);
        assert_eq!(err.message, VALIDATION_MESSAGE);
        err.errors.clone().unwrap()
    }

    #[test]
    fn create_requires_every_field() {
        let errors = field_errors(check_create(&payload(None, Some("  "), None)).unwrap_err());
        assert!(errors.get("name").is_some());
        assert!(errors.get("description").is_some());
        assert!(errors.get("price").is_some());

        assert!(check_create(&payload(Some("Lamp"), Some("Warm"), Some("19.99"))).is_ok());
    }

    #[test]
    fn create_rejects_non_numeric_prices() {
        let errors =
            field_errors(check_create(&payload(Some("Lamp"), Some("Warm"), Some("cheap"))).unwrap_err());
        assert_eq!(errors["price"][0], "price must be a number");
    }

    #[test]
    fn patch_allows_absent_fields_but_not_blank_ones() {
        assert!(check_patch(&payload(None, None, None)).is_ok());
        assert!(check_patch(&payload(Some("Desk"), None, None)).is_ok());

        let errors = field_errors(check_patch(&payload(Some(" "), None, Some("x"))).unwrap_err());
        assert_eq!(errors["name"][0], "name must not be empty");
        assert_eq!(errors["price"][0], "price must be a number");
    }

    #[test]
    fn normalize_trims_text() {
        let mut p = payload(Some(" Lamp "), Some("Warm"), Some(" 3 "));
        normalize(&mut p);
        assert_eq!(p.name.as_deref(), Some("Lamp"));
        assert_eq!(p.description.as_deref(), Some("Warm"));
        assert_eq!(p.price.as_deref(), Some("3"));
    }
}
