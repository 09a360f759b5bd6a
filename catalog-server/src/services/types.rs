use std::str::FromStr;

use catalog_axum::{FormData, FromRestPayload};
use catalog_core::{CatalogError, FieldErrors};
use catalog_media::MediaUpload;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub type CatalogParams = catalog_axum::RestParams;

const PAYLOAD_ERROR: &str = "Invalid product payload";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub description: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub image: Option<String>,
}

/// Row to insert; the store assigns the id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub image: Option<String>,
}

/// Partial update. `None` leaves the column alone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub image: Option<String>,
}

impl ProductChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.price.is_none()
            && self.image.is_none()
    }
}

/// Create/patch input as it came off the wire.
///
/// `price` keeps its textual form until validation; numbers from JSON are
/// rendered back to text so both transports coerce the same way.
#[derive(Debug, Clone, Default)]
pub struct ProductPayload {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<String>,
    pub image: Option<MediaUpload>,
}

/// Decimal from text, accepting plain and scientific notation.
pub fn parse_price(raw: &str) -> Option<Decimal> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .ok()
}

fn text_field(errors: &mut FieldErrors, key: &str, value: Option<&Value>) -> Option<String> {
    match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(_) => {
            errors.push_field(key, format!("{key} must be a string"));
            None
        }
    }
}

fn reject_text_image(errors: &mut FieldErrors, present: bool) {
    if present {
        errors.push_field("image", "image must be uploaded as a file");
    }
}

impl FromRestPayload for ProductPayload {
    fn from_json(value: Value) -> anyhow::Result<Self> {
        let Value::Object(obj) = value else {
            return Err(CatalogError::bad_request("Request body must be a JSON object").into_anyhow());
        };

        let mut errors = FieldErrors::new();
        let name = text_field(&mut errors, "name", obj.get("name"));
        let description = text_field(&mut errors, "description", obj.get("description"));
        let price = match obj.get("price") {
            None | Some(Value::Null) => None,
            Some(Value::Number(n)) => Some(n.to_string()),
            Some(Value::String(s)) => Some(s.clone()),
            Some(_) => {
                errors.push_field("price", "price must be a number");
                None
            }
        };
        reject_text_image(&mut errors, obj.get("image").is_some_and(|v| !v.is_null()));
        errors.into_result(PAYLOAD_ERROR)?;

        Ok(Self {
            name,
            description,
            price,
            image: None,
        })
    }

    fn from_form(mut form: FormData) -> anyhow::Result<Self> {
        let mut errors = FieldErrors::new();
        reject_text_image(&mut errors, form.fields.contains_key("image"));
        errors.into_result(PAYLOAD_ERROR)?;

        let image = form.take_file("image").map(|file| {
            let mut upload = MediaUpload::new(file.data);
            if let Some(name) = file.filename {
                upload = upload.with_filename(name);
            }
            if let Some(ct) = file.content_type {
                upload = upload.with_content_type(ct);
            }
            upload
        });

        Ok(Self {
            name: form.fields.remove("name"),
            description: form.fields.remove("description"),
            price: form.fields.remove("price"),
            image,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use catalog_axum::UploadedFile;
    use serde_json::json;

    #[test]
    fn price_accepts_plain_and_scientific_text() {
        assert_eq!(parse_price("19.99"), Some(Decimal::new(1999, 2)));
        assert_eq!(parse_price(" 5 "), Some(Decimal::new(5, 0)));
        assert_eq!(parse_price("1.5e2"), Some(Decimal::new(150, 0)));
        assert_eq!(parse_price("cheap"), None);
        assert_eq!(parse_price("   "), None);
    }

    #[test]
    fn json_numbers_and_strings_both_become_price_text() {
        let p = ProductPayload::from_json(json!({"name": "Lamp", "price": 12.5})).unwrap();
        assert_eq!(p.price.as_deref(), Some("12.5"));

        let p = ProductPayload::from_json(json!({"price": "7"})).unwrap();
        assert_eq!(p.price.as_deref(), Some("7"));
        assert!(p.name.is_none());
    }

    #[test]
    fn json_ignores_client_ids_and_rejects_textual_images() {
        let p = ProductPayload::from_json(json!({"id": 99, "name": "Lamp"})).unwrap();
        assert_eq!(p.name.as_deref(), Some("Lamp"));

        let err = ProductPayload::from_json(json!({"image": "http://elsewhere/x.png"})).unwrap_err();
        let err = CatalogError::find(&err).unwrap();
        assert_eq!(err.code(), 400);
        assert!(err.errors.as_ref().unwrap().get("image").is_some());
    }

    #[test]
    fn json_rejects_wrong_types() {
        let err = ProductPayload::from_json(json!({"name": 3, "price": true})).unwrap_err();
        let errors = CatalogError::find(&err).unwrap().errors.clone().unwrap();
        assert!(errors.get("name").is_some());
        assert!(errors.get("price").is_some());

        assert!(ProductPayload::from_json(json!([1, 2])).is_err());
    }

    #[test]
    fn form_takes_text_fields_and_the_image_file() {
        let mut form = FormData::default();
        form.fields.insert("name".into(), "Lamp".into());
        form.fields.insert("price".into(), "10".into());
        form.files.push(UploadedFile {
            field: "image".into(),
            filename: Some("lamp.png".into()),
            content_type: Some("image/png".into()),
            data: Bytes::from_static(b"png"),
        });

        let p = ProductPayload::from_form(form).unwrap();
        assert_eq!(p.name.as_deref(), Some("Lamp"));
        assert_eq!(p.price.as_deref(), Some("10"));
        let image = p.image.unwrap();
        assert_eq!(image.filename.as_deref(), Some("lamp.png"));
        assert_eq!(image.extension().as_deref(), Some("png"));
    }

    #[test]
    fn product_price_serializes_as_a_number() {
        let product = Product {
            id: 1,
            name: "Lamp".into(),
            description: "Warm".into(),
            price: Decimal::new(1999, 2),
            image: None,
        };
        let v = serde_json::to_value(&product).unwrap();
        assert_eq!(v["price"], json!(19.99));
        assert!(v["image"].is_null());
    }
}
