//! Field-level validation errors.
//!
//! [`FieldErrors`] collects `field -> [messages]` pairs and turns them into a
//! `BadRequest` carrying the map in `errors`. `validator` results are
//! flattened into the same shape (`profile.name`, `tags[0].email`).

use serde_json::{Map, Value};
use validator::{Validate, ValidationErrors, ValidationErrorsKind};

use crate::errors::CatalogError;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldErrors {
    map: Map<String, Value>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Error not tied to one field (unparseable body and the like).
    pub fn push_schema(&mut self, msg: impl Into<String>) {
        self.push_field("_schema", msg);
    }

    pub fn push_field(&mut self, field: &str, msg: impl Into<String>) {
        let msg = Value::String(msg.into());
        match self.map.get_mut(field) {
            Some(Value::Array(arr)) => arr.push(msg),
            _ => {
                self.map.insert(field.to_string(), Value::Array(vec![msg]));
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.map.contains_key(field)
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.map)
    }

    pub fn into_bad_request(self, message: &str) -> anyhow::Error {
        CatalogError::bad_request(message)
            .with_errors(self.into_value())
            .into_anyhow()
    }

    /// `Ok(())` when empty, otherwise the collected errors as a `BadRequest`.
    pub fn into_result(self, message: &str) -> anyhow::Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self.into_bad_request(message))
        }
    }
}

impl From<&ValidationErrors> for FieldErrors {
    fn from(errs: &ValidationErrors) -> Self {
        let mut out = FieldErrors::new();
        push_validation_errors(&mut out, "", errs);
        out
    }
}

fn friendly_message(code: &str) -> Option<&'static str> {
    match code {
        "required" => Some("is required"),
        "length" => Some("has invalid length"),
        "range" => Some("is out of range"),
        "url" => Some("must be a valid URL"),
        _ => None,
    }
}

fn join_path(prefix: &str, field: &str) -> String {
    if prefix.is_empty() {
        field.to_string()
    } else {
        format!("{prefix}.{field}")
    }
}

fn push_validation_errors(out: &mut FieldErrors, prefix: &str, errs: &ValidationErrors) {
    for (field, kind) in errs.errors() {
        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                let key = join_path(prefix, field);
                for e in field_errors {
                    let msg = e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .or_else(|| friendly_message(&e.code).map(|m| format!("{key} {m}")))
                        .unwrap_or_else(|| e.code.to_string());
                    out.push_field(&key, msg);
                }
            }
            ValidationErrorsKind::Struct(nested) => {
                let next = join_path(prefix, field);
                push_validation_errors(out, &next, nested.as_ref());
            }
            ValidationErrorsKind::List(list) => {
                let base = join_path(prefix, field);
                for (idx, nested) in list {
                    let next = format!("{base}[{idx}]");
                    push_validation_errors(out, &next, nested.as_ref());
                }
            }
        }
    }
}

/// Run `validator` rules, mapping failures to a `BadRequest`.
pub fn validate<T: Validate>(value: &T, message: &str) -> anyhow::Result<()> {
    value
        .validate()
        .map_err(|e| FieldErrors::from(&e).into_bad_request(message))
}
