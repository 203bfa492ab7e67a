//! Domain error model.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Callers branch on the variant, never on the rendered message.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// One or more form fields failed validation.
    #[error("validation failed: {0}")]
    Validation(FieldErrors),

    /// A requested product does not exist.
    #[error("not found")]
    NotFound,

    /// A sale was requested for a zero or negative quantity.
    #[error("invalid quantity: {0}")]
    InvalidQuantity(i64),

    /// A sale asked for more units than are in stock.
    #[error("insufficient stock (requested: {requested}, available: {available})")]
    InsufficientStock { requested: i64, available: i64 },

    /// The stored state changed since it was loaded (optimistic concurrency).
    #[error("conflict: {0}")]
    Conflict(String),

    /// The backing store failed.
    #[error("persistence error: {0}")]
    Persistence(String),
}

impl DomainError {
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }
}

/// Per-field validation messages, keyed by form field name.
///
/// Ordered by field name so rendering and serialization are deterministic.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Convenience constructor for a single failing field.
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.insert(field, message);
        errors
    }

    /// Record a message for `field`. A later message for the same field replaces the earlier one.
    pub fn insert(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.insert(field.into(), message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl core::fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let mut first = true;
        for (field, message) in self.iter() {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{field}: {message}")?;
            first = false;
        }
        Ok(())
    }
}

impl From<FieldErrors> for DomainError {
    fn from(value: FieldErrors) -> Self {
        DomainError::Validation(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_errors_collect_and_render_in_field_order() {
        let mut errors = FieldErrors::new();
        errors.insert("quantity", "expected a positive integer");
        errors.insert("name", "name is required");

        assert_eq!(errors.len(), 2);
        assert_eq!(errors.get("name"), Some("name is required"));
        assert_eq!(
            errors.to_string(),
            "name: name is required; quantity: expected a positive integer"
        );
    }

    #[test]
    fn field_errors_serialize_as_flat_object() {
        let errors = FieldErrors::single("sell_price", "expected a positive integer");
        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(json["sell_price"], "expected a positive integer");
    }
}
