//! Internal helpers for document conversion and validation.
//!
//! These utilities are **not** part of the public API. They centralize
//! validation and mapping logic so the engine enforces consistent invariants.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::store::StoreError;
use crate::{EngineError, ResultEngine};

/// Serialize an entity into its document form.
pub(crate) fn to_doc<T: Serialize>(value: &T) -> ResultEngine<Value> {
    serde_json::to_value(value)
        .map_err(|err| EngineError::Store(StoreError::Serde(err.to_string())))
}

/// Deserialize a stored document, labeling the entity on failure.
pub(crate) fn from_doc<T: DeserializeOwned>(doc: Value, label: &str) -> ResultEngine<T> {
    serde_json::from_value(doc)
        .map_err(|err| EngineError::Store(StoreError::Serde(format!("{label}: {err}"))))
}

/// Trim a required text field, rejecting empty values.
pub(crate) fn require_text(value: &str, label: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::InvalidField(format!(
            "{label} must not be empty"
        )));
    }
    Ok(trimmed.to_string())
}

/// Trim an optional text field, mapping blank to `None`.
pub(crate) fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

/// Map a store insert error, turning id conflicts into `AlreadyExists`.
pub(crate) fn map_insert_err(err: StoreError, label: &str) -> EngineError {
    match err {
        StoreError::Conflict(_) => EngineError::AlreadyExists(label.to_string()),
        other => EngineError::Store(other),
    }
}
