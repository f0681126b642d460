//! Field-level validation error model.

use core::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Dotted path to the offending field (e.g. `metadata.name`, `rules[0].verbs`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldPath(String);

impl FieldPath {
    pub fn new(root: impl Into<String>) -> Self {
        Self(root.into())
    }

    /// Descend into a named child field.
    pub fn child(&self, name: &str) -> Self {
        if self.0.is_empty() {
            Self(name.to_string())
        } else {
            Self(format!("{}.{}", self.0, name))
        }
    }

    /// Descend into a list element.
    pub fn index(&self, idx: usize) -> Self {
        Self(format!("{}[{}]", self.0, idx))
    }

    /// Descend into a map entry.
    pub fn key(&self, key: &str) -> Self {
        Self(format!("{}[{}]", self.0, key))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldErrorKind {
    /// A required field was left empty.
    Required,
    /// A value was malformed.
    Invalid,
    /// A value may not be set (or changed) by the client.
    Forbidden,
    /// A value exceeded its maximum length/size.
    TooLong,
    /// A collection exceeded its maximum number of entries.
    TooMany,
    /// A value is not one of the supported choices.
    NotSupported,
}

impl fmt::Display for FieldErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FieldErrorKind::Required => "Required value",
            FieldErrorKind::Invalid => "Invalid value",
            FieldErrorKind::Forbidden => "Forbidden",
            FieldErrorKind::TooLong => "Too long",
            FieldErrorKind::TooMany => "Too many",
            FieldErrorKind::NotSupported => "Unsupported value",
        };
        f.write_str(s)
    }
}

/// A single structured validation failure.
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{field}: {kind}: {detail}")]
pub struct FieldError {
    pub kind: FieldErrorKind,
    pub field: FieldPath,
    pub detail: String,
}

impl FieldError {
    pub fn required(field: FieldPath, detail: impl Into<String>) -> Self {
        Self { kind: FieldErrorKind::Required, field, detail: detail.into() }
    }

    pub fn invalid(field: FieldPath, detail: impl Into<String>) -> Self {
        Self { kind: FieldErrorKind::Invalid, field, detail: detail.into() }
    }

    pub fn forbidden(field: FieldPath, detail: impl Into<String>) -> Self {
        Self { kind: FieldErrorKind::Forbidden, field, detail: detail.into() }
    }

    pub fn too_long(field: FieldPath, max: usize) -> Self {
        Self {
            kind: FieldErrorKind::TooLong,
            field,
            detail: format!("must have at most {max} bytes"),
        }
    }

    pub fn too_many(field: FieldPath, actual: usize, max: usize) -> Self {
        Self {
            kind: FieldErrorKind::TooMany,
            field,
            detail: format!("{actual}: must have at most {max} items"),
        }
    }

    pub fn not_supported(field: FieldPath, value: &str, supported: &[&str]) -> Self {
        Self {
            kind: FieldErrorKind::NotSupported,
            field,
            detail: format!("\"{value}\": supported values: {}", supported.join(", ")),
        }
    }
}

/// Ordered collection of field errors. Empty means "valid".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ErrorList(Vec<FieldError>);

impl ErrorList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, err: FieldError) {
        self.0.push(err);
    }

    pub fn extend(&mut self, other: ErrorList) {
        self.0.extend(other.0);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }

    /// `Ok(())` if empty, otherwise the list itself as the error.
    pub fn into_result(self) -> Result<(), ErrorList> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl From<FieldError> for ErrorList {
    fn from(value: FieldError) -> Self {
        Self(vec![value])
    }
}

impl FromIterator<FieldError> for ErrorList {
    fn from_iter<I: IntoIterator<Item = FieldError>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for ErrorList {
    type Item = FieldError;
    type IntoIter = std::vec::IntoIter<FieldError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl fmt::Display for ErrorList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|e| e.to_string()).collect();
        write!(f, "[{}]", parts.join(", "))
    }
}

impl std::error::Error for ErrorList {}
