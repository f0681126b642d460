use thiserror::Error;

use warden_core::{ErrorList, ObjectKey};

/// Storage operation error.
///
/// These are **infrastructure errors** (missing objects, name clashes,
/// optimistic concurrency, unreachable backend) plus structured validation
/// failures raised by REST strategies before anything is written.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StorageError {
    #[error("{resource} \"{key}\" not found")]
    NotFound { resource: &'static str, key: ObjectKey },

    #[error("{resource} \"{key}\" already exists")]
    AlreadyExists { resource: &'static str, key: ObjectKey },

    #[error("operation cannot be fulfilled on {resource} \"{key}\": {message}")]
    Conflict {
        resource: &'static str,
        key: ObjectKey,
        message: String,
    },

    #[error("{resource} \"{name}\" is invalid: {errors}")]
    Invalid {
        resource: &'static str,
        name: String,
        errors: ErrorList,
    },

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

impl StorageError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound { .. })
    }

    pub fn is_already_exists(&self) -> bool {
        matches!(self, StorageError::AlreadyExists { .. })
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, StorageError::Conflict { .. })
    }

    pub(crate) fn poisoned() -> Self {
        StorageError::Unavailable("lock poisoned".to_string())
    }
}
