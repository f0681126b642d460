use thiserror::Error;

use warden_registry::StorageError;

#[derive(Debug, Error)]
pub enum ApiServerError {
    #[error("invalid configuration {key}: {message}")]
    Config { key: &'static str, message: String },

    #[error("post-start hook \"{0}\" is already registered")]
    DuplicateHook(String),

    #[error("storage initialization failed: {0}")]
    Storage(#[from] StorageError),
}
