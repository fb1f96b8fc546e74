use std::any::Any;
use thiserror::Error;

/// Fallback message for failures that carry nothing displayable.
pub const UNKNOWN_ERROR: &str = "Unknown error";

#[derive(Error, Debug)]
pub enum ModelDataError {
    /// Caller-supplied index outside `0..len`. Raised before any storage call.
    #[error("Invalid index")]
    Validation { index: Option<usize>, len: usize },

    #[error("Failed to read collection '{name}': {reason}")]
    StorageRead { name: String, reason: String },

    #[error("Failed to write collection '{name}': {reason}")]
    StorageWrite { name: String, reason: String },

    #[error("Invalid collection name: {0:?}")]
    InvalidName(String),

    #[error("Malformed collection document: {0}")]
    Malformed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, ModelDataError>;

impl ModelDataError {
    pub fn read(name: &str, reason: impl Into<String>) -> Self {
        ModelDataError::StorageRead {
            name: name.to_string(),
            reason: reason.into(),
        }
    }

    pub fn write(name: &str, reason: impl Into<String>) -> Self {
        ModelDataError::StorageWrite {
            name: name.to_string(),
            reason: reason.into(),
        }
    }

    /// The underlying reason without the collection prefix, for status captions.
    pub fn reason(&self) -> String {
        match self {
            ModelDataError::StorageRead { reason, .. }
            | ModelDataError::StorageWrite { reason, .. } => reason.clone(),
            other => other.to_string(),
        }
    }
}

/// Produce a displayable message from an arbitrary failure value.
///
/// Checked in order:
/// 1. error values that carry a message (`ModelDataError`, `std::io::Error`,
///    boxed `dyn Error`, `anyhow::Error`)
/// 2. plain strings (`String`, `&str`), which is also what panic payloads are
/// 3. anything else maps to [`UNKNOWN_ERROR`]
pub fn failure_message(failure: &dyn Any) -> String {
    if let Some(err) = failure.downcast_ref::<ModelDataError>() {
        return err.reason();
    }
    if let Some(err) = failure.downcast_ref::<std::io::Error>() {
        return err.to_string();
    }
    if let Some(err) = failure.downcast_ref::<Box<dyn std::error::Error + Send + Sync>>() {
        return err.to_string();
    }
    if let Some(err) = failure.downcast_ref::<anyhow::Error>() {
        return err.to_string();
    }
    if let Some(s) = failure.downcast_ref::<String>() {
        return s.clone();
    }
    if let Some(s) = failure.downcast_ref::<&str>() {
        return (*s).to_string();
    }
    UNKNOWN_ERROR.to_string()
}
