//! Domain errors

use thiserror::Error;

use super::frame::FrameError;
use crate::serializers::SerializerError;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Not found: {entity} with {field}={value}")]
    NotFound {
        entity: &'static str,
        field: &'static str,
        value: String,
    },

    #[error("{0}")]
    Validation(String),

    #[error("Already exists: {0}")]
    Conflict(String),

    #[error("Method \"{0}\" not allowed")]
    MethodNotAllowed(&'static str),

    #[error("{0}")]
    ReadOnly(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl DomainError {
    pub fn row_not_found(key: impl Into<String>) -> Self {
        Self::NotFound {
            entity: "row",
            field: "index",
            value: key.into(),
        }
    }

    pub fn dataset_not_found(name: impl Into<String>) -> Self {
        Self::NotFound {
            entity: "dataset",
            field: "name",
            value: name.into(),
        }
    }
}

impl From<SerializerError> for DomainError {
    fn from(e: SerializerError) -> Self {
        match e {
            SerializerError::ReadOnly(kind) => {
                Self::ReadOnly(format!("{} serializer is read-only", kind))
            }
            other => Self::Validation(other.to_string()),
        }
    }
}

impl From<FrameError> for DomainError {
    fn from(e: FrameError) -> Self {
        match e {
            FrameError::LabelNotFound(label) => Self::row_not_found(label.to_string()),
            FrameError::DuplicateLabel(label) => Self::Conflict(format!("row {}", label)),
            other => Self::Validation(other.to_string()),
        }
    }
}

/// Result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;
