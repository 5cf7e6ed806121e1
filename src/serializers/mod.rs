//! Table serializers
//!
//! A serializer converts a [`DataFrame`] to its wire representation and
//! validates incoming JSON back into a frame.
//!
//! | Kind | Representation |
//! |------|----------------|
//! | `records` | `{"records": [{column: value}, ...]}` (read-only) |
//! | `columns` | `{column: [value, ...]}` |
//! | `index`   | `{"label": {column: value}}` |
//! | `split`   | `{"columns": ["index", ...], "data": [[label, ...], ...]}` |

mod columns;
mod index;
mod records;
mod split;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use utoipa::ToSchema;

use crate::domain::{DataFrame, FrameError};

pub use columns::ColumnsSerializer;
pub use index::IndexSerializer;
pub use records::RecordsSerializer;
pub use split::SplitSerializer;

/// Key used for errors that do not belong to a single field
pub const NON_FIELD_ERRORS_KEY: &str = "non_field_errors";

#[derive(Debug, Error, PartialEq)]
pub enum SerializerError {
    #[error("{} serializer is read-only", .0)]
    ReadOnly(SerializerKind),

    #[error("non_field_errors: {0}")]
    Invalid(String),

    #[error("{field}: {message}")]
    Field { field: String, message: String },
}

impl From<FrameError> for SerializerError {
    fn from(e: FrameError) -> Self {
        Self::Invalid(e.to_string())
    }
}

/// Converts between a table and its wire form
pub trait FrameSerializer: Send + Sync {
    fn kind(&self) -> SerializerKind;

    fn to_representation(&self, frame: &DataFrame) -> Value;

    fn to_internal_value(&self, data: Value) -> Result<DataFrame, SerializerError>;

    /// Whether incoming data names its own row labels.
    ///
    /// Frames from serializers that return `false` are relabeled on create.
    fn carries_index(&self) -> bool {
        true
    }
}

/// Serializer selector used in configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SerializerKind {
    Records,
    #[serde(alias = "list")]
    Columns,
    Index,
    Split,
}

impl SerializerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Records => "records",
            Self::Columns => "columns",
            Self::Index => "index",
            Self::Split => "split",
        }
    }

    pub fn build(self) -> Arc<dyn FrameSerializer> {
        match self {
            Self::Records => Arc::new(RecordsSerializer),
            Self::Columns => Arc::new(ColumnsSerializer),
            Self::Index => Arc::new(IndexSerializer),
            Self::Split => Arc::new(SplitSerializer),
        }
    }
}

impl fmt::Display for SerializerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SerializerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "records" => Ok(Self::Records),
            "columns" | "list" => Ok(Self::Columns),
            "index" => Ok(Self::Index),
            "split" => Ok(Self::Split),
            other => Err(format!("unknown serializer '{}'", other)),
        }
    }
}

/// Flatten `validator` errors into `field: message; ...`
pub(crate) fn validation_message(errors: &validator::ValidationErrors) -> String {
    let mut messages = Vec::new();
    collect_messages("", errors, &mut messages);
    messages.sort();

    if messages.is_empty() {
        "Validation failed".to_string()
    } else {
        messages.join("; ")
    }
}

fn collect_messages(prefix: &str, errors: &validator::ValidationErrors, out: &mut Vec<String>) {
    use validator::ValidationErrorsKind;

    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{}.{}", prefix, field)
        };
        match kind {
            ValidationErrorsKind::Field(errs) => out.extend(errs.iter().map(|e| {
                let msg = e
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| e.code.to_string());
                format!("{}: {}", path, msg)
            })),
            ValidationErrorsKind::Struct(inner) => collect_messages(&path, inner, out),
            ValidationErrorsKind::List(items) => {
                for (i, inner) in items {
                    collect_messages(&format!("{}[{}]", path, i), inner, out);
                }
            }
        }
    }
}

fn expect_object(data: Value) -> Result<serde_json::Map<String, Value>, SerializerError> {
    match data {
        Value::Object(map) => Ok(map),
        other => Err(SerializerError::Invalid(format!(
            "Expected a dictionary of items but got type \"{}\"",
            json_type(&other)
        ))),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "str",
        Value::Array(_) => "list",
        Value::Object(_) => "dict",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_parses_aliases() {
        assert_eq!("list".parse::<SerializerKind>().unwrap(), SerializerKind::Columns);
        assert_eq!("Split".parse::<SerializerKind>().unwrap(), SerializerKind::Split);
        assert!("csv".parse::<SerializerKind>().is_err());
    }

    #[test]
    fn invalid_error_names_non_field_key() {
        let err = SerializerError::Invalid("bad shape".into());
        assert_eq!(err.to_string(), format!("{}: bad shape", NON_FIELD_ERRORS_KEY));
    }

    #[test]
    fn built_serializer_reports_kind() {
        for kind in [
            SerializerKind::Records,
            SerializerKind::Columns,
            SerializerKind::Index,
            SerializerKind::Split,
        ] {
            assert_eq!(kind.build().kind(), kind);
        }
    }
}
