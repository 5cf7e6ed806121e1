use serde_json::Value;

use super::{expect_object, FrameSerializer, SerializerError, SerializerKind};
use crate::domain::DataFrame;

/// Column name to list of values
pub struct ColumnsSerializer;

impl FrameSerializer for ColumnsSerializer {
    fn kind(&self) -> SerializerKind {
        SerializerKind::Columns
    }

    fn to_representation(&self, frame: &DataFrame) -> Value {
        Value::Object(frame.to_columns())
    }

    fn to_internal_value(&self, data: Value) -> Result<DataFrame, SerializerError> {
        let map = expect_object(data)?;
        Ok(DataFrame::from_columns(&map)?)
    }

    fn carries_index(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_positional_columns() {
        let frame = ColumnsSerializer
            .to_internal_value(json!({"name": ["a", "b"], "score": [1, 2]}))
            .unwrap();
        assert_eq!(frame.len(), 2);
        assert_eq!(
            ColumnsSerializer.to_representation(&frame),
            json!({"name": ["a", "b"], "score": [1, 2]})
        );
    }

    #[test]
    fn ragged_input_is_invalid() {
        let err = ColumnsSerializer
            .to_internal_value(json!({"name": ["a", "b"], "score": [1]}))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "non_field_errors: arrays must all be same length"
        );
    }

    #[test]
    fn non_object_is_invalid() {
        assert!(matches!(
            ColumnsSerializer.to_internal_value(json!([1, 2])),
            Err(SerializerError::Invalid(_))
        ));
    }
}
