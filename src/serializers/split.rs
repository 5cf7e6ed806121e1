use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use validator::Validate;

use super::{validation_message, FrameSerializer, SerializerError, SerializerKind};
use crate::domain::DataFrame;

/// Wire form of the split orientation
#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
#[schema(example = json!({
    "columns": ["index", "city", "population"],
    "data": [[0, "Lima", 10000000], [1, "Oslo", 700000]]
}))]
pub struct SplitPayload {
    /// Column names; one of them must be `index`
    #[validate(length(min = 1, message = "must name at least one column"))]
    pub columns: Vec<String>,
    /// Rows, each led by its value for every entry of `columns`
    #[schema(value_type = Vec<Vec<Object>>)]
    pub data: Vec<Vec<Value>>,
}

/// Parallel `columns` and `data` arrays, label first
pub struct SplitSerializer;

impl FrameSerializer for SplitSerializer {
    fn kind(&self) -> SerializerKind {
        SerializerKind::Split
    }

    fn to_representation(&self, frame: &DataFrame) -> Value {
        let (columns, data) = frame.to_split();
        serde_json::json!({ "columns": columns, "data": data })
    }

    fn to_internal_value(&self, data: Value) -> Result<DataFrame, SerializerError> {
        let payload: SplitPayload = serde_json::from_value(data).map_err(|e| SerializerError::Field {
            field: "body".to_string(),
            message: e.to_string(),
        })?;

        payload
            .validate()
            .map_err(|e| SerializerError::Invalid(validation_message(&e)))?;

        Ok(DataFrame::from_split(&payload.columns, &payload.data)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn round_trips_through_wire_form() {
        let body = json!({
            "columns": ["index", "city"],
            "data": [[5, "Lima"], [9, "Oslo"]]
        });
        let frame = SplitSerializer.to_internal_value(body.clone()).unwrap();
        assert_eq!(frame.index(), &[5, 9]);
        assert_eq!(SplitSerializer.to_representation(&frame), body);
    }

    #[test]
    fn empty_columns_fail_validation() {
        let err = SplitSerializer
            .to_internal_value(json!({"columns": [], "data": []}))
            .unwrap_err();
        assert_eq!(
            err,
            SerializerError::Invalid("columns: must name at least one column".into())
        );
    }

    #[test]
    fn missing_fields_are_reported() {
        let err = SplitSerializer
            .to_internal_value(json!({"columns": ["index"]}))
            .unwrap_err();
        assert!(matches!(err, SerializerError::Field { .. }));
    }

    #[test]
    fn row_width_must_match_columns() {
        let err = SplitSerializer
            .to_internal_value(json!({"columns": ["index", "a"], "data": [[1]]}))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "non_field_errors: row 0 has 1 values, expected 2"
        );
    }
}
