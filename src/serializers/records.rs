use serde_json::{json, Value};

use super::{FrameSerializer, SerializerError, SerializerKind};
use crate::domain::DataFrame;

/// Read-only list of row objects under a `records` key
pub struct RecordsSerializer;

impl FrameSerializer for RecordsSerializer {
    fn kind(&self) -> SerializerKind {
        SerializerKind::Records
    }

    fn to_representation(&self, frame: &DataFrame) -> Value {
        json!({ "records": frame.to_records() })
    }

    fn to_internal_value(&self, _data: Value) -> Result<DataFrame, SerializerError> {
        Err(SerializerError::ReadOnly(SerializerKind::Records))
    }

    fn carries_index(&self) -> bool {
        false
    }
}
