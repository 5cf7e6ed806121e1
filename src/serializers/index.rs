use serde_json::Value;

use super::{expect_object, FrameSerializer, SerializerError, SerializerKind};
use crate::domain::DataFrame;

/// Row label (as a string key) to row object
pub struct IndexSerializer;

impl FrameSerializer for IndexSerializer {
    fn kind(&self) -> SerializerKind {
        SerializerKind::Index
    }

    fn to_representation(&self, frame: &DataFrame) -> Value {
        Value::Object(frame.to_index())
    }

    fn to_internal_value(&self, data: Value) -> Result<DataFrame, SerializerError> {
        let map = expect_object(data)?;
        Ok(DataFrame::from_index(&map)?)
    }
}
