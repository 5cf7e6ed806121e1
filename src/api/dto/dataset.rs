//! Dataset DTOs

use serde::Serialize;
use utoipa::ToSchema;

use crate::serializers::SerializerKind;

/// Registered table resource
#[derive(Debug, Serialize, ToSchema)]
pub struct DatasetSummary {
    /// Name used in `/api/v1/datasets/{dataset}/...`
    pub name: String,
    /// Number of rows visible through the resource
    pub rows: usize,
    /// Column names in table order
    pub columns: Vec<String>,
    /// Wire representation of rows
    pub format: SerializerKind,
    /// Enabled operations: `list`, `retrieve`, `create`, `update`, `destroy`
    pub actions: Vec<String>,
    /// Whether list responses may be paginated
    pub paginated: bool,
    /// Whether writes are kept between requests
    pub persistent: bool,
}
