//! Common API DTOs

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Standard API envelope
///
/// Used for errors and for endpoints that are not table representations.
/// On success: `{"success": true, "data": {...}}`,
/// on error: `{"success": false, "data": null, "error": "description"}`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    /// `true` when the request succeeded
    pub success: bool,
    /// Payload, `null` on error
    pub data: Option<T>,
    /// Error description, omitted on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Limit/offset query parameters
///
/// Parameter names are configurable; these are the defaults. Malformed
/// values are ignored rather than rejected.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    /// Page size. Without it (and without a configured default) the whole
    /// table is returned unpaginated
    pub limit: Option<String>,
    /// Position of the first row on the page. Default: 0
    pub offset: Option<String>,
}
