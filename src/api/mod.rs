//! REST API module
//!
//! Exposes registered tables as CRUD resources with limit/offset
//! pagination, plus health, metrics and Swagger documentation.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod views;

pub use error::ApiError;
pub use router::{create_api_router, ApiDoc, AppState};
pub use views::{Action, Actions, DataFrameViewSet, DatasetRegistry, FrameFilter};
