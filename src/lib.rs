//! # frame-rest
//!
//! REST resources over in-memory tables, with limit/offset pagination.
//!
//! ## Architecture
//!
//! - **domain**: the [`DataFrame`] table and domain errors
//! - **pagination**: limit/offset windowing, next/previous links, page controls
//! - **serializers**: table orientations on the wire (`records`, `columns`, `index`, `split`)
//! - **infrastructure**: where tables live between requests
//! - **api**: view sets, handlers and the axum router with Swagger documentation
//! - **server**: process lifecycle used by the CLI

pub mod api;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod pagination;
pub mod serializers;
pub mod server;
pub mod shared;

pub use config::{default_config_path, AppConfig};
pub use domain::{DataFrame, DomainError};

pub use api::{create_api_router, DataFrameViewSet, DatasetRegistry};
pub use pagination::{LimitOffsetPagination, PaginationConfig};
