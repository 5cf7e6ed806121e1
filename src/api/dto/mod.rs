//! Data Transfer Objects for REST API

pub mod common;
pub mod dataset;

pub use common::*;
pub use dataset::*;
pub use crate::pagination::{PageControls, PageLink, PaginatedResponse};
