//! Domain layer: the in-memory table and its errors

pub mod error;
pub mod frame;

pub use error::{DomainError, DomainResult};
pub use frame::{parse_label, DataFrame, FrameError, FrameResult, Label};
