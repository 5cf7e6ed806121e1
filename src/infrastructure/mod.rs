//! Infrastructure layer
//!
//! - `storage`: where tables live between requests

pub mod storage;

pub use storage::{load_frame, DataFrameSource, InMemoryFrameStore, StaticFrame};
