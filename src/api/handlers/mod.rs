//! API Handlers

pub mod datasets;
pub mod health;
pub mod metrics;

pub use datasets::DatasetState;
pub use health::{HealthResponse, HealthState};
pub use metrics::MetricsState;
