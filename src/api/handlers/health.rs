//! Health check handler

use std::sync::Arc;
use std::time::Instant;

use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::api::views::DatasetRegistry;

/// Health check state
#[derive(Clone)]
pub struct HealthState {
    pub registry: Arc<DatasetRegistry>,
    pub started_at: Arc<Instant>,
    pub started_at_utc: DateTime<Utc>,
}

/// Service health response
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// `ok`, or `degraded` when some table source cannot be read
    pub status: String,
    pub version: String,
    pub started_at: DateTime<Utc>,
    pub uptime_seconds: u64,
    pub datasets: Vec<DatasetHealth>,
}

/// Source status of one dataset
#[derive(Debug, Serialize, ToSchema)]
pub struct DatasetHealth {
    pub name: String,
    pub status: String,
    pub rows: Option<usize>,
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
        (status = 503, description = "A table source failed", body = HealthResponse)
    )
)]
pub async fn health_check(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let mut datasets = Vec::new();
    for name in state.registry.names() {
        let rows = match state.registry.get(&name) {
            Ok(viewset) => viewset.filter_dataframe().await.ok().map(|f| f.len()),
            Err(_) => None,
        };
        datasets.push(DatasetHealth {
            status: if rows.is_some() { "ok" } else { "error" }.to_string(),
            name,
            rows,
        });
    }

    let healthy = datasets.iter().all(|d| d.rows.is_some());
    let http_status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        http_status,
        Json(HealthResponse {
            status: if healthy { "ok" } else { "degraded" }.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            started_at: state.started_at_utc,
            uptime_seconds: state.started_at.elapsed().as_secs(),
            datasets,
        }),
    )
}
