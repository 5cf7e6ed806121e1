//! Table resource handlers
//!
//! One set of routes serves every registered dataset; the `{dataset}` path
//! segment selects the [`DataFrameViewSet`](crate::api::views::DataFrameViewSet).
//! Row bodies are the bare serializer representation. Errors use the
//! [`ApiResponse`] envelope.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, OriginalUri, Path, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{Html, IntoResponse, Response},
    Json,
};
use serde_json::Value;
use url::Url;

use crate::api::dto::{ApiResponse, DatasetSummary, PageControls, PageQuery, PaginatedResponse};
use crate::api::error::ApiError;
use crate::api::views::DatasetRegistry;

/// State for table routes
#[derive(Clone)]
pub struct DatasetState {
    pub registry: Arc<DatasetRegistry>,
    /// Host used for links when the request carries no `Host` header
    pub public_host: Option<String>,
}

/// Absolute URL of the current request, used to build page links
fn absolute_url(state: &DatasetState, headers: &HeaderMap, uri: &OriginalUri) -> Result<Url, ApiError> {
    let header_str = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());

    let scheme = header_str("x-forwarded-proto")
        .and_then(|p| p.split(',').next())
        .map(str::trim)
        .unwrap_or("http");
    let host = header_str(header::HOST.as_str())
        .or(state.public_host.as_deref())
        .unwrap_or("localhost");
    let path = uri.0.path_and_query().map_or("/", |pq| pq.as_str());

    Url::parse(&format!("{}://{}{}", scheme, host, path))
        .map_err(|e| ApiError::new(StatusCode::BAD_REQUEST, format!("Invalid request URL: {}", e)))
}

/// Swap the trailing `page-controls` segment for `rows`, keeping the query
fn rows_url(mut url: Url) -> Url {
    if let Ok(mut segments) = url.path_segments_mut() {
        segments.pop_if_empty().pop().push("rows");
    }
    url
}

fn record_rows(dataset: &str, action: &'static str, rows: usize) {
    metrics::counter!(
        "frame_rows_total",
        "dataset" => dataset.to_string(),
        "action" => action
    )
    .increment(rows as u64);
}

/// List registered datasets
#[utoipa::path(
    get,
    path = "/api/v1/datasets",
    tag = "Datasets",
    responses(
        (status = 200, description = "Registered datasets", body = ApiResponse<Vec<DatasetSummary>>)
    )
)]
pub async fn list_datasets(
    State(state): State<DatasetState>,
) -> Result<Json<ApiResponse<Vec<DatasetSummary>>>, ApiError> {
    let mut summaries = Vec::with_capacity(state.registry.len());
    for name in state.registry.names() {
        summaries.push(state.registry.get(&name)?.summary().await?);
    }
    Ok(Json(ApiResponse::success(summaries)))
}

/// List rows
///
/// Without a limit (and without a configured default) the whole table is
/// returned in the dataset's format. With one, the body is
/// `{count, next, previous, results}`.
#[utoipa::path(
    get,
    path = "/api/v1/datasets/{dataset}/rows",
    tag = "Rows",
    params(
        ("dataset" = String, Path, description = "Dataset name"),
        PageQuery
    ),
    responses(
        (status = 200, description = "Paginated rows", body = PaginatedResponse),
        (status = 404, description = "Unknown dataset", body = ApiResponse<String>),
        (status = 405, description = "Listing disabled", body = ApiResponse<String>)
    )
)]
pub async fn list_rows(
    State(state): State<DatasetState>,
    Path(dataset): Path<String>,
    headers: HeaderMap,
    uri: OriginalUri,
) -> Result<Response, ApiError> {
    let viewset = state.registry.get(&dataset)?;
    let url = absolute_url(&state, &headers, &uri)?;
    let output = viewset.list(&url).await?;
    record_rows(&dataset, "list", output.rows);
    Ok(Json(output.body).into_response())
}

/// Create rows
///
/// Returns the created rows. A string `url` field in the representation is
/// echoed as the `Location` header.
#[utoipa::path(
    post,
    path = "/api/v1/datasets/{dataset}/rows",
    tag = "Rows",
    params(("dataset" = String, Path, description = "Dataset name")),
    request_body(content = Object, description = "Rows in the dataset's format", content_type = "application/json"),
    responses(
        (status = 201, description = "Rows created", body = Object),
        (status = 400, description = "Malformed rows", body = ApiResponse<String>),
        (status = 405, description = "Creation disabled or format is read-only", body = ApiResponse<String>),
        (status = 409, description = "Row label already exists", body = ApiResponse<String>)
    )
)]
pub async fn create_row(
    State(state): State<DatasetState>,
    Path(dataset): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(data) = payload?;
    let viewset = state.registry.get(&dataset)?;
    let created = viewset.create(data).await?;
    record_rows(&dataset, "create", created.rows);

    let mut response = (StatusCode::CREATED, Json(created.body)).into_response();
    if let Some(location) = created.location.and_then(|l| HeaderValue::from_str(&l).ok()) {
        response.headers_mut().insert(header::LOCATION, location);
    }
    Ok(response)
}

/// Retrieve one row
#[utoipa::path(
    get,
    path = "/api/v1/datasets/{dataset}/rows/{index}",
    tag = "Rows",
    params(
        ("dataset" = String, Path, description = "Dataset name"),
        ("index" = String, Path, description = "Row label")
    ),
    responses(
        (status = 200, description = "Single-row representation", body = Object),
        (status = 404, description = "Unknown dataset or row", body = ApiResponse<String>)
    )
)]
pub async fn retrieve_row(
    State(state): State<DatasetState>,
    Path((dataset, index)): Path<(String, String)>,
) -> Result<Json<Value>, ApiError> {
    let body = state.registry.get(&dataset)?.retrieve(&index).await?;
    record_rows(&dataset, "retrieve", 1);
    Ok(Json(body))
}

/// Replace one row
///
/// The body must hold exactly one row covering every column.
#[utoipa::path(
    put,
    path = "/api/v1/datasets/{dataset}/rows/{index}",
    tag = "Rows",
    params(
        ("dataset" = String, Path, description = "Dataset name"),
        ("index" = String, Path, description = "Row label")
    ),
    request_body(content = Object, description = "One row in the dataset's format", content_type = "application/json"),
    responses(
        (status = 200, description = "Updated row", body = Object),
        (status = 400, description = "Malformed row or missing columns", body = ApiResponse<String>),
        (status = 404, description = "Unknown dataset or row", body = ApiResponse<String>),
        (status = 405, description = "Updates disabled or format is read-only", body = ApiResponse<String>)
    )
)]
pub async fn update_row(
    State(state): State<DatasetState>,
    Path((dataset, index)): Path<(String, String)>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(data) = payload?;
    let body = state.registry.get(&dataset)?.update(&index, data, false).await?;
    record_rows(&dataset, "update", 1);
    Ok(Json(body))
}

/// Update some columns of one row
#[utoipa::path(
    patch,
    path = "/api/v1/datasets/{dataset}/rows/{index}",
    tag = "Rows",
    params(
        ("dataset" = String, Path, description = "Dataset name"),
        ("index" = String, Path, description = "Row label")
    ),
    request_body(content = Object, description = "One row with the columns to change", content_type = "application/json"),
    responses(
        (status = 200, description = "Updated row", body = Object),
        (status = 400, description = "Malformed row", body = ApiResponse<String>),
        (status = 404, description = "Unknown dataset or row", body = ApiResponse<String>),
        (status = 405, description = "Updates disabled or format is read-only", body = ApiResponse<String>)
    )
)]
pub async fn partial_update_row(
    State(state): State<DatasetState>,
    Path((dataset, index)): Path<(String, String)>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(data) = payload?;
    let body = state.registry.get(&dataset)?.partial_update(&index, data).await?;
    record_rows(&dataset, "partial_update", 1);
    Ok(Json(body))
}

/// Delete one row
#[utoipa::path(
    delete,
    path = "/api/v1/datasets/{dataset}/rows/{index}",
    tag = "Rows",
    params(
        ("dataset" = String, Path, description = "Dataset name"),
        ("index" = String, Path, description = "Row label")
    ),
    responses(
        (status = 204, description = "Row deleted"),
        (status = 404, description = "Unknown dataset or row", body = ApiResponse<String>),
        (status = 405, description = "Deletion disabled", body = ApiResponse<String>)
    )
)]
pub async fn destroy_row(
    State(state): State<DatasetState>,
    Path((dataset, index)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    state.registry.get(&dataset)?.destroy(&index).await?;
    record_rows(&dataset, "destroy", 1);
    Ok(StatusCode::NO_CONTENT)
}

/// Page links for the requested window
///
/// JSON by default, a Bootstrap pagination fragment when the client accepts
/// `text/html`.
#[utoipa::path(
    get,
    path = "/api/v1/datasets/{dataset}/page-controls",
    tag = "Rows",
    params(
        ("dataset" = String, Path, description = "Dataset name"),
        PageQuery
    ),
    responses(
        (status = 200, description = "Page links", body = PageControls),
        (status = 404, description = "Unknown dataset or pagination not active", body = ApiResponse<String>)
    )
)]
pub async fn page_controls(
    State(state): State<DatasetState>,
    Path(dataset): Path<String>,
    headers: HeaderMap,
    uri: OriginalUri,
) -> Result<Response, ApiError> {
    let viewset = state.registry.get(&dataset)?;
    // Links point at the list route the controls page through.
    let url = rows_url(absolute_url(&state, &headers, &uri)?);
    let controls = viewset.page_controls(&url).await?;

    let wants_html = headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|accept| accept.contains("text/html"));
    if wants_html {
        Ok(Html(controls.to_html()).into_response())
    } else {
        Ok(Json(controls).into_response())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Uri;

    fn state(public_host: Option<&str>) -> DatasetState {
        DatasetState {
            registry: Arc::new(DatasetRegistry::new()),
            public_host: public_host.map(String::from),
        }
    }

    fn uri(s: &str) -> OriginalUri {
        OriginalUri(s.parse::<Uri>().unwrap())
    }

    #[test]
    fn controls_link_to_rows_route() {
        let url = Url::parse("http://h/api/v1/datasets/a/page-controls?limit=2&offset=4").unwrap();
        assert_eq!(rows_url(url).as_str(), "http://h/api/v1/datasets/a/rows?limit=2&offset=4");

        let url = Url::parse("http://h/api/v1/datasets/a/page-controls/").unwrap();
        assert_eq!(rows_url(url).as_str(), "http://h/api/v1/datasets/a/rows");
    }

    #[test]
    fn url_uses_host_header() {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, HeaderValue::from_static("api.example.com:8080"));
        let url = absolute_url(&state(None), &headers, &uri("/api/v1/datasets/a/rows?limit=2")).unwrap();
        assert_eq!(url.as_str(), "http://api.example.com:8080/api/v1/datasets/a/rows?limit=2");
    }

    #[test]
    fn url_honours_forwarded_proto() {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, HeaderValue::from_static("example.com"));
        headers.insert("x-forwarded-proto", HeaderValue::from_static("https, http"));
        let url = absolute_url(&state(None), &headers, &uri("/rows")).unwrap();
        assert_eq!(url.as_str(), "https://example.com/rows");
    }

    #[test]
    fn url_falls_back_to_public_host() {
        let url = absolute_url(&state(Some("frames.local")), &HeaderMap::new(), &uri("/rows")).unwrap();
        assert_eq!(url.as_str(), "http://frames.local/rows");

        let url = absolute_url(&state(None), &HeaderMap::new(), &uri("/rows")).unwrap();
        assert_eq!(url.as_str(), "http://localhost/rows");
    }
}
