//! API Router with Swagger UI

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::FromRef,
    middleware,
    routing::get,
    Router,
};
use chrono::Utc;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::dto::*;
use crate::api::handlers::{datasets, health, metrics, DatasetState, HealthState, MetricsState};
use crate::api::middleware::{http_metrics_middleware, request_id_middleware};
use crate::api::views::DatasetRegistry;
use crate::serializers::SerializerKind;

/// Unified router state; handlers pick their part via `FromRef`
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<DatasetRegistry>,
    pub public_host: Option<String>,
    pub health: HealthState,
}

impl FromRef<AppState> for DatasetState {
    fn from_ref(s: &AppState) -> Self {
        DatasetState {
            registry: Arc::clone(&s.registry),
            public_host: s.public_host.clone(),
        }
    }
}

impl FromRef<AppState> for HealthState {
    fn from_ref(s: &AppState) -> Self {
        s.health.clone()
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        datasets::list_datasets,
        datasets::list_rows,
        datasets::create_row,
        datasets::retrieve_row,
        datasets::update_row,
        datasets::partial_update_row,
        datasets::destroy_row,
        datasets::page_controls,
    ),
    components(
        schemas(
            ApiResponse<String>,
            DatasetSummary,
            SerializerKind,
            PaginatedResponse,
            PageControls,
            PageLink,
            health::HealthResponse,
            health::DatasetHealth,
        )
    ),
    tags(
        (name = "Health", description = "Liveness and table source status"),
        (name = "Datasets", description = "Registered table resources"),
        (name = "Rows", description = "Row CRUD in the dataset's representation (`records`, `columns`, `index`, `split`). \
            List endpoints paginate with `limit`/`offset` and answer `{count, next, previous, results}`."),
    ),
    info(
        title = "frame-rest API",
        version = "0.1.0",
        description = "REST resources over in-memory tables.

## Formats

- `records`: `{\"records\": [{column: value}, ...]}`, read-only
- `columns`: `{column: [value, ...]}`
- `index`: `{\"label\": {column: value}}`
- `split`: `{\"columns\": [...], \"data\": [[label, value, ...], ...]}`

## Errors

```json
{\"success\": false, \"data\": null, \"error\": \"description\"}
```",
        license(name = "MIT")
    )
)]
pub struct ApiDoc;

/// Create the API router with all routes.
///
/// `/metrics` is mounted only when a Prometheus handle is given.
pub fn create_api_router(
    registry: Arc<DatasetRegistry>,
    public_host: Option<String>,
    prometheus_handle: Option<PrometheusHandle>,
) -> Router {
    let state = AppState {
        registry: Arc::clone(&registry),
        public_host,
        health: HealthState {
            registry,
            started_at: Arc::new(Instant::now()),
            started_at_utc: Utc::now(),
        },
    };

    // One router for every /api/v1/datasets/* route so the parametric
    // segments share a single match tree.
    let dataset_routes = Router::new()
        .route("/", get(datasets::list_datasets))
        .route(
            "/{dataset}/rows",
            get(datasets::list_rows).post(datasets::create_row),
        )
        .route(
            "/{dataset}/rows/{index}",
            get(datasets::retrieve_row)
                .put(datasets::update_row)
                .patch(datasets::partial_update_row)
                .delete(datasets::destroy_row),
        )
        .route("/{dataset}/page-controls", get(datasets::page_controls))
        .route_layer(middleware::from_fn(http_metrics_middleware))
        .with_state(state.clone());

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let mut router = Router::new()
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .route("/health", get(health::health_check))
        .with_state(state)
        .nest("/api/v1/datasets", dataset_routes);

    if let Some(handle) = prometheus_handle {
        router = router.route(
            "/metrics",
            get(metrics::prometheus_metrics).with_state(MetricsState { handle }),
        );
    }

    router
        .layer(middleware::from_fn(request_id_middleware))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::views::{Actions, DataFrameViewSet};
    use crate::domain::DataFrame;
    use crate::infrastructure::InMemoryFrameStore;
    use crate::pagination::{LimitOffsetPagination, PaginationConfig};
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use serde_json::{json, Value};

    fn planets() -> DataFrame {
        DataFrame::from_rows(
            vec!["name".into(), "moons".into()],
            vec![
                vec![json!("Mercury"), json!(0)],
                vec![json!("Venus"), json!(0)],
                vec![json!("Earth"), json!(1)],
                vec![json!("Mars"), json!(2)],
                vec![json!("Jupiter"), json!(95)],
            ],
        )
        .unwrap()
    }

    fn app() -> Router {
        let registry = DatasetRegistry::new();
        registry.register(
            DataFrameViewSet::new(
                "planets",
                Arc::new(InMemoryFrameStore::new(planets())),
                SerializerKind::Index.build(),
            )
            .with_pagination(LimitOffsetPagination::new(PaginationConfig::default())),
        );
        registry.register(
            DataFrameViewSet::new(
                "catalog",
                Arc::new(InMemoryFrameStore::new(planets())),
                SerializerKind::Records.build(),
            )
            .with_actions(Actions::READ_ONLY),
        );
        create_api_router(Arc::new(registry), None, None)
    }

    async fn send(req: Request<Body>) -> axum::http::Response<Body> {
        use tower::Service;
        let mut svc = app().into_service();
        svc.call(req).await.unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .header(header::HOST, "test.local")
            .body(Body::empty())
            .unwrap()
    }

    fn with_json(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::HOST, "test.local")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap()
    }

    async fn json_body(resp: axum::http::Response<Body>) -> Value {
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_reports_datasets() {
        let resp = send(get("/health")).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = json_body(resp).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["datasets"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn lists_registered_datasets() {
        let resp = send(get("/api/v1/datasets")).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = json_body(resp).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["data"][0]["name"], "catalog");
        assert_eq!(body["data"][1]["name"], "planets");
        assert_eq!(body["data"][1]["format"], "index");
        assert_eq!(body["data"][1]["rows"], 5);
    }

    #[tokio::test]
    async fn paginated_list_has_absolute_links() {
        let resp = send(get("/api/v1/datasets/planets/rows?limit=2&offset=2")).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = json_body(resp).await;
        assert_eq!(body["count"], 5);
        assert_eq!(
            body["next"],
            "http://test.local/api/v1/datasets/planets/rows?limit=2&offset=4"
        );
        assert_eq!(
            body["previous"],
            "http://test.local/api/v1/datasets/planets/rows?limit=2"
        );
        assert_eq!(
            body["results"],
            json!({"2": {"name": "Earth", "moons": 1}, "3": {"name": "Mars", "moons": 2}})
        );
    }

    #[tokio::test]
    async fn list_without_limit_is_unpaginated() {
        let resp = send(get("/api/v1/datasets/catalog/rows")).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = json_body(resp).await;
        assert_eq!(body["records"].as_array().unwrap().len(), 5);
        assert!(body.get("count").is_none());
    }

    #[tokio::test]
    async fn unknown_dataset_is_404_envelope() {
        let resp = send(get("/api/v1/datasets/stars/rows")).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body = json_body(resp).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Not found: dataset with name=stars");
    }

    #[tokio::test]
    async fn retrieve_unknown_row_is_404() {
        let resp = send(get("/api/v1/datasets/planets/rows/17")).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn create_returns_201() {
        let resp = send(with_json(
            "POST",
            "/api/v1/datasets/planets/rows",
            json!({"5": {"name": "Saturn", "moons": 146}}),
        ))
        .await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        assert_eq!(
            json_body(resp).await,
            json!({"5": {"name": "Saturn", "moons": 146}})
        );
    }

    #[tokio::test]
    async fn create_with_taken_label_is_409() {
        let resp = send(with_json(
            "POST",
            "/api/v1/datasets/planets/rows",
            json!({"0": {"name": "Vulcan", "moons": 0}}),
        ))
        .await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn invalid_json_is_400() {
        let req = Request::builder()
            .method("POST")
            .uri("/api/v1/datasets/planets/rows")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("not json"))
            .unwrap();
        let resp = send(req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body = json_body(resp).await;
        assert!(body["error"].as_str().unwrap().starts_with("Invalid JSON"));
    }

    #[tokio::test]
    async fn patch_updates_row() {
        let resp = send(with_json(
            "PATCH",
            "/api/v1/datasets/planets/rows/3",
            json!({"3": {"moons": 3}}),
        ))
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(json_body(resp).await, json!({"3": {"name": "Mars", "moons": 3}}));
    }

    #[tokio::test]
    async fn put_without_every_column_is_400() {
        let resp = send(with_json(
            "PUT",
            "/api/v1/datasets/planets/rows/3",
            json!({"3": {"moons": 3}}),
        ))
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn read_only_dataset_rejects_writes() {
        let resp = send(with_json(
            "PUT",
            "/api/v1/datasets/catalog/rows/0",
            json!({"records": []}),
        ))
        .await;
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);

        let req = Request::builder()
            .method("DELETE")
            .uri("/api/v1/datasets/catalog/rows/0")
            .body(Body::empty())
            .unwrap();
        assert_eq!(send(req).await.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn delete_returns_204() {
        let req = Request::builder()
            .method("DELETE")
            .uri("/api/v1/datasets/planets/rows/1")
            .body(Body::empty())
            .unwrap();
        assert_eq!(send(req).await.status(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn page_controls_as_json_and_html() {
        let resp = send(get("/api/v1/datasets/planets/page-controls?limit=2&offset=2")).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = json_body(resp).await;
        assert_eq!(body["current"], 2);
        assert_eq!(body["final"], 3);
        assert_eq!(body["display"], true);
        assert_eq!(
            body["next_url"],
            "http://test.local/api/v1/datasets/planets/rows?limit=2&offset=4"
        );
        assert_eq!(
            body["previous_url"],
            "http://test.local/api/v1/datasets/planets/rows?limit=2"
        );
        assert_eq!(
            body["page_links"][0]["url"],
            "http://test.local/api/v1/datasets/planets/rows?limit=2"
        );

        let req = Request::builder()
            .uri("/api/v1/datasets/planets/page-controls?limit=2")
            .header(header::HOST, "test.local")
            .header(header::ACCEPT, "text/html")
            .body(Body::empty())
            .unwrap();
        let resp = send(req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let html = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(html.starts_with("<ul class=\"pagination\">"));
        assert!(html.contains("href=\"http://test.local/api/v1/datasets/planets/rows?limit=2&amp;offset=2\""));
        assert!(!html.contains("page-controls"));
    }

    #[tokio::test]
    async fn responses_carry_request_id() {
        let req = Request::builder()
            .uri("/health")
            .header("x-request-id", "abc-123")
            .body(Body::empty())
            .unwrap();
        let resp = send(req).await;
        assert_eq!(resp.headers()["x-request-id"], "abc-123");
    }

    #[tokio::test]
    async fn serves_openapi_document() {
        let resp = send(get("/api-doc/openapi.json")).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = json_body(resp).await;
        assert!(body["paths"]
            .get("/api/v1/datasets/{dataset}/rows/{index}")
            .is_some());
    }
}
