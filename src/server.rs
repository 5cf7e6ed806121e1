//! Reusable server runtime.
//!
//! [`ServerHandle`] owns the full lifecycle: metrics recorder, dataset
//! registration from config, the REST API listener and graceful shutdown.

use std::net::SocketAddr;
use std::sync::{Arc, OnceLock};

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use serde_json::json;
use tracing::{error, info, warn};

use crate::api::views::{DataFrameViewSet, DatasetRegistry};
use crate::api::create_api_router;
use crate::config::{AppConfig, DatasetConfig};
use crate::domain::{DataFrame, DomainError, DomainResult};
use crate::infrastructure::{load_frame, DataFrameSource, InMemoryFrameStore, StaticFrame};
use crate::pagination::LimitOffsetPagination;
use crate::serializers::SerializerKind;
use crate::shared::shutdown::{ShutdownCoordinator, ShutdownSignal};

/// Name of the sample dataset registered by [`ServerOptions::demo`]
pub const DEMO_DATASET: &str = "planets";

/// Options for starting the server
#[derive(Default)]
pub struct ServerOptions {
    pub config: AppConfig,
    /// Register the built-in sample dataset
    pub demo: bool,
}

/// Handle to a running server
pub struct ServerHandle {
    pub config: AppConfig,
    pub registry: Arc<DatasetRegistry>,
    /// Address actually bound (differs from config when port is 0)
    pub local_addr: SocketAddr,

    shutdown: ShutdownCoordinator,
    api_task: tokio::task::JoinHandle<()>,
}

impl ServerHandle {
    /// Install the metrics recorder, register datasets, bind and serve.
    pub async fn start(opts: ServerOptions) -> Result<Self, Box<dyn std::error::Error>> {
        let config = opts.config;
        info!("Starting frame-rest...");

        let prometheus_handle = prometheus_handle()?;

        let registry = Arc::new(build_registry(&config, opts.demo).await?);
        if registry.is_empty() {
            warn!("No datasets configured; only /health and /docs will be useful");
        }

        let api_router = create_api_router(
            Arc::clone(&registry),
            config.server.public_host.clone(),
            Some(prometheus_handle),
        );

        let shutdown = ShutdownCoordinator::new(config.server.shutdown_timeout);
        let shutdown_signal = shutdown.signal();

        let listener = tokio::net::TcpListener::bind(config.server.address()).await?;
        let local_addr = listener.local_addr()?;
        info!("REST API listening on http://{}", local_addr);
        info!("Swagger UI available at http://{}/docs/", local_addr);

        let api_server = axum::serve(listener, api_router).with_graceful_shutdown(async move {
            shutdown_signal.wait().await;
            info!("REST API received shutdown signal");
        });

        let api_task = tokio::spawn(async move {
            if let Err(e) = api_server.await {
                error!("REST API server error: {}", e);
            }
        });

        Ok(Self {
            config,
            registry,
            local_addr,
            shutdown,
            api_task,
        })
    }

    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown.signal()
    }

    /// Trigger shutdown on SIGTERM / SIGINT
    pub fn install_signal_handler(&self) {
        self.shutdown.start_signal_listener();
    }

    pub fn trigger_shutdown(&self) {
        self.shutdown.signal().trigger();
    }

    /// Wait for the API task to finish draining, bounded by the shutdown timeout
    pub async fn wait(self) {
        let Self { shutdown, api_task, .. } = self;
        let abort = api_task.abort_handle();

        let drained = shutdown
            .drain(async move {
                match api_task.await {
                    Ok(()) => info!("REST API server stopped"),
                    Err(e) => error!("REST API server task failed: {}", e),
                }
            })
            .await;
        if !drained {
            abort.abort();
        }
        info!("frame-rest shutdown complete");
    }

    pub async fn shutdown(self) {
        info!("Shutting down...");
        self.trigger_shutdown();
        self.wait().await;
    }

    pub fn is_running(&self) -> bool {
        !self.api_task.is_finished()
    }
}

/// The global recorder can only be installed once per process, so a restart
/// within the same process reuses it.
fn prometheus_handle() -> Result<PrometheusHandle, Box<dyn std::error::Error>> {
    static PROM_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

    if let Some(handle) = PROM_HANDLE.get() {
        return Ok(handle.clone());
    }
    let handle = PrometheusBuilder::new().install_recorder()?;
    info!("Prometheus metrics recorder installed");
    Ok(PROM_HANDLE.get_or_init(|| handle).clone())
}

/// Build view sets for every configured dataset, plus the demo set if asked
pub async fn build_registry(config: &AppConfig, demo: bool) -> DomainResult<DatasetRegistry> {
    let registry = DatasetRegistry::new();
    let pagination = LimitOffsetPagination::new(config.pagination.clone());

    for dataset in &config.datasets {
        registry.register(build_viewset(dataset, &pagination).await?);
    }

    if demo {
        registry.register(
            DataFrameViewSet::new(
                DEMO_DATASET,
                Arc::new(InMemoryFrameStore::new(demo_frame())),
                SerializerKind::Split.build(),
            )
            .with_pagination(pagination),
        );
    }

    info!(datasets = registry.len(), "Datasets registered");
    Ok(registry)
}

async fn build_viewset(
    dataset: &DatasetConfig,
    pagination: &LimitOffsetPagination,
) -> DomainResult<DataFrameViewSet> {
    let frame = match &dataset.path {
        Some(path) => load_frame(path, dataset.file_format).await?,
        None => DataFrame::empty(dataset.columns.clone()),
    };

    let source: Arc<dyn DataFrameSource> = if dataset.persist {
        Arc::new(InMemoryFrameStore::new(frame))
    } else {
        Arc::new(StaticFrame::new(frame))
    };

    let actions = dataset
        .actions()
        .map_err(|e| DomainError::Validation(e.to_string()))?;

    let mut viewset = DataFrameViewSet::new(&dataset.name, source, dataset.format.build())
        .with_actions(actions);
    if dataset.paginate {
        viewset = viewset.with_pagination(pagination.clone());
    }
    Ok(viewset)
}

/// Sample table for `--demo`
pub fn demo_frame() -> DataFrame {
    let planets = [
        ("Mercury", 0.055, 0),
        ("Venus", 0.815, 0),
        ("Earth", 1.0, 1),
        ("Mars", 0.107, 2),
        ("Jupiter", 317.8, 95),
        ("Saturn", 95.2, 146),
        ("Uranus", 14.5, 28),
        ("Neptune", 17.1, 16),
    ];
    let rows = planets
        .iter()
        .map(|(name, mass, moons)| vec![json!(name), json!(mass), json!(moons)])
        .collect();

    DataFrame::from_rows(vec!["name".into(), "mass".into(), "moons".into()], rows)
        .unwrap_or_default()
}

/// Initialize tracing from the config. `RUST_LOG` overrides the level.
pub fn init_tracing(config: &AppConfig) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));

    let result = if config.logging.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .try_init()
    };
    if let Err(e) = result {
        eprintln!("tracing already initialized: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerSettings;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    fn config_with(datasets: Vec<DatasetConfig>) -> AppConfig {
        AppConfig {
            server: ServerSettings {
                host: "127.0.0.1".into(),
                port: 0,
                ..ServerSettings::default()
            },
            datasets,
            ..AppConfig::default()
        }
    }

    fn dataset(raw: &str) -> DatasetConfig {
        toml::from_str(raw).unwrap()
    }

    #[test]
    fn demo_frame_has_every_planet() {
        let frame = demo_frame();
        assert_eq!(frame.len(), 8);
        assert_eq!(frame.columns(), &["name", "mass", "moons"]);
    }

    #[tokio::test]
    async fn registry_from_config() {
        let config = config_with(vec![
            dataset("name = \"empty\"\ncolumns = [\"a\", \"b\"]\nactions = [\"read_only\"]\npaginate = false\n"),
            dataset("name = \"fixed\"\npersist = false\n"),
        ]);
        let registry = build_registry(&config, true).await.unwrap();
        assert_eq!(registry.names(), vec!["empty", "fixed", "planets"]);

        let empty = registry.get("empty").unwrap().summary().await.unwrap();
        assert_eq!(empty.columns, vec!["a", "b"]);
        assert_eq!(empty.actions, vec!["list", "retrieve"]);
        assert!(!empty.paginated);

        let fixed = registry.get("fixed").unwrap().summary().await.unwrap();
        assert!(!fixed.persistent);
        assert!(fixed.paginated);
    }

    #[tokio::test]
    async fn missing_data_file_fails_registration() {
        let config = config_with(vec![dataset(
            "name = \"lost\"\npath = \"/nonexistent/frame-rest/lost.json\"\n",
        )]);
        assert!(build_registry(&config, false).await.is_err());
    }

    #[tokio::test]
    async fn serves_and_shuts_down() {
        let handle = ServerHandle::start(ServerOptions {
            config: config_with(Vec::new()),
            demo: true,
        })
        .await
        .unwrap();
        assert!(handle.is_running());

        let mut stream = tokio::net::TcpStream::connect(handle.local_addr).await.unwrap();
        stream
            .write_all(b"GET /health HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
            .await
            .unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        assert!(response.starts_with("HTTP/1.1 200"));
        assert!(response.contains("\"planets\""));

        handle.shutdown().await;
    }
}
