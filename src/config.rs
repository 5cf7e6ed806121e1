//! Application configuration
//!
//! Loaded from a TOML file (`~/.config/frame-rest/config.toml` by default).
//! Every section is optional; missing fields take their defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use validator::{Validate, ValidationError};

use crate::api::views::Actions;
use crate::pagination::PaginationConfig;
use crate::serializers::{validation_message, SerializerKind};

/// Environment variable overriding the config file path
pub const CONFIG_ENV_VAR: &str = "FRAME_REST_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct AppConfig {
    #[validate(nested)]
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    #[validate(nested)]
    pub pagination: PaginationConfig,
    #[validate(nested)]
    pub datasets: Vec<DatasetConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ServerSettings {
    #[validate(length(min = 1))]
    pub host: String,
    pub port: u16,
    /// Host (and port) used in page links when a request has no `Host` header
    pub public_host: Option<String>,
    /// Seconds to wait for in-flight requests on shutdown
    #[validate(range(min = 1))]
    pub shutdown_timeout: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            public_host: None,
            shutdown_timeout: 30,
        }
    }
}

impl ServerSettings {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// `EnvFilter` directive; `RUST_LOG` takes precedence
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// One table resource
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DatasetConfig {
    #[validate(length(min = 1), custom(function = "validate_dataset_name"))]
    pub name: String,
    /// JSON file holding the initial table; the table starts empty without it
    pub path: Option<PathBuf>,
    /// Orientation of the file contents
    #[serde(default = "default_file_format")]
    pub file_format: SerializerKind,
    /// Columns of an empty table, used when `path` is absent
    #[serde(default)]
    pub columns: Vec<String>,
    /// Representation used on the wire
    #[serde(default = "default_format")]
    pub format: SerializerKind,
    /// Action names or presets, e.g. `["all"]` or `["list", "retrieve"]`
    #[serde(default = "default_actions")]
    #[validate(custom(function = "validate_actions"))]
    pub actions: Vec<String>,
    /// Keep writes between requests
    #[serde(default = "default_true")]
    pub persist: bool,
    /// Apply the `[pagination]` settings to list requests
    #[serde(default = "default_true")]
    pub paginate: bool,
}

impl DatasetConfig {
    /// Parsed `actions`; names are checked during validation
    pub fn actions(&self) -> Result<Actions, ConfigError> {
        Actions::from_names(&self.actions).map_err(ConfigError::Invalid)
    }
}

fn default_file_format() -> SerializerKind {
    SerializerKind::Columns
}

fn default_format() -> SerializerKind {
    SerializerKind::Records
}

fn default_actions() -> Vec<String> {
    vec!["all".to_string()]
}

fn default_true() -> bool {
    true
}

fn validate_dataset_name(name: &str) -> Result<(), ValidationError> {
    if name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        Ok(())
    } else {
        let mut err = ValidationError::new("dataset_name");
        err.message = Some("may only contain letters, digits, '-' and '_'".into());
        Err(err)
    }
}

fn validate_actions(actions: &[String]) -> Result<(), ValidationError> {
    Actions::from_names(actions).map(|_| ()).map_err(|msg| {
        let mut err = ValidationError::new("actions");
        err.message = Some(msg.into());
        err
    })
}

impl AppConfig {
    /// Read and validate `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.check()?;
        Ok(config)
    }

    /// Field validation plus cross-field rules
    pub fn check(&self) -> Result<(), ConfigError> {
        self.validate()
            .map_err(|e| ConfigError::Invalid(validation_message(&e)))?;

        for (i, dataset) in self.datasets.iter().enumerate() {
            if self.datasets[..i].iter().any(|d| d.name == dataset.name) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate dataset name '{}'",
                    dataset.name
                )));
            }
        }

        if let (Some(default), Some(max)) = (self.pagination.default_limit, self.pagination.max_limit) {
            if default > max {
                return Err(ConfigError::Invalid(format!(
                    "pagination.default_limit ({}) exceeds max_limit ({})",
                    default, max
                )));
            }
        }
        Ok(())
    }
}

/// `~/.config/frame-rest/config.toml`
pub fn default_config_path() -> PathBuf {
    dirs_next::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("frame-rest")
        .join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(raw: &str) -> AppConfig {
        toml::from_str(raw).unwrap()
    }

    #[test]
    fn empty_file_gives_defaults() {
        let cfg = parse("");
        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.logging.level, "info");
        assert_eq!(cfg.pagination, PaginationConfig::default());
        assert!(cfg.datasets.is_empty());
        assert!(cfg.check().is_ok());
    }

    #[test]
    fn parses_full_file() {
        let cfg = parse(
            r#"
            [server]
            host = "127.0.0.1"
            port = 9090
            public_host = "frames.local"

            [logging]
            level = "debug"
            json = true

            [pagination]
            default_limit = 20
            max_limit = 100
            limit_query_param = "page_size"

            [[datasets]]
            name = "cities"
            path = "data/cities.json"
            file_format = "index"
            format = "split"
            actions = ["list", "retrieve"]
            persist = false
            "#,
        );
        assert!(cfg.check().is_ok());
        assert_eq!(cfg.server.address(), "127.0.0.1:9090");
        assert!(cfg.logging.json);
        assert_eq!(cfg.pagination.default_limit, Some(20));
        assert_eq!(cfg.pagination.limit_query_param, "page_size");
        assert_eq!(cfg.pagination.offset_query_param, "offset");

        let cities = &cfg.datasets[0];
        assert_eq!(cities.file_format, SerializerKind::Index);
        assert_eq!(cities.format, SerializerKind::Split);
        assert_eq!(cities.actions().unwrap(), Actions::READ_ONLY);
        assert!(!cities.persist);
        assert!(cities.paginate);
    }

    #[test]
    fn dataset_defaults() {
        let cfg = parse("[[datasets]]\nname = \"empty\"\ncolumns = [\"a\"]\n");
        let ds = &cfg.datasets[0];
        assert_eq!(ds.path, None);
        assert_eq!(ds.format, SerializerKind::Records);
        assert_eq!(ds.actions().unwrap(), Actions::ALL);
        assert!(ds.persist);
    }

    #[test]
    fn rejects_unknown_action() {
        let cfg = parse("[[datasets]]\nname = \"x\"\nactions = [\"explode\"]\n");
        assert!(matches!(cfg.check(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn rejects_bad_dataset_name() {
        let cfg = parse("[[datasets]]\nname = \"a/b\"\n");
        assert!(matches!(cfg.check(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn rejects_duplicate_datasets() {
        let cfg = parse("[[datasets]]\nname = \"a\"\n[[datasets]]\nname = \"a\"\n");
        let err = cfg.check().unwrap_err();
        assert_eq!(err.to_string(), "Invalid configuration: duplicate dataset name 'a'");
    }

    #[test]
    fn rejects_default_limit_above_max() {
        let cfg = parse("[pagination]\ndefault_limit = 50\nmax_limit = 10\n");
        assert!(cfg.check().is_err());
    }

    #[test]
    fn rejects_zero_limits() {
        let cfg = parse("[pagination]\nmax_limit = 0\n");
        assert!(cfg.check().is_err());
    }

    #[test]
    fn missing_file_gives_defaults() {
        let path = std::env::temp_dir().join("frame-rest-no-such-config.toml");
        let cfg = AppConfig::load(&path).unwrap();
        assert_eq!(cfg.server.port, 8080);
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let path = std::env::temp_dir().join(format!("frame-rest-{}.toml", uuid::Uuid::new_v4()));
        std::fs::write(&path, "[server\nport = ").unwrap();
        let err = AppConfig::load(&path).unwrap_err();
        std::fs::remove_file(&path).unwrap();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn default_path_ends_with_app_dir() {
        assert!(default_config_path().ends_with("frame-rest/config.toml"));
    }
}
