//! Runtime configuration for ollama-relay.
//!
//! Configuration is loaded from a JSON file (missing fields fall back to
//! defaults), then overridden by the `OLLAMA_SERVER_URL` environment
//! variable and CLI flags. The resolved value is passed explicitly to the
//! relay client and the supervisor; nothing reads the environment later.

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable overriding [`BackendConfig::base_url`].
pub const SERVER_URL_ENV: &str = "OLLAMA_SERVER_URL";

/// Where Ollama listens unless told otherwise.
pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid backend URL {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// Command-line arguments.
#[derive(Parser, Debug, Clone)]
#[command(name = "ollama-relay", about = "HTTP relay in front of a supervised Ollama server")]
pub struct Cli {
    /// Path to configuration file (JSON).
    #[arg(short, long, default_value = "config.json")]
    pub config: PathBuf,

    /// HTTP listen address (overrides `server.listen`).
    #[arg(long)]
    pub listen: Option<String>,

    /// Enable verbose logging.
    #[arg(short, long)]
    pub verbose: bool,

    /// Do not launch the backing server; assume one is already running.
    #[arg(long)]
    pub no_spawn: bool,
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server configuration.
    pub server: ServerConfig,

    /// Backing server (Ollama) API settings.
    pub backend: BackendConfig,

    /// Backing server process supervision.
    pub supervisor: SupervisorConfig,
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address (e.g. "0.0.0.0:8080").
    pub listen: String,

    /// Path of the interactive API docs page. `/` redirects here.
    pub docs_path: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0:8080".to_string(),
            docs_path: "/docs".to_string(),
        }
    }
}

/// Backing server API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Base URL of the Ollama HTTP API.
    pub base_url: String,

    /// Model selector sent with every generate call.
    pub generate_model: String,

    /// Upper bound for a generate call, in seconds.
    pub request_timeout_secs: u64,

    /// Upper bound for a pull call, in seconds. Pulls download whole models.
    pub pull_timeout_secs: u64,

    /// Model to pull once the backing server is ready, before serving.
    pub preload_model: Option<String>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            generate_model: "llama3.2".to_string(),
            request_timeout_secs: 120,
            pull_timeout_secs: 1800,
            preload_model: None,
        }
    }
}

impl BackendConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn pull_timeout(&self) -> Duration {
        Duration::from_secs(self.pull_timeout_secs)
    }
}

/// How the supervisor decides the backing server is ready.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Readiness {
    /// Sleep a fixed delay and assume the server is listening afterwards.
    FixedDelay { secs: u64 },

    /// Probe `GET /api/version` until it answers 2xx or attempts run out.
    Poll {
        interval_ms: u64,
        max_attempts: u32,
        probe_timeout_ms: u64,
    },
}

impl Default for Readiness {
    fn default() -> Self {
        Readiness::Poll {
            interval_ms: 250,
            max_attempts: 40,
            probe_timeout_ms: 1000,
        }
    }
}

impl Readiness {
    /// The blind heuristic: five seconds and hope.
    pub fn fixed_default() -> Self {
        Readiness::FixedDelay { secs: 5 }
    }
}

/// Backing server process settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SupervisorConfig {
    /// Launch the backing server at startup.
    pub enabled: bool,

    /// Executable to launch.
    pub command: String,

    /// Arguments passed to the executable.
    pub args: Vec<String>,

    /// Readiness strategy applied after launch.
    pub readiness: Readiness,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            command: "ollama".to_string(),
            args: vec!["serve".to_string()],
            readiness: Readiness::default(),
        }
    }
}

impl Config {
    /// Load configuration from a JSON file, falling back to defaults for missing fields.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            let data = std::fs::read_to_string(path)?;
            let config: Config = serde_json::from_str(&data)?;
            Ok(config)
        } else {
            tracing::warn!("Config file not found at {:?}, using defaults", path);
            Ok(Config::default())
        }
    }

    /// Apply `OLLAMA_SERVER_URL` from the process environment.
    pub fn apply_env(&mut self) {
        self.override_base_url(std::env::var(SERVER_URL_ENV).ok());
    }

    /// Replace the backend base URL when `value` is present and non-blank.
    pub fn override_base_url(&mut self, value: Option<String>) {
        if let Some(url) = value.filter(|v| !v.trim().is_empty()) {
            self.backend.base_url = url.trim().to_string();
        }
    }

    /// Reject values that would only fail later at request time.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = Url::parse(&self.backend.base_url).map_err(|e| ConfigError::InvalidUrl {
            url: self.backend.base_url.clone(),
            reason: e.to_string(),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidUrl {
                url: self.backend.base_url.clone(),
                reason: format!("unsupported scheme {:?}", url.scheme()),
            });
        }

        if self.backend.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "backend.request_timeout_secs",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.backend.pull_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "backend.pull_timeout_secs",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.backend.generate_model.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "backend.generate_model",
                reason: "must not be empty".to_string(),
            });
        }

        if !self.server.docs_path.starts_with('/') || self.server.docs_path == "/" {
            return Err(ConfigError::InvalidValue {
                field: "server.docs_path",
                reason: "must be an absolute path other than \"/\"".to_string(),
            });
        }

        if self.supervisor.enabled && self.supervisor.command.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "supervisor.command",
                reason: "must not be empty".to_string(),
            });
        }
        if let Readiness::Poll {
            interval_ms,
            max_attempts,
            probe_timeout_ms,
        } = self.supervisor.readiness
        {
            if max_attempts == 0 || probe_timeout_ms == 0 || interval_ms == 0 {
                return Err(ConfigError::InvalidValue {
                    field: "supervisor.readiness",
                    reason: "poll interval, attempts and probe timeout must be non-zero"
                        .to_string(),
                });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = Config::default();
        assert_eq!(cfg.backend.base_url, "http://localhost:11434");
        assert_eq!(cfg.backend.generate_model, "llama3.2");
        assert_eq!(cfg.supervisor.command, "ollama");
        assert_eq!(cfg.supervisor.args, vec!["serve".to_string()]);
        assert_eq!(cfg.server.docs_path, "/docs");
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"backend": {"generate_model": "qwen2.5"},
                "supervisor": {"readiness": {"mode": "fixed_delay", "secs": 5}}}"#,
        )
        .unwrap();

        let cfg = Config::load(&path).unwrap();
        assert_eq!(cfg.backend.generate_model, "qwen2.5");
        assert_eq!(cfg.backend.base_url, DEFAULT_BASE_URL);
        assert_eq!(cfg.backend.request_timeout_secs, 120);
        assert_eq!(cfg.supervisor.readiness, Readiness::fixed_default());
        assert!(cfg.supervisor.enabled);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config::load(&dir.path().join("absent.json")).unwrap();
        assert_eq!(cfg.server.listen, "0.0.0.0:8080");
    }

    #[test]
    fn test_bad_json_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(Config::load(&path), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_base_url_override() {
        let mut cfg = Config::default();
        cfg.override_base_url(Some("  ".to_string()));
        assert_eq!(cfg.backend.base_url, DEFAULT_BASE_URL);

        cfg.override_base_url(None);
        assert_eq!(cfg.backend.base_url, DEFAULT_BASE_URL);

        cfg.override_base_url(Some("http://ollama:11434".to_string()));
        assert_eq!(cfg.backend.base_url, "http://ollama:11434");
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut cfg = Config::default();
        cfg.backend.base_url = "ftp://localhost:11434".to_string();
        assert!(matches!(cfg.validate(), Err(ConfigError::InvalidUrl { .. })));

        cfg.backend.base_url = "not a url".to_string();
        assert!(matches!(cfg.validate(), Err(ConfigError::InvalidUrl { .. })));

        let mut cfg = Config::default();
        cfg.backend.request_timeout_secs = 0;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::InvalidValue { field: "backend.request_timeout_secs", .. })
        ));

        let mut cfg = Config::default();
        cfg.server.docs_path = "/".to_string();
        assert!(cfg.validate().is_err());

        let mut cfg = Config::default();
        cfg.supervisor.readiness = Readiness::Poll {
            interval_ms: 100,
            max_attempts: 0,
            probe_timeout_ms: 100,
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_disabled_supervisor_ignores_command() {
        let mut cfg = Config::default();
        cfg.supervisor.enabled = false;
        cfg.supervisor.command = String::new();
        assert!(cfg.validate().is_ok());
    }
}
