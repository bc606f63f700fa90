//! Configuration loading, validation, and management for RagBridge.
//!
//! Loads configuration from `~/.ragbridge/config.toml` with environment
//! variable overrides. Validates all settings at startup; the resulting
//! config is never mutated afterwards.

use ragbridge_core::template::Template;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ENV_ENABLED: &str = "ENABLE_CUSTOM_RAG_SERVICE";
pub const ENV_URL: &str = "CUSTOM_RAG_SERVICE_URL";
pub const ENV_API_KEY: &str = "CUSTOM_RAG_SERVICE_API_KEY";
pub const ENV_TIMEOUT: &str = "CUSTOM_RAG_SERVICE_TIMEOUT";
pub const ENV_HEALTHZ_PORT: &str = "HEALTHZ_PORT";
pub const ENV_HEALTHZ_READY_FILE: &str = "HEALTHZ_READY_FILE";

pub const DEFAULT_CONTEXT_TEMPLATE: &str = "Based on the following retrieved context, please answer the user's question.

### Retrieved Context:

{context}

### User Question: {query}

Please provide a comprehensive answer based on the context above. If the context doesn't contain relevant information, say so.";

/// The root configuration structure.
///
/// Maps directly to `~/.ragbridge/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Context filter settings
    #[serde(default)]
    pub filter: FilterConfig,

    /// Liveness probe settings
    #[serde(default)]
    pub healthz: HealthzConfig,
}

/// Settings for the context filter hook.
#[derive(Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Host pipelines this filter applies to. `["*"]` = all.
    #[serde(default = "default_pipelines")]
    pub pipelines: Vec<String>,

    /// Ordering among multiple filters (lower runs first)
    #[serde(default)]
    pub priority: i32,

    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Retrieval endpoint. Empty = not configured.
    #[serde(default)]
    pub rag_service_url: String,

    /// Sent as `Authorization: Bearer <key>` when set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rag_service_api_key: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub rag_service_timeout: u64,

    #[serde(default = "default_top_k")]
    pub top_k: u32,

    /// Insert the context message and emit sources
    #[serde(default = "default_true")]
    pub inject_context: bool,

    /// Must contain `{context}` and `{query}`
    #[serde(default = "default_context_template")]
    pub context_template: String,
}

fn default_pipelines() -> Vec<String> {
    vec!["*".into()]
}
fn default_true() -> bool {
    true
}
fn default_timeout() -> u64 {
    30
}
fn default_top_k() -> u32 {
    5
}
fn default_context_template() -> String {
    DEFAULT_CONTEXT_TEMPLATE.into()
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            pipelines: default_pipelines(),
            priority: 0,
            enabled: true,
            rag_service_url: String::new(),
            rag_service_api_key: None,
            rag_service_timeout: default_timeout(),
            top_k: default_top_k(),
            inject_context: true,
            context_template: default_context_template(),
        }
    }
}

/// Redact a secret for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for FilterConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterConfig")
            .field("pipelines", &self.pipelines)
            .field("priority", &self.priority)
            .field("enabled", &self.enabled)
            .field("rag_service_url", &self.rag_service_url)
            .field("rag_service_api_key", &redact(&self.rag_service_api_key))
            .field("rag_service_timeout", &self.rag_service_timeout)
            .field("top_k", &self.top_k)
            .field("inject_context", &self.inject_context)
            .field("context_template", &self.context_template)
            .finish()
    }
}

impl FilterConfig {
    /// Whether a retrieval endpoint has been set.
    pub fn is_configured(&self) -> bool {
        !self.rag_service_url.trim().is_empty()
    }

    /// The API key, if one is set and non-empty.
    pub fn api_key(&self) -> Option<&str> {
        self.rag_service_api_key
            .as_deref()
            .filter(|k| !k.is_empty())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.rag_service_timeout)
    }

    /// Whether this filter runs for the given host pipeline.
    pub fn applies_to(&self, pipeline_id: &str) -> bool {
        self.pipelines
            .iter()
            .any(|p| p == "*" || p == pipeline_id)
    }

    /// Validate the filter settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.enabled {
            let url = self.rag_service_url.trim();
            if url.is_empty() {
                return Err(ConfigError::ValidationError(format!(
                    "rag_service_url must be set when the filter is enabled (or set {ENV_URL})"
                )));
            }
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ConfigError::ValidationError(format!(
                    "rag_service_url must start with http:// or https://, got {url}"
                )));
            }
        }

        if self.rag_service_timeout == 0 {
            return Err(ConfigError::ValidationError(
                "rag_service_timeout must be > 0".into(),
            ));
        }

        if self.top_k == 0 {
            return Err(ConfigError::ValidationError("top_k must be > 0".into()));
        }

        Template::parse_strict(&self.context_template).map_err(|e| {
            ConfigError::ValidationError(format!("context_template is invalid: {e}"))
        })?;

        Ok(())
    }
}

/// Settings for the standalone liveness probe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthzConfig {
    #[serde(default = "default_healthz_port")]
    pub port: u16,

    /// The probe reports ready while this file exists
    #[serde(default = "default_ready_file")]
    pub ready_file: PathBuf,
}

fn default_healthz_port() -> u16 {
    8081
}
fn default_ready_file() -> PathBuf {
    PathBuf::from("/tmp/healthz_ready")
}

impl Default for HealthzConfig {
    fn default() -> Self {
        Self {
            port: default_healthz_port(),
            ready_file: default_ready_file(),
        }
    }
}

impl HealthzConfig {
    /// Build from `HEALTHZ_PORT` / `HEALTHZ_READY_FILE`, defaults otherwise.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env(&lookup)?;
        Ok(config)
    }

    /// Apply `HEALTHZ_*` overrides using `lookup` to read variables.
    pub fn apply_env(
        &mut self,
        lookup: &impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(port) = lookup(ENV_HEALTHZ_PORT) {
            self.port = port.trim().parse().map_err(|_| {
                ConfigError::ValidationError(format!("{ENV_HEALTHZ_PORT} is not a valid port: {port}"))
            })?;
        }
        if let Some(path) = lookup(ENV_HEALTHZ_READY_FILE) {
            self.ready_file = PathBuf::from(path);
        }
        Ok(())
    }
}

impl AppConfig {
    /// Default config file: `~/.ragbridge/config.toml`.
    pub fn default_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Load from `path`, apply environment overrides, validate.
    ///
    /// Environment variables override file values:
    /// - `ENABLE_CUSTOM_RAG_SERVICE` (`"true"` enables, anything else disables)
    /// - `CUSTOM_RAG_SERVICE_URL`
    /// - `CUSTOM_RAG_SERVICE_API_KEY`
    /// - `CUSTOM_RAG_SERVICE_TIMEOUT`
    /// - `HEALTHZ_PORT`, `HEALTHZ_READY_FILE`
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::read(path)?;
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a config file without overrides or validation.
    ///
    /// A missing file yields the defaults.
    pub fn read(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Apply environment overrides using `lookup` to read variables.
    pub fn apply_env(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        let filter = &mut self.filter;

        if let Some(enabled) = lookup(ENV_ENABLED) {
            filter.enabled = enabled.trim().eq_ignore_ascii_case("true");
        }
        if let Some(url) = lookup(ENV_URL) {
            filter.rag_service_url = url;
        }
        if let Some(key) = lookup(ENV_API_KEY) {
            filter.rag_service_api_key = Some(key).filter(|k| !k.is_empty());
        }
        if let Some(timeout) = lookup(ENV_TIMEOUT) {
            filter.rag_service_timeout = timeout.trim().parse().map_err(|_| {
                ConfigError::ValidationError(format!("{ENV_TIMEOUT} must be an integer, got {timeout}"))
            })?;
        }

        self.healthz.apply_env(&lookup)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.filter.validate()
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".ragbridge")
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
