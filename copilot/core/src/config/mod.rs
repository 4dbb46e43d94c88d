//! Client Configuration
//!
//! One [`ClientConfig`] value is built at startup and handed explicitly to every
//! component that needs it. Nothing else in the crate reads the process
//! environment.
//!
//! # Configuration Priority
//!
//! Configuration values are loaded with the following priority (highest first):
//! 1. CLI arguments ([`ConfigOverrides`])
//! 2. Environment variables
//! 3. TOML configuration file
//! 4. Default values
//!
//! # XDG Base Directory Compliance
//!
//! - Config file: `$XDG_CONFIG_HOME/helpdesk-copilot/client.toml`
//! - Token file: `$XDG_DATA_HOME/helpdesk-copilot/auth_token`
//!
//! # Example Configuration
//!
//! ```toml
//! [api]
//! url = "https://helpdesk.example.com/api"
//! request_timeout_ms = 30000
//!
//! [session]
//! token_path = "/home/me/.local/share/helpdesk-copilot/auth_token"
//!
//! [chat]
//! send_auth = true
//! show_error_detail = false
//! ```
//!
//! # Environment Variables
//!
//! - `COPILOT_API_URL`: backend base URL
//! - `COPILOT_REQUEST_TIMEOUT_MS`: per-request timeout (`0` disables)
//! - `COPILOT_TOKEN_PATH`: token file location
//! - `COPILOT_CHAT_AUTH`: send the bearer token with chat turns (`0`/`false` to disable)
//! - `COPILOT_ERROR_DETAIL`: include diagnostic detail in failure messages

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Backend used when nothing else is configured
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Directory name under the XDG config/data homes
pub const APP_DIR_NAME: &str = "helpdesk-copilot";

/// Token file name within the data directory
pub const TOKEN_FILENAME: &str = "auth_token";

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur when loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file at {path}: {source}")]
    ReadError {
        /// The path that was attempted
        path: PathBuf,
        /// The underlying IO error
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("Failed to parse TOML config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

// =============================================================================
// Configuration Source Tracking
// =============================================================================

/// Tracks where a configuration value came from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Value from command-line argument
    Cli,
    /// Value from environment variable
    Env,
    /// Value from TOML configuration file
    File,
    /// Default value
    Default,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cli => write!(f, "CLI"),
            Self::Env => write!(f, "environment"),
            Self::File => write!(f, "config file"),
            Self::Default => write!(f, "default"),
        }
    }
}

// =============================================================================
// TOML Configuration Structures
// =============================================================================

/// `[api]` section
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiToml {
    /// Backend base URL
    pub url: Option<String>,

    /// Per-request timeout in milliseconds (0 = no timeout)
    pub request_timeout_ms: Option<u64>,
}

/// `[session]` section
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionToml {
    /// Where the access token is persisted
    pub token_path: Option<PathBuf>,
}

/// `[chat]` section
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatToml {
    /// Whether chat turns carry the bearer token
    pub send_auth: Option<bool>,

    /// Whether failure messages include diagnostic detail
    pub show_error_detail: Option<bool>,
}

/// Top-level TOML configuration structure
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientToml {
    /// Backend section
    pub api: ApiToml,

    /// Session persistence section
    pub session: SessionToml,

    /// Chat behaviour section
    pub chat: ChatToml,
}

// =============================================================================
// Main Configuration Struct
// =============================================================================

/// Effective client configuration
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Backend base URL, without a trailing slash
    pub api_url: String,

    /// Per-request timeout; `None` waits indefinitely
    pub request_timeout: Option<Duration>,

    /// Token file used by the durable session store
    pub token_path: PathBuf,

    /// Whether `/chat` requests carry the bearer token
    pub send_auth_on_chat: bool,

    /// Whether failure messages include diagnostic detail in their text
    pub show_error_detail: bool,

    /// Path to the config file that was loaded (if any)
    pub config_file_path: Option<PathBuf>,

    /// Source of configuration values
    source: ConfigSource,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            request_timeout: None,
            token_path: default_token_path(),
            send_auth_on_chat: true,
            show_error_detail: false,
            config_file_path: None,
            source: ConfigSource::Default,
        }
    }
}

impl ClientConfig {
    /// Create a new configuration with default values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration pointing at a specific backend, everything else default
    #[must_use]
    pub fn with_api_url(api_url: impl Into<String>) -> Self {
        Self {
            api_url: normalize_url(&api_url.into()),
            ..Self::default()
        }
    }

    /// Get the primary source of this configuration
    #[must_use]
    pub fn source(&self) -> ConfigSource {
        self.source
    }

    /// Set the configuration source
    pub fn set_source(&mut self, source: ConfigSource) {
        self.source = source;
    }

    /// Check values that cannot be expressed by the types alone
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] for an empty or non-HTTP base URL.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_url.is_empty() {
            return Err(ConfigError::ValidationError(
                "api_url must not be empty".to_string(),
            ));
        }
        if !(self.api_url.starts_with("http://") || self.api_url.starts_with("https://")) {
            return Err(ConfigError::ValidationError(format!(
                "api_url must start with http:// or https://, got {}",
                self.api_url
            )));
        }
        Ok(())
    }
}

// =============================================================================
// Configuration Loading
// =============================================================================

/// Get the default configuration file path
///
/// Returns `$XDG_CONFIG_HOME/helpdesk-copilot/client.toml`.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join(APP_DIR_NAME).join("client.toml"))
}

/// Get the default token file path
///
/// Prefers the XDG data directory, then the config directory, then the
/// working directory.
#[must_use]
pub fn default_token_path() -> PathBuf {
    dirs::data_dir()
        .or_else(dirs::config_dir)
        .map(|p| p.join(APP_DIR_NAME).join(TOKEN_FILENAME))
        .unwrap_or_else(|| PathBuf::from(TOKEN_FILENAME))
}

/// Load configuration from all sources with proper priority
///
/// # Errors
///
/// Returns an error if the config file exists but cannot be parsed.
/// A missing config file is not an error (defaults are used).
pub fn load_config() -> Result<ClientConfig, ConfigError> {
    load_config_from_path(default_config_path())
}

/// Load configuration from a specific path
///
/// # Arguments
///
/// * `path` - Optional path to the configuration file. If `None`, only defaults
///   and environment variables are used.
///
/// # Errors
///
/// Returns an error if the specified config file cannot be read or parsed,
/// or the result fails [`ClientConfig::validate`].
pub fn load_config_from_path(path: Option<PathBuf>) -> Result<ClientConfig, ConfigError> {
    let mut config = ClientConfig::default();

    if let Some(ref config_path) = path {
        if config_path.exists() {
            let toml_content =
                std::fs::read_to_string(config_path).map_err(|e| ConfigError::ReadError {
                    path: config_path.clone(),
                    source: e,
                })?;

            let toml_config: ClientToml = toml::from_str(&toml_content)?;
            apply_toml_config(&mut config, &toml_config);
            config.config_file_path = Some(config_path.clone());
            config.source = ConfigSource::File;

            tracing::info!(
                path = %config_path.display(),
                "Loaded configuration from file"
            );
        } else {
            tracing::debug!(
                path = %config_path.display(),
                "Config file not found, using defaults"
            );
        }
    }

    apply_env_config(&mut config, |key| std::env::var(key).ok());

    config.validate()?;
    Ok(config)
}

/// Apply TOML configuration values to the config struct
fn apply_toml_config(config: &mut ClientConfig, toml: &ClientToml) {
    if let Some(ref url) = toml.api.url {
        config.api_url = normalize_url(url);
    }
    if let Some(ms) = toml.api.request_timeout_ms {
        config.request_timeout = timeout_from_ms(ms);
    }
    if let Some(ref path) = toml.session.token_path {
        config.token_path = path.clone();
    }
    if let Some(send) = toml.chat.send_auth {
        config.send_auth_on_chat = send;
    }
    if let Some(show) = toml.chat.show_error_detail {
        config.show_error_detail = show;
    }
}

/// Apply environment variable overrides to the config
///
/// `lookup` resolves a variable name; tests pass a map instead of the real
/// environment.
fn apply_env_config<F>(config: &mut ClientConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = lookup("COPILOT_API_URL") {
        config.api_url = normalize_url(&url);
        config.source = ConfigSource::Env;
    }
    if let Some(timeout) = lookup("COPILOT_REQUEST_TIMEOUT_MS") {
        if let Ok(ms) = timeout.parse::<u64>() {
            config.request_timeout = timeout_from_ms(ms);
            config.source = ConfigSource::Env;
        } else {
            tracing::warn!(value = %timeout, "Ignoring unparsable COPILOT_REQUEST_TIMEOUT_MS");
        }
    }
    if let Some(path) = lookup("COPILOT_TOKEN_PATH") {
        config.token_path = PathBuf::from(path);
        config.source = ConfigSource::Env;
    }
    if let Some(send) = lookup("COPILOT_CHAT_AUTH") {
        config.send_auth_on_chat = parse_flag(&send);
        config.source = ConfigSource::Env;
    }
    if let Some(show) = lookup("COPILOT_ERROR_DETAIL") {
        config.show_error_detail = parse_flag(&show);
        config.source = ConfigSource::Env;
    }
}

fn parse_flag(value: &str) -> bool {
    value != "0" && value.to_lowercase() != "false"
}

fn timeout_from_ms(ms: u64) -> Option<Duration> {
    (ms > 0).then(|| Duration::from_millis(ms))
}

fn normalize_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

// =============================================================================
// CLI Override Support
// =============================================================================

/// Builder for applying CLI overrides to configuration
///
/// Use this after [`load_config`] to apply command-line argument overrides.
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    /// Backend URL override
    pub api_url: Option<String>,

    /// Request timeout override (milliseconds, 0 disables)
    pub request_timeout_ms: Option<u64>,

    /// Token file override
    pub token_path: Option<PathBuf>,
}

impl ConfigOverrides {
    /// Create a new empty set of overrides
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set backend URL override
    #[must_use]
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = Some(url.into());
        self
    }

    /// Set request timeout override
    #[must_use]
    pub fn with_request_timeout_ms(mut self, ms: u64) -> Self {
        self.request_timeout_ms = Some(ms);
        self
    }

    /// Set token file override
    #[must_use]
    pub fn with_token_path(mut self, path: PathBuf) -> Self {
        self.token_path = Some(path);
        self
    }

    /// Whether any override is set
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.api_url.is_none() && self.request_timeout_ms.is_none() && self.token_path.is_none()
    }

    /// Apply these overrides to a configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the overridden configuration fails validation.
    pub fn apply(self, config: &mut ClientConfig) -> Result<(), ConfigError> {
        if self.is_empty() {
            return Ok(());
        }
        if let Some(url) = self.api_url {
            config.api_url = normalize_url(&url);
        }
        if let Some(ms) = self.request_timeout_ms {
            config.request_timeout = timeout_from_ms(ms);
        }
        if let Some(path) = self.token_path {
            config.token_path = path;
        }
        config.source = ConfigSource::Cli;
        config.validate()
    }
}
