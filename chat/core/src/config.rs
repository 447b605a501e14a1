//! TOML Configuration File Support
//!
//! Centralized configuration loading for partchat, supporting a TOML file at
//! `~/.config/partchat/config.toml`.
//!
//! # Configuration Priority
//!
//! Configuration values are loaded with the following priority (highest first):
//! 1. CLI arguments (via [`ConfigOverrides`])
//! 2. Environment variables (`PARTCHAT_*`)
//! 3. TOML configuration file
//! 4. Default values
//!
//! # XDG Base Directory Compliance
//!
//! - `$XDG_CONFIG_HOME/partchat/config.toml` (typically `~/.config/partchat/config.toml`)
//!
//! # Example Configuration
//!
//! ```toml
//! [client]
//! endpoint = "http://localhost:8000/api/v1/chat"
//! user_id = "user123"
//! timeout_secs = 30
//!
//! [conversation]
//! seed_greeting = true
//! greeting = "Hello! Ask me about refrigerator or dishwasher parts."
//! overlap_policy = "reject"
//! max_message_bytes = 32768
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::Url;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::client::HttpTransport;
use crate::controller::{ControllerOptions, OverlapPolicy};
use crate::messages::DEFAULT_GREETING;
use crate::security::InputLimits;

/// Endpoint used when nothing else is configured
pub const DEFAULT_ENDPOINT: &str = "http://localhost:8000/api/v1/chat";

/// Environment variable names
pub mod env {
    /// Chat endpoint URL
    pub const ENDPOINT: &str = "PARTCHAT_ENDPOINT";
    /// Static user id sent with every request
    pub const USER_ID: &str = "PARTCHAT_USER_ID";
    /// Request timeout in seconds
    pub const TIMEOUT_SECS: &str = "PARTCHAT_TIMEOUT_SECS";
    /// Set to `1`/`true` to start without the greeting
    pub const NO_GREETING: &str = "PARTCHAT_NO_GREETING";
    /// `reject` or `latest-wins`
    pub const OVERLAP_POLICY: &str = "PARTCHAT_OVERLAP_POLICY";
    /// Maximum outgoing message size
    pub const MAX_MESSAGE_BYTES: &str = "PARTCHAT_MAX_MESSAGE_BYTES";

    /// Every variable the loader reads
    pub const ALL: [&str; 6] = [
        ENDPOINT,
        USER_ID,
        TIMEOUT_SECS,
        NO_GREETING,
        OVERLAP_POLICY,
        MAX_MESSAGE_BYTES,
    ];
}

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur when loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file at {path}: {source}")]
    Read {
        /// The path that was attempted
        path: PathBuf,
        /// The underlying IO error
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("Failed to parse TOML config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

// =============================================================================
// Configuration Source Tracking
// =============================================================================

/// Tracks where the highest-priority configuration value came from
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

/// `[client]` section
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientToml {
    /// Chat endpoint URL
    pub endpoint: Option<String>,

    /// Static user id
    pub user_id: Option<String>,

    /// Request timeout in seconds
    pub timeout_secs: Option<u64>,
}

/// `[conversation]` section
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversationToml {
    /// Replacement greeting text
    pub greeting: Option<String>,

    /// Whether to seed the greeting at all
    pub seed_greeting: Option<bool>,

    /// Overlapping send behaviour
    pub overlap_policy: Option<OverlapPolicy>,

    /// Maximum outgoing message size in bytes
    pub max_message_bytes: Option<usize>,
}

/// Top-level TOML configuration structure
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatToml {
    /// Client section
    pub client: ClientToml,

    /// Conversation section
    pub conversation: ConversationToml,
}

// =============================================================================
// Main Configuration Struct
// =============================================================================

/// Resolved partchat configuration
///
/// Use [`load_config`] to load with proper priority handling, or
/// [`load_config_from_path`] to layer CLI values on top before validation.
#[derive(Clone, Debug)]
pub struct ChatConfig {
    /// Chat endpoint URL
    pub endpoint: String,

    /// Static user id attached to requests
    pub user_id: Option<String>,

    /// Request timeout (`None` = transport default)
    pub timeout: Option<Duration>,

    /// Greeting text
    pub greeting: String,

    /// Whether the conversation opens with the greeting
    pub seed_greeting: bool,

    /// Overlapping send behaviour
    pub overlap_policy: OverlapPolicy,

    /// Outgoing message limits
    pub limits: InputLimits,

    /// Path to the config file that was loaded (if any)
    pub config_file_path: Option<PathBuf>,

    /// Source of configuration values
    source: ConfigSource,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            user_id: None,
            timeout: None,
            greeting: DEFAULT_GREETING.to_string(),
            seed_greeting: true,
            overlap_policy: OverlapPolicy::default(),
            limits: InputLimits::default(),
            config_file_path: None,
            source: ConfigSource::Default,
        }
    }
}

impl ChatConfig {
    /// Create a new configuration with default values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the primary source of this configuration
    #[must_use]
    pub fn source(&self) -> ConfigSource {
        self.source
    }

    /// Parsed endpoint URL
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the endpoint is not an absolute
    /// `http`/`https` URL.
    pub fn endpoint_url(&self) -> Result<Url, ConfigError> {
        let url = Url::parse(&self.endpoint)
            .map_err(|e| ConfigError::Invalid(format!("endpoint '{}': {e}", self.endpoint)))?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(ConfigError::Invalid(format!(
                "endpoint '{}': unsupported scheme '{other}'",
                self.endpoint
            ))),
        }
    }

    /// Check cross-field constraints
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first bad value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.endpoint_url()?;
        if self.timeout == Some(Duration::ZERO) {
            return Err(ConfigError::Invalid(
                "timeout must be at least one second".to_string(),
            ));
        }
        if self.limits.max_message_bytes == 0 {
            return Err(ConfigError::Invalid(
                "max_message_bytes must be greater than zero".to_string(),
            ));
        }
        if self.seed_greeting && self.greeting.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "greeting is empty; set seed_greeting = false instead".to_string(),
            ));
        }
        Ok(())
    }

    /// Options for a new [`ConversationController`](crate::ConversationController)
    #[must_use]
    pub fn controller_options(&self) -> ControllerOptions {
        ControllerOptions {
            greeting: self.seed_greeting.then(|| self.greeting.clone()),
            overlap_policy: self.overlap_policy,
            limits: self.limits.clone(),
        }
    }

    /// Build the HTTP transport this configuration describes
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint is invalid or the HTTP client cannot
    /// be initialised.
    pub fn http_transport(&self) -> Result<HttpTransport, ConfigError> {
        HttpTransport::new(self.endpoint_url()?, self.timeout)
            .map_err(|e| ConfigError::Invalid(format!("HTTP client: {e}")))
    }
}

// =============================================================================
// Configuration Loading
// =============================================================================

/// Get the default configuration file path
///
/// Returns `$XDG_CONFIG_HOME/partchat/config.toml` or
/// `~/.config/partchat/config.toml` if `XDG_CONFIG_HOME` is not set.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("partchat").join("config.toml"))
}

/// Load configuration from the default file and the process environment
///
/// # Errors
///
/// Returns an error if the config file exists but cannot be parsed, or a
/// value is invalid. A missing config file is not an error.
pub fn load_config() -> Result<ChatConfig, ConfigError> {
    load_config_from_path(default_config_path(), &ConfigOverrides::new())
}

/// Load configuration from a specific path and the process environment,
/// then apply CLI overrides
///
/// The result is validated once, after every layer, so a flag can replace a
/// bad value from the file or environment.
///
/// # Errors
///
/// Returns an error if the specified config file cannot be read or parsed,
/// or a resolved value is invalid.
pub fn load_config_from_path(
    path: Option<PathBuf>,
    overrides: &ConfigOverrides,
) -> Result<ChatConfig, ConfigError> {
    load_config_with_overrides(path.as_deref(), |key| std::env::var(key).ok(), overrides)
}

/// Load configuration reading environment variables through `lookup`
///
/// # Errors
///
/// Same as [`load_config_from_path`].
pub fn load_config_with(
    path: Option<&Path>,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<ChatConfig, ConfigError> {
    load_config_with_overrides(path, lookup, &ConfigOverrides::new())
}

/// Load file and environment layers, apply `overrides`, then validate
///
/// # Errors
///
/// Same as [`load_config_from_path`].
pub fn load_config_with_overrides(
    path: Option<&Path>,
    lookup: impl Fn(&str) -> Option<String>,
    overrides: &ConfigOverrides,
) -> Result<ChatConfig, ConfigError> {
    let mut config = ChatConfig::default();

    if let Some(config_path) = path {
        if config_path.exists() {
            let toml_content =
                std::fs::read_to_string(config_path).map_err(|e| ConfigError::Read {
                    path: config_path.to_path_buf(),
                    source: e,
                })?;

            let toml_config: ChatToml = toml::from_str(&toml_content)?;
            apply_toml_config(&mut config, &toml_config);
            config.config_file_path = Some(config_path.to_path_buf());
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

    apply_env_config(&mut config, lookup)?;
    overrides.merge(&mut config);
    config.validate()?;

    Ok(config)
}

/// Apply TOML configuration values to the config struct
fn apply_toml_config(config: &mut ChatConfig, toml: &ChatToml) {
    if let Some(ref endpoint) = toml.client.endpoint {
        config.endpoint.clone_from(endpoint);
    }
    if toml.client.user_id.is_some() {
        config.user_id.clone_from(&toml.client.user_id);
    }
    if let Some(secs) = toml.client.timeout_secs {
        config.timeout = Some(Duration::from_secs(secs));
    }

    if let Some(ref greeting) = toml.conversation.greeting {
        config.greeting.clone_from(greeting);
    }
    if let Some(seed) = toml.conversation.seed_greeting {
        config.seed_greeting = seed;
    }
    if let Some(policy) = toml.conversation.overlap_policy {
        config.overlap_policy = policy;
    }
    if let Some(bytes) = toml.conversation.max_message_bytes {
        config.limits.max_message_bytes = bytes;
    }
}

/// Parse a numeric environment value
fn parse_env<N: std::str::FromStr>(key: &str, value: &str) -> Result<N, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Invalid(format!("{key}='{value}' is not a number")))
}

/// Apply environment variable overrides to the config
fn apply_env_config(
    config: &mut ChatConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<(), ConfigError> {
    if let Some(endpoint) = lookup(env::ENDPOINT) {
        config.endpoint = endpoint;
        config.source = ConfigSource::Env;
    }
    if let Some(user_id) = lookup(env::USER_ID) {
        config.user_id = Some(user_id).filter(|id| !id.is_empty());
        config.source = ConfigSource::Env;
    }
    if let Some(secs) = lookup(env::TIMEOUT_SECS) {
        config.timeout = Some(Duration::from_secs(parse_env(env::TIMEOUT_SECS, &secs)?));
        config.source = ConfigSource::Env;
    }
    if let Some(flag) = lookup(env::NO_GREETING) {
        // Falsy values leave the file setting alone
        let flag = flag.trim();
        if flag == "1" || flag.eq_ignore_ascii_case("true") {
            config.seed_greeting = false;
            config.source = ConfigSource::Env;
        }
    }
    if let Some(policy) = lookup(env::OVERLAP_POLICY) {
        config.overlap_policy = policy.parse().map_err(ConfigError::Invalid)?;
        config.source = ConfigSource::Env;
    }
    if let Some(bytes) = lookup(env::MAX_MESSAGE_BYTES) {
        config.limits.max_message_bytes = parse_env(env::MAX_MESSAGE_BYTES, &bytes)?;
        config.source = ConfigSource::Env;
    }
    Ok(())
}

// =============================================================================
// CLI Overrides
// =============================================================================

/// Configuration overrides from CLI arguments
///
/// Applied after file and environment loading, so these take precedence.
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    /// Endpoint override
    pub endpoint: Option<String>,

    /// User id override
    pub user_id: Option<String>,

    /// Timeout override in seconds
    pub timeout_secs: Option<u64>,

    /// Disable the seeded greeting
    pub no_greeting: bool,

    /// Overlap policy override
    pub overlap_policy: Option<OverlapPolicy>,
}

impl ConfigOverrides {
    /// Create a new empty set of overrides
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set endpoint override
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Set user id override
    #[must_use]
    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Set timeout override
    #[must_use]
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    /// Start without the greeting
    #[must_use]
    pub fn without_greeting(mut self) -> Self {
        self.no_greeting = true;
        self
    }

    /// Set overlap policy override
    #[must_use]
    pub fn with_overlap_policy(mut self, policy: OverlapPolicy) -> Self {
        self.overlap_policy = Some(policy);
        self
    }

    /// Whether any override is set
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.endpoint.is_none()
            && self.user_id.is_none()
            && self.timeout_secs.is_none()
            && !self.no_greeting
            && self.overlap_policy.is_none()
    }

    /// Apply overrides to a loaded configuration
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the result fails validation.
    pub fn apply(&self, config: &mut ChatConfig) -> Result<(), ConfigError> {
        if self.is_empty() {
            return Ok(());
        }
        self.merge(config);
        config.validate()
    }

    /// Copy set values into `config` without validating
    fn merge(&self, config: &mut ChatConfig) {
        if self.is_empty() {
            return;
        }
        config.source = ConfigSource::Cli;

        if let Some(ref endpoint) = self.endpoint {
            config.endpoint.clone_from(endpoint);
        }
        if self.user_id.is_some() {
            config.user_id.clone_from(&self.user_id);
        }
        if let Some(secs) = self.timeout_secs {
            config.timeout = Some(Duration::from_secs(secs));
        }
        if self.no_greeting {
            config.seed_greeting = false;
        }
        if let Some(policy) = self.overlap_policy {
            config.overlap_policy = policy;
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
