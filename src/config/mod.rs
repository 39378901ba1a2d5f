//! Configuration management
//!
//! This module handles loading and parsing configuration for trailpost.
//! Configuration can be loaded from:
//! - config.yml file
//! - Environment variables (override file settings)
//!
//! Missing optional values are filled with sensible defaults, so a fresh
//! checkout runs against the in-memory store with no file at all.

use serde::{Deserialize, Serialize};

use crate::models::RoleSet;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Content store (club REST API) configuration
    #[serde(default)]
    pub content_store: StoreConfig,
    /// Identity provider configuration
    #[serde(default)]
    pub identity: IdentityConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
    /// CORS allowed origin (the back-office front end)
    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origin: default_cors_origin(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_cors_origin() -> String {
    "http://localhost:3000".to_string()
}

/// Content store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Store driver (memory or rest)
    #[serde(default)]
    pub driver: StoreDriver,
    /// Base URL of the club REST API
    #[serde(default = "default_api_base_url")]
    pub base_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
    /// Initial access token for the REST API
    #[serde(default)]
    pub access_token: Option<String>,
    /// Refresh token used when the access token expires
    #[serde(default)]
    pub refresh_token: Option<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            driver: StoreDriver::default(),
            base_url: default_api_base_url(),
            timeout_seconds: default_timeout(),
            access_token: None,
            refresh_token: None,
        }
    }
}

fn default_api_base_url() -> String {
    "http://localhost:8000/api".to_string()
}

fn default_timeout() -> u64 {
    15
}

/// Content store driver type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreDriver {
    /// In-process store (default, for local runs)
    #[default]
    Memory,
    /// Club REST API
    Rest,
}

/// Identity provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    /// Identity driver (static or rest)
    #[serde(default)]
    pub driver: IdentityDriver,
    /// Base URL of the auth API (`GET {base_url}/auth/me`)
    #[serde(default = "default_api_base_url")]
    pub base_url: String,
    /// How long a resolved token stays cached, in seconds
    #[serde(default = "default_identity_ttl")]
    pub cache_ttl_seconds: u64,
    /// Token table for the static driver
    #[serde(default)]
    pub users: Vec<StaticUser>,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            driver: IdentityDriver::default(),
            base_url: default_api_base_url(),
            cache_ttl_seconds: default_identity_ttl(),
            users: Vec::new(),
        }
    }
}

fn default_identity_ttl() -> u64 {
    300
}

/// Identity driver type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum IdentityDriver {
    /// Token table from this file (default, for development)
    #[default]
    Static,
    /// Club auth API
    Rest,
}

/// Entry of the static token table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaticUser {
    pub token: String,
    pub user_id: i64,
    pub username: String,
    #[serde(default)]
    pub roles: RoleSet,
}

/// Error type for configuration parsing
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    FileRead {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{path}': {message}")]
    ParseError {
        path: String,
        message: String,
    },
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

impl Config {
    /// Load configuration from file
    ///
    /// If the file doesn't exist or is empty, returns default configuration.
    /// If the file exists but is invalid YAML, returns an error with details.
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.display().to_string(),
            source: e,
        })?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config = serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.display().to_string(),
            message: format_yaml_error(&e),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file with environment variable overrides
    ///
    /// Environment variables follow the pattern:
    /// - TRAILPOST_SERVER_HOST / _PORT / _CORS_ORIGIN
    /// - TRAILPOST_STORE_DRIVER / _BASE_URL / _TIMEOUT_SECONDS
    /// - TRAILPOST_STORE_ACCESS_TOKEN / _REFRESH_TOKEN
    /// - TRAILPOST_IDENTITY_DRIVER / _BASE_URL / _CACHE_TTL_SECONDS
    pub fn load_with_env(path: &std::path::Path) -> anyhow::Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that parse but cannot work
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.content_store.driver == StoreDriver::Rest && self.content_store.base_url.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "content_store.base_url is required for the rest driver".to_string(),
            ));
        }
        if self.identity.driver == IdentityDriver::Rest && self.identity.base_url.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "identity.base_url is required for the rest driver".to_string(),
            ));
        }
        if self.content_store.timeout_seconds == 0 {
            return Err(ConfigError::ValidationError(
                "content_store.timeout_seconds must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Apply environment variable overrides to the configuration
    fn apply_env_overrides(&mut self) {
        // Server configuration
        if let Ok(host) = std::env::var("TRAILPOST_SERVER_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("TRAILPOST_SERVER_PORT") {
            if let Ok(port) = port.parse::<u16>() {
                self.server.port = port;
            }
        }
        if let Ok(cors_origin) = std::env::var("TRAILPOST_SERVER_CORS_ORIGIN") {
            self.server.cors_origin = cors_origin;
        }

        // Content store configuration
        if let Ok(driver) = std::env::var("TRAILPOST_STORE_DRIVER") {
            match driver.to_lowercase().as_str() {
                "memory" => self.content_store.driver = StoreDriver::Memory,
                "rest" => self.content_store.driver = StoreDriver::Rest,
                _ => {} // Ignore invalid values
            }
        }
        if let Ok(url) = std::env::var("TRAILPOST_STORE_BASE_URL") {
            self.content_store.base_url = url;
        }
        if let Ok(timeout) = std::env::var("TRAILPOST_STORE_TIMEOUT_SECONDS") {
            if let Ok(timeout) = timeout.parse::<u64>() {
                self.content_store.timeout_seconds = timeout;
            }
        }
        if let Ok(token) = std::env::var("TRAILPOST_STORE_ACCESS_TOKEN") {
            self.content_store.access_token = Some(token);
        }
        if let Ok(token) = std::env::var("TRAILPOST_STORE_REFRESH_TOKEN") {
            self.content_store.refresh_token = Some(token);
        }

        // Identity configuration
        if let Ok(driver) = std::env::var("TRAILPOST_IDENTITY_DRIVER") {
            match driver.to_lowercase().as_str() {
                "static" => self.identity.driver = IdentityDriver::Static,
                "rest" => self.identity.driver = IdentityDriver::Rest,
                _ => {}
            }
        }
        if let Ok(url) = std::env::var("TRAILPOST_IDENTITY_BASE_URL") {
            self.identity.base_url = url;
        }
        if let Ok(ttl) = std::env::var("TRAILPOST_IDENTITY_CACHE_TTL_SECONDS") {
            if let Ok(ttl) = ttl.parse::<u64>() {
                self.identity.cache_ttl_seconds = ttl;
            }
        }
    }
}

/// Format YAML parsing error with location and context
fn format_yaml_error(e: &serde_yaml::Error) -> String {
    if let Some(location) = e.location() {
        format!(
            "at line {}, column {}: {}",
            location.line(),
            location.column(),
            e
        )
    } else {
        e.to_string()
    }
}

#[cfg(test)]
static CONFIG_ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());
