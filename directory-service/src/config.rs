//! Configuration management using Figment
//!
//! Configuration is loaded from multiple sources with the following precedence (highest to lowest):
//! 1. Environment variables (prefix: DIRECTORY_, nested keys separated by `__`)
//! 2. Config file: ./config.toml (or an explicit path)
//! 3. Default values

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use crate::error::{Error, Result};

/// Environment variable prefix
pub const ENV_PREFIX: &str = "DIRECTORY_";

/// Lower bound for the delay between streamed users
pub const MIN_STREAM_INTERVAL_MS: u64 = 100;

/// Minimum accepted length of an explicitly configured signing key
pub const MIN_SIGNING_KEY_BYTES: usize = 32;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Service configuration
    #[serde(default)]
    pub service: ServiceConfig,

    /// gRPC server configuration
    #[serde(default)]
    pub grpc: GrpcConfig,

    /// Streaming configuration
    #[serde(default)]
    pub stream: StreamConfig,

    /// Directory contents
    #[serde(default)]
    pub directory: DirectoryConfig,

    /// Token issuance and validation
    #[serde(default)]
    pub auth: AuthConfig,
}

/// Service-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Service name
    #[serde(default = "default_service_name")]
    pub name: String,

    /// Address to bind
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on (gRPC and the HTTP token endpoint share it)
    #[serde(default = "default_port")]
    pub port: u16,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log output format (pretty, json)
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

/// gRPC server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrpcConfig {
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Maximum message size in MB
    #[serde(default = "default_grpc_max_message_mb")]
    pub max_message_size_mb: usize,
}

/// Server-streaming configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Delay before each streamed item, in milliseconds
    #[serde(default = "default_stream_interval_ms")]
    pub interval_ms: u64,
}

/// Directory contents configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryConfig {
    /// Number of users generated at startup
    #[serde(default = "default_directory_size")]
    pub size: usize,

    /// Generation seed (random when unset)
    #[serde(default)]
    pub seed: Option<u64>,
}

/// Token configuration
///
/// Issuer and audience are always written into issued tokens, but are only
/// checked on validation when the matching flag is set. Both flags default
/// to off.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Hex-encoded HMAC key. A fresh random key is generated at startup when unset.
    #[serde(default)]
    pub signing_key: Option<String>,

    /// Reject tokens whose `iss` claim does not match
    #[serde(default)]
    pub validate_issuer: bool,

    /// Reject tokens whose `aud` claim does not match
    #[serde(default)]
    pub validate_audience: bool,
}

// Default value functions
fn default_service_name() -> String {
    "directory-service".to_string()
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5001
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_grpc_max_message_mb() -> usize {
    4 // 4 MB
}

fn default_stream_interval_ms() -> u64 {
    MIN_STREAM_INTERVAL_MS
}

fn default_directory_size() -> usize {
    10
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}

impl Default for GrpcConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
            max_message_size_mb: default_grpc_max_message_mb(),
        }
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_stream_interval_ms(),
        }
    }
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            size: default_directory_size(),
            seed: None,
        }
    }
}

impl GrpcConfig {
    /// Request timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Maximum message size in bytes
    pub fn max_message_size_bytes(&self) -> usize {
        self.max_message_size_mb * 1024 * 1024
    }
}

impl StreamConfig {
    /// Delay before each streamed item, never below the enforced minimum
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms.max(MIN_STREAM_INTERVAL_MS))
    }
}

impl AuthConfig {
    /// Decode the configured signing key, if any
    pub fn signing_key_bytes(&self) -> Result<Option<Vec<u8>>> {
        let Some(encoded) = &self.signing_key else {
            return Ok(None);
        };

        let bytes = hex::decode(encoded.trim()).map_err(|e| {
            config_error(format!("auth.signing_key must be hex encoded: {}", e))
        })?;

        if bytes.len() < MIN_SIGNING_KEY_BYTES {
            return Err(config_error(format!(
                "auth.signing_key must be at least {} bytes, got {}",
                MIN_SIGNING_KEY_BYTES,
                bytes.len()
            )));
        }

        Ok(Some(bytes))
    }
}

impl Config {
    /// Load configuration from `./config.toml` and the environment
    pub fn load() -> Result<Self> {
        Self::load_from("config.toml")
    }

    /// Load configuration from a specific file
    ///
    /// A missing file is not an error; defaults and environment variables
    /// still apply.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            tracing::info!("Loading configuration from: {}", path.display());
        } else {
            tracing::debug!("No configuration file at {}, using defaults", path.display());
        }

        let config: Config = Self::figment(path).extract()?;
        config.validate()?;
        Ok(config)
    }

    /// The layered figment used by [`Config::load_from`]
    pub fn figment(path: impl AsRef<Path>) -> Figment {
        Figment::new()
            // Start with defaults
            .merge(Serialized::defaults(Config::default()))
            // Load from config file (if exists)
            .merge(Toml::file(path.as_ref()))
            // Override with environment variables
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Check values the type system can't
    pub fn validate(&self) -> Result<()> {
        if self.service.name.is_empty() {
            return Err(config_error("service.name cannot be empty"));
        }

        if self.service.port == 0 {
            return Err(config_error("service.port must be greater than 0"));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&self.service.log_level.as_str()) {
            return Err(config_error(format!(
                "service.log_level must be one of: {}",
                valid_log_levels.join(", ")
            )));
        }

        if !["pretty", "json"].contains(&self.service.log_format.as_str()) {
            return Err(config_error("service.log_format must be one of: pretty, json"));
        }

        if self.stream.interval_ms < MIN_STREAM_INTERVAL_MS {
            return Err(config_error(format!(
                "stream.interval_ms must be at least {}",
                MIN_STREAM_INTERVAL_MS
            )));
        }

        if self.directory.size == 0 {
            return Err(config_error("directory.size must be greater than 0"));
        }

        if i32::try_from(self.directory.size).is_err() {
            return Err(config_error("directory.size does not fit a 32-bit user id"));
        }

        self.auth.signing_key_bytes()?;

        Ok(())
    }

    /// Socket address the server binds to
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.service.host, self.service.port)
            .parse()
            .map_err(|e| config_error(format!("invalid service.host/service.port: {}", e)))
    }
}

fn config_error(message: impl Into<String>) -> Error {
    Error::Config(Box::new(figment::Error::from(message.into())))
}
