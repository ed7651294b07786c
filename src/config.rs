//! Application Configuration
//!
//! This module provides configuration management for the application,
//! supporting YAML configuration files with sensible defaults and a couple
//! of environment overrides for the document store.

use log::Level;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable naming an alternative config file
pub const CONFIG_PATH_ENV: &str = "LOCATION_REGISTRY_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "config.yaml";

/// A message produced while loading configuration. Loading runs before the
/// logger exists, so these are handed back and logged after setup.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigNotice {
    pub level: Level,
    pub message: String,
}

impl ConfigNotice {
    fn info(message: String) -> Self {
        Self { level: Level::Info, message }
    }

    fn warn(message: String) -> Self {
        Self { level: Level::Warn, message }
    }
}

/// Document store backend types
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    File,
    Mock,
}

impl Default for StoreBackend {
    fn default() -> Self {
        StoreBackend::File
    }
}

impl std::str::FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "file" | "json" => Ok(StoreBackend::File),
            "mock" | "memory" => Ok(StoreBackend::Mock),
            _ => Err(format!("Unknown store backend: {}", s)),
        }
    }
}

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppConfig {
    /// Server configuration
    pub server: ServerConfig,
    /// Per-client request throttling
    pub rate_limit: RateLimitConfig,
    /// Allow-listed shared secrets
    pub api_keys: Vec<String>,
    /// Document store configuration
    pub store: StoreConfig,
    /// Switches between historical endpoint behaviors
    pub compatibility: CompatibilityConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// Number of worker threads
    pub workers: usize,
}

/// Rate limit configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct RateLimitConfig {
    /// Window length in seconds
    pub delay_in_seconds: u64,
    /// Max requests per window per client; 0 disables limiting
    pub max_requests_per_second: u32,
}

/// Document store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StoreConfig {
    /// Store backend type
    pub backend: StoreBackend,
    /// Path of the JSON document
    pub path: String,
}

/// Historical behavior switches
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct CompatibilityConfig {
    /// Replace a same-label location on add instead of appending
    pub dedupe_location_labels: bool,
    /// Answer a missed remove-location with `success:false` instead of an empty 204
    pub report_missing_location: bool,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingConfig {
    /// Path to log4rs configuration file
    pub config_file: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            workers: 4,
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            delay_in_seconds: 1,
            max_requests_per_second: 10,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::File,
            path: "./data/data.json".to_string(),
        }
    }
}

impl Default for CompatibilityConfig {
    fn default() -> Self {
        Self {
            dedupe_location_labels: false,
            report_missing_location: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            config_file: "server_log.yaml".to_string(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            rate_limit: RateLimitConfig::default(),
            api_keys: Vec::new(),
            store: StoreConfig::default(),
            compatibility: CompatibilityConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default location, then apply environment
    /// overrides and fix up unusable values
    pub fn load() -> Result<(Self, Vec<ConfigNotice>), Box<dyn std::error::Error>> {
        let config_path = env::var(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));

        let mut notices = Vec::new();
        let mut config = Self::load_from(&config_path)?;
        if config_path.exists() {
            notices.push(ConfigNotice::info(format!("Loaded configuration from {}", config_path.display())));
        } else {
            notices.push(ConfigNotice::warn(format!(
                "Config file {} not found, using defaults",
                config_path.display()
            )));
        }
        notices.extend(config.apply_env_overrides());
        notices.extend(config.sanitize());
        Ok((config, notices))
    }

    /// Load configuration from file, use defaults if not found
    pub fn load_from(config_path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        if config_path.exists() {
            let content = fs::read_to_string(config_path)?;
            let config: AppConfig = serde_yaml::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Apply `STORE_BACKEND` and `STORE_PATH` on top of the file configuration
    pub fn apply_env_overrides(&mut self) -> Vec<ConfigNotice> {
        let mut notices = Vec::new();
        if let Ok(backend_str) = env::var("STORE_BACKEND") {
            match backend_str.parse::<StoreBackend>() {
                Ok(backend) => {
                    notices.push(ConfigNotice::info(format!(
                        "Using store backend from environment: {:?}",
                        backend
                    )));
                    self.store.backend = backend;
                }
                Err(e) => {
                    notices.push(ConfigNotice::warn(format!(
                        "Invalid store backend in environment: {}. Keeping {:?}.",
                        e, self.store.backend
                    )));
                }
            }
        }

        if let Ok(path) = env::var("STORE_PATH") {
            notices.push(ConfigNotice::info(format!("Using store path from environment: {}", path)));
            self.store.path = path;
        }
        notices
    }

    /// Replace values the server cannot start with
    pub fn sanitize(&mut self) -> Vec<ConfigNotice> {
        let mut notices = Vec::new();
        if self.server.workers == 0 {
            notices.push(ConfigNotice::warn("server.workers must be at least 1, using 1".to_string()));
            self.server.workers = 1;
        }
        notices
    }
}
