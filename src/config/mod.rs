//! Configuration management
//!
//! Loads and saves configuration from XDG-compliant paths.
//! Config location: ~/.config/driver-locator/config.toml
//!
//! Deployment environment variables (`X_API_KEY`, `MONGO_URI`, ...) are
//! applied on top of the file after loading. The resulting `Config` is
//! built once at startup and handed to each component's constructor.

pub mod defaults;

use crate::error::{Error, Result};
use defaults::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Listener settings for both services
    #[serde(default)]
    pub server: ServerConfig,

    /// Storage backend settings
    #[serde(default)]
    pub store: StoreConfig,

    /// Location service settings
    #[serde(default)]
    pub locations: LocationsConfig,

    /// Matching service settings
    #[serde(default)]
    pub matching: MatchingConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Location service port
    #[serde(default = "default_locations_port")]
    pub locations_port: u16,

    /// Matching service port
    #[serde(default = "default_matching_port")]
    pub matching_port: u16,

    /// Seconds to let in-flight requests finish after a shutdown signal
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,
}

/// Which store implementation backs the location service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    #[default]
    Mongo,
    Memory,
}

/// Storage settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,

    #[serde(default = "default_mongo_uri")]
    pub mongo_uri: String,

    #[serde(default = "default_database")]
    pub database: String,

    #[serde(default = "default_collection")]
    pub collection: String,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

/// How the CSV importer treats rows that fail to parse
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportPolicy {
    /// Any bad row fails the whole import and nothing is written
    #[default]
    Strict,
    /// Bad rows are skipped and reported as failed in the result
    SkipInvalid,
}

/// Location service settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationsConfig {
    /// Pre-shared key expected in the X-API-Key header
    #[serde(default)]
    pub api_key: String,

    /// Largest accepted search radius in meters
    #[serde(default = "default_max_radius")]
    pub max_radius_meters: f64,

    /// Maximum results returned by one search
    #[serde(default = "default_max_results")]
    pub max_results: usize,

    /// Maximum locations accepted by one bulk request
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,

    #[serde(default)]
    pub import_policy: ImportPolicy,
}

/// Matching service settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchingConfig {
    /// Fixed radius used for every driver search
    #[serde(default = "default_search_radius")]
    pub search_radius_meters: f64,

    /// Base URL of the location service
    #[serde(default = "default_driver_location_base_url")]
    pub driver_location_base_url: String,

    /// Key sent to the location service
    #[serde(default)]
    pub driver_location_api_key: String,

    /// Timeout for one call to the location service
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Human-readable output for development
    #[default]
    Pretty,
    /// One JSON object per line for production
    Json,
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter used when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub format: LogFormat,
}

// Default value functions for serde
fn default_host() -> String {
    DEFAULT_HOST.to_string()
}
fn default_locations_port() -> u16 {
    DEFAULT_LOCATIONS_PORT
}
fn default_matching_port() -> u16 {
    DEFAULT_MATCHING_PORT
}
fn default_shutdown_timeout() -> u64 {
    DEFAULT_SHUTDOWN_TIMEOUT_SECS
}
fn default_mongo_uri() -> String {
    DEFAULT_MONGO_URI.to_string()
}
fn default_database() -> String {
    DEFAULT_DATABASE.to_string()
}
fn default_collection() -> String {
    DEFAULT_COLLECTION.to_string()
}
fn default_connect_timeout() -> u64 {
    DEFAULT_CONNECT_TIMEOUT_SECS
}
fn default_max_radius() -> f64 {
    DEFAULT_MAX_RADIUS_METERS
}
fn default_max_results() -> usize {
    DEFAULT_MAX_RESULTS
}
fn default_max_batch_size() -> usize {
    DEFAULT_MAX_BATCH_SIZE
}
fn default_search_radius() -> f64 {
    DEFAULT_SEARCH_RADIUS_METERS
}
fn default_driver_location_base_url() -> String {
    DEFAULT_DRIVER_LOCATION_BASE_URL.to_string()
}
fn default_request_timeout() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}
fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            locations_port: default_locations_port(),
            matching_port: default_matching_port(),
            shutdown_timeout_secs: default_shutdown_timeout(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            mongo_uri: default_mongo_uri(),
            database: default_database(),
            collection: default_collection(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

impl Default for LocationsConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            max_radius_meters: default_max_radius(),
            max_results: default_max_results(),
            max_batch_size: default_max_batch_size(),
            import_policy: ImportPolicy::default(),
        }
    }
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            search_radius_meters: default_search_radius(),
            driver_location_base_url: default_driver_location_base_url(),
            driver_location_api_key: String::new(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

impl std::fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Mongo => write!(f, "mongo"),
            Self::Memory => write!(f, "memory"),
        }
    }
}

impl std::str::FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mongo" | "mongodb" => Ok(Self::Mongo),
            "memory" => Ok(Self::Memory),
            _ => Err(format!("Unknown store backend: {}", s)),
        }
    }
}

impl std::fmt::Display for ImportPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Strict => write!(f, "strict"),
            Self::SkipInvalid => write!(f, "skip_invalid"),
        }
    }
}

impl std::str::FromStr for ImportPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "skip_invalid" | "skip-invalid" => Ok(Self::SkipInvalid),
            _ => Err(format!("Unknown import policy: {}", s)),
        }
    }
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pretty => write!(f, "pretty"),
            Self::Json => write!(f, "json"),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown log format: {}", s)),
        }
    }
}

/// Environment variables that override file settings, and the key each one sets
const ENV_OVERRIDES: &[(&str, &str)] = &[
    ("X_API_KEY", "locations.api_key"),
    ("MONGO_URI", "store.mongo_uri"),
    ("MONGO_DB_NAME", "store.database"),
    ("MONGO_COLLECTION_NAME", "store.collection"),
    ("SEARCH_RADIUS", "matching.search_radius_meters"),
    ("DRIVER_LOCATION_BASE_URL", "matching.driver_location_base_url"),
    ("DRIVER_LOCATION_X_API_KEY", "matching.driver_location_api_key"),
];

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|p| p.join(APP_DIR_NAME))
            .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))
    }

    /// Get the config file path
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join(CONFIG_FILE_NAME))
    }

    /// Load configuration from the default path, then apply environment overrides
    ///
    /// Creates default config if file doesn't exist
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::config_path()?)?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Load configuration from a specific path, without environment overrides
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = fs::read_to_string(path).map_err(|e| {
                Error::Config(format!("Failed to read config file: {}", e))
            })?;

            toml::from_str(&content).map_err(|e| {
                Error::Config(format!("Failed to parse config file: {}", e))
            })
        } else {
            let config = Config::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    /// Save configuration to the default path
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    /// Save configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                Error::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        let content = toml::to_string_pretty(self).map_err(|e| {
            Error::Config(format!("Failed to serialize config: {}", e))
        })?;

        fs::write(path, content).map_err(|e| {
            Error::Config(format!("Failed to write config file: {}", e))
        })?;

        Ok(())
    }

    /// Apply deployment overrides looked up through `lookup`
    ///
    /// A malformed numeric value is an error rather than being ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        for (var, key) in ENV_OVERRIDES {
            if let Some(value) = lookup(var) {
                self.set(key, &value)
                    .map_err(|e| Error::Config(format!("{} (from ${})", e, var)))?;
            }
        }
        Ok(())
    }

    /// Check the settings `serve locations` depends on
    pub fn validate_for_locations(&self) -> Result<()> {
        if self.locations.api_key.is_empty() {
            return Err(Error::Config(
                "locations.api_key is not set (config file or X_API_KEY)".to_string(),
            ));
        }
        if !(self.locations.max_radius_meters.is_finite() && self.locations.max_radius_meters > 0.0) {
            return Err(Error::Config(format!(
                "locations.max_radius_meters must be positive, got {}",
                self.locations.max_radius_meters
            )));
        }
        if self.locations.max_results == 0 || self.locations.max_batch_size == 0 {
            return Err(Error::Config(
                "locations.max_results and locations.max_batch_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Check the settings `serve matching` depends on
    pub fn validate_for_matching(&self) -> Result<()> {
        if self.matching.driver_location_api_key.is_empty() {
            return Err(Error::Config(
                "matching.driver_location_api_key is not set (config file or DRIVER_LOCATION_X_API_KEY)"
                    .to_string(),
            ));
        }
        if !(self.matching.search_radius_meters.is_finite() && self.matching.search_radius_meters > 0.0) {
            return Err(Error::Config(format!(
                "matching.search_radius_meters must be positive, got {}",
                self.matching.search_radius_meters
            )));
        }
        if self.matching.request_timeout_secs == 0 {
            return Err(Error::Config(
                "matching.request_timeout_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Get a configuration value by key path
    ///
    /// Key format: "section.key"
    /// Returns the value as a string, or None if not found
    pub fn get(&self, key: &str) -> Option<String> {
        let parts: Vec<&str> = key.split('.').collect();

        match parts.as_slice() {
            ["server", "host"] => Some(self.server.host.clone()),
            ["server", "locations_port"] => Some(self.server.locations_port.to_string()),
            ["server", "matching_port"] => Some(self.server.matching_port.to_string()),
            ["server", "shutdown_timeout_secs"] => {
                Some(self.server.shutdown_timeout_secs.to_string())
            }

            ["store", "backend"] => Some(self.store.backend.to_string()),
            ["store", "mongo_uri"] => Some(self.store.mongo_uri.clone()),
            ["store", "database"] => Some(self.store.database.clone()),
            ["store", "collection"] => Some(self.store.collection.clone()),
            ["store", "connect_timeout_secs"] => Some(self.store.connect_timeout_secs.to_string()),

            ["locations", "api_key"] => Some(self.locations.api_key.clone()),
            ["locations", "max_radius_meters"] => Some(self.locations.max_radius_meters.to_string()),
            ["locations", "max_results"] => Some(self.locations.max_results.to_string()),
            ["locations", "max_batch_size"] => Some(self.locations.max_batch_size.to_string()),
            ["locations", "import_policy"] => Some(self.locations.import_policy.to_string()),

            ["matching", "search_radius_meters"] => {
                Some(self.matching.search_radius_meters.to_string())
            }
            ["matching", "driver_location_base_url"] => {
                Some(self.matching.driver_location_base_url.clone())
            }
            ["matching", "driver_location_api_key"] => {
                Some(self.matching.driver_location_api_key.clone())
            }
            ["matching", "request_timeout_secs"] => {
                Some(self.matching.request_timeout_secs.to_string())
            }

            ["logging", "level"] => Some(self.logging.level.clone()),
            ["logging", "format"] => Some(self.logging.format.to_string()),

            _ => None,
        }
    }

    /// Set a configuration value by key path
    ///
    /// Key format: "section.key"
    /// Returns error if key is invalid or value type is wrong
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let parts: Vec<&str> = key.split('.').collect();

        match parts.as_slice() {
            ["server", "host"] => {
                self.server.host = value.to_string();
            }
            ["server", "locations_port"] => {
                self.server.locations_port = parse_value(key, value)?;
            }
            ["server", "matching_port"] => {
                self.server.matching_port = parse_value(key, value)?;
            }
            ["server", "shutdown_timeout_secs"] => {
                self.server.shutdown_timeout_secs = parse_value(key, value)?;
            }

            ["store", "backend"] => {
                self.store.backend = value.parse().map_err(Error::Config)?;
            }
            ["store", "mongo_uri"] => {
                self.store.mongo_uri = value.to_string();
            }
            ["store", "database"] => {
                self.store.database = value.to_string();
            }
            ["store", "collection"] => {
                self.store.collection = value.to_string();
            }
            ["store", "connect_timeout_secs"] => {
                self.store.connect_timeout_secs = parse_value(key, value)?;
            }

            ["locations", "api_key"] => {
                self.locations.api_key = value.to_string();
            }
            ["locations", "max_radius_meters"] => {
                self.locations.max_radius_meters = parse_value(key, value)?;
            }
            ["locations", "max_results"] => {
                self.locations.max_results = parse_value(key, value)?;
            }
            ["locations", "max_batch_size"] => {
                self.locations.max_batch_size = parse_value(key, value)?;
            }
            ["locations", "import_policy"] => {
                self.locations.import_policy = value.parse().map_err(Error::Config)?;
            }

            ["matching", "search_radius_meters"] => {
                self.matching.search_radius_meters = parse_value(key, value)?;
            }
            ["matching", "driver_location_base_url"] => {
                self.matching.driver_location_base_url = value.to_string();
            }
            ["matching", "driver_location_api_key"] => {
                self.matching.driver_location_api_key = value.to_string();
            }
            ["matching", "request_timeout_secs"] => {
                self.matching.request_timeout_secs = parse_value(key, value)?;
            }

            ["logging", "level"] => {
                self.logging.level = value.to_string();
            }
            ["logging", "format"] => {
                self.logging.format = value.parse().map_err(Error::Config)?;
            }

            _ => {
                return Err(Error::Config(format!("Unknown config key: {}", key)));
            }
        }

        Ok(())
    }

    /// List all available config keys
    pub fn available_keys() -> Vec<&'static str> {
        vec![
            "server.host",
            "server.locations_port",
            "server.matching_port",
            "server.shutdown_timeout_secs",
            "store.backend",
            "store.mongo_uri",
            "store.database",
            "store.collection",
            "store.connect_timeout_secs",
            "locations.api_key",
            "locations.max_radius_meters",
            "locations.max_results",
            "locations.max_batch_size",
            "locations.import_policy",
            "matching.search_radius_meters",
            "matching.driver_location_base_url",
            "matching.driver_location_api_key",
            "matching.request_timeout_secs",
            "logging.level",
            "logging.format",
        ]
    }

    /// Location service address as "host:port"
    pub fn locations_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.locations_port)
    }

    /// Matching service address as "host:port"
    pub fn matching_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.matching_port)
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| Error::Config(format!("Invalid value for {}: {}", key, value)))
}
