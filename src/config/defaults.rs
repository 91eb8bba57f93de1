//! Default configuration values
//!
//! Named constants for all tunable parameters

/// Default server host
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default port of the location service
pub const DEFAULT_LOCATIONS_PORT: u16 = 8080;

/// Default port of the matching service
pub const DEFAULT_MATCHING_PORT: u16 = 8081;

/// Default graceful shutdown window in seconds
pub const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 5;

/// Default MongoDB connection string
pub const DEFAULT_MONGO_URI: &str = "mongodb://localhost:27017";

/// Default MongoDB database name
pub const DEFAULT_DATABASE: &str = "driver_location";

/// Default MongoDB collection name
pub const DEFAULT_COLLECTION: &str = "driver_locations";

/// Default store connect timeout in seconds
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;

/// Largest accepted search radius in meters
pub const DEFAULT_MAX_RADIUS_METERS: f64 = 50_000.0;

/// Maximum results returned by a single search
pub const DEFAULT_MAX_RESULTS: usize = 100;

/// Maximum locations accepted by a single bulk request
pub const DEFAULT_MAX_BATCH_SIZE: usize = 1000;

/// Radius used by the matching service when searching for drivers
pub const DEFAULT_SEARCH_RADIUS_METERS: f64 = 8000.0;

/// Base URL of the location service, as seen from the matching service
pub const DEFAULT_DRIVER_LOCATION_BASE_URL: &str = "http://127.0.0.1:8080";

/// Timeout for one call to the location service
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Default log level when RUST_LOG is unset
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Config file name
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Application directory name (for XDG paths)
pub const APP_DIR_NAME: &str = "driver-locator";
