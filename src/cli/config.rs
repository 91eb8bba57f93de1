//! Config command handler
//!
//! View and modify configuration settings.

use crate::config::Config;
use crate::error::Result;
use clap::Args;

/// Config command arguments
#[derive(Args)]
pub struct ConfigArgs {
    /// Configuration key (e.g., "store.backend")
    pub key: Option<String>,

    /// Value to set (if not provided, shows current value)
    pub value: Option<String>,

    /// Show config file path
    #[arg(long)]
    pub path: bool,

    /// Reset config to defaults
    #[arg(long)]
    pub reset: bool,
}

/// Run the config command
pub fn run(args: ConfigArgs) -> Result<()> {
    // Show path
    if args.path {
        let path = Config::config_path()?;
        println!("{}", path.display());
        return Ok(());
    }

    // Reset config
    if args.reset {
        let config = Config::default();
        config.save()?;
        println!("Configuration reset to defaults");
        return Ok(());
    }

    // File values only, so environment overrides are never written back
    let mut config = Config::load_from(&Config::config_path()?)?;

    match (&args.key, &args.value) {
        // No arguments: show all config
        (None, None) => {
            show_all_config(&config);
        }

        // Key only: show that value
        (Some(key), None) => {
            if let Some(value) = config.get(key) {
                println!("{}", value);
            } else {
                eprintln!("Unknown config key: {}", key);
                eprintln!("\nAvailable keys:");
                for k in Config::available_keys() {
                    eprintln!("  {}", k);
                }
                std::process::exit(1);
            }
        }

        // Key and value: set the value
        (Some(key), Some(value)) => {
            config.set(key, value)?;
            config.save()?;
            println!("{} = {}", key, value);
        }

        // Value without key: not valid
        (None, Some(_)) => {
            eprintln!("Error: Must specify a key to set a value");
            std::process::exit(1);
        }
    }

    Ok(())
}

/// Display all configuration values
fn show_all_config(config: &Config) {
    println!("[server]");
    println!("host = \"{}\"", config.server.host);
    println!("locations_port = {}", config.server.locations_port);
    println!("matching_port = {}", config.server.matching_port);
    println!("shutdown_timeout_secs = {}", config.server.shutdown_timeout_secs);
    println!();

    println!("[store]");
    println!("backend = \"{}\"", config.store.backend);
    println!("mongo_uri = \"{}\"", config.store.mongo_uri);
    println!("database = \"{}\"", config.store.database);
    println!("collection = \"{}\"", config.store.collection);
    println!("connect_timeout_secs = {}", config.store.connect_timeout_secs);
    println!();

    println!("[locations]");
    println!("api_key = {}", masked(&config.locations.api_key));
    println!("max_radius_meters = {}", config.locations.max_radius_meters);
    println!("max_results = {}", config.locations.max_results);
    println!("max_batch_size = {}", config.locations.max_batch_size);
    println!("import_policy = \"{}\"", config.locations.import_policy);
    println!();

    println!("[matching]");
    println!("search_radius_meters = {}", config.matching.search_radius_meters);
    println!(
        "driver_location_base_url = \"{}\"",
        config.matching.driver_location_base_url
    );
    println!(
        "driver_location_api_key = {}",
        masked(&config.matching.driver_location_api_key)
    );
    println!("request_timeout_secs = {}", config.matching.request_timeout_secs);
    println!();

    println!("[logging]");
    println!("level = \"{}\"", config.logging.level);
    println!("format = \"{}\"", config.logging.format);
}

/// Keys are never echoed back
fn masked(secret: &str) -> &'static str {
    if secret.is_empty() {
        "\"\" # not configured"
    } else {
        "\"***\" # configured"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_masked() {
        assert_eq!(masked(""), "\"\" # not configured");
        assert_eq!(masked("s3cret"), "\"***\" # configured");
    }
}
