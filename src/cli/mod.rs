//! CLI command handlers
//!
//! Each subcommand has its own module with handler functions.

pub mod config;
pub mod import;
pub mod serve;
pub mod status;

use clap::{Parser, Subcommand};

/// Driver location registry and nearest-driver matching
#[derive(Parser)]
#[command(name = "driver-locator")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the location or matching service (foreground)
    Serve(serve::ServeArgs),

    /// Import driver locations from a CSV file
    Import(import::ImportArgs),

    /// Manage configuration
    Config(config::ConfigArgs),

    /// Probe both services' health endpoints
    Status(status::StatusArgs),
}

/// Run the CLI
pub async fn run() -> crate::error::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve(args) => serve::run(args).await,
        Commands::Import(args) => import::run(args).await,
        Commands::Config(args) => config::run(args),
        Commands::Status(args) => status::run(args).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parses_each_subcommand() {
        for argv in [
            vec!["driver-locator", "serve", "locations"],
            vec!["driver-locator", "serve", "matching", "--port", "9000"],
            vec!["driver-locator", "import", "drivers.csv"],
            vec!["driver-locator", "config", "store.backend", "memory"],
            vec!["driver-locator", "status"],
        ] {
            assert!(Cli::try_parse_from(argv.iter().copied()).is_ok(), "failed to parse {:?}", argv);
        }
    }

    #[test]
    fn test_serve_requires_known_service() {
        assert!(Cli::try_parse_from(["driver-locator", "serve", "billing"]).is_err());
    }
}
