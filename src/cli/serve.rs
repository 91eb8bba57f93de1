//! Serve command handler
//!
//! Starts one of the two HTTP services in foreground mode.

use crate::config::Config;
use crate::error::Result;
use crate::{logging, server};
use clap::{Args, ValueEnum};
use tracing::info;

/// Which service to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ServiceKind {
    /// Location registry and radius search
    Locations,
    /// Nearest-driver matching
    Matching,
}

/// Serve command arguments
#[derive(Args)]
pub struct ServeArgs {
    /// Service to start
    #[arg(value_enum)]
    pub service: ServiceKind,

    /// Host address to bind to
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on (defaults to the service's configured port)
    #[arg(long, short = 'p')]
    pub port: Option<u16>,
}

impl ServeArgs {
    /// Apply command-line overrides on top of the loaded config
    pub fn apply_to(&self, config: &mut Config) {
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            match self.service {
                ServiceKind::Locations => config.server.locations_port = port,
                ServiceKind::Matching => config.server.matching_port = port,
            }
        }
    }
}

/// Run the serve command
pub async fn run(args: ServeArgs) -> Result<()> {
    let mut config = Config::load()?;
    logging::init(&config.logging)?;

    args.apply_to(&mut config);

    match args.service {
        ServiceKind::Locations => {
            info!(
                "Starting driver-locator v{} location service on {}",
                env!("CARGO_PKG_VERSION"),
                config.locations_addr()
            );
            server::run_locations(&config).await
        }
        ServiceKind::Matching => {
            info!(
                "Starting driver-locator v{} matching service on {}",
                env!("CARGO_PKG_VERSION"),
                config.matching_addr()
            );
            server::run_matching(&config).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_override_targets_selected_service() {
        let mut config = Config::default();
        let args = ServeArgs {
            service: ServiceKind::Matching,
            host: Some("0.0.0.0".to_string()),
            port: Some(9001),
        };

        args.apply_to(&mut config);

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.matching_port, 9001);
        assert_eq!(config.server.locations_port, Config::default().server.locations_port);
    }
}
