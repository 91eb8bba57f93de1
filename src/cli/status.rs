//! Status command handler
//!
//! Probes the health endpoints of both services.

use crate::config::Config;
use crate::constants::api::HEALTH_PATH;
use crate::error::Result;
use crate::store::available_backends;
use crate::wire::HealthResponse;
use clap::Args;
use std::time::Duration;

/// Status command arguments
#[derive(Args)]
pub struct StatusArgs {
    /// Seconds to wait for each service
    #[arg(long, default_value = "3")]
    pub timeout: u64,
}

/// Result of probing one service
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Probe {
    /// Answered 200 with `status: ok`
    Up,
    /// Answered, but reported itself unhealthy
    Unavailable(String),
    /// No answer
    Down,
}

/// Run the status command
pub async fn run(args: StatusArgs) -> Result<()> {
    let config = Config::load()?;
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(args.timeout))
        .build()?;

    println!("driver-locator v{}", env!("CARGO_PKG_VERSION"));
    let backend = config.store.backend.to_string();
    if let Some(info) = available_backends().into_iter().find(|b| b.name == backend) {
        println!("Store backend: {} ({})", info.name, info.description);
    }
    println!();

    let services = [
        ("Location service", config.locations_addr()),
        ("Matching service", config.matching_addr()),
    ];
    for (name, addr) in services {
        let base_url = format!("http://{}", addr);
        match probe(&client, &base_url).await {
            Probe::Up => println!("{}: UP on {}", name, addr),
            Probe::Unavailable(detail) => println!("{}: UNAVAILABLE on {} ({})", name, addr, detail),
            Probe::Down => println!("{}: NOT RUNNING on {}", name, addr),
        }
    }

    Ok(())
}

/// Probe `GET {base_url}/health`
pub async fn probe(client: &reqwest::Client, base_url: &str) -> Probe {
    let url = format!("{}{}", base_url, HEALTH_PATH);

    let response = match client.get(&url).send().await {
        Ok(response) => response,
        Err(_) => return Probe::Down,
    };

    let status = response.status();
    match response.json::<HealthResponse>().await {
        Ok(health) if status.is_success() && health.status == "ok" => Probe::Up,
        Ok(health) => Probe::Unavailable(format!("status {}, {}", status, health.status)),
        Err(_) => Probe::Unavailable(format!("status {}", status)),
    }
}
