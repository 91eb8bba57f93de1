//! Import command handler
//!
//! Runs CSV bulk ingestion against the configured store and prints the
//! resulting counts.

use crate::config::{Config, ImportPolicy, StoreBackend};
use crate::error::{Error, Result};
use crate::locations::{BulkResult, LocationService};
use crate::logging;
use crate::store::open_store;
use clap::Args;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use tracing::warn;

/// Import command arguments
#[derive(Args)]
pub struct ImportArgs {
    /// CSV file with a header row followed by `latitude,longitude` rows
    pub file: PathBuf,

    /// Skip unparsable rows instead of failing the whole import
    #[arg(long)]
    pub skip_invalid: bool,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Run the import command
pub async fn run(args: ImportArgs) -> Result<()> {
    let mut config = Config::load()?;
    logging::init(&config.logging)?;

    if args.skip_invalid {
        config.locations.import_policy = ImportPolicy::SkipInvalid;
    }
    if config.store.backend == StoreBackend::Memory {
        warn!("Importing into the in-memory store; nothing will persist after exit");
    }

    let file = File::open(&args.file).map_err(|e| {
        Error::Io(std::io::Error::new(
            e.kind(),
            format!("Failed to open {}: {}", args.file.display(), e),
        ))
    })?;

    let store = open_store(&config).await?;
    let service = LocationService::new(store, &config.locations);
    let result = service.import_csv(BufReader::new(file)).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("{}", summary(&result));
    }

    Ok(())
}

fn summary(result: &BulkResult) -> String {
    format!(
        "Imported {} of {} locations ({} failed)",
        result.successful, result.total, result.failed
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary() {
        let result = BulkResult::from_counts(5, 4);
        assert_eq!(summary(&result), "Imported 4 of 5 locations (1 failed)");
    }
}
