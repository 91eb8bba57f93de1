//! driver-locator CLI entry point
//!
//! Location registry service, nearest-driver matching service and CSV import

use driver_locator::cli;

#[tokio::main]
async fn main() {
    if let Err(e) = cli::run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
