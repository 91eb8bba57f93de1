//! CSV bulk ingestion
//!
//! Input is comma-separated text whose first row is a header (always
//! discarded) followed by rows of exactly `latitude,longitude`. Rows are
//! in latitude-first order, the reverse of `LocationPoint`, so the
//! columns are swapped while parsing.
//!
//! Parsed batches go through the same unordered bulk write as
//! `create_locations_bulk`. Coordinates are only parsed here, not
//! range-checked: out-of-range rows reach the store and are counted as
//! failed there.

use crate::config::ImportPolicy;
use crate::error::{Error, Result};
use crate::geo::LocationPoint;
use crate::locations::{BulkResult, LocationService};
use csv::{ReaderBuilder, StringRecord, Trim};
use std::io::Read;
use tracing::{error, info, warn};

/// Rows parsed from one CSV source
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedRows {
    pub points: Vec<LocationPoint>,
    /// Rows skipped under `ImportPolicy::SkipInvalid`
    pub skipped: usize,
}

impl LocationService {
    /// Import driver locations from CSV
    ///
    /// Under `ImportPolicy::Strict` any unparsable row fails the whole
    /// import before anything is written.
    pub async fn import_csv<R: Read>(&self, reader: R) -> Result<BulkResult> {
        let parsed = parse_rows(reader, self.import_policy)?;
        let written = self.write_batch(&parsed.points).await?;

        let result = BulkResult::from_counts(parsed.points.len() + parsed.skipped, written.successful);
        info!(
            total = result.total,
            successful = result.successful,
            failed = result.failed,
            skipped = parsed.skipped,
            "CSV import finished"
        );
        Ok(result)
    }
}

/// Parse every data row of a CSV source into points
pub fn parse_rows<R: Read>(reader: R, policy: ImportPolicy) -> Result<ParsedRows> {
    let mut csv_reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let mut parsed = ParsedRows::default();

    for (index, record) in csv_reader.records().enumerate() {
        // Header is line 1, so the n-th data row is line n + 2
        let fallback_line = index as u64 + 2;

        let outcome = match record {
            Ok(record) => {
                let line = record.position().map_or(fallback_line, |p| p.line());
                parse_record(&record, line)
            }
            Err(e) => Err(Error::Parse {
                line: e.position().map_or(fallback_line, |p| p.line()),
                reason: format!("failed to read CSV data: {}", e),
            }),
        };

        match (outcome, policy) {
            (Ok(point), _) => parsed.points.push(point),
            (Err(e), ImportPolicy::Strict) => {
                error!(error = %e, "Failed to parse CSV record");
                return Err(e);
            }
            (Err(e), ImportPolicy::SkipInvalid) => {
                warn!(error = %e, "Skipping unparsable CSV record");
                parsed.skipped += 1;
            }
        }
    }

    Ok(parsed)
}

fn parse_record(record: &StringRecord, line: u64) -> Result<LocationPoint> {
    if record.len() != 2 {
        return Err(Error::Parse {
            line,
            reason: format!(
                "expected 2 fields (latitude, longitude), got {}",
                record.len()
            ),
        });
    }

    let latitude = parse_field(&record[0], "latitude", line)?;
    let longitude = parse_field(&record[1], "longitude", line)?;

    Ok(LocationPoint::new(longitude, latitude))
}

fn parse_field(raw: &str, name: &str, line: u64) -> Result<f64> {
    raw.parse::<f64>().map_err(|_| Error::Parse {
        line,
        reason: format!("invalid {} '{}'", name, raw),
    })
}
