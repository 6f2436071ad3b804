use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;

use crate::scan::ScanReport;

pub const HEADER: [&str; 3] = ["revision", "version", "architecture"];

/// Writes the report as CSV, one row per successful revision in ascending
/// revision order. Failed revisions are not written.
pub fn write_report<W: Write>(writer: W, report: &ScanReport) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(HEADER)
        .context("Failed to write CSV header")?;

    for record in report.records() {
        csv.write_record([
            record.revision.to_string().as_str(),
            record.version.as_str(),
            record.architecture.as_str(),
        ])
        .with_context(|| format!("Failed to write row for revision {}", record.revision))?;
    }

    csv.flush().context("Failed to flush CSV output")?;
    Ok(())
}

#[tracing::instrument(skip(report))]
pub fn save_report(path: &Path, report: &ScanReport) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create output file {:?}", path))?;
    write_report(file, report)
}
