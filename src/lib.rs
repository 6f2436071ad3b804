pub mod cleanup;
pub mod config;
pub mod download;
pub mod http;
pub mod output;
pub mod scan;
pub mod snap;
pub mod store;

use anyhow::Result;
use log::info;
use std::path::Path;

use crate::scan::{ScanOptions, Scanner};

/// Scans every requested revision of `snap` and writes the table to `output`.
#[tracing::instrument(skip(options))]
pub async fn run(
    snap: &str,
    output: &Path,
    api_url: Option<String>,
    options: ScanOptions,
) -> Result<()> {
    let config = config::Config::new(api_url)?;
    let cleanup_ctx = cleanup::new_shared();

    let interrupt = cleanup::spawn_interrupt_handler(cleanup_ctx.clone());
    let report = Scanner::new(config, options, cleanup_ctx).run(snap).await;
    interrupt.abort();

    output::save_report(output, &report?)?;
    info!("Done! Results saved to {}", output.display());
    Ok(())
}
