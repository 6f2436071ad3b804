use crate::http::HttpClient;
use anyhow::{Context, Result};
use log::debug;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

/// File name the store uses for a downloaded revision.
pub fn archive_name(snap: &str, revision: u32) -> String {
    format!("{}_{}.snap", snap, revision)
}

/// Downloads one revision's archive into `dir` with retry support and
/// returns the path of the written file.
#[tracing::instrument(skip(http_client, dir))]
pub async fn download_revision(
    http_client: &HttpClient,
    url: &str,
    dir: &Path,
    snap: &str,
    revision: u32,
) -> Result<PathBuf> {
    let path = dir.join(archive_name(snap, revision));
    debug!("Getting revision {} into {:?}", revision, path);

    let bytes = http_client
        .download_file(url, || {
            File::create(&path)
                .map(BufWriter::new)
                .with_context(|| format!("Failed to create {:?}", path))
        })
        .await
        .with_context(|| format!("Failed to download revision {} of {}", revision, snap))?;

    debug!("Revision {}: {} bytes", revision, bytes);
    Ok(path)
}
