//! Snap archive inspection.

mod meta;
mod squashfs;

use anyhow::Result;
use std::path::Path;

pub use meta::{SNAP_YAML_PATH, SnapMeta};
pub use squashfs::SquashfsReader;

/// Extracts the metadata of a downloaded snap.
#[cfg_attr(test, mockall::automock)]
pub trait MetadataReader: Send + Sync {
    /// Reads `meta/snap.yaml` from `archive`. `scratch` is a directory the
    /// reader may write intermediate files to; the caller removes it.
    fn read_meta(&self, archive: &Path, scratch: &Path) -> Result<SnapMeta>;
}
