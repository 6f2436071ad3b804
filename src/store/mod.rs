//! Snap store API: revision discovery and download locations.

mod client;
mod types;

use anyhow::Result;
use async_trait::async_trait;

pub use client::{DEFAULT_API_URL, StoreClient};
pub use types::{Channel, ChannelMapEntry, RevisionRange, SnapInfo};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SnapStore: Send + Sync {
    /// Looks up a snap by name.
    async fn snap_info(&self, name: &str) -> Result<SnapInfo>;

    /// Location of the archive for one revision of a snap.
    fn download_url(&self, snap_id: &str, revision: u32) -> String;
}
