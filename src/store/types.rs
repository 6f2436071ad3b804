use anyhow::{Result, bail};
use serde::Deserialize;

/// Response of the store's `v2/snaps/info/{name}` endpoint, reduced to the
/// fields the scan needs.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct SnapInfo {
    pub name: String,
    pub snap_id: String,
    #[serde(default)]
    pub channel_map: Vec<ChannelMapEntry>,
}

/// One (channel, architecture) slot and the revision currently released to it.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct ChannelMapEntry {
    pub revision: u32,
    pub version: String,
    pub channel: Channel,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Channel {
    pub architecture: String,
    pub name: String,
    pub track: String,
    pub risk: String,
}

/// Inclusive bounds of the revisions to scan. An absent `max` means the
/// newest revision the store advertises.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevisionRange {
    pub min: u32,
    pub max: Option<u32>,
}

impl Default for RevisionRange {
    fn default() -> Self {
        Self { min: 1, max: None }
    }
}

impl SnapInfo {
    /// Highest revision released to any channel on any architecture.
    pub fn latest_revision(&self) -> Result<u32> {
        match self.channel_map.iter().map(|e| e.revision).max() {
            Some(revision) => Ok(revision),
            None => bail!("Snap '{}' has no published revisions", self.name),
        }
    }

    /// Revisions to scan, newest first.
    ///
    /// Revision numbers are shared across architectures and some are never
    /// released, so the list may contain revisions that fail to download.
    pub fn revisions(&self, range: RevisionRange) -> Result<Vec<u32>> {
        let min = range.min.max(1);
        let max = match range.max {
            Some(max) => max,
            None => self.latest_revision()?,
        };
        if min > max {
            bail!(
                "Minimum revision {} is above the maximum revision {} for '{}'",
                min,
                max,
                self.name
            );
        }
        Ok((min..=max).rev().collect())
    }
}
