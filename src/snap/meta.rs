use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Deserializer};

/// Path of the metadata file inside every snap image.
pub const SNAP_YAML_PATH: &str = "meta/snap.yaml";

/// The parts of `meta/snap.yaml` recorded for each revision.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct SnapMeta {
    pub name: String,
    #[serde(deserialize_with = "scalar_to_string")]
    pub version: String,
    #[serde(default)]
    pub architectures: Vec<String>,
}

impl SnapMeta {
    pub fn parse(contents: &str) -> Result<Self> {
        serde_yaml::from_str(contents).context("Failed to parse snap.yaml")
    }

    /// Kernel snaps are built per architecture, so only the first entry is
    /// meaningful.
    pub fn architecture(&self) -> Result<&str> {
        self.architectures
            .first()
            .map(String::as_str)
            .ok_or_else(|| anyhow!("snap.yaml of '{}' lists no architectures", self.name))
    }
}

// `version: 1.0` is valid snap.yaml and arrives as a YAML float.
fn scalar_to_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match serde_yaml::Value::deserialize(deserializer)? {
        serde_yaml::Value::String(s) => Ok(s),
        serde_yaml::Value::Number(n) => Ok(n.to_string()),
        serde_yaml::Value::Bool(b) => Ok(b.to_string()),
        other => Err(D::Error::custom(format!(
            "version must be a scalar, found {:?}",
            other
        ))),
    }
}
