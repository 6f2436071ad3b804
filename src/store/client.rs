use anyhow::{Context, Result};
use async_trait::async_trait;
use log::debug;

use super::SnapStore;
use super::types::SnapInfo;
use crate::http::HttpClient;

pub const DEFAULT_API_URL: &str = "https://api.snapcraft.io";

/// Client for the public snap store API.
pub struct StoreClient {
    pub http: HttpClient,
    pub api_url: String,
}

impl StoreClient {
    #[tracing::instrument(skip(http, api_url))]
    pub fn new(http: HttpClient, api_url: Option<String>) -> Self {
        let api_url = api_url
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        Self { http, api_url }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }
}

#[async_trait]
impl SnapStore for StoreClient {
    #[tracing::instrument(skip(self))]
    async fn snap_info(&self, name: &str) -> Result<SnapInfo> {
        let url = format!("{}/v2/snaps/info/{}", self.api_url, name);
        debug!("Fetching snap info from {}...", url);

        self.http
            .get_json::<SnapInfo>(&url)
            .await
            .with_context(|| format!("Failed to fetch store info for snap '{}'", name))
    }

    fn download_url(&self, snap_id: &str, revision: u32) -> String {
        format!(
            "{}/api/v1/snaps/download/{}_{}.snap",
            self.api_url, snap_id, revision
        )
    }
}
