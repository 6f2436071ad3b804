use anyhow::Result;
use reqwest::{
    Client,
    header::{HeaderMap, HeaderName, HeaderValue},
};

use crate::{
    http::HttpClient,
    snap::{MetadataReader, SquashfsReader},
    store::{SnapStore, StoreClient},
};

/// The store requires every request to name the device series.
pub const DEVICE_SERIES_HEADER: &str = "snap-device-series";
pub const DEVICE_SERIES: &str = "16";

pub const USER_AGENT: &str = concat!("snaprev/", env!("SNAPREV_VERSION"));

/// The collaborators a scan is wired with.
pub struct Config<S: SnapStore, M: MetadataReader> {
    pub store: S,
    pub http: HttpClient,
    pub reader: M,
}

impl Config<StoreClient, SquashfsReader> {
    pub fn new(api_url: Option<String>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_static(DEVICE_SERIES_HEADER),
            HeaderValue::from_static(DEVICE_SERIES),
        );

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()?;

        let http = HttpClient::new(client);
        let store = StoreClient::new(http.clone(), api_url);

        Ok(Self {
            store,
            http,
            reader: SquashfsReader,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;

    #[tokio::test]
    async fn test_config_sends_device_series_and_user_agent() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/")
            .match_header("Snap-Device-Series", "16")
            .match_header("User-Agent", USER_AGENT)
            .create_async()
            .await;

        let config = Config::new(Some(server.url())).unwrap();
        let _ = config.http.inner().get(server.url()).send().await;

        mock.assert_async().await;
        assert_eq!(config.store.api_url(), server.url());
    }
}
