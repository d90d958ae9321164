use async_trait::async_trait;
use log::debug;

use super::{HttpResponse, TileTransport};
use crate::error::AerialError;

const USER_AGENT: &str = concat!("aerial/", env!("CARGO_PKG_VERSION"));

/// Transport that downloads tiles with `reqwest`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    http_client: reqwest::Client,
}

impl ReqwestTransport {
    /// Creates a new transport with the default client settings.
    pub fn new() -> Result<Self, AerialError> {
        let http_client = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self { http_client })
    }

    /// Creates a transport using an existing client.
    pub fn with_client(http_client: reqwest::Client) -> Self {
        Self { http_client }
    }
}

#[async_trait]
impl TileTransport for ReqwestTransport {
    async fn get(&self, url: &str) -> Result<HttpResponse, AerialError> {
        let response = self.http_client.get(url).send().await?;
        let status = response.status();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        if !status.is_success() {
            debug!("Failed to load {url}: {status}");
        }

        Ok(HttpResponse {
            status: status.as_u16(),
            content_type,
            body: response.bytes().await?,
        })
    }
}
