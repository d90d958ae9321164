//! Provides the network access used to download tiles, and [`TileTransport`] to abstract it.

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::AerialError;

/// Response of a tile server.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Value of the `Content-Type` header, if the server sent one.
    pub content_type: Option<String>,
    /// Response body.
    pub body: Bytes,
}

impl HttpResponse {
    /// Successful response with the given content type.
    pub fn ok(content_type: impl Into<String>, body: impl Into<Bytes>) -> Self {
        Self {
            status: 200,
            content_type: Some(content_type.into()),
            body: body.into(),
        }
    }

    /// Returns true for `2xx` statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Returns false only if the server explicitly said that the body is not an image.
    pub fn may_be_image(&self) -> bool {
        match &self.content_type {
            Some(content_type) => {
                let mime = content_type
                    .split(';')
                    .next()
                    .unwrap_or_default()
                    .trim()
                    .to_ascii_lowercase();
                mime.starts_with("image/") || mime == "application/octet-stream"
            }
            None => true,
        }
    }
}

/// Performs network requests for tile data.
///
/// The transport is only responsible for delivering the response. Status and content checks are
/// done by the [`TileFetcher`](crate::fetcher::TileFetcher).
#[async_trait]
pub trait TileTransport: Send + Sync {
    /// Sends a GET request to the given url.
    ///
    /// Errors are returned only if no response was received at all, and must be
    /// [`AerialError::Network`].
    async fn get(&self, url: &str) -> Result<HttpResponse, AerialError>;
}

#[cfg(feature = "reqwest")]
mod native;
#[cfg(feature = "reqwest")]
pub use native::ReqwestTransport;

#[async_trait]
impl<T: TileTransport + ?Sized> TileTransport for std::sync::Arc<T> {
    async fn get(&self, url: &str) -> Result<HttpResponse, AerialError> {
        (**self).get(url).await
    }
}
