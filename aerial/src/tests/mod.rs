use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use aerial_types::TileId;
use bytes::Bytes;
use tokio::sync::mpsc::UnboundedReceiver;

use crate::cache::TileCache;
use crate::decoded_image::DecodedImage;
use crate::error::AerialError;
use crate::event::GridEvent;
use crate::platform::{HttpResponse, TileTransport};
use crate::source::SourceKey;

type Respond = dyn Fn(&str) -> Result<HttpResponse, AerialError> + Send + Sync;

/// Transport that answers from a closure and counts requests.
pub struct TestTransport {
    calls: AtomicUsize,
    delay: Duration,
    respond: Box<Respond>,
}

impl TestTransport {
    pub fn new(
        respond: impl Fn(&str) -> Result<HttpResponse, AerialError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            delay: Duration::ZERO,
            respond: Box::new(respond),
        }
    }

    /// Responds to every url with a valid tile.
    pub fn images() -> Self {
        Self::new(|url| Ok(HttpResponse::ok("image/png", format!("IMG {url}"))))
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl TileTransport for TestTransport {
    async fn get(&self, url: &str) -> Result<HttpResponse, AerialError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        (self.respond)(url)
    }
}

/// Accepts anything starting with `IMG` as a 1x1 image.
pub fn stub_decoder(data: &[u8]) -> Result<DecodedImage, AerialError> {
    if data.starts_with(b"IMG") {
        DecodedImage::from_raw(vec![0; 4], 1, 1)
    } else {
        Err(AerialError::Decode("not an image".into()))
    }
}

/// Cache whose every read and write fails with an io error.
#[derive(Default)]
pub struct FailingCache {
    pub loads: AtomicUsize,
    pub stores: AtomicUsize,
}

impl FailingCache {
    fn error() -> AerialError {
        AerialError::Io(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "cache is read-only",
        ))
    }
}

impl TileCache for FailingCache {
    fn has(&self, _id: &TileId, _source: &SourceKey) -> bool {
        false
    }

    fn load(&self, _id: &TileId, _source: &SourceKey) -> Result<Bytes, AerialError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        Err(Self::error())
    }

    fn store(&self, _id: &TileId, _source: &SourceKey, _data: &Bytes) -> Result<(), AerialError> {
        self.stores.fetch_add(1, Ordering::SeqCst);
        Err(Self::error())
    }
}

/// Takes all events received so far.
pub fn drain(events: &mut UnboundedReceiver<GridEvent>) -> Vec<GridEvent> {
    let mut received = vec![];
    while let Ok(event) = events.try_recv() {
        received.push(event);
    }

    received
}
