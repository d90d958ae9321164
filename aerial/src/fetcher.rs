//! [`TileFetcher`] loads single tiles from the persistent cache or from the network.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use aerial_types::TileId;
use bytes::Bytes;
use parking_lot::Mutex;
use tokio::sync::OnceCell;

use crate::async_runtime;
use crate::cache::TileCache;
use crate::decoded_image::{DecodedImage, ImageDecoder};
use crate::error::{AerialError, TileError};
use crate::platform::TileTransport;
use crate::source::{SourceKey, TileSource};

/// Where the data of a loaded tile came from.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TileOrigin {
    /// The tile was read from the persistent cache.
    Cache,
    /// The tile was downloaded.
    Network,
}

/// Successfully loaded tile.
#[derive(Debug)]
pub struct LoadedTile {
    /// Encoded tile data, as stored in the cache.
    pub bytes: Bytes,
    /// Decoded pixels.
    pub image: Arc<DecodedImage>,
    /// Where the tile came from.
    pub origin: TileOrigin,
}

/// Result of a single tile fetch.
pub type FetchResult = Result<Arc<LoadedTile>, TileError>;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct FetchKey {
    id: TileId,
    source: SourceKey,
    offline: bool,
}

type InFlight = HashMap<FetchKey, Weak<OnceCell<FetchResult>>, ahash::RandomState>;

/// Loads tiles one by one, using the cache first and the network second.
///
/// * If the cache has the tile, it is returned without any network access.
/// * In offline mode a cache miss is a terminal [`Offline`](crate::error::ErrorKind::Offline)
///   error.
/// * Otherwise the tile is requested with the [`TileTransport`], decoded, and written to the cache
///   in background. A failure to write the cache does not fail the tile.
///
/// Only one load of the same tile from the same source runs at a time. If the tile is requested
/// while it is already loading, the request waits for the running load and gets its result.
pub struct TileFetcher {
    cache: Arc<dyn TileCache>,
    transport: Arc<dyn TileTransport>,
    decoder: Arc<dyn ImageDecoder>,
    in_flight: Mutex<InFlight>,
}

impl std::fmt::Debug for TileFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TileFetcher")
            .field("in_flight", &self.in_flight.lock().len())
            .finish()
    }
}

impl TileFetcher {
    /// Creates a new fetcher.
    pub fn new(
        cache: Arc<dyn TileCache>,
        transport: Arc<dyn TileTransport>,
        decoder: Arc<dyn ImageDecoder>,
    ) -> Self {
        Self {
            cache,
            transport,
            decoder,
            in_flight: Mutex::new(HashMap::default()),
        }
    }

    /// Persistent cache used by the fetcher.
    pub fn cache(&self) -> &Arc<dyn TileCache> {
        &self.cache
    }

    /// Number of tile loads that are currently running.
    pub fn in_flight_count(&self) -> usize {
        self.in_flight
            .lock()
            .values()
            .filter(|cell| cell.strong_count() > 0)
            .count()
    }

    /// Loads the tile.
    pub async fn fetch(&self, id: TileId, source: &TileSource, offline: bool) -> FetchResult {
        let key = FetchKey {
            id,
            source: source.key().clone(),
            offline,
        };

        let cell = self.start_loading(&key);
        let result = cell
            .get_or_init(|| self.load(id, source, offline))
            .await
            .clone();
        self.finish_loading(&key, &cell);

        result
    }

    fn start_loading(&self, key: &FetchKey) -> Arc<OnceCell<FetchResult>> {
        let mut in_flight = self.in_flight.lock();
        if let Some(cell) = in_flight.get(key).and_then(Weak::upgrade) {
            log::trace!("Tile {} is already loading, waiting for it", key.id);
            return cell;
        }

        let cell = Arc::new(OnceCell::new());
        in_flight.insert(key.clone(), Arc::downgrade(&cell));
        cell
    }

    fn finish_loading(&self, key: &FetchKey, cell: &Arc<OnceCell<FetchResult>>) {
        let mut in_flight = self.in_flight.lock();
        let is_same_load = in_flight
            .get(key)
            .is_some_and(|current| std::ptr::eq(current.as_ptr(), Arc::as_ptr(cell)));
        if is_same_load {
            in_flight.remove(key);
        }
    }

    async fn load(&self, id: TileId, source: &TileSource, offline: bool) -> FetchResult {
        if let Some(bytes) = self.load_from_cache(id, source.key()).await {
            log::trace!("Cache hit for tile {id}");
            match self.decode(bytes.clone()).await {
                Ok(image) => {
                    return Ok(Arc::new(LoadedTile {
                        bytes,
                        image: Arc::new(image),
                        origin: TileOrigin::Cache,
                    }))
                }
                Err(err) if offline => return Err(err.into()),
                Err(err) => log::warn!("Cached tile {id} is corrupted, reloading it: {err}"),
            }
        }

        if offline {
            log::debug!("Tile {id} is not in the cache and offline mode is on");
            return Err(AerialError::Offline.into());
        }

        self.download(id, source).await
    }

    async fn load_from_cache(&self, id: TileId, source: &SourceKey) -> Option<Bytes> {
        let cache = self.cache.clone();
        let source = source.clone();
        match async_runtime::run_blocking(move || cache.load(&id, &source)).await? {
            Ok(bytes) => Some(bytes),
            Err(AerialError::NotFound) => None,
            Err(err) => {
                log::warn!("Failed to read persistent cache entry for tile {id}: {err}");
                None
            }
        }
    }

    async fn download(&self, id: TileId, source: &TileSource) -> FetchResult {
        let url = source.url_for(&id);
        log::info!("Loading {url}");

        let response = self.transport.get(&url).await.map_err(|err| match err {
            AerialError::Network(_) => err,
            other => AerialError::Network(other.to_string()),
        })?;

        if !response.is_success() {
            return Err(AerialError::InvalidResponse(format!(
                "{url} responded with status {}",
                response.status
            ))
            .into());
        }

        if !response.may_be_image() {
            return Err(AerialError::InvalidResponse(format!(
                "{url} responded with non-image content ({})",
                response.content_type.as_deref().unwrap_or_default()
            ))
            .into());
        }

        let image = match self.decode(response.body.clone()).await {
            Ok(image) => image,
            Err(err @ (AerialError::Decode(_) | AerialError::Internal(_))) => {
                return Err(err.into())
            }
            Err(other) => return Err(AerialError::Decode(other.to_string()).into()),
        };

        log::trace!("Tile {id} loaded. Byte size: {}", response.body.len());
        self.store_in_background(id, source.key().clone(), response.body.clone());

        Ok(Arc::new(LoadedTile {
            bytes: response.body,
            image: Arc::new(image),
            origin: TileOrigin::Network,
        }))
    }

    async fn decode(&self, data: Bytes) -> Result<DecodedImage, AerialError> {
        let decoder = self.decoder.clone();
        match async_runtime::run_blocking(move || decoder.decode(&data)).await {
            Some(result) => result,
            None => Err(AerialError::Internal("image decoder panicked".into())),
        }
    }

    fn store_in_background(&self, id: TileId, source: SourceKey, data: Bytes) {
        let cache = self.cache.clone();
        async_runtime::spawn_blocking(move || {
            if let Err(error) = cache.store(&id, &source, &data) {
                log::warn!("Failed to write persistent cache entry: {error:?}");
            }
        });
    }
}
