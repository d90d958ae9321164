use std::sync::Arc;

use super::TileGridManager;
use crate::config::MapConfig;
use crate::decoded_image::ImageDecoder;
use crate::error::AerialError;
use crate::event::{DummySink, EventSink};
use crate::platform::TileTransport;

/// Constructor for a [`TileGridManager`].
///
/// ```no_run
/// use aerial::config::MapConfig;
/// use aerial::event::GridEvent;
/// use aerial::grid::TileGridManagerBuilder;
///
/// let manager = TileGridManagerBuilder::new(MapConfig::default())
///     .with_sink(|event: GridEvent| println!("{event:?}"))
///     .build()?;
/// # Ok::<(), aerial::error::AerialError>(())
/// ```
pub struct TileGridManagerBuilder {
    config: MapConfig,
    transport: Option<Arc<dyn TileTransport>>,
    decoder: Option<Arc<dyn ImageDecoder>>,
    sink: Option<Arc<dyn EventSink>>,
}

impl TileGridManagerBuilder {
    /// Initializes a builder with the given configuration.
    ///
    /// The configuration is not validated here. Invalid values are reported with an error event
    /// once the manager tries to plan the grid.
    pub fn new(config: MapConfig) -> Self {
        Self {
            config,
            transport: None,
            decoder: None,
            sink: None,
        }
    }

    /// Sets the transport used to download tiles.
    ///
    /// Defaults to [`ReqwestTransport`](crate::platform::ReqwestTransport) if the `reqwest`
    /// feature is enabled. Without the feature, building the manager without a transport returns
    /// an error.
    pub fn with_transport(mut self, transport: impl TileTransport + 'static) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    /// Sets the decoder for downloaded and cached tiles.
    ///
    /// Defaults to [`RasterImageDecoder`](crate::decoded_image::RasterImageDecoder) if the `image`
    /// feature is enabled.
    pub fn with_decoder(mut self, decoder: impl ImageDecoder + 'static) -> Self {
        self.decoder = Some(Arc::new(decoder));
        self
    }

    /// Sets the receiver of the grid events. If not set, all events are dropped.
    pub fn with_sink(mut self, sink: impl EventSink + 'static) -> Self {
        self.sink = Some(Arc::new(sink));
        self
    }

    /// Consumes the builder and constructs the manager.
    pub fn build(self) -> Result<TileGridManager, AerialError> {
        let Self {
            config,
            transport,
            decoder,
            sink,
        } = self;

        let transport = match transport {
            Some(transport) => transport,
            None => default_transport()?,
        };
        let decoder = match decoder {
            Some(decoder) => decoder,
            None => default_decoder()?,
        };
        let sink = sink.unwrap_or_else(|| Arc::new(DummySink));

        Ok(TileGridManager::new(config, transport, decoder, sink))
    }
}

#[cfg(feature = "reqwest")]
fn default_transport() -> Result<Arc<dyn TileTransport>, AerialError> {
    Ok(Arc::new(crate::platform::ReqwestTransport::new()?))
}

#[cfg(not(feature = "reqwest"))]
fn default_transport() -> Result<Arc<dyn TileTransport>, AerialError> {
    Err(AerialError::InvalidConfig(
        "tile transport is not set".into(),
    ))
}

#[cfg(feature = "image")]
fn default_decoder() -> Result<Arc<dyn ImageDecoder>, AerialError> {
    Ok(Arc::new(crate::decoded_image::RasterImageDecoder))
}

#[cfg(not(feature = "image"))]
fn default_decoder() -> Result<Arc<dyn ImageDecoder>, AerialError> {
    Err(AerialError::InvalidConfig(
        "image decoder is not set".into(),
    ))
}
