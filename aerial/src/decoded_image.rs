//! This module contains utilities for decoding tile images into pixel buffers.

use crate::error::AerialError;

/// An image that has been loaded into memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    /// Raw bytes of the image, in RGBA order.
    bytes: Vec<u8>,
    /// Width and height of the image.
    dimensions: (u32, u32),
}

impl DecodedImage {
    /// Decode an image from a byte slice.
    ///
    /// Attempts to guess the format of the image from the data. Non-RGBA images
    /// will be converted to RGBA.
    #[cfg(feature = "image")]
    pub fn decode(bytes: &[u8]) -> Result<Self, AerialError> {
        use image::GenericImageView;
        let decoded = image::load_from_memory(bytes)?;
        let dimensions = decoded.dimensions();
        let bytes = decoded.to_rgba8();

        Ok(Self {
            bytes: bytes.into_vec(),
            dimensions,
        })
    }

    /// Creates an image from raw RGBA pixels.
    ///
    /// Returns an error if the buffer length does not match the dimensions.
    pub fn from_raw(bytes: Vec<u8>, width: u32, height: u32) -> Result<Self, AerialError> {
        let expected = width as usize * height as usize * 4;
        if bytes.len() != expected {
            return Err(AerialError::Decode(format!(
                "expected {expected} bytes for a {width}x{height} image, got {}",
                bytes.len()
            )));
        }

        Ok(Self {
            bytes,
            dimensions: (width, height),
        })
    }

    /// RGBA pixels, row by row from the top of the image.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Width of the image in pixels.
    pub fn width(&self) -> u32 {
        self.dimensions.0
    }

    /// Height of the image in pixels.
    pub fn height(&self) -> u32 {
        self.dimensions.1
    }
}

/// Converts encoded tile data into a pixel buffer.
pub trait ImageDecoder: Send + Sync {
    /// Decodes the image. Data that is not a supported image must result in
    /// [`AerialError::Decode`].
    fn decode(&self, data: &[u8]) -> Result<DecodedImage, AerialError>;
}

impl<F> ImageDecoder for F
where
    F: Fn(&[u8]) -> Result<DecodedImage, AerialError> + Send + Sync,
{
    fn decode(&self, data: &[u8]) -> Result<DecodedImage, AerialError> {
        self(data)
    }
}

/// Decoder backed by the `image` crate. Supports PNG and JPEG tiles.
#[cfg(feature = "image")]
#[derive(Debug, Default, Clone, Copy)]
pub struct RasterImageDecoder;

#[cfg(feature = "image")]
impl ImageDecoder for RasterImageDecoder {
    fn decode(&self, data: &[u8]) -> Result<DecodedImage, AerialError> {
        DecodedImage::decode(data)
    }
}
