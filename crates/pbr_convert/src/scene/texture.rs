//! Textures and their RGBA8 pixel buffers
//!
//! A [`Texture`] either holds decoded pixels or encoded PNG bytes. Encoded
//! images are decoded on demand with the `image` crate.

use std::borrow::Cow;
use std::io::Cursor;

use image::{ImageFormat, RgbaImage};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of channels in every pixel buffer
pub const CHANNELS: usize = 4;

/// Texture decode/encode errors
#[derive(Error, Debug)]
pub enum TextureError {
    /// Encoded image bytes could not be decoded
    #[error("Failed to decode image: {0}")]
    Decode(#[source] image::ImageError),

    /// Pixels could not be encoded
    #[error("Failed to encode image: {0}")]
    Encode(#[source] image::ImageError),

    /// Raw pixel data does not match the declared dimensions
    #[error("Invalid dimensions {width}x{height} for {len} bytes of RGBA data")]
    InvalidDimensions {
        /// Declared width
        width: u32,
        /// Declared height
        height: u32,
        /// Actual byte length
        len: usize,
    },
}

/// 2-D grid of RGBA8 pixels with per-channel random access
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    image: RgbaImage,
}

impl PixelBuffer {
    /// Create a buffer of the given size with every channel set to zero
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbaImage::new(width, height),
        }
    }

    /// Create a buffer from raw row-major RGBA bytes
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> Result<Self, TextureError> {
        let len = data.len();
        RgbaImage::from_raw(width, height, data)
            .filter(|_| len == width as usize * height as usize * CHANNELS)
            .map(|image| Self { image })
            .ok_or(TextureError::InvalidDimensions { width, height, len })
    }

    /// Create a buffer filled with a single color
    pub fn solid(width: u32, height: u32, color: [u8; 4]) -> Self {
        Self {
            image: RgbaImage::from_pixel(width, height, image::Rgba(color)),
        }
    }

    /// Decode PNG bytes into RGBA8 pixels
    pub fn decode(bytes: &[u8]) -> Result<Self, TextureError> {
        let img = image::load_from_memory(bytes).map_err(TextureError::Decode)?;
        let image = img.to_rgba8();

        log::trace!("Decoded image {}x{}", image.width(), image.height());

        Ok(Self { image })
    }

    /// Encode the pixels as PNG
    pub fn encode_png(&self) -> Result<Vec<u8>, TextureError> {
        let mut bytes = Vec::new();
        self.image
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .map_err(TextureError::Encode)?;
        Ok(bytes)
    }

    /// Width in pixels
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Height in pixels
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// `(width, height)` in pixels
    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// Read one channel of one pixel
    ///
    /// # Panics
    /// Panics if `(x, y)` is outside the image or `channel > 3`.
    pub fn get(&self, x: u32, y: u32, channel: usize) -> u8 {
        self.image.get_pixel(x, y).0[channel]
    }

    /// Write one channel of one pixel
    ///
    /// # Panics
    /// Panics if `(x, y)` is outside the image or `channel > 3`.
    pub fn set(&mut self, x: u32, y: u32, channel: usize, value: u8) {
        self.image.get_pixel_mut(x, y).0[channel] = value;
    }

    /// All four channels of one pixel
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        self.image.get_pixel(x, y).0
    }

    /// Mutable access to all four channels of one pixel
    pub fn pixel_mut(&mut self, x: u32, y: u32) -> &mut [u8; 4] {
        &mut self.image.get_pixel_mut(x, y).0
    }

    /// Raw row-major RGBA bytes
    pub fn as_raw(&self) -> &[u8] {
        self.image.as_raw()
    }
}

/// Image payload of a texture
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextureImage {
    /// Decoded RGBA8 pixels
    Pixels(PixelBuffer),
    /// Encoded PNG bytes
    Encoded(Vec<u8>),
}

impl TextureImage {
    /// Decoded pixels, borrowing when already decoded
    pub fn decode(&self) -> Result<Cow<'_, PixelBuffer>, TextureError> {
        match self {
            Self::Pixels(pixels) => Ok(Cow::Borrowed(pixels)),
            Self::Encoded(bytes) => PixelBuffer::decode(bytes).map(Cow::Owned),
        }
    }
}

/// Texture owned by a [`Document`](super::Document)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Texture {
    /// Optional name for debugging
    pub name: Option<String>,
    /// Original URI, if the texture came from an external file
    pub uri: Option<String>,
    /// MIME type of the image payload
    pub mime_type: String,
    /// Pixel data
    pub image: TextureImage,
}

impl Texture {
    /// Create a texture from decoded pixels
    pub fn from_pixels(pixels: PixelBuffer) -> Self {
        Self {
            name: None,
            uri: None,
            mime_type: "image/png".to_string(),
            image: TextureImage::Pixels(pixels),
        }
    }

    /// Create a texture from encoded image bytes
    pub fn from_encoded(bytes: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            name: None,
            uri: None,
            mime_type: mime_type.into(),
            image: TextureImage::Encoded(bytes),
        }
    }

    /// Set the texture name for debugging
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the source URI
    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }
}

// Pixel buffers serialise as `(width, height, raw bytes)`.
impl Serialize for PixelBuffer {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        (self.width(), self.height(), self.as_raw()).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for PixelBuffer {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let (width, height, data) = <(u32, u32, Vec<u8>)>::deserialize(deserializer)?;
        Self::from_rgba(width, height, data).map_err(serde::de::Error::custom)
    }
}
