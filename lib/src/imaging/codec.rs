use image::buffer::ConvertBuffer;
use image::codecs::jpeg::JpegEncoder;
use image::{ImageFormat, RgbImage};

use crate::error::{ErrorKind, Result};

use super::PixelGrid;

/// Quality setting for JPEG encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(u8);

impl Quality {
    pub fn new(value: u8) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

/// Detects the format from the leading bytes, ignoring whatever the client
/// claimed.
pub fn sniff(bytes: &[u8]) -> Result<ImageFormat> {
    image::guess_format(bytes)
        .map_err(|_| ErrorKind::UnsupportedImageType("unrecognized image data".to_string()).into())
}

pub fn decode(bytes: &[u8], format: ImageFormat) -> Result<PixelGrid> {
    let image = image::load_from_memory_with_format(bytes, format)
        .map_err(|e| ErrorKind::InvalidImage(e.to_string()))?;
    Ok(image.to_rgba8())
}

/// Encodes the grid as baseline JPEG. Alpha is dropped.
pub fn encode_jpeg(grid: &PixelGrid, quality: Quality) -> Result<Vec<u8>> {
    let rgb: RgbImage = grid.convert();
    let mut out = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut out, quality.value());
    rgb.write_with_encoder(encoder)?;
    Ok(out)
}
