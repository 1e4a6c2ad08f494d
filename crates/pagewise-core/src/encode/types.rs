//! Encode options and errors.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::canvas::CanvasError;
use crate::format::ImageFormat;
use crate::stream::StreamError;

/// Errors that can occur during encoding.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// The target failed or accepted fewer bytes than it was given.
    #[error("Stream error: {0}")]
    Stream(#[from] StreamError),

    /// The codec rejected the image.
    #[error("Encoding failed: {0}")]
    Codec(String),

    /// The format is known but no encoder is available for it.
    #[error("No encoder available for {0}")]
    UnsupportedFormat(ImageFormat),

    /// The canvas can't be represented in the requested format.
    #[error("Invalid canvas: {0}")]
    InvalidCanvas(String),
}

impl From<CanvasError> for EncodeError {
    fn from(err: CanvasError) -> Self {
        EncodeError::InvalidCanvas(err.to_string())
    }
}

impl From<image::ImageError> for EncodeError {
    fn from(err: image::ImageError) -> Self {
        match err {
            image::ImageError::IoError(e) => EncodeError::Stream(StreamError::Io(e)),
            other => EncodeError::Codec(other.to_string()),
        }
    }
}

/// zlib effort for PNG output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PngCompression {
    Fast,
    #[default]
    Default,
    Best,
}

/// Per-row prediction filter for PNG output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PngFilter {
    None,
    Sub,
    Up,
    Avg,
    Paeth,
    #[default]
    Adaptive,
}

/// Target format and its settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "format", rename_all = "lowercase")]
pub enum EncodeOptions {
    /// Alpha is flattened onto black and samples are narrowed to 8-bit.
    Jpeg {
        #[serde(default = "default_quality")]
        quality: u8,
    },
    Png {
        #[serde(default)]
        compression: PngCompression,
        #[serde(default)]
        filter: PngFilter,
    },
    /// Always lossless.
    Webp,
    Tiff,
    /// One animation frame per canvas frame. `repeat` overrides the canvas
    /// loop count; `0` loops forever.
    Gif {
        #[serde(default)]
        repeat: Option<u16>,
    },
    Bmp,
    Heif,
    Avif,
    Jp2k,
}

fn default_quality() -> u8 {
    90
}

impl EncodeOptions {
    /// Default settings for `format`.
    pub fn for_format(format: ImageFormat) -> Self {
        match format {
            ImageFormat::Jpeg => EncodeOptions::Jpeg {
                quality: default_quality(),
            },
            ImageFormat::Png => EncodeOptions::Png {
                compression: PngCompression::default(),
                filter: PngFilter::default(),
            },
            ImageFormat::Webp => EncodeOptions::Webp,
            ImageFormat::Tiff => EncodeOptions::Tiff,
            ImageFormat::Gif => EncodeOptions::Gif { repeat: None },
            ImageFormat::Bmp => EncodeOptions::Bmp,
            ImageFormat::Heif => EncodeOptions::Heif,
            ImageFormat::Avif => EncodeOptions::Avif,
            ImageFormat::Jp2k => EncodeOptions::Jp2k,
        }
    }

    pub fn format(&self) -> ImageFormat {
        match self {
            EncodeOptions::Jpeg { .. } => ImageFormat::Jpeg,
            EncodeOptions::Png { .. } => ImageFormat::Png,
            EncodeOptions::Webp => ImageFormat::Webp,
            EncodeOptions::Tiff => ImageFormat::Tiff,
            EncodeOptions::Gif { .. } => ImageFormat::Gif,
            EncodeOptions::Bmp => ImageFormat::Bmp,
            EncodeOptions::Heif => ImageFormat::Heif,
            EncodeOptions::Avif => ImageFormat::Avif,
            EncodeOptions::Jp2k => ImageFormat::Jp2k,
        }
    }
}
