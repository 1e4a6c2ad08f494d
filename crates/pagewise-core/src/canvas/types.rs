//! Core canvas types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::format::ImageFormat;

/// Errors raised when constructing a canvas from raw parts.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CanvasError {
    /// Width, height and band count must all be non-zero.
    #[error("Invalid dimensions: {width}x{height} with {bands} bands")]
    InvalidDimensions { width: u32, height: u32, bands: u32 },

    /// Sample buffer length doesn't match width * height * bands.
    #[error("Pixel buffer size mismatch: expected {expected} samples, got {actual}")]
    BufferMismatch { expected: usize, actual: usize },

    /// The band layout has no codec-side pixel type.
    #[error("Unsupported layout: {bands} bands of {format:?}")]
    UnsupportedLayout { bands: u32, format: SampleFormat },
}

/// Storage type of a single sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SampleFormat {
    /// 8 bits per sample, range 0-255.
    #[default]
    U8,
    /// 16 bits per sample, range 0-65535.
    U16,
}

impl SampleFormat {
    /// Largest value a sample can hold.
    #[inline]
    pub fn max_value(self) -> u16 {
        match self {
            SampleFormat::U8 => u8::MAX as u16,
            SampleFormat::U16 => u16::MAX,
        }
    }

    /// Size of one sample in bytes.
    #[inline]
    pub fn bytes_per_sample(self) -> usize {
        match self {
            SampleFormat::U8 => 1,
            SampleFormat::U16 => 2,
        }
    }
}

/// How the bands of a canvas should be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Interpretation {
    /// Bands carry no particular color meaning.
    Multiband,
    /// 8-bit greyscale (optionally with alpha).
    BW,
    /// 16-bit greyscale (optionally with alpha).
    Grey16,
    /// 8-bit sRGB (optionally with alpha).
    #[default]
    Srgb,
    /// 16-bit RGB (optionally with alpha).
    Rgb16,
}

impl Interpretation {
    /// Returns true for the 16-bit-per-channel interpretations.
    #[inline]
    pub fn is_16bit(self) -> bool {
        matches!(self, Interpretation::Grey16 | Interpretation::Rgb16)
    }

    /// The natural interpretation for a band count and sample format.
    pub fn default_for(bands: u32, format: SampleFormat) -> Self {
        match (bands, format) {
            (1 | 2, SampleFormat::U8) => Interpretation::BW,
            (1 | 2, SampleFormat::U16) => Interpretation::Grey16,
            (3 | 4, SampleFormat::U8) => Interpretation::Srgb,
            (3 | 4, SampleFormat::U16) => Interpretation::Rgb16,
            _ => Interpretation::Multiband,
        }
    }
}

/// A sample type the geometric kernels can move around.
pub(crate) trait Sample: Copy + Send + Sync + 'static {
    /// Narrow a value already scaled to this sample's range.
    fn from_u16(value: u16) -> Self;

    /// Widen without rescaling.
    fn to_u16(self) -> u16;
}

impl Sample for u8 {
    #[inline]
    fn from_u16(value: u16) -> Self {
        value.min(u16::from(u8::MAX)) as u8
    }

    #[inline]
    fn to_u16(self) -> u16 {
        u16::from(self)
    }
}

impl Sample for u16 {
    #[inline]
    fn from_u16(value: u16) -> Self {
        value
    }

    #[inline]
    fn to_u16(self) -> u16 {
        self
    }
}

/// Interleaved sample storage, row-major, `bands` samples per pixel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PixelBuffer {
    U8(Vec<u8>),
    U16(Vec<u16>),
}

impl PixelBuffer {
    /// An empty buffer with room for `capacity` samples.
    pub fn with_capacity(format: SampleFormat, capacity: usize) -> Self {
        match format {
            SampleFormat::U8 => PixelBuffer::U8(Vec::with_capacity(capacity)),
            SampleFormat::U16 => PixelBuffer::U16(Vec::with_capacity(capacity)),
        }
    }

    pub fn sample_format(&self) -> SampleFormat {
        match self {
            PixelBuffer::U8(_) => SampleFormat::U8,
            PixelBuffer::U16(_) => SampleFormat::U16,
        }
    }

    /// Number of samples (not pixels, not bytes).
    pub fn len(&self) -> usize {
        match self {
            PixelBuffer::U8(data) => data.len(),
            PixelBuffer::U16(data) => data.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append the samples of `other`. Returns false, leaving `self`
    /// untouched, when the sample formats differ.
    pub(crate) fn append(&mut self, other: &PixelBuffer) -> bool {
        match (self, other) {
            (PixelBuffer::U8(dst), PixelBuffer::U8(src)) => dst.extend_from_slice(src),
            (PixelBuffer::U16(dst), PixelBuffer::U16(src)) => dst.extend_from_slice(src),
            _ => return false,
        }
        true
    }
}

/// A value stored in the canvas metadata map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetaValue {
    Int(i64),
    Str(String),
    IntArray(Vec<i64>),
}

impl From<i64> for MetaValue {
    fn from(value: i64) -> Self {
        MetaValue::Int(value)
    }
}

impl From<&str> for MetaValue {
    fn from(value: &str) -> Self {
        MetaValue::Str(value.to_string())
    }
}

impl From<String> for MetaValue {
    fn from(value: String) -> Self {
        MetaValue::Str(value)
    }
}

impl From<Vec<i64>> for MetaValue {
    fn from(value: Vec<i64>) -> Self {
        MetaValue::IntArray(value)
    }
}

/// A decoded raster image, possibly holding several frames stacked vertically.
///
/// Pixel data is never modified after construction: every transform yields a
/// new `Canvas`. Only the metadata map can be edited, and only through a
/// `&mut Canvas`, i.e. by the exclusive owner.
#[derive(Debug, Clone, PartialEq)]
pub struct Canvas {
    width: u32,
    height: u32,
    bands: u32,
    interpretation: Interpretation,
    pixels: PixelBuffer,
    source_format: Option<ImageFormat>,
    meta: BTreeMap<String, MetaValue>,
}

impl Canvas {
    /// Create a canvas from interleaved samples.
    ///
    /// The interpretation is derived from the band count and sample format.
    pub fn new(width: u32, height: u32, bands: u32, pixels: PixelBuffer) -> Result<Self, CanvasError> {
        if width == 0 || height == 0 || bands == 0 {
            return Err(CanvasError::InvalidDimensions {
                width,
                height,
                bands,
            });
        }
        let expected = width as usize * height as usize * bands as usize;
        if pixels.len() != expected {
            return Err(CanvasError::BufferMismatch {
                expected,
                actual: pixels.len(),
            });
        }
        let interpretation = Interpretation::default_for(bands, pixels.sample_format());
        Ok(Self {
            width,
            height,
            bands,
            interpretation,
            pixels,
            source_format: None,
            meta: BTreeMap::new(),
        })
    }

    /// Create an 8-bit canvas.
    pub fn from_u8(width: u32, height: u32, bands: u32, samples: Vec<u8>) -> Result<Self, CanvasError> {
        Self::new(width, height, bands, PixelBuffer::U8(samples))
    }

    /// Create a 16-bit canvas.
    pub fn from_u16(width: u32, height: u32, bands: u32, samples: Vec<u16>) -> Result<Self, CanvasError> {
        Self::new(width, height, bands, PixelBuffer::U16(samples))
    }

    /// Build a canvas that inherits interpretation, source format and metadata
    /// from `self` but carries new geometry and samples.
    pub(crate) fn derive(&self, width: u32, height: u32, pixels: PixelBuffer) -> Self {
        self.derive_bands(width, height, self.bands, pixels)
    }

    /// Like [`derive`](Self::derive), with a different band count.
    pub(crate) fn derive_bands(&self, width: u32, height: u32, bands: u32, pixels: PixelBuffer) -> Self {
        debug_assert_eq!(
            pixels.len(),
            width as usize * height as usize * bands as usize,
            "Pixel buffer size mismatch"
        );
        Self {
            width,
            height,
            bands,
            interpretation: self.interpretation,
            pixels,
            source_format: self.source_format,
            meta: self.meta.clone(),
        }
    }

    /// Override the color interpretation.
    pub fn with_interpretation(mut self, interpretation: Interpretation) -> Self {
        self.interpretation = interpretation;
        self
    }

    /// Record the container format this canvas was decoded from.
    pub fn with_source_format(mut self, format: ImageFormat) -> Self {
        self.source_format = Some(format);
        self
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn bands(&self) -> u32 {
        self.bands
    }

    pub fn sample_format(&self) -> SampleFormat {
        self.pixels.sample_format()
    }

    pub fn interpretation(&self) -> Interpretation {
        self.interpretation
    }

    pub fn pixels(&self) -> &PixelBuffer {
        &self.pixels
    }

    /// Format of the container this canvas was decoded from, if known.
    pub fn source_format(&self) -> Option<ImageFormat> {
        self.source_format
    }

    /// True if the last band is an alpha channel.
    pub fn has_alpha(&self) -> bool {
        matches!(self.bands, 2 | 4)
    }

    /// Number of samples in one row.
    #[inline]
    pub fn row_len(&self) -> usize {
        self.width as usize * self.bands as usize
    }

    pub fn metadata(&self) -> &BTreeMap<String, MetaValue> {
        &self.meta
    }

    pub fn meta(&self, key: &str) -> Option<&MetaValue> {
        self.meta.get(key)
    }

    pub fn meta_int(&self, key: &str) -> Option<i64> {
        match self.meta.get(key) {
            Some(MetaValue::Int(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn meta_str(&self, key: &str) -> Option<&str> {
        match self.meta.get(key) {
            Some(MetaValue::Str(v)) => Some(v.as_str()),
            _ => None,
        }
    }

    pub fn meta_int_array(&self, key: &str) -> Option<&[i64]> {
        match self.meta.get(key) {
            Some(MetaValue::IntArray(v)) => Some(v.as_slice()),
            _ => None,
        }
    }

    /// Set a metadata entry, replacing any previous value.
    pub fn set_meta(&mut self, key: impl Into<String>, value: impl Into<MetaValue>) {
        self.meta.insert(key.into(), value.into());
    }

    pub fn remove_meta(&mut self, key: &str) -> Option<MetaValue> {
        self.meta.remove(key)
    }

    /// Summarize the canvas for inspection or logging.
    pub fn summary(&self) -> CanvasSummary {
        CanvasSummary {
            format: self.source_format,
            width: self.width,
            height: self.height,
            interpretation: self.interpretation,
            orientation: super::meta::orientation(self),
            pages: super::meta::frame_count(self),
        }
    }
}

/// Width, height, orientation and other headline facts about a canvas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanvasSummary {
    pub format: Option<ImageFormat>,
    pub width: u32,
    pub height: u32,
    pub interpretation: Interpretation,
    /// EXIF orientation (1-8), or 0 when unknown.
    pub orientation: u8,
    pub pages: u32,
}
