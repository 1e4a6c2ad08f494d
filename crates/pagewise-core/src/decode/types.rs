//! Core types for image decoding.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::canvas::CanvasError;
use crate::stream::StreamError;
use crate::transform::{Angle, Direction, Transform, TransformError};

/// Error types for image decoding operations.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The source failed while the decoder was reading it.
    #[error("Stream error: {0}")]
    Stream(#[from] StreamError),

    /// The bytes are not a valid image of the detected format.
    #[error("Codec error: {0}")]
    Codec(String),

    /// The container format was not recognized or has no decoder.
    #[error("Unsupported image format")]
    UnsupportedFormat,

    /// The decode options are inconsistent with each other or the image.
    #[error("Invalid decode options: {0}")]
    InvalidOptions(String),

    /// The image exceeds the configured limits.
    #[error("Limits exceeded: {0}")]
    LimitsExceeded(String),

    /// Auto-rotation or thumbnailing failed.
    #[error("Transform error: {0}")]
    Transform(#[from] TransformError),
}

impl From<CanvasError> for DecodeError {
    fn from(err: CanvasError) -> Self {
        DecodeError::Codec(err.to_string())
    }
}

impl From<image::ImageError> for DecodeError {
    fn from(err: image::ImageError) -> Self {
        match err {
            image::ImageError::Limits(e) => DecodeError::LimitsExceeded(e.to_string()),
            image::ImageError::Unsupported(_) => DecodeError::UnsupportedFormat,
            image::ImageError::IoError(e) => DecodeError::Stream(StreamError::Io(e)),
            other => DecodeError::Codec(other.to_string()),
        }
    }
}

/// Filter type for thumbnail resizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FilterType {
    /// Nearest neighbor interpolation (fastest, lowest quality).
    Nearest,
    /// Bilinear interpolation (fast, acceptable quality).
    Bilinear,
    /// Lanczos3 interpolation (slower, highest quality).
    #[default]
    Lanczos3,
}

impl FilterType {
    /// Convert to the image crate's FilterType.
    pub fn to_image_filter(self) -> image::imageops::FilterType {
        match self {
            FilterType::Nearest => image::imageops::FilterType::Nearest,
            FilterType::Bilinear => image::imageops::FilterType::Triangle,
            FilterType::Lanczos3 => image::imageops::FilterType::Lanczos3,
        }
    }
}

/// EXIF orientation values (1-8).
/// See: https://exiftool.org/TagNames/EXIF.html
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum Orientation {
    /// Normal (no transformation needed).
    #[default]
    Normal = 1,
    /// Horizontal flip.
    FlipHorizontal = 2,
    /// Rotate 180 degrees.
    Rotate180 = 3,
    /// Vertical flip.
    FlipVertical = 4,
    /// Transpose (flip horizontal + rotate 270 CW).
    Transpose = 5,
    /// Rotate 90 degrees clockwise.
    Rotate90CW = 6,
    /// Transverse (flip horizontal + rotate 90 CW).
    Transverse = 7,
    /// Rotate 270 degrees clockwise (90 CCW).
    Rotate270CW = 8,
}

impl Orientation {
    /// Returns true if this orientation swaps width and height dimensions.
    #[inline]
    pub fn swaps_dimensions(self) -> bool {
        matches!(
            self,
            Orientation::Transpose
                | Orientation::Rotate90CW
                | Orientation::Transverse
                | Orientation::Rotate270CW
        )
    }

    /// Transforms that bring a stored image upright, in application order.
    pub fn corrections(self) -> Vec<Transform> {
        match self {
            Orientation::Normal => vec![],
            Orientation::FlipHorizontal => vec![Transform::Flip(Direction::Horizontal)],
            Orientation::Rotate180 => vec![Transform::Rotate(Angle::D180)],
            Orientation::FlipVertical => vec![Transform::Flip(Direction::Vertical)],
            Orientation::Transpose => vec![
                Transform::Rotate(Angle::D90),
                Transform::Flip(Direction::Horizontal),
            ],
            Orientation::Rotate90CW => vec![Transform::Rotate(Angle::D90)],
            Orientation::Transverse => vec![
                Transform::Rotate(Angle::D270),
                Transform::Flip(Direction::Horizontal),
            ],
            Orientation::Rotate270CW => vec![Transform::Rotate(Angle::D270)],
        }
    }
}

impl From<u32> for Orientation {
    fn from(value: u32) -> Self {
        match value {
            1 => Orientation::Normal,
            2 => Orientation::FlipHorizontal,
            3 => Orientation::Rotate180,
            4 => Orientation::FlipVertical,
            5 => Orientation::Transpose,
            6 => Orientation::Rotate90CW,
            7 => Orientation::Transverse,
            8 => Orientation::Rotate270CW,
            _ => Orientation::Normal,
        }
    }
}

/// How many pages to load, starting from [`DecodeOptions::page`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageCount {
    /// Only the first requested page.
    #[default]
    Single,
    /// Every page from the first requested one to the end.
    All,
    /// Exactly this many pages.
    Count(u32),
}

/// Which part of the image a cropping thumbnail keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThumbnailCrop {
    /// Don't crop; fit the whole frame inside the box.
    #[default]
    None,
    /// Fill the box, keeping the center.
    Centre,
    /// Fill the box, keeping the top-left edge.
    Low,
    /// Fill the box, keeping the bottom-right edge.
    High,
}

/// Which direction a thumbnail may scale in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThumbnailSize {
    /// Scale up or down.
    #[default]
    Both,
    /// Only scale up.
    Up,
    /// Only scale down.
    Down,
    /// Scale to exactly the box, ignoring aspect ratio.
    Force,
}

/// A thumbnail request applied to every frame after decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thumbnail {
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub crop: ThumbnailCrop,
    #[serde(default)]
    pub size: ThumbnailSize,
    #[serde(default)]
    pub filter: FilterType,
}

impl Thumbnail {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            crop: ThumbnailCrop::None,
            size: ThumbnailSize::Both,
            filter: FilterType::default(),
        }
    }

    pub fn with_crop(mut self, crop: ThumbnailCrop) -> Self {
        self.crop = crop;
        self
    }

    pub fn with_size(mut self, size: ThumbnailSize) -> Self {
        self.size = size;
        self
    }
}

/// Resource limits checked while decoding. `None` means unlimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodeLimits {
    pub max_width: Option<u32>,
    pub max_height: Option<u32>,
    /// Largest decoder allocation, in bytes.
    pub max_alloc: Option<u64>,
    pub max_pages: Option<u32>,
}

impl DecodeLimits {
    pub(crate) fn to_image_limits(self) -> image::Limits {
        let mut limits = image::Limits::no_limits();
        limits.max_image_width = self.max_width;
        limits.max_image_height = self.max_height;
        limits.max_alloc = self.max_alloc;
        limits
    }

    /// Check a decoded frame size and page count.
    pub(crate) fn check(&self, width: u32, frame_height: u32, pages: u32) -> Result<(), DecodeError> {
        if let Some(max) = self.max_width.filter(|&max| width > max) {
            return Err(DecodeError::LimitsExceeded(format!(
                "width {width} exceeds {max}"
            )));
        }
        if let Some(max) = self.max_height.filter(|&max| frame_height > max) {
            return Err(DecodeError::LimitsExceeded(format!(
                "height {frame_height} exceeds {max}"
            )));
        }
        if let Some(max) = self.max_pages.filter(|&max| pages > max) {
            return Err(DecodeError::LimitsExceeded(format!(
                "{pages} pages exceed {max}"
            )));
        }
        Ok(())
    }
}

/// Options for [`decode`](super::decode).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodeOptions {
    /// First page to load, zero-based.
    pub page: u32,
    pub pages: PageCount,
    /// Apply the EXIF orientation and drop it from the metadata.
    pub autorotate: bool,
    pub limits: DecodeLimits,
    pub thumbnail: Option<Thumbnail>,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            page: 0,
            pages: PageCount::Single,
            autorotate: true,
            limits: DecodeLimits::default(),
            thumbnail: None,
        }
    }
}

impl DecodeOptions {
    pub fn with_pages(mut self, page: u32, pages: PageCount) -> Self {
        self.page = page;
        self.pages = pages;
        self
    }

    pub fn with_thumbnail(mut self, thumbnail: Thumbnail) -> Self {
        self.thumbnail = Some(thumbnail);
        self
    }

    /// Check the options on their own, before any bytes are read.
    pub fn validate(&self) -> Result<(), DecodeError> {
        if self.pages == PageCount::Count(0) {
            return Err(DecodeError::InvalidOptions(
                "page count must be at least 1".to_string(),
            ));
        }
        if let Some(t) = &self.thumbnail {
            if t.width == 0 || t.height == 0 {
                return Err(DecodeError::InvalidOptions(format!(
                    "thumbnail size {}x{} must be non-zero",
                    t.width, t.height
                )));
            }
        }
        Ok(())
    }

    /// Whether more than the first frame of a multi-frame file is wanted.
    pub(crate) fn wants_frames(&self) -> bool {
        self.page > 0 || self.pages != PageCount::Single
    }
}
