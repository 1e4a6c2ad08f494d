//! Transform descriptors and their error type.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::canvas::SampleFormat;

/// Error types for transform, split and join operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransformError {
    /// Frame metadata doesn't describe the canvas, or a frame region falls
    /// outside it.
    #[error("Region error: {0}")]
    Region(String),

    /// A crop region exceeds the frame it is applied to.
    #[error(
        "Crop region {width}x{height} at ({left}, {top}) exceeds {source_width}x{source_height} frame"
    )]
    Bounds {
        left: u32,
        top: u32,
        width: u32,
        height: u32,
        source_width: u32,
        source_height: u32,
    },

    /// Frames handed to the reassembler are missing or inconsistent.
    #[error("Join error: {0}")]
    Join(String),

    /// A descriptor parameter is out of range.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The per-frame worker pool could not be started.
    #[error("Worker pool error: {0}")]
    Pool(String),
}

/// Rotation by a multiple of 90 degrees, clockwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Angle {
    #[default]
    D0,
    D90,
    D180,
    D270,
}

impl Angle {
    /// Build from degrees. Any multiple of 90 is accepted, negative values
    /// rotate counter-clockwise.
    pub fn from_degrees(degrees: i32) -> Option<Self> {
        if degrees % 90 != 0 {
            return None;
        }
        Some(Self::from_quarter_turns(degrees / 90))
    }

    pub fn from_quarter_turns(turns: i32) -> Self {
        match turns.rem_euclid(4) {
            0 => Angle::D0,
            1 => Angle::D90,
            2 => Angle::D180,
            _ => Angle::D270,
        }
    }

    pub fn quarter_turns(self) -> u8 {
        match self {
            Angle::D0 => 0,
            Angle::D90 => 1,
            Angle::D180 => 2,
            Angle::D270 => 3,
        }
    }

    pub fn degrees(self) -> u16 {
        u16::from(self.quarter_turns()) * 90
    }

    /// Returns true if the rotation exchanges width and height.
    #[inline]
    pub fn swaps_dimensions(self) -> bool {
        matches!(self, Angle::D90 | Angle::D270)
    }
}

/// Mirror axis for [`Transform::Flip`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Mirror left to right.
    Horizontal,
    /// Mirror top to bottom.
    Vertical,
}

/// An 8-bit RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Samples for one pixel of a canvas with `bands` bands.
    ///
    /// Components are given in the 0-255 range and always scaled to the
    /// sample range of `format`, so a 16-bit canvas gets `v * 65535 / 255`.
    /// Greyscale canvases receive Rec.601 luma; bands past the fourth are 0.
    pub fn samples_for(self, bands: u32, format: SampleFormat) -> Vec<u16> {
        let scale = |v: u8| -> u16 {
            let max = u32::from(format.max_value());
            (u32::from(v) * max / 255) as u16
        };
        let luma = ((299 * u32::from(self.r) + 587 * u32::from(self.g) + 114 * u32::from(self.b))
            / 1000) as u8;

        let mut samples = match bands {
            1 => vec![scale(luma)],
            2 => vec![scale(luma), scale(self.a)],
            3 => vec![scale(self.r), scale(self.g), scale(self.b)],
            _ => vec![scale(self.r), scale(self.g), scale(self.b), scale(self.a)],
        };
        samples.resize(bands as usize, 0);
        samples
    }
}

/// How pixels outside the source are filled when padding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ExtendPolicy {
    /// All bands zero.
    #[default]
    Black,
    /// All bands at the sample maximum.
    White,
    /// Replicate the nearest edge pixel.
    Copy,
    /// Tile the source.
    Repeat,
    /// Tile the source, mirroring every other tile.
    Mirror,
    /// Fill with a color.
    Background(Color),
}

/// A single geometric operation, applied identically to every frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Transform {
    /// Place the frame at `(left, top)` inside a `width` x `height` frame.
    Pad {
        left: i32,
        top: i32,
        width: u32,
        height: u32,
        extend: ExtendPolicy,
    },
    /// Keep only the `width` x `height` region at `(left, top)`.
    Crop {
        left: u32,
        top: u32,
        width: u32,
        height: u32,
    },
    /// Rotate clockwise by a multiple of 90 degrees.
    Rotate(Angle),
    /// Mirror along one axis.
    Flip(Direction),
    /// Composite the alpha band onto `background` and drop it.
    Flatten { background: Color },
}

impl Transform {
    /// Output frame size for an input frame of `width` x `height`.
    pub fn output_size(&self, width: u32, height: u32) -> (u32, u32) {
        match *self {
            Transform::Pad { width, height, .. } => (width, height),
            Transform::Crop { width, height, .. } => (width, height),
            Transform::Rotate(angle) if angle.swaps_dimensions() => (height, width),
            Transform::Rotate(_) | Transform::Flip(_) | Transform::Flatten { .. } => {
                (width, height)
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Transform::Pad { .. } => "pad",
            Transform::Crop { .. } => "crop",
            Transform::Rotate(_) => "rotate",
            Transform::Flip(_) => "flip",
            Transform::Flatten { .. } => "flatten",
        }
    }
}
