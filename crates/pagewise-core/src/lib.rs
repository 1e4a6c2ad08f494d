//! Pagewise Core - page-aware image transforms
//!
//! A multi-page image (an animation, a multi-page document) is held as one
//! tall canvas with every page stacked vertically and described by the
//! `n-pages` and `page-height` metadata. This crate provides:
//!
//! - Geometric transforms (pad, crop, rotate, flip) and alpha flattening
//!   applied to each page on its own, optionally on a worker pool
//! - Content-box detection against a flat background
//! - Decoding from caller-driven byte sources that may or may not seek
//! - Encoding into caller-driven byte sinks that are always finished once

/// Apply `$body` to the sample vector of a [`canvas::PixelBuffer`],
/// keeping its sample width.
macro_rules! map_samples {
    ($buf:expr, |$data:ident| $body:expr) => {
        match $buf {
            $crate::canvas::PixelBuffer::U8($data) => $crate::canvas::PixelBuffer::U8($body),
            $crate::canvas::PixelBuffer::U16($data) => $crate::canvas::PixelBuffer::U16($body),
        }
    };
}

pub mod canvas;
pub mod config;
pub mod decode;
pub mod encode;
pub mod engine;
pub mod format;
pub mod logging;
pub mod pages;
pub mod stream;
pub mod transform;

#[cfg(test)]
mod test_support;

pub use canvas::{Canvas, CanvasError, Interpretation, MetaValue, PixelBuffer, SampleFormat};
pub use config::{ConfigError, EngineConfig};
pub use decode::{decode, decode_bytes, DecodeError, DecodeOptions};
pub use encode::{encode, encode_to_vec, EncodeError, EncodeOptions};
pub use engine::Engine;
pub use format::ImageFormat;
pub use logging::{LogLevel, Logging, LoggingHandler};
pub use pages::{apply_page_aware, apply_single, Pipeline};
pub use stream::{SourceCapability, StreamError, TargetCapability};
pub use transform::{
    apply_flatten, find_trim, Angle, Color, Direction, ExtendPolicy, Transform, TransformError,
    TrimBox,
};
