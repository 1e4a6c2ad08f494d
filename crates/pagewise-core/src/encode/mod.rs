//! Image encoding to streaming targets.
//!
//! This module provides functionality for:
//! - Encoding JPEG, PNG, WebP, TIFF, BMP and animated GIF
//! - Streaming the encoded bytes into a [`TargetCapability`]
//!
//! The target's `finish` is called exactly once per encode, whether the
//! encode succeeded or not. When a write failed, that failure is reported
//! in preference to whatever the codec made of it.

mod gif;
mod jpeg;
mod still;
mod types;

use std::io::{BufWriter, Write};

pub use types::{EncodeError, EncodeOptions, PngCompression, PngFilter};

use crate::canvas::Canvas;
use crate::format::ImageFormat;
use crate::stream::{MemoryTarget, TargetAdapter, TargetCapability};

/// Encode `canvas` into `target`.
///
/// # Errors
///
/// - `EncodeError::Stream` if the target fails or accepts a short write
/// - `EncodeError::UnsupportedFormat` for HEIF, AVIF and JPEG 2000
/// - `EncodeError::InvalidCanvas` if the canvas can't be stored in the format
#[tracing::instrument(
    level = "debug",
    skip_all,
    fields(format = %options.format(), width = canvas.width(), height = canvas.height())
)]
pub fn encode(
    canvas: &Canvas,
    target: &mut dyn TargetCapability,
    options: &EncodeOptions,
) -> Result<(), EncodeError> {
    let mut adapter = TargetAdapter::new(target);
    match write_encoded(canvas, &mut adapter, options) {
        Ok(()) => {
            let bytes = adapter.finish()?;
            tracing::debug!(bytes, "encoded");
            Ok(())
        }
        Err(err) => {
            let write_err = adapter.take_error();
            if let Err(e) = adapter.finish() {
                tracing::warn!(error = %e, "finish failed after encode error");
            }
            Err(write_err.map_or(err, EncodeError::Stream))
        }
    }
}

/// Encode into a new byte vector.
pub fn encode_to_vec(canvas: &Canvas, options: &EncodeOptions) -> Result<Vec<u8>, EncodeError> {
    let mut target = MemoryTarget::new();
    encode(canvas, &mut target, options)?;
    Ok(target.into_inner())
}

fn write_encoded(
    canvas: &Canvas,
    adapter: &mut TargetAdapter<'_>,
    options: &EncodeOptions,
) -> Result<(), EncodeError> {
    let mut writer = BufWriter::new(adapter);
    match *options {
        EncodeOptions::Jpeg { quality } => jpeg::encode_jpeg(canvas, &mut writer, quality)?,
        EncodeOptions::Png {
            compression,
            filter,
        } => still::encode_png(canvas, &mut writer, compression, filter)?,
        EncodeOptions::Webp => still::encode_webp(canvas, &mut writer)?,
        EncodeOptions::Tiff => still::encode_tiff(canvas, &mut writer)?,
        EncodeOptions::Bmp => still::encode_bmp(canvas, &mut writer)?,
        EncodeOptions::Gif { repeat } => gif::encode_gif(canvas, &mut writer, repeat)?,
        EncodeOptions::Heif => return Err(EncodeError::UnsupportedFormat(ImageFormat::Heif)),
        EncodeOptions::Avif => return Err(EncodeError::UnsupportedFormat(ImageFormat::Avif)),
        EncodeOptions::Jp2k => return Err(EncodeError::UnsupportedFormat(ImageFormat::Jp2k)),
    }
    writer
        .flush()
        .map_err(|e| EncodeError::Stream(e.into()))
}
