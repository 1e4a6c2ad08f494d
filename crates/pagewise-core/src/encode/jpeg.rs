//! JPEG encoding.
//!
//! JPEG has no alpha channel and only 8-bit samples, so the canvas is
//! narrowed and flattened onto black before the `image` crate's encoder runs.

use std::io::Write;

use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, ImageEncoder};

use super::EncodeError;
use crate::canvas::{to_u8, Canvas, PixelBuffer};
use crate::transform::{apply_flatten, Color};

/// Narrow to 8-bit and blend alpha onto black.
fn flatten(canvas: &Canvas) -> Result<(u32, Vec<u8>), EncodeError> {
    if canvas.bands() > 4 {
        return Err(EncodeError::InvalidCanvas(format!(
            "JPEG can't hold {} bands",
            canvas.bands()
        )));
    }
    let flat = apply_flatten(&to_u8(canvas), Color::BLACK);
    match flat.pixels() {
        PixelBuffer::U8(data) => Ok((flat.bands(), data.clone())),
        PixelBuffer::U16(_) => Err(EncodeError::InvalidCanvas(
            "flatten expects 8-bit samples".to_string(),
        )),
    }
}

/// Encode a canvas as JPEG into `writer`.
///
/// # Arguments
///
/// * `canvas` - The image; multi-frame canvases are written as one tall image
/// * `writer` - Destination for the encoded bytes
/// * `quality` - JPEG quality (1-100, where 100 is highest quality)
///
/// # Quality Guidelines
///
/// * 90-100: High quality, suitable for archival or further editing
/// * 80-90: Good quality, recommended for most uses
/// * 60-80: Medium quality, acceptable for web/social media
/// * Below 60: Low quality, visible artifacts
///
/// # Errors
///
/// `EncodeError::InvalidCanvas` for more than four bands, `Codec` or
/// `Stream` if the encoder fails.
pub(crate) fn encode_jpeg<W: Write>(
    canvas: &Canvas,
    writer: W,
    quality: u8,
) -> Result<(), EncodeError> {
    // Clamp quality to valid range (1-100)
    let quality = quality.clamp(1, 100);

    let (bands, pixels) = flatten(canvas)?;
    let color = if bands == 1 {
        ExtendedColorType::L8
    } else {
        ExtendedColorType::Rgb8
    };

    JpegEncoder::new_with_quality(writer, quality).write_image(
        &pixels,
        canvas.width(),
        canvas.height(),
        color,
    )?;
    Ok(())
}
