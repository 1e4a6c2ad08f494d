//! Single-image formats written through `DynamicImage`.
//!
//! Multi-frame canvases are written as one tall image, the frame layout is
//! not preserved.

use std::io::{Cursor, Write};

use image::codecs::bmp::BmpEncoder;
use image::codecs::png::{self, PngEncoder};
use image::codecs::tiff::TiffEncoder;
use image::codecs::webp::WebPEncoder;
use image::DynamicImage;

use super::{EncodeError, PngCompression, PngFilter};
use crate::canvas::{dynamic_from_canvas, to_u8, Canvas};

pub(crate) fn encode_png<W: Write>(
    canvas: &Canvas,
    writer: W,
    compression: PngCompression,
    filter: PngFilter,
) -> Result<(), EncodeError> {
    let compression = match compression {
        PngCompression::Fast => png::CompressionType::Fast,
        PngCompression::Default => png::CompressionType::Default,
        PngCompression::Best => png::CompressionType::Best,
    };
    let filter = match filter {
        PngFilter::None => png::FilterType::NoFilter,
        PngFilter::Sub => png::FilterType::Sub,
        PngFilter::Up => png::FilterType::Up,
        PngFilter::Avg => png::FilterType::Avg,
        PngFilter::Paeth => png::FilterType::Paeth,
        PngFilter::Adaptive => png::FilterType::Adaptive,
    };
    let img = dynamic_from_canvas(canvas)?;
    img.write_with_encoder(PngEncoder::new_with_quality(writer, compression, filter))?;
    Ok(())
}

pub(crate) fn encode_webp<W: Write>(canvas: &Canvas, writer: W) -> Result<(), EncodeError> {
    let img = dynamic_from_canvas(&to_u8(canvas))?;
    img.write_with_encoder(WebPEncoder::new_lossless(writer))?;
    Ok(())
}

pub(crate) fn encode_bmp<W: Write>(canvas: &Canvas, mut writer: W) -> Result<(), EncodeError> {
    let img = dynamic_from_canvas(&to_u8(canvas))?;
    img.write_with_encoder(BmpEncoder::new(&mut writer))?;
    Ok(())
}

/// TIFF needs to seek back to patch offsets, so it is assembled in memory
/// and then streamed out.
pub(crate) fn encode_tiff<W: Write>(canvas: &Canvas, mut writer: W) -> Result<(), EncodeError> {
    let img = dynamic_from_canvas(canvas)?;
    let img = match img {
        DynamicImage::ImageLumaA8(_) => DynamicImage::ImageRgba8(img.to_rgba8()),
        DynamicImage::ImageLumaA16(_) => DynamicImage::ImageRgba16(img.to_rgba16()),
        other => other,
    };

    let mut buffer = Cursor::new(Vec::new());
    img.write_with_encoder(TiffEncoder::new(&mut buffer))?;
    writer
        .write_all(buffer.get_ref())
        .map_err(|e| EncodeError::Stream(e.into()))?;
    Ok(())
}
