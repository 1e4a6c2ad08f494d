//! Conversion between canvases and `image::DynamicImage`.

use image::{DynamicImage, ImageBuffer};

use super::types::{Canvas, CanvasError, Interpretation, PixelBuffer};

/// Geometry, band count and samples of a decoded image.
///
/// Float images are narrowed to 16-bit.
pub(crate) fn pixels_from_dynamic(img: DynamicImage) -> (u32, u32, u32, PixelBuffer) {
    let (width, height) = (img.width(), img.height());
    let (bands, pixels) = match img {
        DynamicImage::ImageLuma8(buf) => (1, PixelBuffer::U8(buf.into_raw())),
        DynamicImage::ImageLumaA8(buf) => (2, PixelBuffer::U8(buf.into_raw())),
        DynamicImage::ImageRgb8(buf) => (3, PixelBuffer::U8(buf.into_raw())),
        DynamicImage::ImageRgba8(buf) => (4, PixelBuffer::U8(buf.into_raw())),
        DynamicImage::ImageLuma16(buf) => (1, PixelBuffer::U16(buf.into_raw())),
        DynamicImage::ImageLumaA16(buf) => (2, PixelBuffer::U16(buf.into_raw())),
        DynamicImage::ImageRgb16(buf) => (3, PixelBuffer::U16(buf.into_raw())),
        DynamicImage::ImageRgba16(buf) => (4, PixelBuffer::U16(buf.into_raw())),
        DynamicImage::ImageRgb32F(_) => (3, PixelBuffer::U16(img.into_rgb16().into_raw())),
        other => (4, PixelBuffer::U16(other.into_rgba16().into_raw())),
    };
    (width, height, bands, pixels)
}

/// Build a canvas from a decoded image.
pub(crate) fn canvas_from_dynamic(img: DynamicImage) -> Result<Canvas, CanvasError> {
    let (width, height, bands, pixels) = pixels_from_dynamic(img);
    let format = pixels.sample_format();
    Ok(Canvas::new(width, height, bands, pixels)?
        .with_interpretation(Interpretation::default_for(bands, format)))
}

/// View a canvas as a `DynamicImage` for resizing and encoding.
///
/// # Errors
///
/// `CanvasError::UnsupportedLayout` for more than four bands.
pub(crate) fn dynamic_from_canvas(canvas: &Canvas) -> Result<DynamicImage, CanvasError> {
    let (w, h) = (canvas.width(), canvas.height());
    let unsupported = || CanvasError::UnsupportedLayout {
        bands: canvas.bands(),
        format: canvas.sample_format(),
    };
    let mismatch = || CanvasError::BufferMismatch {
        expected: w as usize * h as usize * canvas.bands() as usize,
        actual: canvas.pixels().len(),
    };

    let img = match (canvas.pixels(), canvas.bands()) {
        (PixelBuffer::U8(data), 1) => {
            DynamicImage::ImageLuma8(ImageBuffer::from_raw(w, h, data.clone()).ok_or_else(mismatch)?)
        }
        (PixelBuffer::U8(data), 2) => {
            DynamicImage::ImageLumaA8(ImageBuffer::from_raw(w, h, data.clone()).ok_or_else(mismatch)?)
        }
        (PixelBuffer::U8(data), 3) => {
            DynamicImage::ImageRgb8(ImageBuffer::from_raw(w, h, data.clone()).ok_or_else(mismatch)?)
        }
        (PixelBuffer::U8(data), 4) => {
            DynamicImage::ImageRgba8(ImageBuffer::from_raw(w, h, data.clone()).ok_or_else(mismatch)?)
        }
        (PixelBuffer::U16(data), 1) => {
            DynamicImage::ImageLuma16(ImageBuffer::from_raw(w, h, data.clone()).ok_or_else(mismatch)?)
        }
        (PixelBuffer::U16(data), 2) => {
            DynamicImage::ImageLumaA16(ImageBuffer::from_raw(w, h, data.clone()).ok_or_else(mismatch)?)
        }
        (PixelBuffer::U16(data), 3) => {
            DynamicImage::ImageRgb16(ImageBuffer::from_raw(w, h, data.clone()).ok_or_else(mismatch)?)
        }
        (PixelBuffer::U16(data), 4) => {
            DynamicImage::ImageRgba16(ImageBuffer::from_raw(w, h, data.clone()).ok_or_else(mismatch)?)
        }
        _ => return Err(unsupported()),
    };
    Ok(img)
}

/// Narrow a canvas to 8-bit samples, keeping everything else.
pub(crate) fn to_u8(canvas: &Canvas) -> Canvas {
    match canvas.pixels() {
        PixelBuffer::U8(_) => canvas.clone(),
        PixelBuffer::U16(data) => {
            let narrowed = data.iter().map(|&v| (v >> 8) as u8).collect();
            let out = canvas.derive(canvas.width(), canvas.height(), PixelBuffer::U8(narrowed));
            let interpretation = match canvas.interpretation() {
                Interpretation::Grey16 => Interpretation::BW,
                Interpretation::Rgb16 => Interpretation::Srgb,
                other => other,
            };
            out.with_interpretation(interpretation)
        }
    }
}
