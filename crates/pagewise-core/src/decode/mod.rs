//! Image decoding from streaming sources.
//!
//! This module provides functionality for:
//! - Negotiating seekable or forward-only access to a [`SourceCapability`]
//! - Decoding still images through the `image` crate
//! - Decoding animated GIF, WebP and APNG into a stacked multi-frame canvas
//! - EXIF auto-rotation and page-aware thumbnailing after decode
//!
//! # Source access
//!
//! The source is probed once with a zero-length seek. Seekable sources are
//! decoded in place through a read buffer. Forward-only sources are read to
//! the end first and decoded from memory, since most containers need to
//! look back at their headers.

mod orientation;
mod resize;
mod types;

use std::io::{BufRead, BufReader, Cursor, Read, Seek};

use image::codecs::gif::GifDecoder;
use image::codecs::png::PngDecoder;
use image::codecs::webp::WebPDecoder;
use image::{AnimationDecoder, DynamicImage, ImageDecoder, ImageReader};

pub use orientation::read_orientation;
pub use resize::resize;
pub use types::{
    DecodeError, DecodeLimits, DecodeOptions, FilterType, Orientation, PageCount, Thumbnail,
    ThumbnailCrop, ThumbnailSize,
};

use crate::canvas::{canvas_from_dynamic, meta, Canvas};
use crate::format::ImageFormat;
use crate::pages::Pipeline;
use crate::stream::{MemorySource, SourceAdapter, SourceCapability, StreamError};

/// Decode one image from `source`.
///
/// Frames run on the calling thread; use [`Engine`](crate::Engine) for a
/// worker pool.
///
/// # Errors
///
/// - `DecodeError::Stream` if the source fails; this takes precedence over
///   whatever the codec made of the truncated input
/// - `DecodeError::UnsupportedFormat` if the container isn't recognized
/// - `DecodeError::InvalidOptions` if the requested pages don't exist
/// - `DecodeError::LimitsExceeded` if the image is larger than allowed
pub fn decode(
    source: &mut dyn SourceCapability,
    options: &DecodeOptions,
) -> Result<Canvas, DecodeError> {
    decode_with(source, options, &Pipeline::sequential())
}

/// Decode an image held in memory.
pub fn decode_bytes(bytes: &[u8], options: &DecodeOptions) -> Result<Canvas, DecodeError> {
    decode(&mut MemorySource::new(bytes), options)
}

#[tracing::instrument(level = "debug", skip_all, fields(page = options.page, pages = ?options.pages))]
pub(crate) fn decode_with(
    source: &mut dyn SourceCapability,
    options: &DecodeOptions,
    pipeline: &Pipeline,
) -> Result<Canvas, DecodeError> {
    options.validate()?;

    let mut adapter = SourceAdapter::new(source);
    let decoded = if adapter.probe_seek() {
        tracing::debug!(mode = "seekable", "negotiated source access");
        decode_container(BufReader::new(&mut adapter), options)
    } else {
        tracing::debug!(mode = "buffered", "negotiated source access");
        buffer_source(&mut adapter, options.limits.max_alloc)
            .and_then(|bytes| decode_container(Cursor::new(bytes), options))
    };

    let mut canvas = match (decoded, adapter.take_error()) {
        (Ok(canvas), _) => canvas,
        (Err(_), Some(stream)) => return Err(DecodeError::Stream(stream)),
        (Err(e), None) => return Err(e),
    };
    tracing::debug!(bytes = adapter.bytes_read(), "source consumed");

    let orientation = Orientation::from(u32::from(meta::orientation(&canvas)));
    if options.autorotate && orientation != Orientation::Normal {
        tracing::debug!(?orientation, "auto-rotating");
        canvas = orientation::apply_orientation(&canvas, orientation, pipeline)?;
    }

    if let Some(thumbnail) = &options.thumbnail {
        canvas = resize::apply_thumbnail(&canvas, thumbnail, pipeline)?;
    }

    tracing::debug!(
        width = canvas.width(),
        height = canvas.height(),
        pages = meta::frame_count(&canvas),
        "decoded"
    );
    Ok(canvas)
}

/// Read a forward-only source to the end, stopping one byte past `max`.
fn buffer_source(adapter: &mut SourceAdapter<'_>, max: Option<u64>) -> Result<Vec<u8>, DecodeError> {
    let mut bytes = Vec::new();
    let read = match max {
        Some(max) => adapter.by_ref().take(max.saturating_add(1)).read_to_end(&mut bytes),
        None => adapter.read_to_end(&mut bytes),
    };
    read.map_err(|e| DecodeError::Stream(StreamError::Io(e)))?;
    if let Some(max) = max.filter(|&max| bytes.len() as u64 > max) {
        return Err(DecodeError::LimitsExceeded(format!(
            "input exceeds {max} bytes"
        )));
    }
    Ok(bytes)
}

fn decode_container<R: BufRead + Seek>(
    reader: R,
    options: &DecodeOptions,
) -> Result<Canvas, DecodeError> {
    let reader = ImageReader::new(reader)
        .with_guessed_format()
        .map_err(StreamError::Io)?;
    let detected = reader.format().ok_or(DecodeError::UnsupportedFormat)?;
    let format = ImageFormat::from_image_format(detected).ok_or(DecodeError::UnsupportedFormat)?;
    tracing::debug!(%format, "detected format");

    let canvas = match detected {
        image::ImageFormat::Gif | image::ImageFormat::WebP | image::ImageFormat::Png
            if options.wants_frames() =>
        {
            decode_frames(detected, reader.into_inner(), options)?
        }
        _ => {
            select_pages(1, options)?;
            decode_still(reader, options)?
        }
    };

    let mut canvas = canvas.with_source_format(format);
    canvas.set_meta(meta::LOADER, format.extension());
    options.limits.check(
        canvas.width(),
        meta::frame_height(&canvas),
        meta::frame_count(&canvas),
    )?;
    Ok(canvas)
}

/// First page and page count to load from a file with `available` pages.
fn select_pages(available: u32, options: &DecodeOptions) -> Result<(u32, u32), DecodeError> {
    if options.page >= available {
        return Err(DecodeError::InvalidOptions(format!(
            "page {} out of range for {available} pages",
            options.page
        )));
    }
    let remaining = available - options.page;
    let count = match options.pages {
        PageCount::Single => 1,
        PageCount::All => remaining,
        PageCount::Count(n) if n <= remaining => n,
        PageCount::Count(n) => {
            return Err(DecodeError::InvalidOptions(format!(
                "{n} pages requested from page {}, only {remaining} available",
                options.page
            )))
        }
    };
    Ok((options.page, count))
}

fn decode_still<R: BufRead + Seek>(
    mut reader: ImageReader<R>,
    options: &DecodeOptions,
) -> Result<Canvas, DecodeError> {
    reader.limits(options.limits.to_image_limits());
    let mut decoder = reader.into_decoder()?;
    let orientation = match decoder.exif_metadata() {
        Ok(Some(raw)) => orientation::orientation_from_exif(raw),
        _ => Orientation::Normal,
    };
    let img = DynamicImage::from_decoder(decoder)?;

    let mut canvas = canvas_from_dynamic(img)?;
    if orientation != Orientation::Normal {
        canvas.set_meta(meta::ORIENTATION, orientation as i64);
    }
    Ok(canvas)
}

fn decode_frames<R: BufRead + Seek>(
    format: image::ImageFormat,
    reader: R,
    options: &DecodeOptions,
) -> Result<Canvas, DecodeError> {
    let limits = options.limits.to_image_limits();
    match format {
        image::ImageFormat::Gif => {
            let mut decoder = GifDecoder::new(reader)?;
            decoder.set_limits(limits)?;
            collect_frames(decoder.into_frames(), options)
        }
        image::ImageFormat::WebP => {
            let mut decoder = WebPDecoder::new(reader)?;
            if !decoder.has_animation() {
                select_pages(1, options)?;
                decoder.set_limits(limits)?;
                return Ok(canvas_from_dynamic(DynamicImage::from_decoder(decoder)?)?);
            }
            decoder.set_limits(limits)?;
            collect_frames(decoder.into_frames(), options)
        }
        _ => {
            let mut decoder = PngDecoder::new(reader)?;
            decoder.set_limits(limits)?;
            if !decoder.is_apng()? {
                select_pages(1, options)?;
                return Ok(canvas_from_dynamic(DynamicImage::from_decoder(decoder)?)?);
            }
            collect_frames(decoder.apng()?.into_frames(), options)
        }
    }
}

/// Stack the selected animation frames into one RGBA canvas.
fn collect_frames(frames: image::Frames<'_>, options: &DecodeOptions) -> Result<Canvas, DecodeError> {
    let wanted = match options.pages {
        PageCount::Single => Some(1),
        PageCount::All => None,
        PageCount::Count(n) => Some(n),
    };

    let mut size = None;
    let mut data = Vec::new();
    let mut delays = Vec::new();

    for frame in frames
        .skip(options.page as usize)
        .take(wanted.map_or(usize::MAX, |n| n as usize))
    {
        let frame = frame?;
        let (numer, denom) = frame.delay().numer_denom_ms();
        let buffer = frame.into_buffer();
        let dims = buffer.dimensions();

        match size {
            None => size = Some(dims),
            Some(first) if first != dims => {
                return Err(DecodeError::Codec(format!(
                    "frame {} is {}x{}, expected {}x{}",
                    options.page as usize + delays.len(),
                    dims.0,
                    dims.1,
                    first.0,
                    first.1
                )))
            }
            Some(_) => {}
        }

        delays.push(numer / denom.max(1));
        let pages = delays.len() as u32;
        options.limits.check(dims.0, dims.1, pages)?;
        data.extend_from_slice(buffer.as_raw());
    }

    let loaded = delays.len() as u32;
    let (width, height) = size.ok_or_else(|| {
        DecodeError::InvalidOptions(format!("page {} out of range", options.page))
    })?;
    if let Some(n) = wanted.filter(|&n| loaded < n) {
        return Err(DecodeError::InvalidOptions(format!(
            "{n} pages requested from page {}, only {loaded} available",
            options.page
        )));
    }
    tracing::debug!(pages = loaded, width, height, "collected animation frames");

    let mut canvas = Canvas::from_u8(width, height * loaded, 4, data)?;
    if loaded > 1 {
        meta::set_frame_count(&mut canvas, loaded);
        meta::set_frame_height(&mut canvas, height);
    }
    meta::set_frame_delays(&mut canvas, &delays);
    Ok(canvas)
}
