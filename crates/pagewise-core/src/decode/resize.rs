//! Resizing and thumbnail generation.
//!
//! Thumbnails are computed per frame: an animated canvas is resized frame by
//! frame so the page layout survives.

use super::{FilterType, Thumbnail, ThumbnailCrop, ThumbnailSize};
use crate::canvas::{dynamic_from_canvas, meta, pixels_from_dynamic, Canvas};
use crate::pages::{Frame, Pipeline};
use crate::transform::{apply_crop, TransformError};

/// Resize a single frame to exact dimensions.
///
/// # Arguments
///
/// * `canvas` - The frame to resize
/// * `width` - Target width in pixels
/// * `height` - Target height in pixels
/// * `filter` - Interpolation filter to use
///
/// # Returns
///
/// A new canvas with the same bands, sample format and metadata.
///
/// # Errors
///
/// Returns `TransformError::InvalidArgument` for a zero target size or a band
/// layout the resampler can't handle.
pub fn resize(
    canvas: &Canvas,
    width: u32,
    height: u32,
    filter: FilterType,
) -> Result<Canvas, TransformError> {
    if width == 0 || height == 0 {
        return Err(TransformError::InvalidArgument(format!(
            "resize target {width}x{height} must be non-zero"
        )));
    }

    // Fast path: if dimensions match, just clone
    if canvas.width() == width && canvas.height() == height {
        return Ok(canvas.clone());
    }

    let img = dynamic_from_canvas(canvas)
        .map_err(|e| TransformError::InvalidArgument(e.to_string()))?;
    let resized = img.resize_exact(width, height, filter.to_image_filter());
    let (w, h, _, pixels) = pixels_from_dynamic(resized);
    Ok(canvas.derive(w, h, pixels))
}

/// Resize and crop steps for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ThumbnailPlan {
    width: u32,
    height: u32,
    /// `(left, top, width, height)` in the resized frame.
    crop: Option<(u32, u32, u32, u32)>,
}

fn plan(src_width: u32, src_height: u32, thumbnail: &Thumbnail) -> ThumbnailPlan {
    if thumbnail.size == ThumbnailSize::Force {
        return ThumbnailPlan {
            width: thumbnail.width,
            height: thumbnail.height,
            crop: None,
        };
    }

    let sx = f64::from(thumbnail.width) / f64::from(src_width);
    let sy = f64::from(thumbnail.height) / f64::from(src_height);
    let mut scale = match thumbnail.crop {
        ThumbnailCrop::None => sx.min(sy),
        _ => sx.max(sy),
    };
    scale = match thumbnail.size {
        ThumbnailSize::Up => scale.max(1.0),
        ThumbnailSize::Down => scale.min(1.0),
        ThumbnailSize::Both | ThumbnailSize::Force => scale,
    };

    let width = ((f64::from(src_width) * scale).round() as u32).max(1);
    let height = ((f64::from(src_height) * scale).round() as u32).max(1);

    let crop = match thumbnail.crop {
        ThumbnailCrop::None => None,
        anchor => {
            let cw = thumbnail.width.min(width);
            let ch = thumbnail.height.min(height);
            let (left, top) = match anchor {
                ThumbnailCrop::Low => (0, 0),
                ThumbnailCrop::High => (width - cw, height - ch),
                _ => ((width - cw) / 2, (height - ch) / 2),
            };
            Some((left, top, cw, ch)).filter(|&c| c != (0, 0, width, height))
        }
    };

    ThumbnailPlan {
        width,
        height,
        crop,
    }
}

fn thumbnail_frame(
    frame: &Canvas,
    plan: &ThumbnailPlan,
    filter: FilterType,
) -> Result<Canvas, TransformError> {
    let resized = resize(frame, plan.width, plan.height, filter)?;
    match plan.crop {
        Some((left, top, width, height)) => apply_crop(&resized, left, top, width, height),
        None => Ok(resized),
    }
}

/// Shrink or enlarge every frame to fit the thumbnail box.
pub(crate) fn apply_thumbnail(
    canvas: &Canvas,
    thumbnail: &Thumbnail,
    pipeline: &Pipeline,
) -> Result<Canvas, TransformError> {
    let plan = plan(canvas.width(), meta::frame_height(canvas), thumbnail);
    tracing::debug!(
        width = plan.width,
        height = plan.height,
        crop = ?plan.crop,
        "thumbnail plan"
    );

    if meta::frame_count(canvas) <= 1 {
        return thumbnail_frame(canvas, &plan, thumbnail.filter);
    }
    pipeline.map_frames(canvas, |frame| {
        thumbnail_frame(frame.canvas(), &plan, thumbnail.filter).map(Frame::new)
    })
}
