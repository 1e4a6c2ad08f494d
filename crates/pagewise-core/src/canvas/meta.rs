//! Frame metadata accessors.
//!
//! A multi-frame canvas stores its frames stacked vertically. Two metadata
//! entries describe the stacking: [`N_PAGES`] (frame count) and
//! [`PAGE_HEIGHT`] (height of one frame). Accessors fall back to the
//! single-frame interpretation when an entry is missing. Nothing here checks
//! that the entries agree with the canvas height; the page-aware pipeline does.

use super::types::{Canvas, MetaValue};

/// Number of frames stacked in the canvas.
pub const N_PAGES: &str = "n-pages";
/// Height of a single frame in pixels.
pub const PAGE_HEIGHT: &str = "page-height";
/// Per-frame display time in milliseconds.
pub const DELAY: &str = "delay";
/// Animation repeat count, 0 = forever.
pub const LOOP: &str = "loop";
/// EXIF orientation (1-8).
pub const ORIENTATION: &str = "orientation";
/// Name of the decoder that produced the canvas.
pub const LOADER: &str = "loader";

/// Frame count, 1 when absent or not a positive integer.
pub fn frame_count(canvas: &Canvas) -> u32 {
    positive(canvas.meta_int(N_PAGES)).unwrap_or(1)
}

/// Height of one frame, the full canvas height when absent.
pub fn frame_height(canvas: &Canvas) -> u32 {
    positive(canvas.meta_int(PAGE_HEIGHT)).unwrap_or_else(|| canvas.height())
}

/// Set the height of one frame.
///
/// Used when unrolling an animation back into frames after an out-of-core
/// resize changed the stacked height.
pub fn set_frame_height(canvas: &mut Canvas, height: u32) {
    canvas.set_meta(PAGE_HEIGHT, i64::from(height));
}

pub(crate) fn set_frame_count(canvas: &mut Canvas, count: u32) {
    canvas.set_meta(N_PAGES, i64::from(count));
}

/// Drop the frame entries so the canvas reads as a single frame.
pub(crate) fn clear_frames(canvas: &mut Canvas) {
    canvas.remove_meta(N_PAGES);
    canvas.remove_meta(PAGE_HEIGHT);
}

/// Per-frame delays in milliseconds, if the canvas is animated.
pub fn frame_delays(canvas: &Canvas) -> Option<Vec<u32>> {
    canvas.meta_int_array(DELAY).map(|delays| {
        delays
            .iter()
            .map(|&d| u32::try_from(d).unwrap_or(0))
            .collect()
    })
}

/// Set per-frame delays in milliseconds.
pub fn set_frame_delays(canvas: &mut Canvas, delays: &[u32]) {
    let values: Vec<i64> = delays.iter().map(|&d| i64::from(d)).collect();
    canvas.set_meta(DELAY, MetaValue::IntArray(values));
}

/// Animation repeat count (0 = loop forever), if recorded.
pub fn loop_count(canvas: &Canvas) -> Option<u32> {
    canvas.meta_int(LOOP).and_then(|v| u32::try_from(v).ok())
}

pub fn set_loop_count(canvas: &mut Canvas, count: u32) {
    canvas.set_meta(LOOP, i64::from(count));
}

/// EXIF orientation as it appears in the file, 0 if absent.
pub fn orientation(canvas: &Canvas) -> u8 {
    canvas
        .meta_int(ORIENTATION)
        .and_then(|v| u8::try_from(v).ok())
        .filter(|v| (1..=8).contains(v))
        .unwrap_or(0)
}

fn positive(value: Option<i64>) -> Option<u32> {
    value.and_then(|v| u32::try_from(v).ok()).filter(|&v| v > 0)
}
