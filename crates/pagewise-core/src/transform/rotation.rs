//! Lossless rotation by quarter turns.
//!
//! Rotations are exact pixel permutations, so no interpolation is involved.
//! For an output pixel `(ox, oy)` the source pixel is:
//!
//! ```text
//! D0:   (ox,         oy)
//! D90:  (oy,         h - 1 - ox)
//! D180: (w - 1 - ox, h - 1 - oy)
//! D270: (w - 1 - oy, ox)
//! ```

use super::{Angle, Sample};
use crate::canvas::Canvas;

/// Rotate a frame clockwise by `angle`.
///
/// 90 and 270 degree rotations exchange width and height.
pub fn apply_rotation(canvas: &Canvas, angle: Angle) -> Canvas {
    // Fast path: no rotation needed
    if angle == Angle::D0 {
        return canvas.clone();
    }

    let (w, h) = (canvas.width(), canvas.height());
    let bands = canvas.bands() as usize;
    let pixels = map_samples!(canvas.pixels(), |data| rotate_samples(
        data,
        w as usize,
        h as usize,
        bands,
        angle
    ));

    let (out_w, out_h) = if angle.swaps_dimensions() { (h, w) } else { (w, h) };
    canvas.derive(out_w, out_h, pixels)
}

fn rotate_samples<T: Sample>(data: &[T], w: usize, h: usize, bands: usize, angle: Angle) -> Vec<T> {
    let (out_w, out_h) = if angle.swaps_dimensions() { (h, w) } else { (w, h) };
    let mut output = Vec::with_capacity(data.len());

    for oy in 0..out_h {
        for ox in 0..out_w {
            let (sx, sy) = match angle {
                Angle::D0 => (ox, oy),
                Angle::D90 => (oy, h - 1 - ox),
                Angle::D180 => (w - 1 - ox, h - 1 - oy),
                Angle::D270 => (w - 1 - oy, ox),
            };
            let idx = (sy * w + sx) * bands;
            output.extend_from_slice(&data[idx..idx + bands]);
        }
    }

    output
}


// ============================================================================
// Property-Based Tests
// ============================================================================
