//! Embed a frame inside a larger (or shifted) frame.
//!
//! The source is placed at `(left, top)` in a new `width` x `height` frame.
//! Offsets may be negative, in which case part of the source is cut off.
//! Pixels not covered by the source are produced by the [`ExtendPolicy`].

use super::{ExtendPolicy, Sample, TransformError};
use crate::canvas::Canvas;

/// Per-axis rule for mapping an outside coordinate back into the source.
#[derive(Clone, Copy)]
enum EdgeRule {
    Fill,
    Clamp,
    Wrap,
    Reflect,
}

/// Pad (embed) a frame.
///
/// # Errors
///
/// Returns `TransformError::InvalidArgument` if the target size is empty.
pub fn apply_pad(
    canvas: &Canvas,
    left: i32,
    top: i32,
    width: u32,
    height: u32,
    extend: ExtendPolicy,
) -> Result<Canvas, TransformError> {
    if width == 0 || height == 0 {
        return Err(TransformError::InvalidArgument(format!(
            "pad target must be non-empty, got {width}x{height}"
        )));
    }

    // Fast path: nothing moves and nothing is added
    if left == 0 && top == 0 && width == canvas.width() && height == canvas.height() {
        return Ok(canvas.clone());
    }

    let format = canvas.sample_format();
    let bands = canvas.bands();
    let (rule, fill) = match extend {
        ExtendPolicy::Black => (EdgeRule::Fill, vec![0u16; bands as usize]),
        ExtendPolicy::White => (EdgeRule::Fill, vec![format.max_value(); bands as usize]),
        ExtendPolicy::Background(color) => (EdgeRule::Fill, color.samples_for(bands, format)),
        ExtendPolicy::Copy => (EdgeRule::Clamp, Vec::new()),
        ExtendPolicy::Repeat => (EdgeRule::Wrap, Vec::new()),
        ExtendPolicy::Mirror => (EdgeRule::Reflect, Vec::new()),
    };

    let geometry = Embed {
        src_w: i64::from(canvas.width()),
        src_h: i64::from(canvas.height()),
        bands: bands as usize,
        left: i64::from(left),
        top: i64::from(top),
        out_w: i64::from(width),
        out_h: i64::from(height),
        rule,
    };
    let pixels = map_samples!(canvas.pixels(), |data| geometry.run(data, &fill));

    Ok(canvas.derive(width, height, pixels))
}

struct Embed {
    src_w: i64,
    src_h: i64,
    bands: usize,
    left: i64,
    top: i64,
    out_w: i64,
    out_h: i64,
    rule: EdgeRule,
}

impl Embed {
    fn run<T: Sample>(&self, data: &[T], fill: &[u16]) -> Vec<T> {
        let fill: Vec<T> = fill.iter().map(|&v| T::from_u16(v)).collect();
        let mut output = Vec::with_capacity((self.out_w * self.out_h) as usize * self.bands);

        for y in 0..self.out_h {
            let sy = resolve(y - self.top, self.src_h, self.rule);
            for x in 0..self.out_w {
                let sx = resolve(x - self.left, self.src_w, self.rule);
                match (sx, sy) {
                    (Some(sx), Some(sy)) => {
                        let idx = (sy * self.src_w + sx) as usize * self.bands;
                        output.extend_from_slice(&data[idx..idx + self.bands]);
                    }
                    _ => output.extend_from_slice(&fill),
                }
            }
        }

        output
    }
}

/// Map a coordinate on one axis into `0..len`, or `None` when the pixel
/// should take the fill value.
fn resolve(v: i64, len: i64, rule: EdgeRule) -> Option<i64> {
    if (0..len).contains(&v) {
        return Some(v);
    }
    match rule {
        EdgeRule::Fill => None,
        EdgeRule::Clamp => Some(v.clamp(0, len - 1)),
        EdgeRule::Wrap => Some(v.rem_euclid(len)),
        EdgeRule::Reflect => {
            let m = v.rem_euclid(2 * len);
            Some(if m >= len { 2 * len - 1 - m } else { m })
        }
    }
}


// ============================================================================
// Property-Based Tests
// ============================================================================
