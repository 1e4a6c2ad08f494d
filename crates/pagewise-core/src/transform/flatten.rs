//! Composite the alpha band onto a solid background.

use super::{Color, Sample};
use crate::canvas::Canvas;

/// Blend every pixel onto `background` and drop the alpha band.
///
/// Alpha is measured against the full sample range (255 for 8-bit, 65535 for
/// 16-bit) and the background comes from [`Color::samples_for`], so a 16-bit
/// canvas is blended against the scaled color. Canvases without an alpha
/// band are returned unchanged.
pub fn apply_flatten(canvas: &Canvas, background: Color) -> Canvas {
    if !canvas.has_alpha() {
        return canvas.clone();
    }

    let format = canvas.sample_format();
    let bands = canvas.bands() as usize;
    let color_bands = canvas.bands() - 1;
    let fill = background.samples_for(color_bands, format);
    let max_alpha = u64::from(format.max_value());

    let pixels = map_samples!(canvas.pixels(), |data| blend(data, bands, &fill, max_alpha));
    canvas.derive_bands(canvas.width(), canvas.height(), color_bands, pixels)
}

fn blend<T: Sample>(data: &[T], bands: usize, fill: &[u16], max_alpha: u64) -> Vec<T> {
    let alpha_index = bands - 1;
    let mut output = Vec::with_capacity(data.len() / bands * alpha_index);
    for px in data.chunks_exact(bands) {
        let alpha = u64::from(px[alpha_index].to_u16()).min(max_alpha);
        let cover = max_alpha - alpha;
        for (v, &bg) in px[..alpha_index].iter().zip(fill) {
            let mixed = (u64::from(v.to_u16()) * alpha + u64::from(bg) * cover + max_alpha / 2) / max_alpha;
            output.push(T::from_u16(mixed as u16));
        }
    }
    output
}


// ============================================================================
// Property-Based Tests
// ============================================================================
