//! Find the content box of a frame against a flat background.

use serde::{Deserialize, Serialize};

use super::{apply_flatten, Color, Sample, Transform, TransformError};
use crate::canvas::{meta, Canvas, PixelBuffer};

/// A rectangle in frame coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TrimBox {
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
}

impl TrimBox {
    /// True when no pixel differed from the background.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// The crop that keeps this box, `None` when it is empty.
    pub fn to_crop(self) -> Option<Transform> {
        (!self.is_empty()).then_some(Transform::Crop {
            left: self.left,
            top: self.top,
            width: self.width,
            height: self.height,
        })
    }
}

/// Bounding box of the pixels that differ from `background` by more than
/// `threshold` in any color band.
///
/// `threshold` is in the canvas' own sample units. The background goes
/// through [`Color::samples_for`], so a white background matches 65535 on a
/// 16-bit canvas. Canvases with alpha are flattened onto the background
/// before comparing. For a multi-frame canvas the box is the union over all
/// frames, in frame coordinates, so cropping every frame to it keeps each
/// frame's content. An all-background canvas yields an empty box.
///
/// # Errors
///
/// - `TransformError::InvalidArgument` for a negative or NaN threshold
/// - `TransformError::Region` if the frame metadata doesn't describe the canvas
pub fn find_trim(canvas: &Canvas, threshold: f64, background: Color) -> Result<TrimBox, TransformError> {
    if threshold.is_nan() || threshold < 0.0 {
        return Err(TransformError::InvalidArgument(format!(
            "trim threshold must be >= 0, got {threshold}"
        )));
    }
    let count = meta::frame_count(canvas);
    let frame_height = meta::frame_height(canvas);
    if u64::from(count) * u64::from(frame_height) != u64::from(canvas.height()) {
        return Err(TransformError::Region(format!(
            "{count} frames of height {frame_height} don't match canvas height {}",
            canvas.height()
        )));
    }

    let flat = apply_flatten(canvas, background);
    let scan = Scan {
        width: flat.width() as usize,
        bands: flat.bands() as usize,
        frame_height: frame_height as usize,
        fill: background.samples_for(flat.bands(), flat.sample_format()),
        threshold,
    };
    let found = match flat.pixels() {
        PixelBuffer::U8(data) => scan.run(data),
        PixelBuffer::U16(data) => scan.run(data),
    };

    let trim = found.map_or_else(TrimBox::default, |(x0, y0, x1, y1)| TrimBox {
        left: x0 as u32,
        top: y0 as u32,
        width: (x1 - x0 + 1) as u32,
        height: (y1 - y0 + 1) as u32,
    });
    tracing::debug!(?trim, frames = count, "found trim box");
    Ok(trim)
}

struct Scan {
    width: usize,
    bands: usize,
    frame_height: usize,
    fill: Vec<u16>,
    threshold: f64,
}

impl Scan {
    /// Inclusive `(x0, y0, x1, y1)` of the differing pixels, if any.
    fn run<T: Sample>(&self, data: &[T]) -> Option<(usize, usize, usize, usize)> {
        let mut bounds: Option<(usize, usize, usize, usize)> = None;
        for (row_index, row) in data.chunks_exact(self.width * self.bands).enumerate() {
            let y = row_index % self.frame_height;
            for (x, px) in row.chunks_exact(self.bands).enumerate() {
                if !self.differs(px) {
                    continue;
                }
                bounds = Some(match bounds {
                    None => (x, y, x, y),
                    Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
                });
            }
        }
        bounds
    }

    fn differs<T: Sample>(&self, px: &[T]) -> bool {
        px.iter()
            .zip(&self.fill)
            .any(|(v, &bg)| (f64::from(v.to_u16()) - f64::from(bg)).abs() > self.threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pages::apply_page_aware;

    /// A `width` x `height` RGB canvas of `base` with `(x, y, value)` pixels set.
    fn rgb_with(width: u32, height: u32, base: u8, marks: &[(u32, u32, u8)]) -> Canvas {
        let mut data = vec![base; (width * height * 3) as usize];
        for &(x, y, value) in marks {
            let i = ((y * width + x) * 3) as usize;
            data[i..i + 3].fill(value);
        }
        Canvas::from_u8(width, height, 3, data).unwrap()
    }

    #[test]
    fn test_trim_finds_block() {
        let marks: Vec<_> = (3..6)
            .flat_map(|x| (2..5).map(move |y| (x, y, 0)))
            .collect();
        let img = rgb_with(10, 8, 255, &marks);

        let trim = find_trim(&img, 10.0, Color::WHITE).unwrap();
        assert_eq!(
            trim,
            TrimBox {
                left: 3,
                top: 2,
                width: 3,
                height: 3
            }
        );
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let img = rgb_with(4, 4, 255, &[(1, 1, 245)]);

        assert!(find_trim(&img, 10.0, Color::WHITE).unwrap().is_empty());
        let trim = find_trim(&img, 9.0, Color::WHITE).unwrap();
        assert_eq!((trim.left, trim.top, trim.width, trim.height), (1, 1, 1, 1));
    }

    #[test]
    fn test_all_background_is_empty() {
        let img = rgb_with(5, 5, 0, &[]);
        let trim = find_trim(&img, 0.0, Color::BLACK).unwrap();
        assert!(trim.is_empty());
        assert_eq!(trim.to_crop(), None);
    }

    #[test]
    fn test_16bit_background_is_scaled() {
        let mut data = vec![65535u16; 6 * 4];
        data[(2 * 6) + 3] = 0;
        let img = Canvas::from_u16(6, 4, 1, data).unwrap();

        let trim = find_trim(&img, 100.0, Color::WHITE).unwrap();
        assert_eq!((trim.left, trim.top, trim.width, trim.height), (3, 2, 1, 1));
    }

    #[test]
    fn test_alpha_flattened_first() {
        let mut data = vec![0u8; 4 * 3 * 4];
        let i = (4 + 2) * 4;
        data[i..i + 4].copy_from_slice(&[10, 20, 30, 255]);
        let img = Canvas::from_u8(4, 3, 4, data).unwrap();

        let trim = find_trim(&img, 0.0, Color::WHITE).unwrap();
        assert_eq!((trim.left, trim.top, trim.width, trim.height), (2, 1, 1, 1));
    }

    #[test]
    fn test_union_over_frames() {
        let mut img = rgb_with(6, 8, 255, &[(1, 1, 0), (4, 6, 0)]);
        meta::set_frame_count(&mut img, 2);
        meta::set_frame_height(&mut img, 4);

        let trim = find_trim(&img, 0.0, Color::WHITE).unwrap();
        assert_eq!(
            trim,
            TrimBox {
                left: 1,
                top: 1,
                width: 4,
                height: 2
            }
        );

        let cropped = apply_page_aware(&img, &trim.to_crop().unwrap()).unwrap();
        assert_eq!((cropped.width(), cropped.height()), (4, 4));
        assert_eq!(meta::frame_height(&cropped), 2);
    }

    #[test]
    fn test_bad_arguments() {
        let mut img = rgb_with(4, 6, 255, &[]);
        assert!(matches!(
            find_trim(&img, -1.0, Color::WHITE),
            Err(TransformError::InvalidArgument(_))
        ));
        assert!(matches!(
            find_trim(&img, f64::NAN, Color::WHITE),
            Err(TransformError::InvalidArgument(_))
        ));

        meta::set_frame_height(&mut img, 4);
        assert!(matches!(
            find_trim(&img, 0.0, Color::WHITE),
            Err(TransformError::Region(_))
        ));
    }
}
