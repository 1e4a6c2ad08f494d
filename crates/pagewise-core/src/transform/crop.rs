//! Rectangular crop of a single frame.
//!
//! Coordinates are in pixels with the origin at the top-left corner. Unlike a
//! clamping crop, a region that reaches past the frame is an error: silently
//! shrinking one frame would leave an animation with frames of mixed sizes.

use super::{Sample, TransformError};
use crate::canvas::Canvas;

/// Extract the `width` x `height` region at `(left, top)`.
///
/// # Errors
///
/// Returns `TransformError::Bounds` if the region is empty or extends past
/// the right or bottom edge of the frame.
pub fn apply_crop(
    canvas: &Canvas,
    left: u32,
    top: u32,
    width: u32,
    height: u32,
) -> Result<Canvas, TransformError> {
    let fits = width > 0
        && height > 0
        && u64::from(left) + u64::from(width) <= u64::from(canvas.width())
        && u64::from(top) + u64::from(height) <= u64::from(canvas.height());
    if !fits {
        return Err(TransformError::Bounds {
            left,
            top,
            width,
            height,
            source_width: canvas.width(),
            source_height: canvas.height(),
        });
    }

    // Fast path: full crop returns a clone
    if left == 0 && top == 0 && width == canvas.width() && height == canvas.height() {
        return Ok(canvas.clone());
    }

    let row_len = canvas.row_len();
    let bands = canvas.bands() as usize;
    let pixels = map_samples!(canvas.pixels(), |data| extract_region(
        data,
        row_len,
        bands,
        (left as usize, top as usize),
        (width as usize, height as usize),
    ));

    Ok(canvas.derive(width, height, pixels))
}

/// Copy a region out of an interleaved sample buffer, row by row.
///
/// The caller guarantees the region lies inside the buffer.
pub(crate) fn extract_region<T: Sample>(
    data: &[T],
    row_len: usize,
    bands: usize,
    (left, top): (usize, usize),
    (width, height): (usize, usize),
) -> Vec<T> {
    let span = width * bands;
    let mut output = Vec::with_capacity(span * height);
    for y in top..top + height {
        let start = y * row_len + left * bands;
        output.extend_from_slice(&data[start..start + span]);
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::PixelBuffer;
    use crate::test_support::gradient;

    #[test]
    fn test_full_crop() {
        let img = gradient(20, 10, 3);
        let result = apply_crop(&img, 0, 0, 20, 10).unwrap();

        assert_eq!(result, img);
    }

    #[test]
    fn test_center_crop() {
        let img = gradient(10, 10, 1);
        let result = apply_crop(&img, 2, 2, 6, 6).unwrap();

        assert_eq!(result.width(), 6);
        assert_eq!(result.height(), 6);

        // First pixel comes from (2, 2): (2 * 10 + 2) % 256 = 22
        let PixelBuffer::U8(data) = result.pixels() else {
            panic!("expected 8-bit samples");
        };
        assert_eq!(data[0], 22);
        // Last pixel comes from (7, 7)
        assert_eq!(data[35], 77);
    }

    #[test]
    fn test_crop_keeps_bands() {
        let img = gradient(8, 8, 4);
        let result = apply_crop(&img, 1, 1, 3, 2).unwrap();

        assert_eq!(result.bands(), 4);
        assert_eq!(result.pixels().len(), 3 * 2 * 4);
    }

    #[test]
    fn test_crop_16bit() {
        let img = Canvas::from_u16(2, 2, 1, vec![1, 2, 3, 4]).unwrap();
        let result = apply_crop(&img, 1, 0, 1, 2).unwrap();

        assert_eq!(result.pixels(), &PixelBuffer::U16(vec![2, 4]));
    }

    #[test]
    fn test_crop_out_of_bounds() {
        let img = gradient(10, 10, 3);

        let err = apply_crop(&img, 8, 8, 5, 5).unwrap_err();
        assert_eq!(
            err,
            TransformError::Bounds {
                left: 8,
                top: 8,
                width: 5,
                height: 5,
                source_width: 10,
                source_height: 10,
            }
        );
    }

    #[test]
    fn test_crop_empty_region() {
        let img = gradient(10, 10, 3);
        assert!(apply_crop(&img, 0, 0, 0, 4).is_err());
        assert!(apply_crop(&img, 0, 0, 4, 0).is_err());
    }

    #[test]
    fn test_crop_overflowing_offset() {
        let img = gradient(10, 10, 3);
        assert!(apply_crop(&img, u32::MAX, 0, 2, 2).is_err());
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod proptests {
    use super::*;
    use crate::test_support::gradient;
    use proptest::prelude::*;

    /// Strategy for an image size and a crop region that fits inside it.
    fn region_strategy() -> impl Strategy<Value = ((u32, u32), (u32, u32, u32, u32))> {
        (1u32..=40, 1u32..=40).prop_flat_map(|(w, h)| {
            (0..w, 0..h).prop_flat_map(move |(left, top)| {
                (1..=w - left, 1..=h - top)
                    .prop_map(move |(cw, ch)| ((w, h), (left, top, cw, ch)))
            })
        })
    }

    proptest! {
        /// Property: Output has exactly the requested size.
        #[test]
        fn prop_output_matches_region(((w, h), (left, top, cw, ch)) in region_strategy()) {
            let img = gradient(w, h, 3);
            let result = apply_crop(&img, left, top, cw, ch).unwrap();

            prop_assert_eq!(result.width(), cw);
            prop_assert_eq!(result.height(), ch);
            prop_assert_eq!(result.pixels().len(), (cw * ch * 3) as usize);
        }

        /// Property: Cropping twice equals one crop at the summed offset.
        #[test]
        fn prop_crops_compose(((w, h), (left, top, cw, ch)) in region_strategy()) {
            let img = gradient(w, h, 1);
            let once = apply_crop(&img, left, top, cw, ch).unwrap();
            let inner = apply_crop(&once, 0, 0, cw, ch).unwrap();

            prop_assert_eq!(once, inner);
        }

        /// Property: Regions past the edge are always rejected.
        #[test]
        fn prop_oversized_rejected(w in 1u32..=40, h in 1u32..=40, extra in 1u32..=10) {
            let img = gradient(w, h, 3);
            prop_assert!(apply_crop(&img, 0, 0, w + extra, h).is_err());
            prop_assert!(apply_crop(&img, 0, 0, w, h + extra).is_err());
        }
    }
}
