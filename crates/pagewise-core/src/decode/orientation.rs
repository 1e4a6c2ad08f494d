//! EXIF orientation lookup and correction.

use exif::{In, Reader, Tag};

use super::Orientation;
use crate::canvas::{meta, Canvas};
use crate::pages::Pipeline;
use crate::transform::TransformError;

/// Extract the orientation from a raw EXIF (TIFF structured) block.
///
/// Returns `Orientation::Normal` if the block can't be parsed or has no
/// orientation entry.
pub(crate) fn orientation_from_exif(raw: Vec<u8>) -> Orientation {
    match Reader::new().read_raw(raw) {
        Ok(exif) => exif
            .get_field(Tag::Orientation, In::PRIMARY)
            .and_then(|field| field.value.get_uint(0))
            .map(Orientation::from)
            .unwrap_or_default(),
        Err(e) => {
            tracing::debug!(error = %e, "ignoring unreadable EXIF block");
            Orientation::Normal
        }
    }
}

/// Extract the orientation from a complete JPEG, PNG, WebP or TIFF file.
pub fn read_orientation(bytes: &[u8]) -> Orientation {
    let mut cursor = std::io::Cursor::new(bytes);
    match Reader::new().read_from_container(&mut cursor) {
        Ok(exif) => exif
            .get_field(Tag::Orientation, In::PRIMARY)
            .and_then(|field| field.value.get_uint(0))
            .map(Orientation::from)
            .unwrap_or_default(),
        Err(_) => Orientation::Normal,
    }
}

/// Bring every frame upright and drop the orientation entry.
pub(crate) fn apply_orientation(
    canvas: &Canvas,
    orientation: Orientation,
    pipeline: &Pipeline,
) -> Result<Canvas, TransformError> {
    let mut out = canvas.clone();
    for transform in orientation.corrections() {
        out = pipeline.apply_page_aware(&out, &transform)?;
    }
    out.remove_meta(meta::ORIENTATION);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::PixelBuffer;
    use crate::test_support::{gradient, stacked};

    // Big-endian TIFF header and a single IFD entry: Orientation (SHORT) = 6
    const EXIF_ROTATE_90: &[u8] = &[
        0x4D, 0x4D, 0x00, 0x2A, 0x00, 0x00, 0x00, 0x08, 0x00, 0x01, 0x01, 0x12, 0x00, 0x03, 0x00,
        0x00, 0x00, 0x01, 0x00, 0x06, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    ];

    #[test]
    fn test_orientation_from_exif() {
        assert_eq!(
            orientation_from_exif(EXIF_ROTATE_90.to_vec()),
            Orientation::Rotate90CW
        );
    }

    #[test]
    fn test_orientation_from_garbage() {
        assert_eq!(orientation_from_exif(vec![1, 2, 3]), Orientation::Normal);
        assert_eq!(read_orientation(&[0xFF, 0xD8, 0x00]), Orientation::Normal);
    }

    #[test]
    fn test_apply_rotate_90() {
        let mut img = gradient(4, 2, 1);
        img.set_meta(meta::ORIENTATION, 6i64);

        let out = apply_orientation(&img, Orientation::Rotate90CW, &Pipeline::sequential()).unwrap();
        assert_eq!((out.width(), out.height()), (2, 4));
        assert_eq!(meta::orientation(&out), 0);
    }

    #[test]
    fn test_apply_flip_horizontal() {
        let img = Canvas::from_u8(3, 1, 1, vec![1, 2, 3]).unwrap();
        let out =
            apply_orientation(&img, Orientation::FlipHorizontal, &Pipeline::sequential()).unwrap();
        assert_eq!(out.pixels(), &PixelBuffer::U8(vec![3, 2, 1]));
    }

    #[test]
    fn test_apply_to_every_frame() {
        let img = stacked(3, 6, 4);
        let out = apply_orientation(&img, Orientation::Transpose, &Pipeline::sequential()).unwrap();

        assert_eq!(out.width(), 4);
        assert_eq!(meta::frame_count(&out), 3);
        assert_eq!(meta::frame_height(&out), 6);
    }
}
