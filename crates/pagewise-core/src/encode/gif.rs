//! Animated GIF encoding, one GIF frame per canvas frame.

use std::io::Write;

use image::codecs::gif::{GifEncoder, Repeat};
use image::{Delay, DynamicImage, Frame};

use super::EncodeError;
use crate::canvas::{dynamic_from_canvas, meta, to_u8, Canvas};
use crate::transform::apply_crop;

/// Delay used when the canvas carries none.
const DEFAULT_DELAY_MS: u32 = 100;

pub(crate) fn encode_gif<W: Write>(
    canvas: &Canvas,
    writer: W,
    repeat: Option<u16>,
) -> Result<(), EncodeError> {
    let count = meta::frame_count(canvas);
    let height = meta::frame_height(canvas);
    if u64::from(count) * u64::from(height) != u64::from(canvas.height()) {
        return Err(EncodeError::InvalidCanvas(format!(
            "{count} frames of height {height} don't match canvas height {}",
            canvas.height()
        )));
    }

    let delays = meta::frame_delays(canvas).unwrap_or_default();
    let repeat = repeat.or_else(|| {
        meta::loop_count(canvas).map(|n| n.min(u32::from(u16::MAX)) as u16)
    });
    let repeat = match repeat {
        None | Some(0) => Repeat::Infinite,
        Some(n) => Repeat::Finite(n),
    };

    let canvas = to_u8(canvas);
    let mut encoder = GifEncoder::new(writer);
    encoder.set_repeat(repeat)?;

    for index in 0..count {
        let frame = apply_crop(&canvas, 0, index * height, canvas.width(), height)
            .map_err(|e| EncodeError::InvalidCanvas(e.to_string()))?;
        let rgba = match dynamic_from_canvas(&frame)? {
            DynamicImage::ImageRgba8(buf) => buf,
            other => other.to_rgba8(),
        };
        let delay = delays.get(index as usize).copied().unwrap_or(DEFAULT_DELAY_MS);
        encoder.encode_frame(Frame::from_parts(
            rgba,
            0,
            0,
            Delay::from_numer_denom_ms(delay, 1),
        ))?;
    }
    tracing::debug!(frames = count, "encoded gif");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::{decode_bytes, DecodeOptions, PageCount};
    use crate::test_support::stacked;

    #[test]
    fn test_gif_keeps_frames_and_delays() {
        let mut img = stacked(3, 8, 6);
        meta::set_frame_delays(&mut img, &[40, 80, 120]);

        let mut out = Vec::new();
        encode_gif(&img, &mut out, None).unwrap();
        assert_eq!(&out[0..6], b"GIF89a");

        let options = DecodeOptions::default().with_pages(0, PageCount::All);
        let decoded = decode_bytes(&out, &options).unwrap();
        assert_eq!(meta::frame_count(&decoded), 3);
        assert_eq!(meta::frame_height(&decoded), 6);
        assert_eq!(meta::frame_delays(&decoded), Some(vec![40, 80, 120]));
    }

    #[test]
    fn test_gif_single_frame() {
        let img = stacked(1, 5, 5);
        let mut out = Vec::new();
        encode_gif(&img, &mut out, Some(2)).unwrap();
        assert_eq!(&out[0..6], b"GIF89a");
    }

    #[test]
    fn test_gif_rejects_bad_layout() {
        let mut img = stacked(1, 4, 10);
        meta::set_frame_height(&mut img, 3);

        let mut out = Vec::new();
        assert!(matches!(
            encode_gif(&img, &mut out, None),
            Err(EncodeError::InvalidCanvas(_))
        ));
    }
}
