//! Reassemble frames into one stacked canvas.

use super::sequence::FrameSequence;
use crate::canvas::{meta, Canvas, PixelBuffer};
use crate::transform::TransformError;

/// Stack frames top to bottom in index order.
///
/// The result inherits metadata from frame 0 and records the new layout:
/// `frame_count = N`, `frame_height = ` the common frame height.
///
/// # Errors
///
/// `TransformError::Join` if the sequence is empty, has an unfilled slot, or
/// its frames differ in width, height, band count, sample format or
/// interpretation.
pub(crate) fn join(sequence: FrameSequence) -> Result<Canvas, TransformError> {
    let frames = sequence.into_frames()?;
    let first = frames
        .first()
        .ok_or_else(|| TransformError::Join("frame sequence is empty".to_string()))?
        .canvas();

    let (width, height, bands) = (first.width(), first.height(), first.bands());
    let format = first.sample_format();
    let interpretation = first.interpretation();

    for (index, frame) in frames.iter().enumerate().skip(1) {
        let c = frame.canvas();
        if c.width() != width || c.height() != height {
            return Err(TransformError::Join(format!(
                "frame {index} is {}x{}, expected {width}x{height}",
                c.width(),
                c.height()
            )));
        }
        if c.bands() != bands || c.sample_format() != format || c.interpretation() != interpretation {
            return Err(TransformError::Join(format!(
                "frame {index} has {} bands of {:?} ({:?}), expected {bands} bands of {format:?} ({interpretation:?})",
                c.bands(),
                c.sample_format(),
                c.interpretation()
            )));
        }
    }

    let count = u32::try_from(frames.len())
        .map_err(|_| TransformError::Join(format!("too many frames: {}", frames.len())))?;
    let total_height = height
        .checked_mul(count)
        .ok_or_else(|| TransformError::Join(format!("{count} frames of height {height} overflow")))?;

    let mut pixels = PixelBuffer::with_capacity(format, first.pixels().len() * frames.len());
    for (index, frame) in frames.iter().enumerate() {
        if !pixels.append(frame.canvas().pixels()) {
            return Err(TransformError::Join(format!(
                "frame {index} has {:?} samples, expected {format:?}",
                frame.canvas().sample_format()
            )));
        }
    }

    let mut canvas = first.derive(width, total_height, pixels);
    meta::set_frame_count(&mut canvas, count);
    meta::set_frame_height(&mut canvas, height);
    Ok(canvas)
}
