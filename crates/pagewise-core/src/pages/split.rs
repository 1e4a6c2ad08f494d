//! Split a stacked canvas into frames.

use super::sequence::{Frame, FrameSequence};
use crate::canvas::{meta, Canvas};
use crate::transform::{extract_region, TransformError};

/// Cut the canvas into `frame_count` horizontal strips of `frame_height` rows.
///
/// Each frame inherits the canvas metadata minus the frame layout entries.
///
/// # Errors
///
/// `TransformError::Region` when the frame layout doesn't exactly cover the
/// canvas height.
pub(crate) fn split(canvas: &Canvas) -> Result<FrameSequence, TransformError> {
    let count = meta::frame_count(canvas);
    let height = meta::frame_height(canvas);

    if u64::from(count) * u64::from(height) != u64::from(canvas.height()) {
        return Err(TransformError::Region(format!(
            "{count} frames of height {height} don't match canvas height {}",
            canvas.height()
        )));
    }

    let width = canvas.width();
    let row_len = canvas.row_len();
    let bands = canvas.bands() as usize;
    let mut sequence = FrameSequence::with_len(count as usize);

    for index in 0..count {
        let top = index * height;
        if top + height > canvas.height() {
            return Err(TransformError::Region(format!(
                "frame {index} at row {top} extends past canvas height {}",
                canvas.height()
            )));
        }

        let pixels = map_samples!(canvas.pixels(), |data| extract_region(
            data,
            row_len,
            bands,
            (0, top as usize),
            (width as usize, height as usize),
        ));
        let mut frame = canvas.derive(width, height, pixels);
        meta::clear_frames(&mut frame);
        sequence.set(index as usize, Frame::new(frame))?;
    }

    Ok(sequence)
}
