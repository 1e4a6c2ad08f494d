//! Frames and ordered frame sequences.

use crate::canvas::Canvas;
use crate::transform::{transform_frame, Transform, TransformError};

/// One page of a multi-frame canvas.
///
/// Frames only exist while a page-aware operation runs; they are never
/// handed back to callers.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Frame {
    canvas: Canvas,
}

impl Frame {
    pub(crate) fn new(canvas: Canvas) -> Self {
        Self { canvas }
    }

    pub(crate) fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    pub(crate) fn transform(&self, transform: &Transform) -> Result<Frame, TransformError> {
        transform_frame(&self.canvas, transform).map(Frame::new)
    }
}

/// Frames indexed by their logical position, top to bottom.
///
/// Slots can be filled in any order, so results arriving from a worker pool
/// land by index rather than by completion order.
#[derive(Debug, Default)]
pub(crate) struct FrameSequence {
    slots: Vec<Option<Frame>>,
}

impl FrameSequence {
    /// A sequence of `len` empty slots.
    pub(crate) fn with_len(len: usize) -> Self {
        Self {
            slots: (0..len).map(|_| None).collect(),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }

    /// Place a frame at `index`.
    ///
    /// Fails with `TransformError::Join` if the index is out of range or the
    /// slot is already taken.
    pub(crate) fn set(&mut self, index: usize, frame: Frame) -> Result<(), TransformError> {
        let len = self.slots.len();
        let slot = self.slots.get_mut(index).ok_or_else(|| {
            TransformError::Join(format!("frame index {index} out of range for {len} frames"))
        })?;
        if slot.is_some() {
            return Err(TransformError::Join(format!(
                "frame {index} was produced twice"
            )));
        }
        *slot = Some(frame);
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn get(&self, index: usize) -> Option<&Frame> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    /// Filled slots with their index, in index order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = (usize, &Frame)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|frame| (i, frame)))
    }

    /// Unwrap into frames in index order, failing on the first empty slot.
    pub(crate) fn into_frames(self) -> Result<Vec<Frame>, TransformError> {
        self.slots
            .into_iter()
            .enumerate()
            .map(|(i, slot)| slot.ok_or_else(|| TransformError::Join(format!("frame {i} is missing"))))
            .collect()
    }
}
