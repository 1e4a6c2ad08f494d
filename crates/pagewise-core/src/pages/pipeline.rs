//! Page-aware transform pipeline.
//!
//! A multi-frame canvas is split into frames, the transform is applied to each
//! frame on its own, and the results are stacked back in frame order. Frames
//! can be transformed on a rayon pool; results are placed by index so the
//! output never depends on which worker finished first.

use std::sync::Arc;

use rayon::prelude::*;

use super::join::join;
use super::sequence::{Frame, FrameSequence};
use super::split::split;
use crate::canvas::{meta, Canvas};
use crate::transform::{transform_frame, Angle, Transform, TransformError};

/// Runs transforms across every frame of a canvas.
///
/// `Pipeline::sequential()` transforms frames on the calling thread;
/// `Pipeline::with_threads(n)` owns a rayon pool of `n` workers. Cloning
/// shares the pool.
#[derive(Clone, Default)]
pub struct Pipeline {
    pool: Option<Arc<rayon::ThreadPool>>,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("threads", &self.threads())
            .finish()
    }
}

impl Pipeline {
    pub fn sequential() -> Self {
        Self { pool: None }
    }

    /// Build a pipeline with its own pool of `threads` workers.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for zero threads, `Pool` if rayon can't start the
    /// workers.
    pub fn with_threads(threads: usize) -> Result<Self, TransformError> {
        if threads == 0 {
            return Err(TransformError::InvalidArgument(
                "worker thread count must be >= 1".to_string(),
            ));
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("pagewise-frame-{i}"))
            .build()
            .map_err(|e| TransformError::Pool(format!("failed to build rayon thread pool: {e}")))?;
        Ok(Self {
            pool: Some(Arc::new(pool)),
        })
    }

    /// Worker count, `None` when frames run on the caller's thread.
    pub fn threads(&self) -> Option<usize> {
        self.pool.as_ref().map(|p| p.current_num_threads())
    }

    /// Apply `transform` to every frame of `canvas`.
    ///
    /// Single-frame canvases go straight to the frame transformer. For
    /// multi-frame canvases the result keeps the frame count; after a 90 or
    /// 270 degree rotation the frame height becomes the original canvas
    /// width.
    ///
    /// # Errors
    ///
    /// `Region` for malformed frame metadata, otherwise the first error any
    /// frame produced. No partial result is returned.
    #[tracing::instrument(
        level = "debug",
        skip_all,
        fields(op = transform.name(), width = canvas.width(), height = canvas.height())
    )]
    pub fn apply_page_aware(
        &self,
        canvas: &Canvas,
        transform: &Transform,
    ) -> Result<Canvas, TransformError> {
        let count = meta::frame_count(canvas);
        if count <= 1 {
            return apply_single(canvas, transform);
        }

        tracing::debug!(frames = count, "transforming frames");
        let mut out = self.map_frames(canvas, |frame| frame.transform(transform))?;

        if let Transform::Rotate(Angle::D90 | Angle::D270) = transform {
            meta::set_frame_height(&mut out, canvas.width());
        }
        Ok(out)
    }

    /// Split, run `op` on every frame, and join in index order.
    pub(crate) fn map_frames<F>(&self, canvas: &Canvas, op: F) -> Result<Canvas, TransformError>
    where
        F: Fn(&Frame) -> Result<Frame, TransformError> + Send + Sync,
    {
        let frames = split(canvas)?;
        let mut out = FrameSequence::with_len(frames.len());

        let run = |index: usize, frame: &Frame| {
            op(frame).map(|done| (index, done)).map_err(|err| {
                tracing::debug!(frame = index, error = %err, "frame transform failed");
                err
            })
        };

        // Both paths stop at the first failing frame.
        let done: Vec<(usize, Frame)> = match &self.pool {
            None => frames
                .iter()
                .map(|(i, f)| run(i, f))
                .collect::<Result<_, _>>()?,
            Some(pool) => {
                let dispatch = tracing::dispatcher::get_default(|d| d.clone());
                let inputs: Vec<(usize, &Frame)> = frames.iter().collect();
                pool.install(|| {
                    inputs
                        .par_iter()
                        .map(|&(i, f)| tracing::dispatcher::with_default(&dispatch, || run(i, f)))
                        .collect::<Result<Vec<_>, _>>()
                })?
            }
        };

        for (index, frame) in done {
            out.set(index, frame)?;
        }

        join(out)
    }
}

/// Apply a transform with the sequential pipeline.
pub fn apply_page_aware(canvas: &Canvas, transform: &Transform) -> Result<Canvas, TransformError> {
    Pipeline::sequential().apply_page_aware(canvas, transform)
}

/// Apply a transform to a canvas treated as one frame.
///
/// Any frame layout on the input is ignored and the result is a plain
/// single-frame canvas.
pub fn apply_single(canvas: &Canvas, transform: &Transform) -> Result<Canvas, TransformError> {
    let mut out = transform_frame(canvas, transform)?;
    meta::clear_frames(&mut out);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::PixelBuffer;
    use crate::test_support::{gradient, stacked};
    use crate::transform::{Color, Direction, ExtendPolicy};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn pad(width: u32, height: u32) -> Transform {
        Transform::Pad {
            left: 5,
            top: 10,
            width,
            height,
            extend: ExtendPolicy::Background(Color::WHITE),
        }
    }

    #[test]
    fn test_pad_four_pages() {
        let img = stacked(4, 50, 40);
        let out = apply_page_aware(&img, &pad(300, 80)).unwrap();

        assert_eq!(out.width(), 300);
        assert_eq!(out.height(), 320);
        assert_eq!(meta::frame_count(&out), 4);
        assert_eq!(meta::frame_height(&out), 80);
    }

    #[test]
    fn test_first_failure_stops_remaining_frames() {
        let img = stacked(5, 4, 3);
        let calls = AtomicUsize::new(0);

        let result = Pipeline::sequential().map_frames(&img, |_frame| {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(TransformError::InvalidArgument("rejected".to_string()))
        });

        assert!(matches!(result, Err(TransformError::InvalidArgument(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_failure_midway_skips_later_frames() {
        let img = stacked(6, 4, 3);
        let calls = AtomicUsize::new(0);
        let flip = Transform::Flip(Direction::Horizontal);

        let result = Pipeline::sequential().map_frames(&img, |frame| {
            if calls.fetch_add(1, Ordering::SeqCst) == 2 {
                return Err(TransformError::InvalidArgument("frame 2".to_string()));
            }
            frame.transform(&flip)
        });

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_pool_failure_reported() {
        let img = stacked(8, 4, 3);
        let pipeline = Pipeline::with_threads(2).unwrap();
        let calls = AtomicUsize::new(0);

        let result = pipeline.map_frames(&img, |_frame| {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(TransformError::InvalidArgument("rejected".to_string()))
        });

        assert!(matches!(result, Err(TransformError::InvalidArgument(_))));
        assert!(calls.load(Ordering::SeqCst) >= 1);
    }

    #[test]
    fn test_pad_places_each_frame() {
        let img = stacked(3, 2, 2);
        let out = apply_page_aware(
            &img,
            &Transform::Pad {
                left: 1,
                top: 1,
                width: 4,
                height: 4,
                extend: ExtendPolicy::Black,
            },
        )
        .unwrap();

        let PixelBuffer::U8(data) = out.pixels() else {
            panic!("expected 8-bit samples");
        };
        let row_len = out.row_len();
        for page in 0..3usize {
            // pixel (1, 1) of each frame holds the frame index
            let offset = (page * 4 + 1) * row_len + 3;
            assert_eq!(data[offset], page as u8, "page {page}");
            // corner is padding
            assert_eq!(data[page * 4 * row_len], 0);
        }
    }

    #[test]
    fn test_rotate_four_pages() {
        let img = stacked(4, 50, 40);
        let out = apply_page_aware(&img, &Transform::Rotate(Angle::D90)).unwrap();

        assert_eq!(out.width(), 40);
        assert_eq!(out.height(), 200);
        assert_eq!(meta::frame_count(&out), 4);
        assert_eq!(meta::frame_height(&out), 50);
    }

    #[test]
    fn test_rotate_180_keeps_frame_height() {
        let img = stacked(3, 6, 4);
        let out = apply_page_aware(&img, &Transform::Rotate(Angle::D180)).unwrap();

        assert_eq!((out.width(), out.height()), (6, 12));
        assert_eq!(meta::frame_height(&out), 4);
    }

    #[test]
    fn test_flip_vertical_mirrors_frames_not_stack() {
        let img = stacked(3, 2, 2);
        let out = apply_page_aware(&img, &Transform::Flip(Direction::Vertical)).unwrap();

        // every frame is a solid fill, so a per-frame flip leaves the stack as is
        assert_eq!(out.pixels(), img.pixels());
    }

    #[test]
    fn test_flatten_drops_alpha_per_frame() {
        let mut img = gradient(3, 4, 4);
        meta::set_frame_count(&mut img, 2);
        meta::set_frame_height(&mut img, 2);
        let flatten = Transform::Flatten {
            background: Color::WHITE,
        };
        let out = apply_page_aware(&img, &flatten).unwrap();

        assert_eq!(out.bands(), 3);
        assert_eq!((out.width(), out.height()), (3, 4));
        assert_eq!(meta::frame_count(&out), 2);
        assert_eq!(meta::frame_height(&out), 2);
        assert_eq!(out.pixels(), crate::transform::apply_flatten(&img, Color::WHITE).pixels());
    }

    #[test]
    fn test_crop_four_pages() {
        let img = stacked(4, 10, 8);
        let crop = Transform::Crop {
            left: 2,
            top: 2,
            width: 5,
            height: 3,
        };
        let out = apply_page_aware(&img, &crop).unwrap();

        assert_eq!((out.width(), out.height()), (5, 12));
        assert_eq!(meta::frame_count(&out), 4);
        assert_eq!(meta::frame_height(&out), 3);
    }

    #[test]
    fn test_single_frame_delegates() {
        let img = gradient(10, 8, 3);
        let t = Transform::Rotate(Angle::D270);

        assert_eq!(
            apply_page_aware(&img, &t).unwrap(),
            transform_frame(&img, &t).unwrap()
        );
    }

    #[test]
    fn test_identity_transforms() {
        let img = stacked(2, 6, 5);

        let rotated = apply_page_aware(&img, &Transform::Rotate(Angle::D0)).unwrap();
        assert_eq!(rotated, img);

        let cropped = apply_page_aware(
            &img,
            &Transform::Crop {
                left: 0,
                top: 0,
                width: 6,
                height: 5,
            },
        )
        .unwrap();
        assert_eq!(cropped, img);
    }

    #[test]
    fn test_bad_metadata_is_region_error() {
        let mut img = gradient(4, 10, 1);
        img.set_meta(meta::N_PAGES, 3i64);
        meta::set_frame_height(&mut img, 4);

        let err = apply_page_aware(&img, &Transform::Rotate(Angle::D90)).unwrap_err();
        assert!(matches!(err, TransformError::Region(_)));
    }

    #[test]
    fn test_crop_outside_frame_fails() {
        // inside the stacked canvas, outside any single frame
        let img = stacked(4, 10, 8);
        let crop = Transform::Crop {
            left: 0,
            top: 6,
            width: 10,
            height: 4,
        };
        let err = apply_page_aware(&img, &crop).unwrap_err();
        assert!(matches!(err, TransformError::Bounds { .. }));
    }

    #[test]
    fn test_partial_failure_leaves_input_untouched() {
        let img = stacked(3, 4, 4);
        let before = img.clone();

        let pipeline = Pipeline::sequential();
        let err = pipeline
            .map_frames(&img, |frame| {
                if frame.canvas().pixels() == &PixelBuffer::U8(vec![1; 4 * 4 * 3]) {
                    Err(TransformError::InvalidArgument("frame 2 of 3".to_string()))
                } else {
                    frame.transform(&Transform::Rotate(Angle::D90))
                }
            })
            .unwrap_err();

        assert_eq!(err, TransformError::InvalidArgument("frame 2 of 3".to_string()));
        assert_eq!(img, before);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let img = stacked(8, 17, 9);
        let parallel = Pipeline::with_threads(4).unwrap();
        let sequential = Pipeline::sequential();

        for t in [
            pad(30, 20),
            Transform::Rotate(Angle::D90),
            Transform::Flip(Direction::Horizontal),
        ] {
            assert_eq!(
                parallel.apply_page_aware(&img, &t).unwrap(),
                sequential.apply_page_aware(&img, &t).unwrap(),
                "{}",
                t.name()
            );
        }
        assert_eq!(parallel.threads(), Some(4));
    }

    #[test]
    fn test_zero_threads_rejected() {
        assert!(matches!(
            Pipeline::with_threads(0),
            Err(TransformError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_apply_single_clears_layout() {
        let img = stacked(2, 4, 3);
        let out = apply_single(&img, &Transform::Rotate(Angle::D90)).unwrap();

        assert_eq!((out.width(), out.height()), (6, 4));
        assert_eq!(meta::frame_count(&out), 1);
        assert_eq!(meta::frame_height(&out), 4);
    }

    #[test]
    fn test_delays_carried_through() {
        let mut img = stacked(3, 4, 4);
        meta::set_frame_delays(&mut img, &[10, 20, 30]);
        let out = apply_page_aware(&img, &Transform::Rotate(Angle::D270)).unwrap();

        assert_eq!(meta::frame_delays(&out), Some(vec![10, 20, 30]));
    }
}

// ===== Property-Based Tests =====
