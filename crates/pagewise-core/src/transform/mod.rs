//! Single-frame transforms: pad, crop, rotate, flip and flatten.
//!
//! Every function here takes one frame and returns a new one; none of them
//! know whether the frame is a whole image or one page of an animation. The
//! page-aware layer in [`crate::pages`] reuses them unchanged.
//!
//! # Coordinate System
//!
//! - Coordinates are integer pixels, origin at the top-left corner
//! - Rotation angles are clockwise quarter turns
//! - Pad offsets may be negative; crop regions must lie inside the frame

mod crop;
mod flatten;
mod flip;
mod pad;
mod rotation;
mod trim;
mod types;

pub(crate) use crate::canvas::Sample;
pub(crate) use crop::extract_region;

pub use crop::apply_crop;
pub use flatten::apply_flatten;
pub use flip::apply_flip;
pub use pad::apply_pad;
pub use rotation::apply_rotation;
pub use trim::{find_trim, TrimBox};
pub use types::{Angle, Color, Direction, ExtendPolicy, Transform, TransformError};

use crate::canvas::Canvas;

/// Apply one transform to one frame.
///
/// Frame metadata on the input is carried over untouched; callers that
/// treat the output as a standalone image use
/// [`apply_single`](crate::pages::apply_single) instead, which also resets it.
pub fn transform_frame(frame: &Canvas, transform: &Transform) -> Result<Canvas, TransformError> {
    match *transform {
        Transform::Pad {
            left,
            top,
            width,
            height,
            extend,
        } => apply_pad(frame, left, top, width, height, extend),
        Transform::Crop {
            left,
            top,
            width,
            height,
        } => apply_crop(frame, left, top, width, height),
        Transform::Rotate(angle) => Ok(apply_rotation(frame, angle)),
        Transform::Flip(direction) => Ok(apply_flip(frame, direction)),
        Transform::Flatten { background } => Ok(apply_flatten(frame, background)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::gradient;

    #[test]
    fn test_dispatch_matches_direct_calls() {
        let img = gradient(12, 9, 3);

        let pad = Transform::Pad {
            left: 2,
            top: 3,
            width: 20,
            height: 20,
            extend: ExtendPolicy::Copy,
        };
        assert_eq!(
            transform_frame(&img, &pad).unwrap(),
            apply_pad(&img, 2, 3, 20, 20, ExtendPolicy::Copy).unwrap()
        );

        let crop = Transform::Crop {
            left: 1,
            top: 1,
            width: 4,
            height: 4,
        };
        assert_eq!(
            transform_frame(&img, &crop).unwrap(),
            apply_crop(&img, 1, 1, 4, 4).unwrap()
        );

        assert_eq!(
            transform_frame(&img, &Transform::Rotate(Angle::D270)).unwrap(),
            apply_rotation(&img, Angle::D270)
        );
        assert_eq!(
            transform_frame(&img, &Transform::Flip(Direction::Vertical)).unwrap(),
            apply_flip(&img, Direction::Vertical)
        );

        let rgba = gradient(5, 4, 4);
        let flatten = Transform::Flatten {
            background: Color::WHITE,
        };
        assert_eq!(
            transform_frame(&rgba, &flatten).unwrap(),
            apply_flatten(&rgba, Color::WHITE)
        );
    }

    #[test]
    fn test_output_size_agrees_with_result() {
        let img = gradient(12, 9, 1);
        let transforms = [
            Transform::Pad {
                left: -2,
                top: 4,
                width: 7,
                height: 30,
                extend: ExtendPolicy::Mirror,
            },
            Transform::Crop {
                left: 0,
                top: 5,
                width: 12,
                height: 4,
            },
            Transform::Rotate(Angle::D90),
            Transform::Flip(Direction::Horizontal),
            Transform::Flatten {
                background: Color::BLACK,
            },
        ];

        for t in transforms {
            let out = transform_frame(&img, &t).unwrap();
            assert_eq!((out.width(), out.height()), t.output_size(12, 9), "{}", t.name());
        }
    }
}
