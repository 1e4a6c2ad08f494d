//! Mirror a frame along one axis.

use super::{Direction, Sample};
use crate::canvas::Canvas;

/// Mirror a frame horizontally (left/right) or vertically (top/bottom).
pub fn apply_flip(canvas: &Canvas, direction: Direction) -> Canvas {
    let row_len = canvas.row_len();
    let bands = canvas.bands() as usize;
    let pixels = map_samples!(canvas.pixels(), |data| flip_samples(
        data, row_len, bands, direction
    ));
    canvas.derive(canvas.width(), canvas.height(), pixels)
}

fn flip_samples<T: Sample>(data: &[T], row_len: usize, bands: usize, direction: Direction) -> Vec<T> {
    let mut output = Vec::with_capacity(data.len());
    match direction {
        Direction::Horizontal => {
            for row in data.chunks_exact(row_len) {
                for pixel in row.chunks_exact(bands).rev() {
                    output.extend_from_slice(pixel);
                }
            }
        }
        Direction::Vertical => {
            for row in data.chunks_exact(row_len).rev() {
                output.extend_from_slice(row);
            }
        }
    }
    output
}
