//! Canvas model and frame metadata.
//!
//! A [`Canvas`] is an immutable raster buffer. Animated and paginated images
//! keep all frames in one canvas, stacked top to bottom, with the frame layout
//! recorded in the metadata map (see [`meta`]).

mod convert;
pub mod meta;
mod types;

pub use meta::{frame_count, frame_height, set_frame_height};
pub(crate) use convert::{canvas_from_dynamic, dynamic_from_canvas, pixels_from_dynamic, to_u8};
pub(crate) use types::Sample;
pub use types::{
    Canvas, CanvasError, CanvasSummary, Interpretation, MetaValue, PixelBuffer, SampleFormat,
};
