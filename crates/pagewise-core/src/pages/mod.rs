//! Page-aware operations on multi-frame canvases.
//!
//! A multi-frame canvas stores its pages stacked vertically, described by the
//! `n-pages` and `page-height` metadata entries. This module splits such a
//! canvas into frames, runs a single-frame transform on each, and joins the
//! results back into one canvas.

mod join;
mod pipeline;
mod sequence;
mod split;

pub use pipeline::{apply_page_aware, apply_single, Pipeline};
pub(crate) use sequence::Frame;
