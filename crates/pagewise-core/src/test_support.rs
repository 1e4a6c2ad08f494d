//! Shared builders for unit tests.

use std::io::Cursor;

use image::codecs::gif::{GifEncoder, Repeat};
use image::{Delay, Frame, RgbaImage};

use crate::canvas::{dynamic_from_canvas, meta, Canvas};
use crate::stream::{SourceCapability, StreamError};

/// An 8-bit canvas where every band of pixel `(x, y)` holds
/// `(y * width + x) % 256`.
pub(crate) fn gradient(width: u32, height: u32, bands: u32) -> Canvas {
    let mut samples = Vec::with_capacity((width * height * bands) as usize);
    for y in 0..height {
        for x in 0..width {
            let value = ((y * width + x) % 256) as u8;
            samples.extend(std::iter::repeat(value).take(bands as usize));
        }
    }
    Canvas::from_u8(width, height, bands, samples).unwrap()
}

/// A 3-band multi-frame canvas of `pages` frames, each `width` x `height`,
/// with frame `i` filled with the value `i`.
pub(crate) fn stacked(pages: u32, width: u32, height: u32) -> Canvas {
    let frame_len = (width * height * 3) as usize;
    let samples = (0..pages)
        .flat_map(|i| std::iter::repeat(i as u8).take(frame_len))
        .collect();
    let mut canvas = Canvas::from_u8(width, height * pages, 3, samples).unwrap();
    if pages > 1 {
        meta::set_frame_count(&mut canvas, pages);
        meta::set_frame_height(&mut canvas, height);
    }
    canvas
}

/// PNG bytes for a canvas, written with the `image` crate directly.
pub(crate) fn encode_png(canvas: &Canvas) -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    dynamic_from_canvas(canvas)
        .unwrap()
        .write_to(&mut out, image::ImageFormat::Png)
        .unwrap();
    out.into_inner()
}

/// An animated GIF of `pages` solid frames; frame `i` is red `60 * i`,
/// shown for 100 ms.
pub(crate) fn animated_gif(pages: u32, width: u32, height: u32) -> Vec<u8> {
    let mut out = Vec::new();
    {
        let mut encoder = GifEncoder::new(&mut out);
        encoder.set_repeat(Repeat::Infinite).unwrap();
        let frames = (0..pages).map(|i| {
            let buffer = RgbaImage::from_pixel(
                width,
                height,
                image::Rgba([(60 * i).min(255) as u8, 0, 0, 255]),
            );
            Frame::from_parts(buffer, 0, 0, Delay::from_numer_denom_ms(100, 1))
        });
        encoder.encode_frames(frames).unwrap();
    }
    out
}

/// A forward-only source that answers each read with at most the next
/// scheduled chunk size. The unread part of a chunk stays at the front of
/// the schedule; a scheduled 0, or an empty schedule, reads as end of stream.
pub(crate) struct ChunkedSource {
    data: Vec<u8>,
    chunks: Vec<usize>,
    pos: usize,
}

impl ChunkedSource {
    pub(crate) fn new(data: Vec<u8>, chunks: Vec<usize>) -> Self {
        Self {
            data,
            chunks,
            pos: 0,
        }
    }

    /// Chunks of `size` bytes until the data runs out.
    pub(crate) fn uniform(data: Vec<u8>, size: usize) -> Self {
        let chunks = vec![size; data.len().div_ceil(size)];
        Self::new(data, chunks)
    }
}

impl SourceCapability for ChunkedSource {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, StreamError> {
        let Some(&chunk) = self.chunks.first() else {
            return Ok(0);
        };
        let n = chunk.min(buf.len()).min(self.data.len() - self.pos);
        buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
        self.pos += n;
        if n == chunk {
            self.chunks.remove(0);
        } else {
            self.chunks[0] = chunk - n;
        }
        Ok(n)
    }
}
