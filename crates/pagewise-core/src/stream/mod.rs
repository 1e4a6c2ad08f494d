//! Streaming source and target adapters.
//!
//! The codec layer never talks to a caller's byte stream directly. A decode
//! borrows a [`SourceCapability`] through a [`SourceAdapter`], an encode
//! borrows a [`TargetCapability`] through a [`TargetAdapter`]. Adapters
//! implement the std I/O traits so codecs can consume them, forward every
//! call to the capability, and remember the first error so it can be
//! reported as a [`StreamError`] after the codec gives up.

mod source;
mod target;

use std::io;

use thiserror::Error;

pub use source::{
    FileSource, MemorySource, ReaderSource, SeekableSource, SourceAdapter, SourceCapability,
};
pub use target::{FileTarget, MemoryTarget, TargetAdapter, TargetCapability, WriterTarget};

/// Errors raised by stream capabilities and adapters.
#[derive(Debug, Error)]
pub enum StreamError {
    /// The underlying reader or writer failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The source can only be read forward.
    #[error("Source does not support seeking")]
    UnsupportedSeek,

    /// The sink accepted fewer bytes than it was given.
    #[error("Short write: {written} of {requested} bytes accepted")]
    ShortWrite { requested: usize, written: usize },

    /// The target was already finished.
    #[error("Target already finished")]
    Finished,
}

impl StreamError {
    /// Convert into an `io::Error` for codecs that only speak std I/O.
    pub(crate) fn to_io(&self) -> io::Error {
        match self {
            StreamError::Io(e) => io::Error::new(e.kind(), e.to_string()),
            StreamError::UnsupportedSeek => {
                io::Error::new(io::ErrorKind::Unsupported, self.to_string())
            }
            StreamError::ShortWrite { .. } => {
                io::Error::new(io::ErrorKind::WriteZero, self.to_string())
            }
            StreamError::Finished => io::Error::new(io::ErrorKind::BrokenPipe, self.to_string()),
        }
    }
}

/// Reference point for [`SourceCapability::seek`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Whence {
    /// Offset from the start of the stream.
    Start,
    /// Offset from the current position.
    Current,
    /// Offset from the end of the stream.
    End,
}

impl Whence {
    /// The equivalent `SeekFrom`.
    ///
    /// # Errors
    ///
    /// `StreamError::Io` with `InvalidInput` for a negative offset from the
    /// start.
    pub fn to_seek_from(self, offset: i64) -> Result<io::SeekFrom, StreamError> {
        match self {
            Whence::Start => u64::try_from(offset).map(io::SeekFrom::Start).map_err(|_| {
                StreamError::Io(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("negative seek offset {offset} from start"),
                ))
            }),
            Whence::Current => Ok(io::SeekFrom::Current(offset)),
            Whence::End => Ok(io::SeekFrom::End(offset)),
        }
    }

    /// Split a `SeekFrom` into offset and whence.
    pub(crate) fn split(pos: io::SeekFrom) -> Result<(i64, Whence), StreamError> {
        match pos {
            io::SeekFrom::Start(offset) => i64::try_from(offset)
                .map(|o| (o, Whence::Start))
                .map_err(|_| {
                    StreamError::Io(io::Error::new(
                        io::ErrorKind::InvalidInput,
                        format!("seek offset {offset} out of range"),
                    ))
                }),
            io::SeekFrom::Current(offset) => Ok((offset, Whence::Current)),
            io::SeekFrom::End(offset) => Ok((offset, Whence::End)),
        }
    }
}
