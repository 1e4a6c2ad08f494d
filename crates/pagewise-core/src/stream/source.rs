//! Byte sources for decoding.

use std::borrow::Cow;
use std::fs::File;
use std::io::{self, Cursor, Read, Seek};
use std::path::Path;

use super::{StreamError, Whence};

/// A caller-supplied byte stream a decode reads from.
///
/// `read` returns the number of bytes placed at the start of `buf`; `0`
/// means end of stream. Sources that can't reposition keep the default
/// `seek`, which reports [`StreamError::UnsupportedSeek`]; the decoder then
/// reads the stream forward once into memory.
pub trait SourceCapability {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, StreamError>;

    fn seek(&mut self, offset: i64, whence: Whence) -> Result<u64, StreamError> {
        let _ = (offset, whence);
        Err(StreamError::UnsupportedSeek)
    }
}

impl<S: SourceCapability + ?Sized> SourceCapability for &mut S {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, StreamError> {
        (**self).read(buf)
    }

    fn seek(&mut self, offset: i64, whence: Whence) -> Result<u64, StreamError> {
        (**self).seek(offset, whence)
    }
}

fn read_retrying<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<usize, StreamError> {
    loop {
        match reader.read(buf) {
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            other => return other.map_err(StreamError::Io),
        }
    }
}

fn seek_std<S: Seek>(seeker: &mut S, offset: i64, whence: Whence) -> Result<u64, StreamError> {
    let pos = whence.to_seek_from(offset)?;
    Ok(seeker.seek(pos)?)
}

/// In-memory bytes, borrowed or owned.
#[derive(Debug, Clone)]
pub struct MemorySource<'a> {
    cursor: Cursor<Cow<'a, [u8]>>,
}

impl<'a> MemorySource<'a> {
    pub fn new(data: impl Into<Cow<'a, [u8]>>) -> Self {
        Self {
            cursor: Cursor::new(data.into()),
        }
    }
}

impl SourceCapability for MemorySource<'_> {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, StreamError> {
        read_retrying(&mut self.cursor, buf)
    }

    fn seek(&mut self, offset: i64, whence: Whence) -> Result<u64, StreamError> {
        seek_std(&mut self.cursor, offset, whence)
    }
}

/// A file on disk.
#[derive(Debug)]
pub struct FileSource {
    file: File,
}

impl FileSource {
    /// # Errors
    ///
    /// `StreamError::Io` if the file can't be opened.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StreamError> {
        Ok(Self {
            file: File::open(path)?,
        })
    }
}

impl From<File> for FileSource {
    fn from(file: File) -> Self {
        Self { file }
    }
}

impl SourceCapability for FileSource {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, StreamError> {
        read_retrying(&mut self.file, buf)
    }

    fn seek(&mut self, offset: i64, whence: Whence) -> Result<u64, StreamError> {
        seek_std(&mut self.file, offset, whence)
    }
}

/// A forward-only reader such as a socket or pipe.
#[derive(Debug)]
pub struct ReaderSource<R> {
    reader: R,
}

impl<R: Read> ReaderSource<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<R: Read> SourceCapability for ReaderSource<R> {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, StreamError> {
        read_retrying(&mut self.reader, buf)
    }
}

/// Any reader that can also seek.
#[derive(Debug)]
pub struct SeekableSource<R> {
    reader: R,
}

impl<R: Read + Seek> SeekableSource<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<R: Read + Seek> SourceCapability for SeekableSource<R> {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, StreamError> {
        read_retrying(&mut self.reader, buf)
    }

    fn seek(&mut self, offset: i64, whence: Whence) -> Result<u64, StreamError> {
        seek_std(&mut self.reader, offset, whence)
    }
}

/// Exposes a [`SourceCapability`] as `Read + Seek` for the duration of one
/// decode.
///
/// Calls are forwarded one to one without buffering. The first error the
/// capability reports is kept; every later call fails with it, and the
/// decoder retrieves it with [`SourceAdapter::take_error`].
pub struct SourceAdapter<'a> {
    capability: &'a mut dyn SourceCapability,
    error: Option<StreamError>,
    bytes_read: u64,
}

impl<'a> SourceAdapter<'a> {
    pub fn new(capability: &'a mut dyn SourceCapability) -> Self {
        tracing::trace!("source adapter opened");
        Self {
            capability,
            error: None,
            bytes_read: 0,
        }
    }

    /// Check whether the capability can seek, without moving it.
    ///
    /// Only [`StreamError::UnsupportedSeek`] marks the source forward-only;
    /// any other failure is kept as the terminal error.
    pub fn probe_seek(&mut self) -> bool {
        match self.capability.seek(0, Whence::Current) {
            Ok(_) => true,
            Err(StreamError::UnsupportedSeek) => false,
            Err(e) => {
                tracing::debug!(error = %e, "seek probe failed");
                self.error = Some(e);
                false
            }
        }
    }

    /// Total bytes handed out so far.
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    /// The error that ended the stream, if any.
    pub fn take_error(&mut self) -> Option<StreamError> {
        self.error.take()
    }

    fn fail(&mut self, err: StreamError) -> io::Error {
        let io_err = err.to_io();
        self.error = Some(err);
        io_err
    }
}

impl Read for SourceAdapter<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if let Some(err) = &self.error {
            return Err(err.to_io());
        }
        match self.capability.read(buf) {
            Ok(n) if n > buf.len() => Err(self.fail(StreamError::Io(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("source reported {n} bytes for a {} byte buffer", buf.len()),
            )))),
            Ok(n) => {
                self.bytes_read += n as u64;
                Ok(n)
            }
            Err(e) => Err(self.fail(e)),
        }
    }
}

impl Seek for SourceAdapter<'_> {
    fn seek(&mut self, pos: io::SeekFrom) -> io::Result<u64> {
        if let Some(err) = &self.error {
            return Err(err.to_io());
        }
        let (offset, whence) = Whence::split(pos).map_err(|e| e.to_io())?;
        self.capability
            .seek(offset, whence)
            .map_err(|e| self.fail(e))
    }
}

impl Drop for SourceAdapter<'_> {
    fn drop(&mut self) {
        tracing::trace!(bytes = self.bytes_read, "source adapter closed");
    }
}
