//! Byte sinks for encoding.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use super::StreamError;

/// A caller-supplied byte sink an encode writes to.
///
/// `write` returns how many bytes were accepted; anything short of the full
/// slice ends the encode. `finish` is called exactly once per encode, after
/// the last write or after the encode failed.
pub trait TargetCapability {
    fn write(&mut self, bytes: &[u8]) -> Result<usize, StreamError>;

    fn finish(&mut self) -> Result<(), StreamError>;
}

impl<T: TargetCapability + ?Sized> TargetCapability for &mut T {
    fn write(&mut self, bytes: &[u8]) -> Result<usize, StreamError> {
        (**self).write(bytes)
    }

    fn finish(&mut self) -> Result<(), StreamError> {
        (**self).finish()
    }
}

fn write_retrying<W: Write>(writer: &mut W, bytes: &[u8]) -> Result<usize, StreamError> {
    loop {
        match writer.write(bytes) {
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            other => return other.map_err(StreamError::Io),
        }
    }
}

/// Collects the encoded bytes in memory.
#[derive(Debug, Default, Clone)]
pub struct MemoryTarget {
    buffer: Vec<u8>,
    finished: bool,
}

impl MemoryTarget {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.buffer
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.buffer
    }
}

impl TargetCapability for MemoryTarget {
    fn write(&mut self, bytes: &[u8]) -> Result<usize, StreamError> {
        if self.finished {
            return Err(StreamError::Finished);
        }
        self.buffer.extend_from_slice(bytes);
        Ok(bytes.len())
    }

    fn finish(&mut self) -> Result<(), StreamError> {
        self.finished = true;
        Ok(())
    }
}

/// Writes to a file; `finish` flushes and closes it.
#[derive(Debug)]
pub struct FileTarget {
    file: Option<File>,
}

impl FileTarget {
    /// Create or truncate `path`.
    ///
    /// # Errors
    ///
    /// `StreamError::Io` if the file can't be created.
    pub fn create(path: impl AsRef<Path>) -> Result<Self, StreamError> {
        Ok(Self {
            file: Some(File::create(path)?),
        })
    }
}

impl From<File> for FileTarget {
    fn from(file: File) -> Self {
        Self { file: Some(file) }
    }
}

impl TargetCapability for FileTarget {
    fn write(&mut self, bytes: &[u8]) -> Result<usize, StreamError> {
        let file = self.file.as_mut().ok_or(StreamError::Finished)?;
        write_retrying(file, bytes)
    }

    fn finish(&mut self) -> Result<(), StreamError> {
        let mut file = self.file.take().ok_or(StreamError::Finished)?;
        file.flush()?;
        Ok(())
    }
}

/// Wraps any writer; `finish` flushes it.
#[derive(Debug)]
pub struct WriterTarget<W> {
    writer: W,
    finished: bool,
}

impl<W: Write> WriterTarget<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            finished: false,
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> TargetCapability for WriterTarget<W> {
    fn write(&mut self, bytes: &[u8]) -> Result<usize, StreamError> {
        if self.finished {
            return Err(StreamError::Finished);
        }
        write_retrying(&mut self.writer, bytes)
    }

    fn finish(&mut self) -> Result<(), StreamError> {
        if self.finished {
            return Err(StreamError::Finished);
        }
        self.finished = true;
        Ok(self.writer.flush()?)
    }
}

/// Exposes a [`TargetCapability`] as `Write` for the duration of one encode.
///
/// A short or failed write is terminal: the error is kept and every later
/// write fails with it. The capability's `finish` runs exactly once, either
/// through [`TargetAdapter::finish`] or when the adapter is dropped.
pub struct TargetAdapter<'a> {
    capability: &'a mut dyn TargetCapability,
    error: Option<StreamError>,
    finished: bool,
    bytes_written: u64,
}

impl<'a> TargetAdapter<'a> {
    pub fn new(capability: &'a mut dyn TargetCapability) -> Self {
        tracing::trace!("target adapter opened");
        Self {
            capability,
            error: None,
            finished: false,
            bytes_written: 0,
        }
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// The error that ended the stream, if any.
    pub fn take_error(&mut self) -> Option<StreamError> {
        self.error.take()
    }

    /// Finish the capability and report the outcome of the whole stream.
    ///
    /// Returns the byte count on success. If a write already failed, that
    /// error is returned and a finish failure is only logged.
    pub fn finish(mut self) -> Result<u64, StreamError> {
        let finished = self.finish_once();
        match (self.error.take(), finished) {
            (Some(write_err), Err(finish_err)) => {
                tracing::warn!(error = %finish_err, "finish failed after write error");
                Err(write_err)
            }
            (Some(write_err), Ok(())) => Err(write_err),
            (None, Err(finish_err)) => Err(finish_err),
            (None, Ok(())) => Ok(self.bytes_written),
        }
    }

    fn finish_once(&mut self) -> Result<(), StreamError> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        tracing::debug!(bytes = self.bytes_written, "finishing target");
        self.capability.finish()
    }

    fn fail(&mut self, err: StreamError) -> io::Error {
        let io_err = err.to_io();
        self.error = Some(err);
        io_err
    }
}

impl Write for TargetAdapter<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if let Some(err) = &self.error {
            return Err(err.to_io());
        }
        if self.finished {
            return Err(StreamError::Finished.to_io());
        }
        if buf.is_empty() {
            return Ok(0);
        }
        match self.capability.write(buf) {
            Ok(n) if n == buf.len() => {
                self.bytes_written += n as u64;
                Ok(n)
            }
            Ok(n) if n < buf.len() => {
                self.bytes_written += n as u64;
                Err(self.fail(StreamError::ShortWrite {
                    requested: buf.len(),
                    written: n,
                }))
            }
            Ok(n) => Err(self.fail(StreamError::Io(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("target reported {n} bytes for a {} byte write", buf.len()),
            )))),
            Err(e) => Err(self.fail(e)),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match &self.error {
            Some(err) => Err(err.to_io()),
            None => Ok(()),
        }
    }
}

impl Drop for TargetAdapter<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.finish_once() {
            tracing::warn!(error = %e, "finish failed while closing target");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        data: Vec<u8>,
        finishes: usize,
        limit: Option<usize>,
        fail_writes: bool,
        fail_finish: bool,
    }

    impl TargetCapability for Recorder {
        fn write(&mut self, bytes: &[u8]) -> Result<usize, StreamError> {
            if self.fail_writes {
                return Err(StreamError::Io(io::Error::new(
                    io::ErrorKind::BrokenPipe,
                    "sink closed",
                )));
            }
            let n = self.limit.map_or(bytes.len(), |l| l.min(bytes.len()));
            self.data.extend_from_slice(&bytes[..n]);
            Ok(n)
        }

        fn finish(&mut self) -> Result<(), StreamError> {
            self.finishes += 1;
            if self.fail_finish {
                return Err(StreamError::Io(io::Error::other("close failed")));
            }
            Ok(())
        }
    }

    #[test]
    fn test_writes_then_single_finish() {
        let mut sink = Recorder::default();
        let mut adapter = TargetAdapter::new(&mut sink);
        adapter.write_all(b"abc").unwrap();
        adapter.write_all(b"def").unwrap();

        assert_eq!(adapter.finish().unwrap(), 6);
        assert_eq!(sink.data, b"abcdef");
        assert_eq!(sink.finishes, 1);
    }

    #[test]
    fn test_drop_finishes_once() {
        let mut sink = Recorder::default();
        {
            let mut adapter = TargetAdapter::new(&mut sink);
            adapter.write_all(b"xy").unwrap();
        }
        assert_eq!(sink.finishes, 1);
    }

    #[test]
    fn test_short_write_is_terminal() {
        let mut sink = Recorder {
            limit: Some(2),
            ..Default::default()
        };
        let mut adapter = TargetAdapter::new(&mut sink);

        let err = adapter.write(b"hello").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::WriteZero);
        assert!(adapter.write(b"more").is_err());

        let err = adapter.finish().unwrap_err();
        assert!(matches!(
            err,
            StreamError::ShortWrite {
                requested: 5,
                written: 2
            }
        ));
        assert_eq!(sink.data, b"he");
        assert_eq!(sink.finishes, 1);
    }

    #[test]
    fn test_write_error_still_finishes() {
        let mut sink = Recorder {
            fail_writes: true,
            fail_finish: true,
            ..Default::default()
        };
        let mut adapter = TargetAdapter::new(&mut sink);
        assert!(adapter.write_all(b"data").is_err());

        // the write error wins over the finish error
        match adapter.finish() {
            Err(StreamError::Io(e)) => assert_eq!(e.kind(), io::ErrorKind::BrokenPipe),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(sink.finishes, 1);
    }

    #[test]
    fn test_finish_error_reported() {
        let mut sink = Recorder {
            fail_finish: true,
            ..Default::default()
        };
        let adapter = TargetAdapter::new(&mut sink);
        assert!(matches!(adapter.finish(), Err(StreamError::Io(_))));
    }

    #[test]
    fn test_memory_target() {
        let mut target = MemoryTarget::new();
        {
            let mut adapter = TargetAdapter::new(&mut target);
            adapter.write_all(b"payload").unwrap();
            adapter.finish().unwrap();
        }
        assert!(target.is_finished());
        assert_eq!(target.bytes(), b"payload");
        assert!(matches!(target.write(b"late"), Err(StreamError::Finished)));
    }

    #[test]
    fn test_writer_target_finish_once() {
        let mut target = WriterTarget::new(Vec::new());
        assert_eq!(TargetCapability::write(&mut target, b"ab").unwrap(), 2);
        target.finish().unwrap();
        assert!(matches!(target.finish(), Err(StreamError::Finished)));
        assert_eq!(target.into_inner(), b"ab");
    }
}
