//! Per-file slot state.
//!
//! Each file in a fileset owns two equally sized [`Buffer`]s. The consumer
//! drains the one held by its [`Front`]; the I/O thread fills the one held by
//! the slot's [`Back`]. The two halves live in different places:
//!
//! - [`Front`] sits behind a per-slot mutex that only the (single) consumer
//!   of that file ever takes.
//! - [`Back`] sits inside the fileset's shared state, guarded by the shared
//!   mutex. While a background read is in flight the I/O thread has moved the
//!   back buffer out by value, so neither side can touch the other's bytes.
//!
//! The swap that promotes a ready back buffer to the front is a pointer swap
//! performed by the consumer while holding the shared mutex.

use crate::error::{Error, Result};
use std::io::{self, Read};
use std::mem;

/// Outcome of filling a buffer from its file.
#[derive(Debug, Clone)]
pub(crate) enum Fill {
    /// Read this many bytes (always > 0).
    Data(usize),
    /// The file returned zero bytes.
    EndOfStream,
    /// The read failed.
    Failed(Error),
}

impl Fill {
    /// True when no further read should ever be issued for the file.
    ///
    /// I/O errors are terminal exactly like end-of-stream.
    pub(crate) fn is_terminal(&self) -> bool {
        !matches!(self, Fill::Data(_))
    }
}

/// One generation of a file's data.
pub(crate) struct Buffer {
    data: Box<[u8]>,
    len: usize,
    error: Option<Error>,
}

impl Buffer {
    /// Allocate a zeroed buffer of `size` bytes.
    ///
    /// Allocation failure is returned as an `OutOfMemory` I/O error.
    pub(crate) fn new(size: usize) -> Result<Self> {
        let mut data: Vec<u8> = Vec::new();
        data.try_reserve_exact(size)
            .map_err(|_| io::Error::from(io::ErrorKind::OutOfMemory))?;
        data.resize(size, 0);
        Ok(Self {
            data: data.into_boxed_slice(),
            len: 0,
            error: None,
        })
    }

    /// Number of valid bytes.
    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    /// Error stored by the read that produced this generation, if any.
    #[inline]
    pub(crate) fn error(&self) -> Option<&Error> {
        self.error.as_ref()
    }

    /// Perform one read of up to the buffer size and record the outcome.
    pub(crate) fn fill<R: Read>(&mut self, reader: &mut R) -> Fill {
        match read_retrying(reader, &mut self.data) {
            Ok(0) => {
                self.len = 0;
                self.error = Some(Error::EndOfStream);
                Fill::EndOfStream
            }
            Ok(n) => {
                self.len = n;
                self.error = None;
                Fill::Data(n)
            }
            Err(e) => {
                let err = Error::from(e);
                self.len = 0;
                self.error = Some(err.clone());
                Fill::Failed(err)
            }
        }
    }
}

/// A single `read` call, retried while the OS reports `EINTR`.
fn read_retrying<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    loop {
        match reader.read(buf) {
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            result => return result,
        }
    }
}

/// Consumer-owned half of a slot.
pub(crate) struct Front {
    pub(crate) buffer: Buffer,
    offset_in_buf: usize,
    offset_in_file: u64,
}

impl Front {
    pub(crate) fn new(buffer: Buffer) -> Self {
        Self {
            buffer,
            offset_in_buf: 0,
            offset_in_file: 0,
        }
    }

    /// Error stored against the current front generation.
    #[inline]
    pub(crate) fn error(&self) -> Option<&Error> {
        self.buffer.error()
    }

    /// Bytes not yet handed to the consumer.
    #[inline]
    pub(crate) fn remaining(&self) -> usize {
        self.buffer.len() - self.offset_in_buf
    }

    /// Bytes handed to the consumer since the file was opened.
    #[inline]
    pub(crate) fn offset_in_file(&self) -> u64 {
        self.offset_in_file
    }

    /// Copy as many unread bytes as fit into `dst` and advance the cursors.
    pub(crate) fn take(&mut self, dst: &mut [u8]) -> usize {
        let n = dst.len().min(self.remaining());
        let start = self.offset_in_buf;
        dst[..n].copy_from_slice(&self.buffer.data[start..start + n]);
        self.offset_in_buf += n;
        self.offset_in_file += n as u64;
        n
    }

    /// Exchange the drained front buffer with a ready back buffer.
    ///
    /// Must only be called while holding the shared mutex that guards `incoming`.
    pub(crate) fn promote(&mut self, incoming: &mut Buffer) {
        debug_assert_eq!(self.remaining(), 0);
        mem::swap(&mut self.buffer, incoming);
        self.offset_in_buf = 0;
    }
}

/// Lock-protected half of a slot.
pub(crate) struct Back {
    /// `None` while the I/O thread is reading into it.
    pub(crate) buffer: Option<Buffer>,
    /// The back buffer holds an outcome the consumer has not claimed.
    pub(crate) ready: bool,
    /// No further background read will be issued.
    pub(crate) stream_done: bool,
}

impl Back {
    pub(crate) fn new(buffer: Buffer) -> Self {
        Self {
            buffer: Some(buffer),
            ready: false,
            stream_done: false,
        }
    }

    /// Code of the error stored in the back buffer, 0 if none or in flight.
    pub(crate) fn error_code(&self) -> i32 {
        self.buffer
            .as_ref()
            .and_then(Buffer::error)
            .map_or(0, Error::code)
    }
}
