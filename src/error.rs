//! Error types for fileset operations.

use std::io;
use std::sync::Arc;

/// Code stored for an end-of-stream outcome.
pub const EOF_CODE: i32 = -1;

/// Code reported for an I/O error that carries no OS errno.
pub const UNKNOWN_OS_CODE: i32 = -2;

/// Panic code raised when the background I/O thread itself unwinds.
pub const IO_THREAD_PANIC_CODE: i32 = -3;

/// Panic code raised when a fileset is dropped without being destroyed.
pub const DROPPED_PANIC_CODE: i32 = -4;

/// Errors that can occur while creating or reading a fileset.
///
/// Stored per buffer generation and handed back to the consumer every time it
/// reads a drained slot, so the type is cheap to clone.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// The file has no more data. Terminal for the slot.
    #[error("end of stream")]
    EndOfStream,

    /// A read against the file failed. Terminal for the slot.
    #[error("I/O error: {0}")]
    Io(Arc<io::Error>),

    /// The fileset was panicked with the given code.
    #[error("fileset panicked (code {0})")]
    Panicked(i32),

    /// The file index is out of range.
    #[error("invalid file index {index} (fileset has {count} files)")]
    InvalidFile { index: usize, count: usize },

    /// Another consumer is already reading this file.
    #[error("file {0} is already being read by another consumer")]
    SlotBusy(usize),

    /// Buffers must hold at least one byte.
    #[error("buffer size must be non-zero")]
    InvalidBufferSize,

    /// The background I/O thread could not be started.
    #[error("failed to start I/O thread: {0}")]
    Spawn(Arc<io::Error>),

    /// The background I/O thread unwound instead of exiting.
    #[error("I/O thread panicked")]
    ThreadPanicked,
}

impl Error {
    /// Integer code for this error, as reported by [`Fileset::dump`].
    ///
    /// End-of-stream is [`EOF_CODE`], I/O errors report their OS errno (or
    /// [`UNKNOWN_OS_CODE`]), and panics report the code they were raised with.
    ///
    /// [`Fileset::dump`]: crate::Fileset::dump
    pub fn code(&self) -> i32 {
        match self {
            Self::EndOfStream => EOF_CODE,
            Self::Io(e) | Self::Spawn(e) => e.raw_os_error().unwrap_or(UNKNOWN_OS_CODE),
            Self::Panicked(code) => *code,
            Self::InvalidFile { .. }
            | Self::SlotBusy(_)
            | Self::InvalidBufferSize
            | Self::ThreadPanicked => UNKNOWN_OS_CODE,
        }
    }

    /// Returns true for the end-of-stream sentinel.
    pub fn is_end_of_stream(&self) -> bool {
        matches!(self, Self::EndOfStream)
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Io(Arc::new(e))
    }
}

impl From<Error> for io::Error {
    fn from(e: Error) -> Self {
        let kind = match &e {
            Error::EndOfStream => io::ErrorKind::UnexpectedEof,
            Error::Io(inner) | Error::Spawn(inner) => inner.kind(),
            Error::Panicked(_) | Error::ThreadPanicked => io::ErrorKind::Other,
            Error::InvalidFile { .. } | Error::InvalidBufferSize => io::ErrorKind::InvalidInput,
            Error::SlotBusy(_) => io::ErrorKind::ResourceBusy,
        };
        io::Error::new(kind, e)
    }
}

/// Result type for fileset operations.
pub type Result<T> = std::result::Result<T, Error>;
