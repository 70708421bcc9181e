//! The fileset controller and the consumer read path.
//!
//! A [`Fileset`] overlaps disk reads with consumption across a fixed set of
//! files. Every file gets two buffers: the consumer drains the front one
//! while a single background thread fills the back one. When the front runs
//! dry the consumer swaps the two under the shared lock and queues the file
//! for another background read.
//!
//! # Ownership
//!
//! ```text
//!   consumer thread (one per file)        I/O thread (one per fileset)
//!   +---------------------------+         +---------------------------+
//!   | fronts[i]: Mutex<Front>   |         | readers: Vec<R>           |
//!   +---------------------------+         +---------------------------+
//!                 \                                   /
//!                  \        Shared (Mutex<State>)    /
//!                   +------------------------------+
//!                   | queue, backs[i], pending     |
//!                   +------------------------------+
//! ```
//!
//! The panic flag lives outside the mutex. It is a relaxed atomic: a liveness
//! hint that every party re-checks after acquiring the lock, not a
//! linearizable signal.

use crate::error::{DROPPED_PANIC_CODE, Error, Result};
use crate::io_thread;
use crate::metrics::{
    BYTES_DELIVERED, CONSUMER_WAITS, FILESETS_ACTIVE, PANICS, PRIMING_READS, SWAPS,
};
use crate::queue::WorkQueue;
use crate::reader::SlotReader;
use crate::slot::{Back, Buffer, Fill, Front};
use parking_lot::{Condvar, Mutex};
use std::fmt;
use std::fmt::Write as _;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::thread::{self, JoinHandle};
use tracing::{debug, trace, warn};

/// Default size of each buffer (two per file).
pub const DEFAULT_BUFFER_SIZE: usize = 1024 * 1024;

/// Default name of the background I/O thread.
pub const DEFAULT_THREAD_NAME: &str = "dbufio-io";

/// State guarded by the shared mutex.
pub(crate) struct State {
    pub(crate) queue: WorkQueue,
    pub(crate) backs: Vec<Back>,
    /// Slots that have not yet reached end-of-stream or an error.
    pub(crate) pending: usize,
}

/// Everything the consumers and the I/O thread share.
pub(crate) struct Shared {
    pub(crate) state: Mutex<State>,
    pub(crate) cond: Condvar,
    panicked: AtomicBool,
    panic_code: AtomicI32,
    buffer_size: usize,
}

impl Shared {
    pub(crate) fn new(state: State, buffer_size: usize) -> Self {
        Self {
            state: Mutex::new(state),
            cond: Condvar::new(),
            panicked: AtomicBool::new(false),
            panic_code: AtomicI32::new(0),
            buffer_size,
        }
    }

    #[inline]
    pub(crate) fn is_panicked(&self) -> bool {
        self.panicked.load(Ordering::Relaxed)
    }

    #[inline]
    pub(crate) fn panic_code(&self) -> i32 {
        self.panic_code.load(Ordering::Relaxed)
    }

    /// Set the panic flag. Only the first caller stores its code.
    ///
    /// Does not wake anyone; callers broadcast under the lock afterwards.
    pub(crate) fn raise_panic(&self, code: i32) -> bool {
        if self
            .panicked
            .compare_exchange(false, true, Ordering::Relaxed, Ordering::Relaxed)
            .is_err()
        {
            return false;
        }
        self.panic_code.store(code, Ordering::Relaxed);
        true
    }
}

/// Double-buffered read-ahead over a fixed set of files.
///
/// Created with [`Fileset::create`], [`Fileset::open`] or a
/// [`FilesetBuilder`]. Each file is identified by its index in the reader list
/// passed at creation.
///
/// # Thread Safety
///
/// `Fileset` is `Send + Sync`; share it by reference (for example with
/// [`std::thread::scope`]) so that each consumer thread reads its own files.
/// At most one thread may read a given file at a time. A second concurrent
/// reader of the same file gets [`Error::SlotBusy`].
pub struct Fileset {
    shared: Arc<Shared>,
    fronts: Vec<Mutex<Front>>,
    io_thread: Option<JoinHandle<io_thread::Exit>>,
}

impl Fileset {
    /// Prime one buffer per reader and start the background I/O thread.
    ///
    /// Each reader gets one synchronous read before the thread starts. A file
    /// that is already empty is marked done up front. The first read or
    /// allocation error aborts creation and is returned; nothing created so
    /// far outlives the call.
    pub fn create<R>(readers: Vec<R>, buffer_size: usize) -> Result<Self>
    where
        R: Read + Send + 'static,
    {
        FilesetBuilder::new().buffer_size(buffer_size).build(readers)
    }

    /// Open every path read-only and create a fileset over them.
    pub fn open<I, P>(paths: I, buffer_size: usize) -> Result<Self>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let files = paths
            .into_iter()
            .map(File::open)
            .collect::<std::io::Result<Vec<_>>>()?;
        Self::create(files, buffer_size)
    }

    /// Create a builder.
    pub fn builder() -> FilesetBuilder {
        FilesetBuilder::new()
    }

    /// Number of files.
    pub fn len(&self) -> usize {
        self.fronts.len()
    }

    /// True if the fileset was created without any files.
    pub fn is_empty(&self) -> bool {
        self.fronts.is_empty()
    }

    /// Size of every buffer in bytes.
    pub fn buffer_size(&self) -> usize {
        self.shared.buffer_size
    }

    /// Number of files that have not yet reached end-of-stream or an error.
    pub fn pending(&self) -> usize {
        self.shared.state.lock().pending
    }

    /// True once [`Fileset::panic`] has been called.
    pub fn is_panicked(&self) -> bool {
        self.shared.is_panicked()
    }

    /// Code passed to the first [`Fileset::panic`] call, if any.
    pub fn panic_code(&self) -> Option<i32> {
        self.is_panicked().then(|| self.shared.panic_code())
    }

    /// Bytes delivered to the consumer of `file` so far.
    ///
    /// Returns [`Error::SlotBusy`] while that file's consumer is inside
    /// [`Fileset::read`], including while it waits for read-ahead.
    pub fn position(&self, file: usize) -> Result<u64> {
        Ok(self.front(file)?.offset_in_file())
    }

    /// A [`std::io::Read`] adapter over one file.
    pub fn reader(&self, file: usize) -> Result<SlotReader<'_>> {
        if file >= self.len() {
            return Err(self.invalid_file(file));
        }
        Ok(SlotReader::new(self, file))
    }

    /// Read up to `buf.len()` bytes from `file`.
    ///
    /// Returns the number of bytes copied. Fewer bytes than requested with
    /// `Ok` is a short read: the next call on the same file reports whatever
    /// stopped this one (usually [`Error::EndOfStream`]). An error is only
    /// returned when no byte could be delivered.
    ///
    /// Blocks while the file's front buffer is drained and its next buffer is
    /// still being read. A panic raised while blocked returns
    /// [`Error::Panicked`].
    pub fn read(&self, file: usize, buf: &mut [u8]) -> Result<usize> {
        let mut front = self.front(file)?;
        let mut total = 0;

        loop {
            if let Some(e) = front.error() {
                if total > 0 {
                    break;
                }
                return Err(e.clone());
            }

            total += front.take(&mut buf[total..]);
            if total == buf.len() {
                break;
            }

            if let Err(e) = self.swap(file, &mut front) {
                if total > 0 {
                    break;
                }
                return Err(e);
            }
        }

        BYTES_DELIVERED.add(total as u64);
        Ok(total)
    }

    /// Promote the file's ready back buffer, waiting for it if necessary.
    fn swap(&self, file: usize, front: &mut Front) -> Result<()> {
        let mut state = self.shared.state.lock();

        if !state.backs[file].ready {
            CONSUMER_WAITS.increment();
            trace!(file, "waiting for read-ahead");
            while !state.backs[file].ready {
                if self.shared.is_panicked() {
                    return Err(Error::Panicked(self.shared.panic_code()));
                }
                self.shared.cond.wait(&mut state);
            }
        }

        let state = &mut *state;
        let back = &mut state.backs[file];
        let incoming = back
            .buffer
            .as_mut()
            .expect("ready slot owns its back buffer");
        front.promote(incoming);
        back.ready = false;
        if !back.stream_done {
            state.queue.push(file);
        }
        self.shared.cond.notify_all();

        SWAPS.increment();
        trace!(file, bytes = front.remaining(), "swapped buffers");
        Ok(())
    }

    /// Abort the fileset.
    ///
    /// The background thread stops at its next lock acquisition without
    /// finishing queued work. Consumers blocked waiting for read-ahead wake up
    /// with [`Error::Panicked`]; data already buffered is still delivered.
    /// Only the first code is kept. Safe to call from any thread.
    pub fn panic(&self, code: i32) {
        if self.shared.raise_panic(code) {
            PANICS.increment();
            warn!(code, "fileset panicked");
        }
        let _state = self.shared.state.lock();
        self.shared.cond.notify_all();
    }

    /// Wait for the background thread to exit and release every buffer.
    ///
    /// The thread exits once every file reached end-of-stream or an error, or
    /// after [`Fileset::panic`]. Stop reading early only after panicking the
    /// fileset, otherwise this waits for read-ahead that nobody will consume.
    pub fn destroy(mut self) -> Result<()> {
        self.join()
    }

    fn join(&mut self) -> Result<()> {
        let Some(handle) = self.io_thread.take() else {
            return Ok(());
        };
        let result = handle.join();
        FILESETS_ACTIVE.decrement();
        match result {
            Ok(exit) => {
                debug!(?exit, files = self.len(), "fileset destroyed");
                Ok(())
            }
            Err(_) => Err(Error::ThreadPanicked),
        }
    }

    /// Best-effort diagnostic snapshot.
    ///
    /// Lists the panic code (if panicked), the file count, the pending count,
    /// the buffer size, and `index=[front,back]` error codes for every file
    /// with a non-zero code. A front whose consumer is mid-read shows `?`.
    pub fn dump(&self) -> String {
        let mut out = String::from("fileset");
        if let Some(code) = self.panic_code() {
            let _ = write!(out, " panic={code}");
        }

        let state = self.shared.state.lock();
        let _ = write!(
            out,
            " N={} {} {}",
            self.len(),
            state.pending,
            self.buffer_size()
        );

        for (index, (front, back)) in self.fronts.iter().zip(&state.backs).enumerate() {
            let front_code = front
                .try_lock()
                .map(|f| f.error().map_or(0, Error::code));
            let back_code = back.error_code();
            match front_code {
                Some(0) if back_code == 0 => {}
                Some(code) => {
                    let _ = write!(out, " {index}=[{code},{back_code}]");
                }
                None => {
                    let _ = write!(out, " {index}=[?,{back_code}]");
                }
            }
        }
        out
    }

    fn front(&self, file: usize) -> Result<parking_lot::MutexGuard<'_, Front>> {
        self.fronts
            .get(file)
            .ok_or_else(|| self.invalid_file(file))?
            .try_lock()
            .ok_or(Error::SlotBusy(file))
    }

    fn invalid_file(&self, index: usize) -> Error {
        Error::InvalidFile {
            index,
            count: self.len(),
        }
    }
}

impl fmt::Display for Fileset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.dump())
    }
}

impl fmt::Debug for Fileset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fileset")
            .field("files", &self.len())
            .field("buffer_size", &self.buffer_size())
            .field("panicked", &self.is_panicked())
            .finish()
    }
}

impl Drop for Fileset {
    fn drop(&mut self) {
        if self.io_thread.is_some() {
            self.panic(DROPPED_PANIC_CODE);
            let _ = self.join();
        }
    }
}

/// Builder for creating a [`Fileset`].
#[derive(Debug, Clone)]
pub struct FilesetBuilder {
    buffer_size: usize,
    thread_name: String,
}

impl Default for FilesetBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl FilesetBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
            thread_name: DEFAULT_THREAD_NAME.to_string(),
        }
    }

    /// Set the size of each buffer in bytes.
    pub fn buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size;
        self
    }

    /// Set the name of the background I/O thread.
    pub fn thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }

    /// Prime every reader and start the background I/O thread.
    pub fn build<R>(self, mut readers: Vec<R>) -> Result<Fileset>
    where
        R: Read + Send + 'static,
    {
        if self.buffer_size == 0 {
            return Err(Error::InvalidBufferSize);
        }

        let count = readers.len();
        let mut fronts = Vec::with_capacity(count);
        let mut backs = Vec::with_capacity(count);
        let mut queue = WorkQueue::new(count);
        let mut pending = count;

        for (index, reader) in readers.iter_mut().enumerate() {
            let mut front = Front::new(Buffer::new(self.buffer_size)?);
            let mut back = Back::new(Buffer::new(self.buffer_size)?);

            PRIMING_READS.increment();
            match front.buffer.fill(reader) {
                Fill::Data(bytes) => {
                    trace!(file = index, bytes, "primed");
                    queue.push(index);
                }
                Fill::EndOfStream => {
                    trace!(file = index, "empty at creation");
                    back.stream_done = true;
                    pending -= 1;
                }
                Fill::Failed(e) => {
                    warn!(file = index, error = %e, "priming read failed");
                    return Err(e);
                }
            }

            fronts.push(Mutex::new(front));
            backs.push(back);
        }

        let shared = Arc::new(Shared::new(
            State {
                queue,
                backs,
                pending,
            },
            self.buffer_size,
        ));

        let thread_shared = Arc::clone(&shared);
        let handle = thread::Builder::new()
            .name(self.thread_name)
            .spawn(move || io_thread::run(&thread_shared, readers))
            .map_err(|e| Error::Spawn(Arc::new(e)))?;
        FILESETS_ACTIVE.increment();

        debug!(
            files = count,
            pending,
            buffer_size = self.buffer_size,
            "fileset created"
        );

        Ok(Fileset {
            shared,
            fronts,
            io_thread: Some(handle),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{self, Cursor};
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    fn cursors(files: &[&[u8]]) -> Vec<Cursor<Vec<u8>>> {
        files.iter().map(|f| Cursor::new(f.to_vec())).collect()
    }

    /// Reader whose reads are counted, so tests can tell whether the I/O
    /// thread has touched it.
    struct Counted {
        inner: Cursor<Vec<u8>>,
        reads: Arc<AtomicUsize>,
    }

    impl Read for Counted {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            self.inner.read(buf)
        }
    }

    /// Reader that blocks every read after the first until released.
    struct Gated {
        inner: Cursor<Vec<u8>>,
        primed: bool,
        gate: Arc<(std::sync::Mutex<bool>, std::sync::Condvar)>,
    }

    impl Read for Gated {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.primed {
                let (lock, cond) = &*self.gate;
                let mut open = lock.lock().unwrap();
                while !*open {
                    open = cond.wait(open).unwrap();
                }
            }
            self.primed = true;
            self.inner.read(buf)
        }
    }

    fn wait_for_drain(fileset: &Fileset) {
        for _ in 0..1000 {
            if fileset.pending() == 0 {
                return;
            }
            thread::sleep(Duration::from_millis(1));
        }
        panic!("fileset never drained");
    }

    #[test]
    fn test_read_assembles_across_two_swaps() {
        let data: &[u8] = b"0123456789";
        let fileset = Fileset::create(cursors(&[data, b"abcdefghij"]), 4).unwrap();

        let swaps = SWAPS.value();
        let mut buf = [0u8; 10];
        assert_eq!(fileset.read(0, &mut buf).unwrap(), 10);
        assert_eq!(&buf, data);
        assert!(SWAPS.value() >= swaps + 2);
        assert_eq!(fileset.position(0).unwrap(), 10);

        assert!(matches!(fileset.read(0, &mut buf), Err(Error::EndOfStream)));
        fileset.panic(1);
        fileset.destroy().unwrap();
    }

    #[test]
    fn test_empty_file_reports_end_of_stream() {
        let fileset = Fileset::create(cursors(&[b""]), 8).unwrap();
        assert_eq!(fileset.pending(), 0);

        let mut buf = [0u8; 4];
        assert!(matches!(fileset.read(0, &mut buf), Err(Error::EndOfStream)));
        // Stays terminal.
        assert!(matches!(fileset.read(0, &mut buf), Err(Error::EndOfStream)));
        fileset.destroy().unwrap();
    }

    #[test]
    fn test_short_read_defers_end_of_stream() {
        let fileset = Fileset::create(cursors(&[b"abcdef"]), 4).unwrap();

        let mut buf = [0u8; 16];
        assert_eq!(fileset.read(0, &mut buf).unwrap(), 6);
        assert_eq!(&buf[..6], b"abcdef");
        assert!(matches!(fileset.read(0, &mut buf), Err(Error::EndOfStream)));
        fileset.destroy().unwrap();
    }

    #[test]
    fn test_read_within_front_does_not_touch_io_thread() {
        let gate = Arc::new((std::sync::Mutex::new(false), std::sync::Condvar::new()));
        let reader = Gated {
            inner: Cursor::new(b"0123456789abcdef".to_vec()),
            primed: false,
            gate: Arc::clone(&gate),
        };
        let fileset = Fileset::create(vec![reader], 8).unwrap();

        // The background read is stuck behind the gate, yet reads inside the
        // primed front buffer complete.
        let mut buf = [0u8; 3];
        assert_eq!(fileset.read(0, &mut buf).unwrap(), 3);
        assert_eq!(&buf, b"012");
        assert_eq!(fileset.read(0, &mut buf).unwrap(), 3);
        assert_eq!(&buf, b"345");
        let mut buf = [0u8; 2];
        assert_eq!(fileset.read(0, &mut buf).unwrap(), 2);
        assert_eq!(&buf, b"67");
        assert_eq!(fileset.position(0).unwrap(), 8);

        {
            let (lock, cond) = &*gate;
            *lock.lock().unwrap() = true;
            cond.notify_all();
        }

        let mut rest = Vec::new();
        fileset.reader(0).unwrap().read_to_end(&mut rest).unwrap();
        assert_eq!(rest, b"89abcdef");
        fileset.destroy().unwrap();
    }

    #[test]
    fn test_end_of_stream_slot_not_requeued() {
        let reads = Arc::new(AtomicUsize::new(0));
        let reader = Counted {
            inner: Cursor::new(b"abc".to_vec()),
            reads: Arc::clone(&reads),
        };
        let fileset = Fileset::create(vec![reader], 4).unwrap();

        // Priming read plus the background read that hits end-of-stream.
        wait_for_drain(&fileset);
        let mut buf = [0u8; 8];
        assert_eq!(fileset.read(0, &mut buf).unwrap(), 3);
        assert!(matches!(fileset.read(0, &mut buf), Err(Error::EndOfStream)));
        fileset.destroy().unwrap();
        assert_eq!(reads.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_zero_length_read() {
        let fileset = Fileset::create(cursors(&[b"ab"]), 2).unwrap();
        assert_eq!(fileset.read(0, &mut []).unwrap(), 0);

        let mut buf = [0u8; 2];
        assert_eq!(fileset.read(0, &mut buf).unwrap(), 2);
        // Drained front, zero bytes requested: never blocks.
        assert_eq!(fileset.read(0, &mut []).unwrap(), 0);
        fileset.destroy().unwrap();
    }

    #[test]
    fn test_invalid_file_index() {
        let fileset = Fileset::create(cursors(&[b"ab"]), 2).unwrap();
        let mut buf = [0u8; 2];
        assert!(matches!(
            fileset.read(1, &mut buf),
            Err(Error::InvalidFile { index: 1, count: 1 })
        ));
        assert!(fileset.reader(5).is_err());
        assert!(fileset.position(5).is_err());
        fileset.panic(0);
        fileset.destroy().unwrap();
    }

    #[test]
    fn test_zero_buffer_size_rejected() {
        let result = Fileset::create(cursors(&[b"ab"]), 0);
        assert!(matches!(result, Err(Error::InvalidBufferSize)));
    }

    #[test]
    fn test_unallocatable_buffer_size_rejected() {
        let err = Fileset::create(cursors(&[b"abc"]), usize::MAX).unwrap_err();
        assert!(matches!(&err, Error::Io(e) if e.kind() == io::ErrorKind::OutOfMemory));
        assert_eq!(err.code(), crate::error::UNKNOWN_OS_CODE);
    }

    #[test]
    fn test_priming_error_aborts_creation() {
        struct Broken;
        impl Read for Broken {
            fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
                Err(io::Error::from_raw_os_error(13))
            }
        }

        let readers: Vec<Box<dyn Read + Send>> = vec![
            Box::new(Cursor::new(b"fine".to_vec())),
            Box::new(Broken),
            Box::new(Cursor::new(b"never read".to_vec())),
        ];
        let err = Fileset::create(readers, 4).unwrap_err();
        assert_eq!(err.code(), 13);
    }

    #[test]
    fn test_no_files() {
        let fileset = Fileset::create(Vec::<Cursor<Vec<u8>>>::new(), 4).unwrap();
        assert!(fileset.is_empty());
        assert_eq!(fileset.pending(), 0);
        fileset.destroy().unwrap();
    }

    #[test]
    fn test_panic_is_idempotent() {
        let fileset = Fileset::create(cursors(&[b"abcdefgh"]), 2).unwrap();
        assert_eq!(fileset.panic_code(), None);
        fileset.panic(5);
        fileset.panic(6);
        assert!(fileset.is_panicked());
        assert_eq!(fileset.panic_code(), Some(5));
        fileset.destroy().unwrap();
    }

    #[test]
    fn test_panic_wakes_blocked_consumer() {
        let gate = Arc::new((std::sync::Mutex::new(false), std::sync::Condvar::new()));
        let reader = Gated {
            inner: Cursor::new(b"abcdefgh".to_vec()),
            primed: false,
            gate: Arc::clone(&gate),
        };
        let fileset = Fileset::create(vec![reader], 4).unwrap();

        thread::scope(|s| {
            let consumer = s.spawn(|| {
                let mut buf = [0u8; 8];
                // Buffered data first, then a wait that only panic can end.
                let n = fileset.read(0, &mut buf).unwrap();
                assert_eq!(&buf[..n], b"abcd");
                fileset.read(0, &mut buf)
            });
            thread::sleep(Duration::from_millis(20));
            fileset.panic(77);
            let result = consumer.join().unwrap();
            assert!(matches!(result, Err(Error::Panicked(77))));
        });

        // Let the gated read finish so the I/O thread can observe the panic.
        {
            let (lock, cond) = &*gate;
            *lock.lock().unwrap() = true;
            cond.notify_all();
        }
        fileset.destroy().unwrap();
    }

    #[test]
    fn test_concurrent_reader_on_same_slot_rejected() {
        let fileset = Fileset::create(cursors(&[b"abcd"]), 4).unwrap();
        let _held = fileset.front(0).unwrap();
        let mut buf = [0u8; 1];
        assert!(matches!(fileset.read(0, &mut buf), Err(Error::SlotBusy(0))));
        assert!(matches!(fileset.position(0), Err(Error::SlotBusy(0))));
        assert!(fileset.dump().contains("0=[?,"));
        drop(_held);
        fileset.panic(0);
        fileset.destroy().unwrap();
    }

    #[test]
    fn test_dump() {
        let fileset = Fileset::create(cursors(&[b"", b"abc"]), 4).unwrap();
        let mut buf = [0u8; 4];
        assert_eq!(fileset.read(1, &mut buf).unwrap(), 3);
        assert!(fileset.read(1, &mut buf).is_err());

        let dump = fileset.dump();
        assert!(dump.starts_with("fileset N=2 0 4"), "{dump}");
        assert!(dump.contains(" 0=[-1,0]"), "{dump}");
        assert!(dump.contains(" 1=[-1,0]"), "{dump}");
        assert_eq!(format!("{fileset}"), dump);

        fileset.panic(3);
        assert!(fileset.dump().starts_with("fileset panic=3 N=2 0 4"));
        fileset.destroy().unwrap();
    }

    #[test]
    fn test_drop_without_destroy_does_not_hang() {
        let fileset = Fileset::create(cursors(&[b"abcdefghijkl", b"mnopqrstuvwx", b"yz"]), 2).unwrap();
        let mut buf = [0u8; 1];
        fileset.read(0, &mut buf).unwrap();
        drop(fileset);
    }

    #[test]
    fn test_thread_name() {
        // Readers are dropped by the I/O thread when it exits.
        struct DropNamed(Arc<Mutex<Option<String>>>);
        impl Drop for DropNamed {
            fn drop(&mut self) {
                *self.0.lock() = thread::current().name().map(str::to_string);
            }
        }
        impl Read for DropNamed {
            fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
                Ok(0)
            }
        }

        let seen = Arc::new(Mutex::new(None));
        let fileset = Fileset::builder()
            .thread_name("merge-io")
            .buffer_size(8)
            .build(vec![DropNamed(Arc::clone(&seen))])
            .unwrap();
        fileset.destroy().unwrap();
        assert_eq!(seen.lock().as_deref(), Some("merge-io"));
    }
}
