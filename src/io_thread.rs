//! Background read-ahead thread.
//!
//! One thread per fileset. It owns every reader, so no other thread can ever
//! issue a read against a file once the fileset is running.
//!
//! ```text
//!            +-----------+   queue empty    +------+
//!    +-----> | check     | ---------------> | Idle | -- wait on cond --+
//!    |       +-----------+                  +------+                   |
//!    |         |   |   \                                               |
//!    |  panic  |   |    \ pending == 0                                 |
//!    |         v   |     v                                             |
//!    |      (exit) |   (exit)                                          |
//!    |             | dequeue                                           |
//!    |             v                                                   |
//!    |       +-----------+  unlock, read(), lock                       |
//!    +------ | Servicing | <-------------------------------------------+
//!            +-----------+
//! ```

use crate::error::IO_THREAD_PANIC_CODE;
use crate::fileset::{Shared, State};
use crate::metrics::{BACKGROUND_READS, BYTES_READ_AHEAD, READ_ERRORS};
use crate::slot::Fill;
use parking_lot::MutexGuard;
use std::io::Read;
use std::thread;
use tracing::{debug, error, trace, warn};

/// Why the I/O thread stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Exit {
    /// Every slot reached end-of-stream or an error.
    Drained,
    /// The fileset was panicked.
    Panicked,
}

/// Raises a fileset panic if the I/O thread unwinds, so consumers waiting
/// for read-ahead wake up instead of blocking forever.
struct UnwindGuard<'a> {
    shared: &'a Shared,
}

impl Drop for UnwindGuard<'_> {
    fn drop(&mut self) {
        if thread::panicking() {
            error!("I/O thread unwound, panicking fileset");
            self.shared.raise_panic(IO_THREAD_PANIC_CODE);
            let _state = self.shared.state.lock();
            self.shared.cond.notify_all();
        }
    }
}

/// Thread body. Returns once the fileset drains or panics.
pub(crate) fn run<R: Read>(shared: &Shared, mut readers: Vec<R>) -> Exit {
    let _guard = UnwindGuard { shared };
    let mut state = shared.state.lock();

    let exit = loop {
        if shared.is_panicked() {
            break Exit::Panicked;
        }
        if state.pending == 0 {
            break Exit::Drained;
        }

        let Some(slot) = state.queue.pop() else {
            shared.cond.wait(&mut state);
            continue;
        };

        let mut buffer = {
            let back = &mut state.backs[slot];
            debug_assert!(!back.ready && !back.stream_done);
            back.buffer
                .take()
                .expect("queued slot owns its back buffer")
        };

        // Consumers may swap other slots meanwhile. They cannot swap this one
        // because its `ready` flag is false.
        let fill = MutexGuard::unlocked(&mut state, || buffer.fill(&mut readers[slot]));
        BACKGROUND_READS.increment();

        if shared.is_panicked() {
            break Exit::Panicked;
        }

        record(&mut state, slot, &fill);
        let back = &mut state.backs[slot];
        back.buffer = Some(buffer);
        back.ready = true;
        shared.cond.notify_all();
    };

    debug!(
        ?exit,
        pending = state.pending,
        unserviced = state.queue.len(),
        "I/O thread exiting"
    );
    exit
}

/// Account for the outcome of a background read.
fn record(state: &mut State, slot: usize, fill: &Fill) {
    match fill {
        Fill::Data(n) => {
            BYTES_READ_AHEAD.add(*n as u64);
            trace!(slot, bytes = n, "read ahead");
        }
        Fill::EndOfStream => {
            trace!(slot, "end of stream");
        }
        Fill::Failed(e) => {
            READ_ERRORS.increment();
            warn!(slot, error = %e, "background read failed");
        }
    }

    if fill.is_terminal() {
        state.backs[slot].stream_done = true;
        state.pending -= 1;
    }
}
