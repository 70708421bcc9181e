//! Scan a set of files through one fileset.
//!
//! Backs the `dbufio-scan` tool: every file is drained in `chunk_size` reads,
//! counting bytes and newlines along the way. A read error on any file
//! panics the fileset so the remaining consumers stop instead of waiting on
//! read-ahead that will never be issued.

use crate::config::{ScanConfig, ScanMode};
use crate::error::{Error, Result};
use crate::fileset::Fileset;
use std::fs::File;
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Outcome for one scanned file.
#[derive(Debug, Clone)]
pub struct FileReport {
    pub path: PathBuf,
    pub bytes: u64,
    pub lines: u64,
    /// The error that stopped the scan of this file, if it was not a clean
    /// end-of-stream.
    pub error: Option<Error>,
}

/// Outcome of a whole scan.
#[derive(Debug, Clone)]
pub struct ScanReport {
    pub files: Vec<FileReport>,
    /// [`Fileset::dump`] taken after every consumer finished.
    pub dump: String,
    pub elapsed: Duration,
}

impl ScanReport {
    pub fn total_bytes(&self) -> u64 {
        self.files.iter().map(|f| f.bytes).sum()
    }

    pub fn is_clean(&self) -> bool {
        self.files.iter().all(|f| f.error.is_none())
    }
}

/// Per-file consumer state.
struct Tally {
    bytes: u64,
    lines: u64,
    error: Option<Error>,
    done: bool,
}

impl Tally {
    fn new() -> Self {
        Self {
            bytes: 0,
            lines: 0,
            error: None,
            done: false,
        }
    }

    /// Perform one chunked read and account for it.
    fn step(&mut self, fileset: &Fileset, file: usize, chunk: &mut [u8]) {
        match fileset.read(file, chunk) {
            Ok(n) => {
                self.bytes += n as u64;
                self.lines += chunk[..n].iter().filter(|&&b| b == b'\n').count() as u64;
            }
            Err(Error::EndOfStream) => self.done = true,
            Err(e) => {
                warn!(file, error = %e, "scan stopped");
                if !matches!(e, Error::Panicked(_)) {
                    fileset.panic(e.code());
                }
                self.error = Some(e);
                self.done = true;
            }
        }
    }
}

/// Scan `paths` with the given configuration.
pub fn scan(config: &ScanConfig, paths: &[PathBuf]) -> Result<ScanReport> {
    let files = paths
        .iter()
        .map(File::open)
        .collect::<std::io::Result<Vec<_>>>()?;

    let start = Instant::now();
    let fileset = config.fileset.builder().build(files)?;
    info!(
        files = fileset.len(),
        buffer_size = fileset.buffer_size(),
        mode = ?config.scan.mode,
        "scan starting"
    );

    let chunk_size = config.scan.chunk_size;
    let tallies = match config.scan.mode {
        ScanMode::PerFile => per_file(&fileset, chunk_size),
        ScanMode::RoundRobin => round_robin(&fileset, chunk_size),
    };

    let dump = fileset.dump();
    fileset.destroy()?;
    let elapsed = start.elapsed();

    let files: Vec<FileReport> = paths
        .iter()
        .zip(tallies)
        .map(|(path, tally)| FileReport {
            path: path.clone(),
            bytes: tally.bytes,
            lines: tally.lines,
            error: tally.error,
        })
        .collect();

    debug!(?elapsed, %dump, "scan finished");
    Ok(ScanReport {
        files,
        dump,
        elapsed,
    })
}

fn per_file(fileset: &Fileset, chunk_size: usize) -> Vec<Tally> {
    thread::scope(|s| {
        let handles: Vec<_> = (0..fileset.len())
            .map(|file| {
                s.spawn(move || {
                    let mut chunk = vec![0u8; chunk_size];
                    let mut tally = Tally::new();
                    while !tally.done {
                        tally.step(fileset, file, &mut chunk);
                    }
                    tally
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|h| match h.join() {
                Ok(tally) => tally,
                Err(payload) => std::panic::resume_unwind(payload),
            })
            .collect()
    })
}

fn round_robin(fileset: &Fileset, chunk_size: usize) -> Vec<Tally> {
    let mut chunk = vec![0u8; chunk_size];
    let mut tallies: Vec<Tally> = (0..fileset.len()).map(|_| Tally::new()).collect();

    while tallies.iter().any(|t| !t.done) {
        for (file, tally) in tallies.iter_mut().enumerate() {
            if !tally.done {
                tally.step(fileset, file, &mut chunk);
            }
        }
    }
    tallies
}
