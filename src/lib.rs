//! Double-buffered read-ahead over a fixed set of files.
//!
//! When a storage engine merges many sorted runs it reads every run a little
//! at a time, in an order driven by the data. `dbufio` keeps one background
//! thread busy refilling buffers so those reads rarely have to wait on disk.
//!
//! - [`Fileset`]: the files, their buffers and the background I/O thread
//! - [`FilesetBuilder`]: creation options
//! - [`SlotReader`]: `std::io::Read` over one file
//! - [`config`]: TOML configuration
//! - [`metrics`]: process-wide counters
//!
//! # Example
//!
//! ```no_run
//! use dbufio::{Error, Fileset};
//!
//! let fileset = Fileset::open(["run-0.dat", "run-1.dat"], 64 * 1024)?;
//! let mut record = [0u8; 16];
//! loop {
//!     match fileset.read(0, &mut record) {
//!         Ok(n) => println!("{n} bytes"),
//!         Err(Error::EndOfStream) => break,
//!         Err(e) => {
//!             fileset.panic(e.code());
//!             break;
//!         }
//!     }
//! }
//! fileset.panic(0);
//! fileset.destroy()?;
//! # Ok::<(), dbufio::Error>(())
//! ```

pub mod config;
pub mod error;
mod fileset;
mod io_thread;
pub mod logging;
pub mod metrics;
mod queue;
mod reader;
pub mod scan;
mod slot;

pub use config::{FilesetConfig, LoggingConfig, ScanConfig};
pub use error::{Error, Result};
pub use fileset::{DEFAULT_BUFFER_SIZE, DEFAULT_THREAD_NAME, Fileset, FilesetBuilder};
pub use reader::SlotReader;
