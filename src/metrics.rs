//! Read-ahead metrics.
//!
//! Process-wide counters shared by every fileset. They are exposed through
//! the `metriken` registry and can be exported by whatever the host process
//! uses for metrics.

use metriken::{Counter, Gauge, metric};

// Filesets
#[metric(
    name = "dbufio_filesets_active",
    description = "Number of filesets whose I/O thread has not been joined"
)]
pub static FILESETS_ACTIVE: Gauge = Gauge::new();

#[metric(
    name = "dbufio_panics",
    description = "Total filesets panicked"
)]
pub static PANICS: Counter = Counter::new();

// I/O thread
#[metric(
    name = "dbufio_priming_reads",
    description = "Total synchronous reads issued while creating filesets"
)]
pub static PRIMING_READS: Counter = Counter::new();

#[metric(
    name = "dbufio_background_reads",
    description = "Total reads issued by background I/O threads"
)]
pub static BACKGROUND_READS: Counter = Counter::new();

#[metric(
    name = "dbufio_bytes_read_ahead",
    description = "Total bytes read by background I/O threads"
)]
pub static BYTES_READ_AHEAD: Counter = Counter::new();

#[metric(
    name = "dbufio_read_errors",
    description = "Total reads that failed with an I/O error"
)]
pub static READ_ERRORS: Counter = Counter::new();

// Consumers
#[metric(
    name = "dbufio_swaps",
    description = "Total buffer swaps performed by consumers"
)]
pub static SWAPS: Counter = Counter::new();

#[metric(
    name = "dbufio_consumer_waits",
    description = "Total times a consumer blocked waiting for read-ahead"
)]
pub static CONSUMER_WAITS: Counter = Counter::new();

#[metric(
    name = "dbufio_bytes_delivered",
    description = "Total bytes handed to consumers"
)]
pub static BYTES_DELIVERED: Counter = Counter::new();
