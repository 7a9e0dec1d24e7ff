//! Acquisition
//!
//! Drives the serial link to a board: single reads, automatic listening and
//! the reconnect test procedure. Decoded readings go to a [`ReadingStore`].
//!
//! [`ReadingStore`]: crate::store::ReadingStore

mod auto;
mod config;
mod error;
mod framing;
mod session;
mod test_procedure;

pub use auto::{AutoRunner, AutoSummary, StopHandle};
pub use config::{
    AcquisitionConfig, FramingMode, DEFAULT_PACKET_WINDOW_MS, DEFAULT_READ_BUFFER_SIZE,
    DEFAULT_READ_TIMEOUT_MS, DEFAULT_RECONNECT_SETTLE_MS, DEFAULT_RECONNECT_WINDOW_MS,
    DEFAULT_RETRY_INTERVAL_MS, DEFAULT_SETTLE_DELAY_MS,
};
pub use error::AcquisitionError;
pub use framing::Received;
pub use session::{AcquisitionSession, Acquired, SessionCounters, SessionState, TestPhase};
pub use test_procedure::TestSummary;
