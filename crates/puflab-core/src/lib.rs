//! # puflab Core Library
//!
//! Acquisition and evaluation of SRAM PUF fingerprints.

#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//!
//! This library provides:
//! - The binary packet format sent by the board firmware
//! - Serial acquisition: single reads, automatic mode and the reconnect test procedure
//! - PUF quality metrics (uniformity, reliability, uniqueness)
//! - A store interface for boards and readings
//! - CSV and PNG reports
//!
//! ## Supported Boards
//!
//! - STM32 Nucleo F401RE
//! - STM32 Nucleo F446RE
//!
//! ## Example
//!
//! ```rust,ignore
//! use puflab_core::prelude::*;
//! use std::time::Duration;
//!
//! let config = AcquisitionConfig::for_port("/dev/ttyACM0");
//! let mut session = AcquisitionSession::new(config, SerialOpener, MemoryStore::new())?;
//! session.reopen()?;
//!
//! // One packet per board reset
//! if let Some(acquired) = session.acquire_packet(Duration::from_secs(15))? {
//!     println!("{:?}", acquired);
//! }
//! ```

pub mod acquisition;
pub mod demo;
pub mod model;
pub mod protocol;
pub mod report;
pub mod stats;
pub mod store;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::acquisition::{
        AcquisitionConfig, AcquisitionError, AcquisitionSession, Acquired, FramingMode,
        SessionState, StopHandle,
    };
    pub use crate::model::{Board, BoardSpecifier, Reading, Uid};
    pub use crate::protocol::{decode, PacketError, SerialOpener};
    pub use crate::report::{Metric, MetricPipeline};
    pub use crate::stats::{known_fingerprint, reliability, uniformity, uniqueness};
    pub use crate::store::{MemoryStore, ReadingQuery, ReadingStore};
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
