//! Acquisition errors

use std::path::PathBuf;
use thiserror::Error;

use super::{SessionState, TestPhase};
use crate::store::StoreError;

/// Errors that can occur while driving the serial link
#[derive(Error, Debug)]
pub enum AcquisitionError {
    #[error("I/O error on {port}: {source}")]
    Io {
        port: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Timed out during test procedure ({phase})")]
    Timeout { phase: TestPhase },

    #[error("Cannot {operation} while {state}")]
    InvalidState {
        operation: &'static str,
        state: SessionState,
    },

    #[error("No data has been read yet")]
    NoData,

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}
