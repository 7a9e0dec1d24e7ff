//! Packet errors

use thiserror::Error;

use crate::model::RangeError;

/// Errors that can occur while decoding a packet
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PacketError {
    #[error("Packet too short: expected at least {expected} bytes, got {actual}")]
    Size { expected: usize, actual: usize },

    #[error("Protocol error: {0}")]
    Protocol(&'static str),

    #[error(transparent)]
    Range(#[from] RangeError),
}

impl PacketError {
    /// Name of the offending field for range errors
    pub fn field(&self) -> Option<&'static str> {
        match self {
            PacketError::Range(e) => Some(e.field),
            _ => None,
        }
    }
}
