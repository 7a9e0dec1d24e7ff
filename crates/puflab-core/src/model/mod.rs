//! Data model
//!
//! Board identities and the readings taken from them.

mod board;
mod reading;

pub use board::{Board, BoardSpecifier, Uid, UID_WORDS};
pub use reading::{Reading, MAX_ADDRESS, MAX_TEMPERATURE, MIN_TEMPERATURE};

use thiserror::Error;

/// A field violates its domain
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{field} out of range: {message}")]
pub struct RangeError {
    /// Name of the offending field
    pub field: &'static str,
    /// Expected vs. actual value
    pub message: String,
}

impl RangeError {
    /// Create a range error for `field`
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}
