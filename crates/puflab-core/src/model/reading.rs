//! PUF readings

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::RangeError;

/// Lowest accepted temperature in °C (exclusive)
pub const MIN_TEMPERATURE: f64 = -273.0;

/// Highest accepted temperature in °C (inclusive)
pub const MAX_TEMPERATURE: f64 = 250.0;

/// Highest address a reading may carry; the wire format stores addresses as `i32`
pub const MAX_ADDRESS: u32 = i32::MAX as u32;

/// One PUF measurement: the SRAM contents of `[puf_start, puf_end)` at power-up.
///
/// A `Reading` can only be built through [`Reading::new`], which checks every
/// invariant, so holding one means the addresses, fingerprint length and
/// temperature are consistent. Deserialization runs the same checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawReading")]
pub struct Reading {
    puf_start: u32,
    puf_end: u32,
    fingerprint: Vec<u8>,
    temperature: f64,
    timestamp: DateTime<Local>,
}

/// Unchecked field set a [`Reading`] is deserialized through
#[derive(Deserialize)]
struct RawReading {
    puf_start: u32,
    puf_end: u32,
    fingerprint: Vec<u8>,
    temperature: f64,
    timestamp: DateTime<Local>,
}

impl TryFrom<RawReading> for Reading {
    type Error = RangeError;

    fn try_from(raw: RawReading) -> Result<Self, Self::Error> {
        Reading::with_timestamp(
            raw.puf_start,
            raw.puf_end,
            raw.temperature,
            raw.fingerprint,
            raw.timestamp,
        )
    }
}

impl Reading {
    /// Create a reading stamped with the current local time
    pub fn new(
        puf_start: u32,
        puf_end: u32,
        temperature: f64,
        fingerprint: Vec<u8>,
    ) -> Result<Self, RangeError> {
        Self::with_timestamp(puf_start, puf_end, temperature, fingerprint, Local::now())
    }

    /// Create a reading with an explicit capture time
    pub fn with_timestamp(
        puf_start: u32,
        puf_end: u32,
        temperature: f64,
        fingerprint: Vec<u8>,
        timestamp: DateTime<Local>,
    ) -> Result<Self, RangeError> {
        for (field, address) in [("puf_start", puf_start), ("puf_end", puf_end)] {
            if address > MAX_ADDRESS {
                return Err(RangeError::new(
                    field,
                    format!(
                        "must not exceed 0x{:08X}, got 0x{:08X}",
                        MAX_ADDRESS, address
                    ),
                ));
            }
        }
        if puf_end <= puf_start {
            return Err(RangeError::new(
                "puf_end",
                format!(
                    "must be larger than puf_start 0x{:08X}, got 0x{:08X}",
                    puf_start, puf_end
                ),
            ));
        }
        let size = (puf_end - puf_start) as usize;
        if fingerprint.len() != size {
            return Err(RangeError::new(
                "fingerprint",
                format!("expected {} bytes, got {}", size, fingerprint.len()),
            ));
        }
        // NaN fails both comparisons and is rejected here as well
        if !(temperature > MIN_TEMPERATURE && temperature <= MAX_TEMPERATURE) {
            return Err(RangeError::new(
                "temperature",
                format!(
                    "expected ({}, {}] °C, got {}",
                    MIN_TEMPERATURE, MAX_TEMPERATURE, temperature
                ),
            ));
        }

        Ok(Self {
            puf_start,
            puf_end,
            fingerprint,
            temperature,
            timestamp,
        })
    }

    /// First SRAM address of the PUF region
    pub fn puf_start(&self) -> u32 {
        self.puf_start
    }

    /// End address of the PUF region (exclusive)
    pub fn puf_end(&self) -> u32 {
        self.puf_end
    }

    /// Size of the PUF region in bytes
    pub fn puf_size(&self) -> usize {
        (self.puf_end - self.puf_start) as usize
    }

    /// Raw fingerprint bytes
    pub fn fingerprint(&self) -> &[u8] {
        &self.fingerprint
    }

    /// Board temperature in °C
    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    /// Capture time
    pub fn timestamp(&self) -> DateTime<Local> {
        self.timestamp
    }

    /// True when both readings carry the same measurement, ignoring capture time
    pub fn same_measurement(&self, other: &Reading) -> bool {
        self.puf_start == other.puf_start
            && self.puf_end == other.puf_end
            && self.temperature == other.temperature
            && self.fingerprint == other.fingerprint
    }
}

impl AsRef<[u8]> for Reading {
    fn as_ref(&self) -> &[u8] {
        &self.fingerprint
    }
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "PufStart: 0x{:08X}", self.puf_start)?;
        writeln!(f, "PufEnd: 0x{:08X}", self.puf_end)?;
        writeln!(f, "PUF Size: {} Bytes", self.puf_size())?;
        write!(f, "Temperature: {}", self.temperature)
    }
}
