//! Acquisition configuration

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use super::AcquisitionError;
use crate::protocol::{DEFAULT_BAUD_RATE, MAX_PACKET_SIZE};

/// Default timeout of a single blocking read
pub const DEFAULT_READ_TIMEOUT_MS: u64 = 10_000;

/// Default wait after the first bytes of a packet arrive (settle framing)
pub const DEFAULT_SETTLE_DELAY_MS: u64 = 1_000;

/// Default time given to the operator to replug the board during the test procedure
pub const DEFAULT_RECONNECT_SETTLE_MS: u64 = 15_000;

/// Default window for reopening the port after the settle time
pub const DEFAULT_RECONNECT_WINDOW_MS: u64 = 5_000;

/// Default window for a full packet to arrive after reconnecting
pub const DEFAULT_PACKET_WINDOW_MS: u64 = 15_000;

/// Default sleep between polls and reopen attempts
pub const DEFAULT_RETRY_INTERVAL_MS: u64 = 500;

/// Default receive buffer size, large enough for the largest packet
pub const DEFAULT_READ_BUFFER_SIZE: usize = MAX_PACKET_SIZE;

/// How packet boundaries are found on the byte stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FramingMode {
    /// Read the header, then exactly the number of bytes it announces
    #[default]
    Length,
    /// Wait `settle_delay_ms` once a minimal packet is buffered, then take
    /// whatever arrived. Matches the timing of older firmware.
    SettleDelay,
}

/// Acquisition configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AcquisitionConfig {
    /// Serial port name
    pub port_name: String,
    /// Baud rate
    pub baud_rate: u32,
    /// Timeout of a single blocking read in milliseconds
    pub read_timeout_ms: u64,
    /// Packet framing strategy
    pub framing: FramingMode,
    /// Settle delay for [`FramingMode::SettleDelay`]
    pub settle_delay_ms: u64,
    /// Time to replug the board during the test procedure
    pub reconnect_settle_ms: u64,
    /// Window for reopening the port
    pub reconnect_window_ms: u64,
    /// Window for a packet after reconnecting
    pub packet_window_ms: u64,
    /// Sleep between polls and retries
    pub retry_interval_ms: u64,
    /// Receive buffer size for raw reads; at least [`MAX_PACKET_SIZE`]
    pub read_buffer_size: usize,
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            port_name: String::new(),
            baud_rate: DEFAULT_BAUD_RATE,
            read_timeout_ms: DEFAULT_READ_TIMEOUT_MS,
            framing: FramingMode::Length,
            settle_delay_ms: DEFAULT_SETTLE_DELAY_MS,
            reconnect_settle_ms: DEFAULT_RECONNECT_SETTLE_MS,
            reconnect_window_ms: DEFAULT_RECONNECT_WINDOW_MS,
            packet_window_ms: DEFAULT_PACKET_WINDOW_MS,
            retry_interval_ms: DEFAULT_RETRY_INTERVAL_MS,
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
        }
    }
}

impl AcquisitionConfig {
    /// Create a configuration for `port_name` with default timings
    pub fn for_port(port_name: impl Into<String>) -> Self {
        Self {
            port_name: port_name.into(),
            ..Self::default()
        }
    }

    /// Parse and validate a JSON configuration; missing keys take defaults
    pub fn from_json_str(json: &str) -> Result<Self, AcquisitionError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| AcquisitionError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON configuration file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, AcquisitionError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| AcquisitionError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&content)
    }

    /// Reject settings the session cannot work with
    pub fn validate(&self) -> Result<(), AcquisitionError> {
        if self.baud_rate == 0 {
            return Err(AcquisitionError::Config("baud_rate must be positive".into()));
        }
        if self.read_buffer_size < MAX_PACKET_SIZE {
            return Err(AcquisitionError::Config(format!(
                "read_buffer_size must hold at least {} bytes, got {}",
                MAX_PACKET_SIZE, self.read_buffer_size
            )));
        }
        if self.retry_interval_ms == 0 {
            return Err(AcquisitionError::Config("retry_interval_ms must be positive".into()));
        }
        Ok(())
    }

    /// Read timeout as a duration
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    /// Settle delay as a duration
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    /// Reconnect settle time as a duration
    pub fn reconnect_settle(&self) -> Duration {
        Duration::from_millis(self.reconnect_settle_ms)
    }

    /// Reconnect window as a duration
    pub fn reconnect_window(&self) -> Duration {
        Duration::from_millis(self.reconnect_window_ms)
    }

    /// Packet window as a duration
    pub fn packet_window(&self) -> Duration {
        Duration::from_millis(self.packet_window_ms)
    }

    /// Retry interval as a duration
    pub fn retry_interval(&self) -> Duration {
        Duration::from_millis(self.retry_interval_ms)
    }
}
