//! Acquisition session
//!
//! Owns the serial link to one board and drives it through the
//! open / read / decode cycle. Every operation takes `&mut self`, so only one
//! can be in flight at a time.

use chrono::Local;
use serde::Serialize;
use std::fmt;
use std::io::{self, ErrorKind, Read};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use super::framing::{read_framed, Received};
use super::{AcquisitionConfig, AcquisitionError, FramingMode};
use crate::protocol::{self, PacketError, PacketSummary, PortChannel, PortOpener, MIN_PACKET_SIZE};
use crate::store::{ReadingId, ReadingStore, StoredBoard};

/// Phase of the reconnect test procedure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TestPhase {
    /// Port closed, operator replugs the board
    Disconnected,
    /// Trying to reopen the port
    WaitingReconnect,
    /// Port reopened, waiting for the board's packet
    WaitingPacket,
}

impl fmt::Display for TestPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestPhase::Disconnected => f.write_str("disconnected"),
            TestPhase::WaitingReconnect => f.write_str("waiting for reconnect"),
            TestPhase::WaitingPacket => f.write_str("waiting for packet"),
        }
    }
}

/// Session state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionState {
    /// No port open
    Closed,
    /// Open in progress
    Opening,
    /// Port open and idle
    Open,
    /// A read or receive is outstanding
    Reading,
    /// Automatic mode is listening
    Auto,
    /// The reconnect test procedure is running
    Test(TestPhase),
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Closed => f.write_str("closed"),
            SessionState::Opening => f.write_str("opening"),
            SessionState::Open => f.write_str("open"),
            SessionState::Reading => f.write_str("reading"),
            SessionState::Auto => f.write_str("in automatic mode"),
            SessionState::Test(phase) => write!(f, "testing ({})", phase),
        }
    }
}

/// What became of a received packet
#[derive(Debug, Clone, PartialEq)]
pub enum Acquired {
    /// Decoded and handed to the store
    Stored {
        /// Board the reading belongs to
        board: StoredBoard,
        /// Store key of the reading
        id: ReadingId,
    },
    /// Framing checked only (local mode)
    Checked(PacketSummary),
}

/// Cumulative session counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SessionCounters {
    /// Bytes received
    pub rx_bytes: u64,
    /// Packets accepted
    pub packets: u64,
    /// Packets discarded as malformed
    pub rejected: u64,
}

/// Serial acquisition session for one board at a time
pub struct AcquisitionSession<O: PortOpener, S: ReadingStore> {
    pub(super) opener: O,
    /// The only handle to the port
    pub(super) port: Option<Box<dyn PortChannel>>,
    /// Last port opened successfully (or configured)
    pub(super) port_name: String,
    pub(super) state: SessionState,
    pub(super) config: AcquisitionConfig,
    pub(super) store: S,
    /// Check packets without storing them
    pub(super) local_mode: bool,
    /// Bytes of the last read or packet
    pub(super) last_buffer: Vec<u8>,
    pub(super) counters: SessionCounters,
}

impl<O: PortOpener, S: ReadingStore> AcquisitionSession<O, S> {
    /// Create a closed session, rejecting a configuration that fails
    /// [`AcquisitionConfig::validate`]
    pub fn new(config: AcquisitionConfig, opener: O, store: S) -> Result<Self, AcquisitionError> {
        config.validate()?;
        Ok(Self {
            opener,
            port: None,
            port_name: config.port_name.clone(),
            state: SessionState::Closed,
            config,
            store,
            local_mode: false,
            last_buffer: Vec::new(),
            counters: SessionCounters::default(),
        })
    }

    /// Current state
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Selected port name
    pub fn port_name(&self) -> &str {
        &self.port_name
    }

    /// Whether a port handle is held
    pub fn is_open(&self) -> bool {
        self.port.is_some()
    }

    /// Session configuration
    pub fn config(&self) -> &AcquisitionConfig {
        &self.config
    }

    /// The reading store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The reading store, mutably
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Consume the session, returning the store
    pub fn into_store(self) -> S {
        self.store
    }

    /// Whether local mode is active
    pub fn is_local_mode(&self) -> bool {
        self.local_mode
    }

    /// In local mode packets are checked but never handed to the store
    pub fn set_local_mode(&mut self, enabled: bool) {
        self.local_mode = enabled;
        tracing::info!(enabled, "local mode");
    }

    /// Bytes of the last read or received packet, malformed ones included.
    /// Empty if the last read timed out.
    pub fn last_buffer(&self) -> &[u8] {
        &self.last_buffer
    }

    /// Cumulative counters
    pub fn counters(&self) -> SessionCounters {
        self.counters
    }

    pub(super) fn expect_state(
        &self,
        operation: &'static str,
        allowed: &[SessionState],
    ) -> Result<(), AcquisitionError> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(AcquisitionError::InvalidState {
                operation,
                state: self.state,
            })
        }
    }

    /// Back to `Open` if the port survived the operation, `Closed` otherwise
    pub(super) fn restore_idle(&mut self) {
        self.state = if self.port.is_some() {
            SessionState::Open
        } else {
            SessionState::Closed
        };
    }

    pub(super) fn channel(
        &mut self,
        operation: &'static str,
    ) -> Result<&mut dyn PortChannel, AcquisitionError> {
        match self.port.as_mut() {
            Some(channel) => Ok(channel.as_mut()),
            None => Err(AcquisitionError::InvalidState {
                operation,
                state: self.state,
            }),
        }
    }

    pub(super) fn open_channel(&self, name: &str) -> io::Result<Box<dyn PortChannel>> {
        self.opener
            .open(name, self.config.baud_rate, self.config.read_timeout())
    }

    /// Drop the handle after a port failure and wrap the error
    pub(super) fn fail_io(&mut self, source: io::Error) -> AcquisitionError {
        tracing::warn!(port = %self.port_name, "port failure, closing: {}", source);
        self.port = None;
        self.state = SessionState::Closed;
        AcquisitionError::Io {
            port: self.port_name.clone(),
            source,
        }
    }

    /// Open `port_name`.
    ///
    /// On failure the session stays closed and the previously selected port
    /// name is kept.
    pub fn open(&mut self, port_name: &str) -> Result<(), AcquisitionError> {
        self.expect_state("open", &[SessionState::Closed])?;
        self.state = SessionState::Opening;

        match self.open_channel(port_name) {
            Ok(channel) => {
                self.port = Some(channel);
                self.port_name = port_name.to_string();
                self.state = SessionState::Open;
                tracing::info!(port = port_name, baud = self.config.baud_rate, "opened port");
                Ok(())
            }
            Err(source) => {
                self.state = SessionState::Closed;
                tracing::warn!(port = port_name, "failed to open port: {}", source);
                Err(AcquisitionError::Io {
                    port: port_name.to_string(),
                    source,
                })
            }
        }
    }

    /// Open the previously selected port
    pub fn reopen(&mut self) -> Result<(), AcquisitionError> {
        if self.port_name.is_empty() {
            return Err(AcquisitionError::Config("no port selected".into()));
        }
        let name = self.port_name.clone();
        self.open(&name)
    }

    /// Close the port. Closing a closed session is a no-op.
    pub fn close(&mut self) {
        if self.port.take().is_some() {
            tracing::info!(port = %self.port_name, "closed port");
        }
        self.state = SessionState::Closed;
    }

    /// Discard everything received but not yet read
    pub fn flush(&mut self) -> Result<(), AcquisitionError> {
        self.expect_state("flush", &[SessionState::Open])?;
        self.clear_input()?;
        tracing::debug!(port = %self.port_name, "input flushed");
        Ok(())
    }

    pub(super) fn clear_input(&mut self) -> Result<(), AcquisitionError> {
        let result = match self.port.as_mut() {
            Some(channel) => channel.clear_input_buffer(),
            None => return Ok(()),
        };
        result.map_err(|e| self.fail_io(e))
    }

    pub(super) fn bytes_available(&mut self) -> Result<usize, AcquisitionError> {
        let result = self.channel("poll")?.bytes_to_read();
        result.map(|n| n as usize).map_err(|e| self.fail_io(e))
    }

    /// One blocking read bounded by `timeout` into the session buffer
    pub(super) fn read_into_buffer(&mut self, timeout: Duration) -> Result<usize, AcquisitionError> {
        let mut buf = vec![0u8; self.config.read_buffer_size];
        let channel = self.channel("read")?;
        let result = match channel.set_timeout(timeout) {
            Ok(()) => channel.read(&mut buf),
            Err(e) => Err(e),
        };

        match result {
            Ok(n) => {
                buf.truncate(n);
                self.last_buffer = buf;
                self.counters.rx_bytes += n as u64;
                Ok(n)
            }
            Err(e) if e.kind() == ErrorKind::TimedOut || e.kind() == ErrorKind::WouldBlock => {
                self.last_buffer.clear();
                Ok(0)
            }
            Err(e) => Err(self.fail_io(e)),
        }
    }

    /// Block until bytes arrive or `timeout` elapses.
    ///
    /// Returns the number of bytes read; `0` means the timeout passed without
    /// data, which is not an error.
    pub fn read_once(&mut self, timeout: Duration) -> Result<usize, AcquisitionError> {
        self.expect_state("read", &[SessionState::Open])?;
        self.state = SessionState::Reading;
        let result = self.read_into_buffer(timeout);
        self.restore_idle();

        match &result {
            Ok(0) => tracing::debug!(port = %self.port_name, "no data within timeout"),
            Ok(n) => tracing::info!(port = %self.port_name, bytes = n, "read data"),
            Err(_) => {}
        }
        result
    }

    /// One raw read followed by decoding, as the board sends one packet per reset
    pub fn read_and_decode(&mut self, timeout: Duration) -> Result<Option<Acquired>, AcquisitionError> {
        if self.read_once(timeout)? == 0 {
            return Ok(None);
        }
        let packet = self.last_buffer.clone();
        self.handle_packet(&packet)
    }

    /// Wait up to `window` for one packet using the configured framing
    pub fn receive_packet(&mut self, window: Duration) -> Result<Received, AcquisitionError> {
        self.expect_state("receive", &[SessionState::Open])?;
        self.state = SessionState::Reading;
        let result = self.receive(window);
        self.restore_idle();
        result
    }

    /// Receive one packet within `window` and decode it
    pub fn acquire_packet(&mut self, window: Duration) -> Result<Option<Acquired>, AcquisitionError> {
        self.expect_state("acquire", &[SessionState::Open])?;
        self.state = SessionState::Reading;
        let result = self.acquire(window);
        self.restore_idle();
        result
    }

    pub(super) fn acquire(&mut self, window: Duration) -> Result<Option<Acquired>, AcquisitionError> {
        match self.receive(window)? {
            Received::Packet(bytes) => self.handle_packet(&bytes),
            Received::Malformed(_) | Received::Nothing => Ok(None),
        }
    }

    pub(super) fn receive(&mut self, window: Duration) -> Result<Received, AcquisitionError> {
        match self.config.framing {
            FramingMode::Length => self.receive_framed(window),
            FramingMode::SettleDelay => self.receive_settled(window),
        }
    }

    fn receive_framed(&mut self, window: Duration) -> Result<Received, AcquisitionError> {
        let poll = self.config.retry_interval();
        let mut raw = Vec::new();
        let result = read_framed(self.channel("receive")?, window, poll, &mut raw);

        match result {
            Ok(Received::Nothing) => Ok(Received::Nothing),
            Ok(received) => {
                self.counters.rx_bytes += raw.len() as u64;
                self.last_buffer = raw;
                if let Received::Malformed(e) = &received {
                    self.reject(e, self.last_buffer.len());
                    // Resynchronize on the next packet
                    self.clear_input()?;
                }
                Ok(received)
            }
            Err(e) => Err(self.fail_io(e)),
        }
    }

    fn receive_settled(&mut self, window: Duration) -> Result<Received, AcquisitionError> {
        let deadline = Instant::now() + window;
        let poll = self.config.retry_interval();

        loop {
            if self.bytes_available()? >= MIN_PACKET_SIZE {
                break;
            }
            let now = Instant::now();
            if now >= deadline {
                return Ok(Received::Nothing);
            }
            std::thread::sleep((deadline - now).min(poll));
        }

        tracing::debug!(
            settle_ms = self.config.settle_delay_ms,
            "data received, waiting for the rest of the packet"
        );
        std::thread::sleep(self.config.settle_delay());

        if self.read_into_buffer(self.config.read_timeout())? == 0 {
            return Ok(Received::Nothing);
        }
        Ok(Received::Packet(self.last_buffer.clone()))
    }

    fn reject(&mut self, error: &PacketError, bytes: usize) {
        self.counters.rejected += 1;
        tracing::warn!(
            port = %self.port_name,
            field = ?error.field(),
            bytes,
            "discarding packet: {}",
            error
        );
    }

    /// Decode a packet and hand it to the store, or only check it in local mode.
    ///
    /// Malformed packets are logged and discarded; they yield `Ok(None)`.
    pub(super) fn handle_packet(&mut self, packet: &[u8]) -> Result<Option<Acquired>, AcquisitionError> {
        if self.local_mode {
            return match protocol::check(packet) {
                Ok(summary) => {
                    self.counters.packets += 1;
                    tracing::info!(
                        uid = %summary.uid,
                        bytes = summary.packet_len,
                        "packet ok (local mode, not stored)"
                    );
                    Ok(Some(Acquired::Checked(summary)))
                }
                Err(e) => {
                    self.reject(&e, packet.len());
                    Ok(None)
                }
            };
        }

        match protocol::decode(packet) {
            Ok((board, reading)) => {
                let stored = self
                    .store
                    .find_or_create_board(board.specifier(), board.uid())?;
                tracing::info!(
                    board = %board,
                    puf_start = reading.puf_start(),
                    puf_size = reading.puf_size(),
                    temperature = reading.temperature(),
                    "packet received"
                );
                let id = self.store.save_reading(&stored, reading)?;
                self.counters.packets += 1;
                Ok(Some(Acquired::Stored { board: stored, id }))
            }
            Err(e) => {
                self.reject(&e, packet.len());
                Ok(None)
            }
        }
    }

    /// Write the last read bytes to `dir/puflab-YYYYMMDD-HHMMSS.bin`
    pub fn save_last_buffer(&self, dir: impl AsRef<Path>) -> Result<PathBuf, AcquisitionError> {
        if self.last_buffer.is_empty() {
            return Err(AcquisitionError::NoData);
        }
        let name = format!("puflab-{}.bin", Local::now().format("%Y%m%d-%H%M%S"));
        let path = dir.as_ref().join(name);
        std::fs::write(&path, &self.last_buffer).map_err(|source| AcquisitionError::Write {
            path: path.clone(),
            source,
        })?;
        tracing::info!(path = %path.display(), bytes = self.last_buffer.len(), "stored raw data");
        Ok(path)
    }
}
