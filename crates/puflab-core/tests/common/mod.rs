//! Shared test helpers: a scripted in-memory serial link

#![allow(dead_code)]

use std::collections::VecDeque;
use std::io::{self, ErrorKind, Read};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::{Duration, Instant};

use puflab_core::acquisition::{AcquisitionConfig, StopHandle};
use puflab_core::model::{Board, BoardSpecifier, Reading, Uid};
use puflab_core::protocol::{PacketBuilder, PortChannel, PortOpener};

/// Install a test subscriber once; `RUST_LOG` selects the level
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Timings short enough for tests
pub fn fast_config() -> AcquisitionConfig {
    AcquisitionConfig {
        port_name: "fake0".into(),
        read_timeout_ms: 200,
        settle_delay_ms: 20,
        reconnect_settle_ms: 5,
        reconnect_window_ms: 100,
        packet_window_ms: 200,
        retry_interval_ms: 5,
        ..AcquisitionConfig::default()
    }
}

pub fn test_board() -> Board {
    Board::new(
        BoardSpecifier::NucleoF401RE,
        Uid::new(0x0035_0047, 0x3138_5111, 0x3036_3831),
    )
}

/// A valid packet with `size` fingerprint bytes of `fill`
pub fn packet(size: usize, fill: u8, temperature: f64) -> Vec<u8> {
    PacketBuilder::new(&test_board())
        .addresses(0x2000_0000, 0x2000_0000 + size as u32)
        .temperature(temperature)
        .fingerprint(&vec![fill; size])
        .build()
}

pub fn reading(fingerprint: Vec<u8>) -> Reading {
    let end = 0x2000_0000 + fingerprint.len() as u32;
    Reading::new(0x2000_0000, end, 25.0, fingerprint).unwrap()
}

#[derive(Default)]
struct LinkState {
    /// Whether the board is plugged in
    connected: bool,
    rx: VecDeque<u8>,
    /// Packets the board sends after each successful open
    on_open: VecDeque<Vec<u8>>,
    /// Delivered on the first access after an open
    pending: Option<Vec<u8>>,
    /// Largest number of bytes handed out per read
    chunk: Option<usize>,
    fail_reads: bool,
    opens: usize,
    /// Raised once the last scripted packet has been handed out
    stop_when_drained: Option<StopHandle>,
}

impl LinkState {
    fn deliver_pending(&mut self) {
        if let Some(bytes) = self.pending.take() {
            self.rx.extend(bytes);
        }
    }
}

/// Both ends of the fake link; clones share state
#[derive(Clone)]
pub struct FakeLink {
    state: Arc<Mutex<LinkState>>,
}

impl FakeLink {
    pub fn new() -> Self {
        let link = Self {
            state: Arc::new(Mutex::new(LinkState::default())),
        };
        link.lock().connected = true;
        link
    }

    fn lock(&self) -> MutexGuard<'_, LinkState> {
        self.state.lock().unwrap()
    }

    pub fn opener(&self) -> FakeOpener {
        FakeOpener { link: self.clone() }
    }

    /// Bytes arriving from the board now
    pub fn push(&self, bytes: &[u8]) {
        self.lock().rx.extend(bytes.iter().copied());
    }

    pub fn set_connected(&self, connected: bool) {
        self.lock().connected = connected;
    }

    pub fn set_chunk(&self, chunk: usize) {
        self.lock().chunk = Some(chunk);
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.lock().fail_reads = fail;
    }

    pub fn send_on_open(&self, packet: Vec<u8>) {
        self.lock().on_open.push_back(packet);
    }

    pub fn stop_when_drained(&self, stop: StopHandle) {
        self.lock().stop_when_drained = Some(stop);
    }

    pub fn opens(&self) -> usize {
        self.lock().opens
    }

    pub fn buffered(&self) -> usize {
        let state = self.lock();
        state.rx.len() + state.pending.as_ref().map_or(0, Vec::len)
    }

    /// Wait until the session has read everything, up to `limit`
    pub fn wait_drained(&self, limit: Duration) -> bool {
        let deadline = Instant::now() + limit;
        while Instant::now() < deadline {
            if self.buffered() == 0 {
                return true;
            }
            thread::sleep(Duration::from_millis(5));
        }
        false
    }
}

pub struct FakeOpener {
    link: FakeLink,
}

impl PortOpener for FakeOpener {
    fn open(&self, name: &str, _baud_rate: u32, timeout: Duration) -> io::Result<Box<dyn PortChannel>> {
        let mut state = self.link.lock();
        if !state.connected {
            return Err(io::Error::new(ErrorKind::NotFound, format!("{} not present", name)));
        }
        state.opens += 1;
        state.rx.clear();
        state.pending = state.on_open.pop_front();
        if state.pending.is_some() && state.on_open.is_empty() {
            if let Some(stop) = &state.stop_when_drained {
                stop.stop();
            }
        }
        Ok(Box::new(FakeChannel {
            link: self.link.clone(),
            timeout,
        }))
    }
}

pub struct FakeChannel {
    link: FakeLink,
    timeout: Duration,
}

impl Read for FakeChannel {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        {
            let mut state = self.link.lock();
            if state.fail_reads {
                return Err(io::Error::new(ErrorKind::BrokenPipe, "device unplugged"));
            }
            state.deliver_pending();
            if !state.rx.is_empty() {
                let limit = state.chunk.unwrap_or(usize::MAX).min(buf.len());
                let n = limit.min(state.rx.len());
                for (slot, byte) in buf.iter_mut().zip(state.rx.drain(..n)) {
                    *slot = byte;
                }
                return Ok(n);
            }
        }
        thread::sleep(self.timeout.min(Duration::from_millis(10)));
        Err(io::Error::new(ErrorKind::TimedOut, "Operation timed out"))
    }
}

impl PortChannel for FakeChannel {
    fn set_timeout(&mut self, timeout: Duration) -> io::Result<()> {
        self.timeout = timeout;
        Ok(())
    }

    fn bytes_to_read(&mut self) -> io::Result<u32> {
        let mut state = self.link.lock();
        if state.fail_reads {
            return Err(io::Error::new(ErrorKind::BrokenPipe, "device unplugged"));
        }
        state.deliver_pending();
        Ok(state.rx.len() as u32)
    }

    fn clear_input_buffer(&mut self) -> io::Result<()> {
        self.link.lock().rx.clear();
        Ok(())
    }

    fn try_clone(&self) -> io::Result<Box<dyn PortChannel>> {
        Ok(Box::new(FakeChannel {
            link: self.link.clone(),
            timeout: self.timeout,
        }))
    }
}
