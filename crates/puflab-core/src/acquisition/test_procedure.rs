//! Reconnect test procedure
//!
//! Repeatedly closes the port, waits for the operator to replug the board,
//! reopens it and stores the packet the board sends after reset. Runs until
//! stopped or until a phase times out.

use std::thread;
use std::time::Instant;

use super::framing::Received;
use super::{AcquisitionError, AcquisitionSession, SessionState, StopHandle, TestPhase};
use crate::protocol::PortOpener;
use crate::store::ReadingStore;

/// Result of a test procedure run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TestSummary {
    /// Completed reconnect cycles
    pub cycles: u64,
    /// Packets discarded during the run
    pub rejected: u64,
}

impl<O: PortOpener, S: ReadingStore> AcquisitionSession<O, S> {
    /// Run reconnect cycles until `stop` is raised.
    ///
    /// A reconnect that does not succeed within the reconnect window, or a
    /// packet that does not arrive within the packet window, ends the run
    /// with [`AcquisitionError::Timeout`] and the port closed.
    pub fn run_test_procedure(&mut self, stop: &StopHandle) -> Result<TestSummary, AcquisitionError> {
        self.expect_state(
            "run test procedure",
            &[SessionState::Open, SessionState::Closed],
        )?;
        if self.port_name.is_empty() {
            return Err(AcquisitionError::Config("no port selected".into()));
        }
        tracing::info!(port = %self.port_name, "starting test procedure");

        let rejected = self.counters.rejected;
        let mut cycles = 0;
        let result = self.test_cycles(stop, &mut cycles);
        self.restore_idle();

        tracing::info!(cycles, "test procedure finished");
        result.map(|()| TestSummary {
            cycles,
            rejected: self.counters.rejected - rejected,
        })
    }

    fn test_cycles(&mut self, stop: &StopHandle, cycles: &mut u64) -> Result<(), AcquisitionError> {
        while !stop.is_stopped() {
            self.reconnect()?;
            self.clear_input()?;

            self.state = SessionState::Test(TestPhase::WaitingPacket);
            tracing::info!(
                window_ms = self.config.packet_window_ms,
                "board connected, waiting for packet"
            );

            match self.receive(self.config.packet_window())? {
                Received::Nothing => {
                    self.close();
                    tracing::warn!("no packet within the packet window");
                    return Err(AcquisitionError::Timeout {
                        phase: TestPhase::WaitingPacket,
                    });
                }
                Received::Packet(bytes) => {
                    self.handle_packet(&bytes)?;
                }
                // Already logged and counted
                Received::Malformed(_) => {}
            }

            *cycles += 1;
            tracing::info!(cycle = *cycles, "cycle complete, replug the board");
        }
        Ok(())
    }

    fn reconnect(&mut self) -> Result<(), AcquisitionError> {
        self.port = None;
        self.state = SessionState::Test(TestPhase::Disconnected);
        tracing::info!(
            settle_ms = self.config.reconnect_settle_ms,
            "port closed, reconnect the board"
        );
        thread::sleep(self.config.reconnect_settle());

        self.state = SessionState::Test(TestPhase::WaitingReconnect);
        let deadline = Instant::now() + self.config.reconnect_window();
        loop {
            match self.open_channel(&self.port_name) {
                Ok(channel) => {
                    self.port = Some(channel);
                    tracing::info!(port = %self.port_name, "port reopened");
                    return Ok(());
                }
                Err(e) => {
                    if Instant::now() >= deadline {
                        self.state = SessionState::Closed;
                        tracing::warn!(port = %self.port_name, "board did not come back: {}", e);
                        return Err(AcquisitionError::Timeout {
                            phase: TestPhase::WaitingReconnect,
                        });
                    }
                    tracing::debug!(port = %self.port_name, "board not yet connected: {}", e);
                    thread::sleep(self.config.retry_interval());
                }
            }
        }
    }
}
