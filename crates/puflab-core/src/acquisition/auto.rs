//! Automatic mode
//!
//! A notifier thread watches a clone of the port and posts into a
//! single-slot channel whenever a packet's worth of bytes is buffered. The
//! session thread is the only consumer; it runs one receive and decode cycle
//! per notification, so two cycles never overlap.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender, TrySendError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use super::{AcquisitionError, AcquisitionSession, SessionState};
use crate::protocol::{PortChannel, PortOpener, MIN_PACKET_SIZE};
use crate::store::ReadingStore;

/// Cooperative cancellation flag shared between threads
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    /// New, not stopped
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a stop
    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether a stop was requested
    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Result of an automatic mode run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AutoSummary {
    /// Notifications received from the watcher
    pub notifications: u64,
    /// Packets accepted during the run
    pub packets: u64,
    /// Packets discarded during the run
    pub rejected: u64,
}

#[derive(Debug)]
enum Notification {
    DataAvailable(u32),
    PortError(io::Error),
}

fn spawn_notifier(
    mut watcher: Box<dyn PortChannel>,
    tx: SyncSender<Notification>,
    done: Arc<AtomicBool>,
    poll: Duration,
) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("puflab-notifier".into())
        .spawn(move || {
            while !done.load(Ordering::SeqCst) {
                match watcher.bytes_to_read() {
                    Ok(n) if n as usize >= MIN_PACKET_SIZE => {
                        // A full slot means a cycle is already pending
                        if let Err(TrySendError::Disconnected(_)) =
                            tx.try_send(Notification::DataAvailable(n))
                        {
                            break;
                        }
                    }
                    Ok(_) => {}
                    Err(e) => {
                        let _ = tx.send(Notification::PortError(e));
                        break;
                    }
                }
                thread::sleep(poll);
            }
        })
}

impl<O: PortOpener, S: ReadingStore> AcquisitionSession<O, S> {
    /// Listen for packets until `stop` is raised.
    ///
    /// Every packet is decoded and stored as it arrives. Returns with the
    /// session back in `Open`, or `Closed` if the port failed.
    pub fn auto_loop(&mut self, stop: &StopHandle) -> Result<AutoSummary, AcquisitionError> {
        const OPERATION: &str = "start automatic mode";
        self.expect_state(OPERATION, &[SessionState::Open])?;
        self.clear_input()?;

        let watcher = self.channel(OPERATION)?.try_clone();
        let watcher = watcher.map_err(|e| self.fail_io(e))?;

        let (tx, rx) = mpsc::sync_channel(1);
        let done = Arc::new(AtomicBool::new(false));
        let notifier = spawn_notifier(watcher, tx, done.clone(), self.config.retry_interval())
            .map_err(|source| AcquisitionError::Io {
                port: self.port_name.clone(),
                source,
            })?;

        self.state = SessionState::Auto;
        tracing::info!(port = %self.port_name, "automatic mode started");

        let start = self.counters;
        let mut notifications = 0;
        let result = self.consume(&rx, stop, &mut notifications);

        done.store(true, Ordering::SeqCst);
        drop(rx);
        if notifier.join().is_err() {
            tracing::error!("notifier thread panicked");
        }
        self.restore_idle();

        let summary = AutoSummary {
            notifications,
            packets: self.counters.packets - start.packets,
            rejected: self.counters.rejected - start.rejected,
        };
        tracing::info!(
            packets = summary.packets,
            rejected = summary.rejected,
            "automatic mode stopped"
        );
        result.map(|()| summary)
    }

    fn consume(
        &mut self,
        rx: &Receiver<Notification>,
        stop: &StopHandle,
        notifications: &mut u64,
    ) -> Result<(), AcquisitionError> {
        let poll = self.config.retry_interval();
        let window = self.config.read_timeout();

        while !stop.is_stopped() {
            match rx.recv_timeout(poll) {
                Ok(Notification::DataAvailable(n)) => {
                    *notifications += 1;
                    // Posted while the previous cycle was still reading
                    if self.bytes_available()? < MIN_PACKET_SIZE {
                        tracing::trace!(bytes = n, "stale notification");
                        continue;
                    }
                    tracing::debug!(bytes = n, "data received");
                    self.acquire(window)?;
                }
                Ok(Notification::PortError(e)) => return Err(self.fail_io(e)),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        Ok(())
    }
}

/// Session running automatic mode on a background thread
pub struct AutoRunner<O: PortOpener, S: ReadingStore> {
    stop: StopHandle,
    handle: JoinHandle<(AcquisitionSession<O, S>, Result<AutoSummary, AcquisitionError>)>,
}

impl<O: PortOpener + 'static, S: ReadingStore + 'static> AcquisitionSession<O, S> {
    /// Move the session onto a worker thread running [`auto_loop`](Self::auto_loop)
    pub fn start_auto(self) -> AutoRunner<O, S> {
        let stop = StopHandle::new();
        let thread_stop = stop.clone();
        let handle = thread::spawn(move || {
            let mut session = self;
            let result = session.auto_loop(&thread_stop);
            (session, result)
        });
        AutoRunner { stop, handle }
    }
}

impl<O: PortOpener, S: ReadingStore> AutoRunner<O, S> {
    /// Handle that stops the run from elsewhere
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Whether the worker has already returned
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Stop listening and hand the session back
    pub fn stop_auto(self) -> (AcquisitionSession<O, S>, Result<AutoSummary, AcquisitionError>) {
        self.stop.stop();
        match self.handle.join() {
            Ok(outcome) => outcome,
            Err(panic) => std::panic::resume_unwind(panic),
        }
    }
}
