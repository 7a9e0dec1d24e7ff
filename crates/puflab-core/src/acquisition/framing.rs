//! Length-based packet framing
//!
//! Reads the fixed header first, then exactly the number of bytes the header
//! announces, so a packet is never cut short by timing and never swallows the
//! start of the next one.

use std::io::{self, ErrorKind, Read};
use std::time::{Duration, Instant};

use crate::protocol::{declared_packet_len, PacketError, PortChannel, HEADER_SIZE};

/// Outcome of waiting for one packet
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Received {
    /// A complete packet, framing not yet validated beyond its length
    Packet(Vec<u8>),
    /// Bytes arrived but could not be framed; they were discarded
    Malformed(PacketError),
    /// Nothing arrived within the window
    Nothing,
}

/// Fill `buf` from `channel` until it is full or `deadline` passes.
///
/// Each blocking read is bounded by `poll`, so a deadline is never overshot
/// by more than one poll interval. Returns the number of bytes filled.
pub(crate) fn read_until(
    channel: &mut dyn PortChannel,
    buf: &mut [u8],
    deadline: Instant,
    poll: Duration,
) -> io::Result<usize> {
    let mut filled = 0;

    while filled < buf.len() {
        let now = Instant::now();
        if now >= deadline {
            break;
        }
        let wait = (deadline - now).min(poll);
        channel.set_timeout(wait)?;

        match channel.read(&mut buf[filled..]) {
            Ok(0) => std::thread::sleep(wait),
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::TimedOut || e.kind() == ErrorKind::WouldBlock => {}
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }

    Ok(filled)
}

/// Receive one packet framed by its declared length within `window`.
///
/// `raw` is replaced by every byte consumed from the channel, including the
/// bytes of a packet that turned out malformed.
pub(crate) fn read_framed(
    channel: &mut dyn PortChannel,
    window: Duration,
    poll: Duration,
    raw: &mut Vec<u8>,
) -> io::Result<Received> {
    let deadline = Instant::now() + window;

    raw.clear();
    raw.resize(HEADER_SIZE, 0);
    let got = read_until(channel, raw, deadline, poll)?;
    if got < HEADER_SIZE {
        raw.truncate(got);
        if got == 0 {
            return Ok(Received::Nothing);
        }
        return Ok(Received::Malformed(PacketError::Size {
            expected: HEADER_SIZE,
            actual: got,
        }));
    }

    let total = match declared_packet_len(raw) {
        Ok(total) => total,
        Err(e) => return Ok(Received::Malformed(e)),
    };

    raw.resize(total, 0);
    let got = HEADER_SIZE + read_until(channel, &mut raw[HEADER_SIZE..], deadline, poll)?;
    if got < total {
        raw.truncate(got);
        return Ok(Received::Malformed(PacketError::Size {
            expected: total,
            actual: got,
        }));
    }

    Ok(Received::Packet(raw.clone()))
}
