//! Packet encoding/decoding
//!
//! Packet format sent by the srampuf firmware (all integers little-endian):
//! - 4 bytes: magic number `E5 55 01 EB`
//! - 12 bytes: board UID (3 x u32)
//! - 4 bytes: board specifier (i32)
//! - 4 bytes: PUF start address (i32)
//! - 4 bytes: PUF end address (i32)
//! - 4 bytes: temperature in milli-degrees Celsius (i32)
//! - N bytes: fingerprint, N = end - start
//! - 2 bytes: terminator `00 00`

use byteorder::{ByteOrder, LittleEndian};

use super::{PacketError, HEADER_SIZE, MAGIC, MAX_FINGERPRINT_SIZE, MIN_PACKET_SIZE, TERMINATOR};
use crate::model::{Board, BoardSpecifier, RangeError, Reading, Uid};

/// Fixed header fields, before any semantic validation of specifier or temperature
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Header {
    uid: Uid,
    specifier: i32,
    puf_start: u32,
    puf_end: u32,
    temperature_milli: i32,
}

impl Header {
    fn puf_size(&self) -> usize {
        (self.puf_end - self.puf_start) as usize
    }

    fn packet_len(&self) -> usize {
        HEADER_SIZE + self.puf_size() + TERMINATOR.len()
    }
}

/// Parse the 32 header bytes: magic number and address range
fn parse_header(data: &[u8]) -> Result<Header, PacketError> {
    if data.len() < HEADER_SIZE {
        return Err(PacketError::Size {
            expected: HEADER_SIZE,
            actual: data.len(),
        });
    }

    if data[0..4] != MAGIC {
        return Err(PacketError::Protocol("bad start"));
    }

    let uid = Uid::new(
        LittleEndian::read_u32(&data[4..8]),
        LittleEndian::read_u32(&data[8..12]),
        LittleEndian::read_u32(&data[12..16]),
    );
    let specifier = LittleEndian::read_i32(&data[16..20]);
    let start = LittleEndian::read_i32(&data[20..24]);
    let end = LittleEndian::read_i32(&data[24..28]);
    let temperature_milli = LittleEndian::read_i32(&data[28..32]);

    if start < 0 {
        return Err(RangeError::new("puf_start", format!("must not be negative, got {}", start)).into());
    }
    if end < 0 {
        return Err(RangeError::new("puf_end", format!("must not be negative, got {}", end)).into());
    }
    if end <= start {
        return Err(RangeError::new(
            "puf_end",
            format!("must be larger than puf_start 0x{:08X}, got 0x{:08X}", start, end),
        )
        .into());
    }
    let size = (end - start) as usize;
    if size > MAX_FINGERPRINT_SIZE {
        return Err(RangeError::new(
            "puf_end",
            format!("fingerprint of {} bytes exceeds {} bytes", size, MAX_FINGERPRINT_SIZE),
        )
        .into());
    }

    Ok(Header {
        uid,
        specifier,
        puf_start: start as u32,
        puf_end: end as u32,
        temperature_milli,
    })
}

/// Check the overall length and the terminator, returning the fingerprint slice
fn frame<'a>(data: &'a [u8], header: &Header) -> Result<&'a [u8], PacketError> {
    let packet_len = header.packet_len();
    if data.len() < packet_len {
        return Err(PacketError::Size {
            expected: packet_len,
            actual: data.len(),
        });
    }

    let fp_end = HEADER_SIZE + header.puf_size();
    if data[fp_end..fp_end + 2] != TERMINATOR {
        return Err(PacketError::Protocol("bad end"));
    }

    Ok(&data[HEADER_SIZE..fp_end])
}

/// Decode a packet into the board identity and the reading it carries.
///
/// Decoding is all-or-nothing. Bytes after the terminator are ignored.
pub fn decode(data: &[u8]) -> Result<(Board, Reading), PacketError> {
    if data.len() < MIN_PACKET_SIZE {
        return Err(PacketError::Size {
            expected: MIN_PACKET_SIZE,
            actual: data.len(),
        });
    }

    let header = parse_header(data)?;
    let fingerprint = frame(data, &header)?;

    let specifier = BoardSpecifier::try_from(header.specifier)?;
    let temperature = header.temperature_milli as f64 / 1000.0;
    let reading = Reading::new(
        header.puf_start,
        header.puf_end,
        temperature,
        fingerprint.to_vec(),
    )?;

    Ok((Board::new(specifier, header.uid), reading))
}

/// Framing facts about a packet that passed [`check`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketSummary {
    /// Board UID from the header
    pub uid: Uid,
    /// Raw specifier value, not validated
    pub specifier: i32,
    /// PUF start address
    pub puf_start: u32,
    /// PUF end address
    pub puf_end: u32,
    /// Total packet length including header and terminator
    pub packet_len: usize,
}

/// Validate the framing of a packet without building a reading.
///
/// Only the size, magic number, addresses and terminator are checked.
pub fn check(data: &[u8]) -> Result<PacketSummary, PacketError> {
    if data.len() < MIN_PACKET_SIZE {
        return Err(PacketError::Size {
            expected: MIN_PACKET_SIZE,
            actual: data.len(),
        });
    }

    let header = parse_header(data)?;
    frame(data, &header)?;

    Ok(PacketSummary {
        uid: header.uid,
        specifier: header.specifier,
        puf_start: header.puf_start,
        puf_end: header.puf_end,
        packet_len: header.packet_len(),
    })
}

/// Total packet length announced by a header.
///
/// `header` must hold at least [`HEADER_SIZE`] bytes.
pub fn declared_packet_len(header: &[u8]) -> Result<usize, PacketError> {
    parse_header(header).map(|h| h.packet_len())
}

/// Encode a board and reading into a packet
pub fn encode(board: &Board, reading: &Reading) -> Vec<u8> {
    PacketBuilder::new(board)
        .addresses(reading.puf_start(), reading.puf_end())
        .temperature(reading.temperature())
        .fingerprint(reading.fingerprint())
        .build()
}

/// Builder for constructing packets
///
/// The builder does not validate; it can produce packets that [`decode`]
/// rejects, which is what the firmware simulator and tests rely on.
pub struct PacketBuilder {
    uid: Uid,
    specifier: i32,
    puf_start: i32,
    puf_end: Option<i32>,
    temperature_milli: i32,
    fingerprint: Vec<u8>,
}

impl PacketBuilder {
    /// Start a packet for `board`
    pub fn new(board: &Board) -> Self {
        Self {
            uid: board.uid(),
            specifier: board.specifier().raw(),
            puf_start: 0,
            puf_end: None,
            temperature_milli: 0,
            fingerprint: Vec::new(),
        }
    }

    /// Override the raw specifier value
    pub fn specifier_raw(mut self, value: i32) -> Self {
        self.specifier = value;
        self
    }

    /// Set the PUF address range. Addresses above `i32::MAX` wrap negative
    /// on the wire.
    pub fn addresses(mut self, start: u32, end: u32) -> Self {
        self.puf_start = start as i32;
        self.puf_end = Some(end as i32);
        self
    }

    /// Set raw (possibly negative) addresses
    pub fn addresses_raw(mut self, start: i32, end: i32) -> Self {
        self.puf_start = start;
        self.puf_end = Some(end);
        self
    }

    /// Set the temperature in °C, rounded to milli-degrees
    pub fn temperature(mut self, celsius: f64) -> Self {
        self.temperature_milli = (celsius * 1000.0).round() as i32;
        self
    }

    /// Set the fingerprint bytes
    pub fn fingerprint(mut self, data: &[u8]) -> Self {
        self.fingerprint = data.to_vec();
        self
    }

    /// Build the packet. Without explicit addresses the end address is
    /// derived from the fingerprint length.
    pub fn build(self) -> Vec<u8> {
        let end = self
            .puf_end
            .unwrap_or(self.puf_start.wrapping_add(self.fingerprint.len() as i32));
        let mut bytes = Vec::with_capacity(MIN_PACKET_SIZE + self.fingerprint.len());
        let mut word = [0u8; 4];

        bytes.extend_from_slice(&MAGIC);
        for w in self.uid.words() {
            LittleEndian::write_u32(&mut word, *w);
            bytes.extend_from_slice(&word);
        }
        for v in [self.specifier, self.puf_start, end, self.temperature_milli] {
            LittleEndian::write_i32(&mut word, v);
            bytes.extend_from_slice(&word);
        }
        bytes.extend_from_slice(&self.fingerprint);
        bytes.extend_from_slice(&TERMINATOR);

        bytes
    }
}
