//! Serial Protocol
//!
//! Implements the fixed binary packet format sent by the srampuf firmware,
//! plus the serial port plumbing used to receive it.

mod error;
mod packet;
pub mod serial;
pub mod stream;

pub use error::PacketError;
pub use packet::{check, declared_packet_len, decode, encode, PacketBuilder, PacketSummary};
pub use serial::{list_ports, open_port, PortInfo};
pub use stream::{PortChannel, PortOpener, SerialChannel, SerialOpener};

/// Magic number at the start of every packet
pub const MAGIC: [u8; 4] = [0xE5, 0x55, 0x01, 0xEB];

/// Terminator after the fingerprint
pub const TERMINATOR: [u8; 2] = [0x00, 0x00];

/// Size of the fixed header preceding the fingerprint
pub const HEADER_SIZE: usize = 32;

/// Smallest packet the decoder accepts
pub const MIN_PACKET_SIZE: usize = 40;

/// Largest fingerprint accepted on the wire
pub const MAX_FINGERPRINT_SIZE: usize = 10_000;

/// Largest packet accepted on the wire
pub const MAX_PACKET_SIZE: usize = HEADER_SIZE + MAX_FINGERPRINT_SIZE + TERMINATOR.len();

/// Default baud rate of the board firmware
pub const DEFAULT_BAUD_RATE: u32 = 115200;
