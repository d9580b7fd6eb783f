//! Serial Protocol Communication
//!
//! Implements the SSP packet engine used to talk to cash-handling peripherals.
//!
//! Frame format:
//! - 1 byte: STX start marker (0x7F)
//! - 1 byte: SEQ/ADDR (bit 7 = sequence flag, bits 6..0 = device address)
//! - 1 byte: payload length
//! - N bytes: payload
//! - 2 bytes: CRC-16 of SEQ/ADDR..payload (little-endian)

pub mod checksum;
pub mod commands;
mod connection;
mod error;
mod packet;
pub mod response;
pub mod sequence;
pub mod serial;
pub mod stuffing;
pub mod transport;

pub use checksum::{crc16, crc16_bytes};
pub use commands::{code_name, SspCommand};
pub use connection::{Connection, ConnectionConfig, ConnectionState};
pub use error::{ProtocolError, Result};
pub use packet::{pack, unpack, Packet, PacketBuilder};
pub use response::{classify, ResponseCode};
pub use sequence::SequenceTracker;
pub use serial::{clear_buffers, configure_port, list_ports, open_port, PortInfo};
pub use transport::{ByteChannel, FrameTerminator, ReadTimeouts};

/// Frame start marker
pub const STX: u8 = 0x7F;

/// Default baud rate for SSP peripherals
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// Default bounded wait for the first byte of a reply, in milliseconds
pub const DEFAULT_RESPONSE_TIMEOUT_MS: u64 = 1000;

/// Default inter-byte idle window that ends a reply, in microseconds.
///
/// termios counts read timeouts in tenths of a second, so the 500us window
/// requested by older drivers was served as 100ms on real ports.
pub const DEFAULT_IDLE_TIMEOUT_US: u64 = 100_000;

/// Maximum payload size carried by a single frame
pub const MAX_PAYLOAD_SIZE: usize = 255;

/// Smallest valid frame: STX + SEQ/ADDR + LEN + CRC lo/hi + at least one payload byte
pub const MIN_FRAME_SIZE: usize = 6;
