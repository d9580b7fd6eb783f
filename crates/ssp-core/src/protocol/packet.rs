//! Packet encoding/decoding
//!
//! Packet format:
//! - 1 byte: STX (0x7F)
//! - 1 byte: SEQ/ADDR
//! - 1 byte: payload length
//! - N bytes: payload (0..=255)
//! - 2 bytes: CRC-16 of SEQ/ADDR, length and payload (little-endian)

use byteorder::{ByteOrder, LittleEndian};

use super::{
    checksum::crc16_bytes, ProtocolError, Result, SspCommand, MAX_PAYLOAD_SIZE, MIN_FRAME_SIZE,
    STX,
};

/// Frame `payload` for transmission with the given SEQ/ADDR byte
pub fn pack(payload: &[u8], seq_addr: u8) -> Result<Vec<u8>> {
    if payload.len() > MAX_PAYLOAD_SIZE {
        return Err(ProtocolError::PayloadTooLarge(payload.len()));
    }

    let mut frame = Vec::with_capacity(payload.len() + 5);
    frame.push(STX);
    frame.push(seq_addr);
    frame.push(payload.len() as u8);
    frame.extend_from_slice(payload);

    let crc = crc16_bytes(&frame[1..]);
    frame.extend_from_slice(&crc);
    Ok(frame)
}

/// Validate a received frame and return its payload
///
/// The length byte is not cross-checked: everything between it and the
/// checksum is returned as payload.
pub fn unpack(frame: &[u8]) -> Result<&[u8]> {
    if frame.len() < MIN_FRAME_SIZE {
        return Err(ProtocolError::FrameTooShort {
            len: frame.len(),
            frame: frame.to_vec(),
        });
    }
    if frame[0] != STX {
        return Err(ProtocolError::InvalidFraming {
            found: frame[0],
            frame: frame.to_vec(),
        });
    }

    let (body, crc) = frame.split_at(frame.len() - 2);
    let expected = crc16_bytes(&body[1..]);
    if crc != expected {
        return Err(ProtocolError::ChecksumMismatch {
            expected: u16::from_le_bytes(expected),
            actual: LittleEndian::read_u16(crc),
            frame: frame.to_vec(),
        });
    }

    Ok(&body[3..])
}

/// A decoded protocol packet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    /// Sequence flag and address byte
    pub seq_addr: u8,
    /// Packet payload
    pub payload: Vec<u8>,
}

impl Packet {
    /// Create a new packet with the given SEQ/ADDR byte and payload
    pub fn new(seq_addr: u8, payload: Vec<u8>) -> Self {
        Self { seq_addr, payload }
    }

    /// Decode a packet from raw (unstuffed) bytes
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let payload = unpack(data)?.to_vec();
        Ok(Self {
            seq_addr: data[1],
            payload,
        })
    }

    /// Encode the packet to raw bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        pack(&self.payload, self.seq_addr)
    }

    /// Sequence flag carried in bit 7
    pub fn sequence_flag(&self) -> bool {
        self.seq_addr & 0x80 != 0
    }

    /// Device address carried in bits 6..0
    pub fn address(&self) -> u8 {
        self.seq_addr & 0x7F
    }

    /// Get the total encoded size (before stuffing)
    pub fn encoded_size(&self) -> usize {
        3 + self.payload.len() + 2
    }
}

/// Builder for command payloads
///
/// Multi-byte fields are little-endian on the wire.
pub struct PacketBuilder {
    payload: Vec<u8>,
}

impl PacketBuilder {
    /// Create a new payload builder
    pub fn new() -> Self {
        Self {
            payload: Vec::new(),
        }
    }

    /// Add a command byte
    pub fn command(mut self, cmd: SspCommand) -> Self {
        self.payload.push(cmd.byte());
        self
    }

    /// Add a single byte
    pub fn byte(mut self, b: u8) -> Self {
        self.payload.push(b);
        self
    }

    /// Add a 16-bit value (little-endian)
    pub fn u16_le(mut self, value: u16) -> Self {
        let mut bytes = [0u8; 2];
        LittleEndian::write_u16(&mut bytes, value);
        self.payload.extend_from_slice(&bytes);
        self
    }

    /// Add a 32-bit value (little-endian)
    pub fn u32_le(mut self, value: u32) -> Self {
        let mut bytes = [0u8; 4];
        LittleEndian::write_u32(&mut bytes, value);
        self.payload.extend_from_slice(&bytes);
        self
    }

    /// Add raw bytes
    pub fn bytes(mut self, data: &[u8]) -> Self {
        self.payload.extend_from_slice(data);
        self
    }

    /// Finish and return the payload
    pub fn build(self) -> Vec<u8> {
        self.payload
    }
}

impl Default for PacketBuilder {
    fn default() -> Self {
        Self::new()
    }
}
