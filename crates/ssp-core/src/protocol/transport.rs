//! Byte channel transport
//!
//! The packet engine only needs something that can write bytes and hand back
//! whatever bytes arrived within a bounded wait. How a reply is delimited is a
//! separate choice, see [`FrameTerminator`].

use serde::{Deserialize, Serialize};
use serialport::SerialPort;
use std::io::{self, Read, Write};
use std::time::{Duration, Instant};

use super::{
    stuffing::unstuff_frame, ProtocolError, Result, DEFAULT_IDLE_TIMEOUT_US,
    DEFAULT_RESPONSE_TIMEOUT_MS, MAX_PAYLOAD_SIZE, STX,
};

/// Largest frame the device can send once every byte after STX is stuffed
pub const MAX_STUFFED_FRAME_SIZE: usize = 1 + 2 * (2 + MAX_PAYLOAD_SIZE + 2);

/// A duplex byte channel to the device
pub trait ByteChannel {
    /// Write `data`, returning how many bytes were accepted
    fn write_bytes(&mut self, data: &[u8]) -> io::Result<usize>;

    /// Read whatever is available into `buf`, waiting at most `wait` for the
    /// first byte. Returns `Ok(0)` when nothing arrived in time.
    fn read_available(&mut self, buf: &mut [u8], wait: Duration) -> io::Result<usize>;
}

impl<C: ByteChannel + ?Sized> ByteChannel for &mut C {
    fn write_bytes(&mut self, data: &[u8]) -> io::Result<usize> {
        (**self).write_bytes(data)
    }

    fn read_available(&mut self, buf: &mut [u8], wait: Duration) -> io::Result<usize> {
        (**self).read_available(buf, wait)
    }
}

impl ByteChannel for Box<dyn SerialPort> {
    fn write_bytes(&mut self, data: &[u8]) -> io::Result<usize> {
        self.write(data)
    }

    fn read_available(&mut self, buf: &mut [u8], wait: Duration) -> io::Result<usize> {
        self.set_timeout(wait)?;
        match self.read(buf) {
            Ok(n) => Ok(n),
            Err(ref e)
                if e.kind() == io::ErrorKind::TimedOut || e.kind() == io::ErrorKind::WouldBlock =>
            {
                Ok(0)
            }
            Err(e) => Err(e),
        }
    }
}

/// How the end of a reply is detected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameTerminator {
    /// Read until no new byte is observed for the idle window.
    ///
    /// Assumes the device sends its reply as one burst. This is what SSP
    /// hosts have always done and stays the default for compatibility.
    #[default]
    IdleTimeout,
    /// Read until the declared length byte plus checksum has arrived
    LengthPrefixed,
}

/// Bounds applied to a single read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadTimeouts {
    /// Maximum wait for the first byte of a reply (the whole reply for
    /// [`FrameTerminator::LengthPrefixed`])
    pub response: Duration,
    /// Inter-byte silence that ends a reply
    pub idle: Duration,
}

impl Default for ReadTimeouts {
    fn default() -> Self {
        Self {
            response: Duration::from_millis(DEFAULT_RESPONSE_TIMEOUT_MS),
            idle: Duration::from_micros(DEFAULT_IDLE_TIMEOUT_US),
        }
    }
}

/// Write a whole frame, failing if the channel accepts fewer bytes
pub fn write_frame<C: ByteChannel + ?Sized>(channel: &mut C, bytes: &[u8]) -> Result<()> {
    let written = channel.write_bytes(bytes)?;
    if written != bytes.len() {
        return Err(ProtocolError::TransportWriteShort {
            written,
            expected: bytes.len(),
        });
    }
    tracing::trace!("wrote {} bytes: {:02X?}", written, bytes);
    Ok(())
}

/// Read one reply using the given terminator
///
/// Never blocks past the configured bounds. Returns the bytes accumulated so
/// far, which may be empty if the device stayed silent; frame validation is
/// left to [`unpack`](super::unpack).
pub fn read_frame<C: ByteChannel + ?Sized>(
    channel: &mut C,
    terminator: FrameTerminator,
    timeouts: ReadTimeouts,
    stuffed: bool,
) -> Result<Vec<u8>> {
    match terminator {
        FrameTerminator::IdleTimeout => read_until_idle(channel, timeouts),
        FrameTerminator::LengthPrefixed => read_declared_length(channel, timeouts, stuffed),
    }
}

fn read_until_idle<C: ByteChannel + ?Sized>(
    channel: &mut C,
    timeouts: ReadTimeouts,
) -> Result<Vec<u8>> {
    let mut response = Vec::new();
    let mut buffer = [0u8; 256];
    let mut wait = timeouts.response;

    while response.len() < MAX_STUFFED_FRAME_SIZE {
        let n = channel.read_available(&mut buffer, wait)?;
        if n == 0 {
            if response.is_empty() {
                tracing::debug!("no reply within {}ms", timeouts.response.as_millis());
            }
            break;
        }
        response.extend_from_slice(&buffer[..n]);
        tracing::trace!("read {} bytes, total = {}", n, response.len());
        wait = timeouts.idle;
    }

    Ok(response)
}

fn read_declared_length<C: ByteChannel + ?Sized>(
    channel: &mut C,
    timeouts: ReadTimeouts,
    stuffed: bool,
) -> Result<Vec<u8>> {
    let mut response = Vec::new();
    let mut buffer = [0u8; 256];
    let deadline = Instant::now() + timeouts.response;

    while !frame_complete(&response, stuffed) && response.len() < MAX_STUFFED_FRAME_SIZE {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            tracing::debug!(
                "timed out after reading {} bytes of a length-prefixed reply",
                response.len()
            );
            break;
        }
        let n = channel.read_available(&mut buffer, remaining)?;
        if n == 0 {
            break;
        }
        response.extend_from_slice(&buffer[..n]);
        tracing::trace!("read {} bytes, total = {}", n, response.len());
    }

    Ok(response)
}

/// Whether `raw` holds a full frame according to its length byte
fn frame_complete(raw: &[u8], stuffed: bool) -> bool {
    if stuffed && pending_stuffed_marker(raw) {
        return false;
    }
    let frame = if stuffed {
        unstuff_frame(raw)
    } else {
        raw.to_vec()
    };
    match frame.get(2) {
        Some(&len) => frame.len() >= 3 + len as usize + 2,
        None => false,
    }
}

/// True when the data after STX ends in an odd run of markers, i.e. the
/// second half of a stuffed pair has not arrived yet
fn pending_stuffed_marker(raw: &[u8]) -> bool {
    let run = raw
        .iter()
        .skip(1)
        .rev()
        .take_while(|&&b| b == STX)
        .count();
    run % 2 == 1
}
