//! Protocol errors

use thiserror::Error;

use super::ResponseCode;

/// Errors that can occur during protocol communication
///
/// Every error is terminal for the exchange that produced it. The driver
/// never retries on its own; see [`Connection::retry`](super::Connection::retry).
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Invalid data packet size ({len}): {frame:02X?}")]
    FrameTooShort { len: usize, frame: Vec<u8> },

    #[error("Invalid data packet format, start byte {found:#04x}: {frame:02X?}")]
    InvalidFraming { found: u8, frame: Vec<u8> },

    #[error("Invalid packet checksum: expected {expected:#06x}, got {actual:#06x}")]
    ChecksumMismatch {
        expected: u16,
        actual: u16,
        frame: Vec<u8>,
    },

    #[error("Payload too large: {0} bytes (max 255)")]
    PayloadTooLarge(usize),

    #[error("Response payload is empty")]
    EmptyPayload,

    #[error("Device has responded with \"Busy\", command cannot be processed at this time")]
    DeviceBusy,

    #[error("Command response is CANNOT PROCESS COMMAND, error code - {0:#04x}")]
    CannotProcess(u8),

    #[error("{}", .0.name())]
    Response(ResponseCode),

    #[error("Short write: {written} of {expected} bytes")]
    TransportWriteShort { written: usize, expected: usize },

    #[error("Serial port error: {0}")]
    SerialError(String),

    #[error("Not connected to device")]
    NotConnected,

    #[error("Already connected")]
    AlreadyConnected,

    #[error("No command has been sent yet, nothing to retransmit")]
    NoRetryPending,

    #[error("No device found")]
    NoDeviceFound,

    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type alias using [`ProtocolError`]
pub type Result<T> = std::result::Result<T, ProtocolError>;

impl ProtocolError {
    /// The response code reported by the device, if this error came from one
    pub fn response_code(&self) -> Option<ResponseCode> {
        match self {
            ProtocolError::DeviceBusy | ProtocolError::CannotProcess(_) => {
                Some(ResponseCode::CannotProcess)
            }
            ProtocolError::Response(code) => Some(*code),
            _ => None,
        }
    }

    /// True for failures caused by the bytes on the wire rather than the device's verdict
    pub fn is_framing_error(&self) -> bool {
        matches!(
            self,
            ProtocolError::FrameTooShort { .. }
                | ProtocolError::InvalidFraming { .. }
                | ProtocolError::ChecksumMismatch { .. }
        )
    }
}
