//! Response classification
//!
//! The first payload byte of every reply is a status code. Anything other than
//! OK fails the exchange; CANNOT PROCESS carries a sub-code in the second byte.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{ProtocolError, Result};

/// Sub-code sent with CANNOT PROCESS when the device is busy
pub const BUSY_SUBCODE: u8 = 0x03;

/// Generic response status codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResponseCode {
    /// 0xF0
    Ok,
    /// 0xF2
    CommandUnknown,
    /// 0xF3
    WrongParams,
    /// 0xF4
    ParamOutOfRange,
    /// 0xF5
    CannotProcess,
    /// 0xF6
    SoftwareError,
    /// 0xF8
    Fail,
    /// 0xFA, encryption keys must be renegotiated
    KeyNotSet,
    /// Any byte outside the generic catalog
    Other(u8),
}

impl ResponseCode {
    /// Decode a status byte
    pub fn from_byte(b: u8) -> Self {
        match b {
            0xF0 => ResponseCode::Ok,
            0xF2 => ResponseCode::CommandUnknown,
            0xF3 => ResponseCode::WrongParams,
            0xF4 => ResponseCode::ParamOutOfRange,
            0xF5 => ResponseCode::CannotProcess,
            0xF6 => ResponseCode::SoftwareError,
            0xF8 => ResponseCode::Fail,
            0xFA => ResponseCode::KeyNotSet,
            other => ResponseCode::Other(other),
        }
    }

    /// Wire value of this code
    pub fn as_byte(&self) -> u8 {
        match self {
            ResponseCode::Ok => 0xF0,
            ResponseCode::CommandUnknown => 0xF2,
            ResponseCode::WrongParams => 0xF3,
            ResponseCode::ParamOutOfRange => 0xF4,
            ResponseCode::CannotProcess => 0xF5,
            ResponseCode::SoftwareError => 0xF6,
            ResponseCode::Fail => 0xF8,
            ResponseCode::KeyNotSet => 0xFA,
            ResponseCode::Other(b) => *b,
        }
    }

    /// Human-readable description used in error messages
    pub fn name(&self) -> &'static str {
        match self {
            ResponseCode::Ok => "Success",
            ResponseCode::CommandUnknown => "Command response is UNKNOWN COMMAND",
            ResponseCode::WrongParams => "Command response is WRONG PARAMETERS",
            ResponseCode::ParamOutOfRange => "Command response is PARAM OUT OF RANGE",
            ResponseCode::CannotProcess => "CANNOT PROCESS COMMAND",
            ResponseCode::SoftwareError => "Command response is SOFTWARE ERROR",
            ResponseCode::Fail => "Command response is FAIL",
            ResponseCode::KeyNotSet => "Command response is KEY NOT SET, renegotiate keys",
            ResponseCode::Other(_) => "UNKNOWN command",
        }
    }

    /// Check if this is the OK code
    pub fn is_ok(&self) -> bool {
        matches!(self, ResponseCode::Ok)
    }
}

impl From<u8> for ResponseCode {
    fn from(b: u8) -> Self {
        ResponseCode::from_byte(b)
    }
}

impl fmt::Display for ResponseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:#04x})", self.name(), self.as_byte())
    }
}

/// Classify an unpacked reply payload
///
/// On OK returns the command-specific data following the status byte.
pub fn classify(payload: &[u8]) -> Result<&[u8]> {
    let (&status, data) = payload.split_first().ok_or(ProtocolError::EmptyPayload)?;

    match ResponseCode::from_byte(status) {
        ResponseCode::Ok => Ok(data),
        ResponseCode::CannotProcess => match data.first() {
            Some(&BUSY_SUBCODE) => Err(ProtocolError::DeviceBusy),
            Some(&subcode) => Err(ProtocolError::CannotProcess(subcode)),
            None => Err(ProtocolError::Response(ResponseCode::CannotProcess)),
        },
        code => Err(ProtocolError::Response(code)),
    }
}
