//! Device detection
//!
//! Probes serial ports with a SETUP REQUEST and decodes the fixed-offset
//! header of the reply.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ascii_string;
use crate::protocol::{
    list_ports, ByteChannel, Connection, ConnectionConfig, ProtocolError, Result, SspCommand,
};

/// Bytes of setup data needed to fill a [`UnitInfo`]
pub const SETUP_HEADER_LEN: usize = 12;

/// Kind of unit reported in the setup request reply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnitType {
    /// Banknote validator
    Validator,
    /// SMART Hopper coin payout
    SmartHopper,
    /// SMART Payout note recycler
    SmartPayout,
    /// NV11 note float
    Nv11,
    /// Any other type byte
    Unknown(u8),
}

impl UnitType {
    /// Decode the unit type byte
    pub fn from_byte(b: u8) -> Self {
        match b {
            0x00 => UnitType::Validator,
            0x03 => UnitType::SmartHopper,
            0x06 => UnitType::SmartPayout,
            0x07 => UnitType::Nv11,
            other => UnitType::Unknown(other),
        }
    }

    /// Human-readable name
    pub fn name(&self) -> &'static str {
        match self {
            UnitType::Validator => "Validator",
            UnitType::SmartHopper => "SMART Hopper",
            UnitType::SmartPayout => "SMART Payout",
            UnitType::Nv11 => "NV11",
            UnitType::Unknown(_) => "Unknown Type",
        }
    }
}

impl fmt::Display for UnitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Unit description decoded from a setup request reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitInfo {
    /// Unit type
    pub unit_type: UnitType,
    /// Four-character firmware version
    pub firmware_version: String,
    /// Three-letter currency code
    pub currency: String,
    /// Number of channels
    pub channels: u8,
}

/// A serial port and the SSP address probed on it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SspPort {
    /// Port name
    pub name: String,
    /// Device address
    pub address: u8,
}

impl fmt::Display for SspPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (address {})", self.name, self.address)
    }
}

/// A device found by [`search_devices`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectedDevice {
    /// Where the device answered
    pub port: SspPort,
    /// What it reported
    pub unit: UnitInfo,
}

/// Decode the data following the OK byte of a setup request reply
///
/// Layout: unit type at 0, firmware version at 1..5, currency at 5..8,
/// channel count at 11.
pub fn parse_setup_response(data: &[u8]) -> Result<UnitInfo> {
    if data.len() < SETUP_HEADER_LEN {
        return Err(ProtocolError::UnexpectedResponse(format!(
            "setup data too short ({} bytes, need {})",
            data.len(),
            SETUP_HEADER_LEN
        )));
    }
    Ok(UnitInfo {
        unit_type: UnitType::from_byte(data[0]),
        firmware_version: ascii_string(&data[1..5]),
        currency: ascii_string(&data[5..8]),
        channels: data[11],
    })
}

/// Every serial port, probed at address 0
pub fn available_ports() -> Vec<SspPort> {
    list_ports()
        .into_iter()
        .map(|p| SspPort {
            name: p.name,
            address: 0,
        })
        .collect()
}

/// Probe-time configuration: the setup request goes out with the sequence flag set
fn probe_config(port: &SspPort) -> ConnectionConfig {
    ConnectionConfig {
        port_name: port.name.clone(),
        address: port.address,
        initial_sequence_flag: true,
        ..Default::default()
    }
}

/// Ask whatever listens on `conn` for its setup data
///
/// A silent channel yields [`ProtocolError::NoDeviceFound`].
pub fn probe<C: ByteChannel>(conn: &mut Connection<C>) -> Result<UnitInfo> {
    match conn.send_command(&SspCommand::SetupRequest.payload()) {
        Ok(data) => parse_setup_response(&data),
        Err(ProtocolError::FrameTooShort { len: 0, .. }) => Err(ProtocolError::NoDeviceFound),
        Err(e) => Err(e),
    }
}

/// Open `port` and identify the device on it
pub fn detect(port: &SspPort) -> Result<DetectedDevice> {
    let mut conn = Connection::open(probe_config(port))?;
    let unit = probe(&mut conn)?;
    conn.close();
    Ok(DetectedDevice {
        port: port.clone(),
        unit,
    })
}

/// Probe every available port and return the devices that answered
pub fn search_devices() -> Vec<DetectedDevice> {
    available_ports()
        .iter()
        .filter_map(|port| match detect(port) {
            Ok(dev) => {
                tracing::info!("found {} on {}", dev.unit.unit_type, port);
                Some(dev)
            }
            Err(e) => {
                tracing::debug!("no SSP device on {}: {}", port, e);
                None
            }
        })
        .collect()
}
