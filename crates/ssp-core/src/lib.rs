//! # SSP Core Library
//!
//! Master-side driver for the SSP serial protocol spoken by bill validators,
//! SMART Hopper / SMART Payout units and other cash-handling peripherals.

#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//!
//! This library provides:
//! - Packet framing with CRC-16 checksums and byte stuffing
//! - Sequence flag tracking for retransmission detection
//! - Response code classification
//! - A pluggable byte-channel transport with a serial port binding
//! - A capability-based command layer and device detection
//!
//! ## Example
//!
//! ```rust,ignore
//! use ssp_core::device::{GenericUnit, SspDevice};
//! use ssp_core::protocol::{Connection, ConnectionConfig};
//!
//! let config = ConnectionConfig {
//!     port_name: "/dev/ttyUSB0".to_string(),
//!     ..Default::default()
//! };
//! let mut unit = GenericUnit::new(Connection::open(config)?);
//! unit.sync()?;
//! unit.host_protocol_version(6)?;
//! unit.enable()?;
//! ```

pub mod device;
pub mod protocol;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::device::{
        GenericUnit, NoteValidator, PayoutUnit, SspDevice, SspPort, UnitInfo, UnitType,
    };
    pub use crate::protocol::{
        ByteChannel, Connection, ConnectionConfig, ConnectionState, FrameTerminator,
        ProtocolError, ResponseCode, SspCommand,
    };
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
