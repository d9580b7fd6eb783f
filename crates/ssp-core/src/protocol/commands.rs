//! Protocol commands
//!
//! Command bytes understood by SSP peripherals, and a name table covering
//! commands, asynchronous poll events and response codes for log output.

use serde::{Deserialize, Serialize};
use std::fmt;

/// SSP command bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SspCommand {
    // Generic commands
    /// Restart the device
    Reset,
    /// Request unit setup information
    SetupRequest,
    /// Negotiate the host protocol version
    HostProtocolVersion,
    /// Poll for events
    Poll,
    /// Disable the device
    Disable,
    /// Enable the device
    Enable,
    /// Request the unit serial number
    GetSerialNumber,
    /// Reset the sequence flag on the device
    Sync,
    /// Request the firmware version string
    FirmwareVersion,
    /// Request the dataset version string
    GetDatasetVersion,
    /// Request the build revision
    GetBuildRevision,
    /// Poll; events are repeated until acknowledged
    PollWithAck,
    /// Acknowledge events returned by [`SspCommand::PollWithAck`]
    EventAck,
    /// Read the unit counters
    GetCounter,
    /// Clear the unit counters
    ResetCounter,

    // Note validator commands
    /// Set the channel inhibit mask
    SetInhibits,
    /// Turn the bezel display on
    DisplayOn,
    /// Turn the bezel display off
    DisplayOff,
    /// Reject the note in escrow
    RejectNote,
    /// Request unit data
    UnitData,
    /// Request channel values
    ChannelValueRequest,
    /// Request channel security levels
    ChannelSecurityData,
    /// Reason for the last rejected note
    LastRejectCode,
    /// Keep the escrowed note held
    Hold,
    /// Report note positions on the payout
    GetNotePositions,
    /// Pay out the last stored note
    PayoutLastNote,
    /// Move the last stored note to the cashbox
    StackLastNote,
    /// Report values as channel numbers or amounts
    SetValueReportingType,

    // Payout commands
    /// Stop a payout in progress
    HaltPayout,
    /// Route a denomination to the payout or the cashbox
    SetDenominationRoute,
    /// Read the route of a denomination
    GetDenominationRoute,
    /// Empty all stored notes to the cashbox
    EmptyAll,
    /// Empty all stored notes, keeping a record of them
    SmartEmpty,
    /// Enable the payout unit
    EnablePayout,
    /// Disable the payout unit
    DisablePayout,
}

impl SspCommand {
    /// Get the command byte
    pub fn byte(&self) -> u8 {
        match self {
            SspCommand::Reset => 0x01,
            SspCommand::SetupRequest => 0x05,
            SspCommand::HostProtocolVersion => 0x06,
            SspCommand::Poll => 0x07,
            SspCommand::Disable => 0x09,
            SspCommand::Enable => 0x0A,
            SspCommand::GetSerialNumber => 0x0C,
            SspCommand::Sync => 0x11,
            SspCommand::FirmwareVersion => 0x20,
            SspCommand::GetDatasetVersion => 0x21,
            SspCommand::GetBuildRevision => 0x4F,
            SspCommand::PollWithAck => 0x56,
            SspCommand::EventAck => 0x57,
            SspCommand::GetCounter => 0x58,
            SspCommand::ResetCounter => 0x59,
            SspCommand::SetInhibits => 0x02,
            SspCommand::DisplayOn => 0x03,
            SspCommand::DisplayOff => 0x04,
            SspCommand::RejectNote => 0x08,
            SspCommand::UnitData => 0x0D,
            SspCommand::ChannelValueRequest => 0x0E,
            SspCommand::ChannelSecurityData => 0x14,
            SspCommand::LastRejectCode => 0x17,
            SspCommand::Hold => 0x18,
            SspCommand::GetNotePositions => 0x41,
            SspCommand::PayoutLastNote => 0x42,
            SspCommand::StackLastNote => 0x43,
            SspCommand::SetValueReportingType => 0x45,
            SspCommand::HaltPayout => 0x38,
            SspCommand::SetDenominationRoute => 0x3B,
            SspCommand::GetDenominationRoute => 0x3C,
            SspCommand::EmptyAll => 0x3F,
            SspCommand::SmartEmpty => 0x52,
            SspCommand::EnablePayout => 0x5C,
            SspCommand::DisablePayout => 0x5B,
        }
    }

    /// Human-readable command name
    pub fn name(&self) -> &'static str {
        code_name(self.byte())
    }

    /// Single-byte payload carrying just this command
    pub fn payload(&self) -> Vec<u8> {
        vec![self.byte()]
    }
}

impl fmt::Display for SspCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Names for every byte the driver may log: commands, poll events and responses
const CODE_NAMES: &[(u8, &str)] = &[
    (0x01, "RESET COMMAND"),
    (0x02, "SET INHIBITS COMMAND"),
    (0x03, "DISPLAY ON COMMAND"),
    (0x04, "DISPLAY OFF COMMAND"),
    (0x05, "SETUP REQUEST COMMAND"),
    (0x06, "HOST PROTOCOL VERSION"),
    (0x07, "POLL COMMAND"),
    (0x08, "REJECT NOTE"),
    (0x09, "DISABLE COMMAND"),
    (0x0A, "ENABLE COMMAND"),
    (0x0C, "GET SERIAL NUMBER"),
    (0x0D, "UNIT DATA"),
    (0x0E, "CHANNEL VALUE REQUEST"),
    (0x11, "SYNC COMMAND"),
    (0x14, "CHANNEL SECURITY"),
    (0x17, "LAST REJECT CODE"),
    (0x18, "HOLD"),
    (0x20, "GET FIRMWARE VERSION"),
    (0x21, "GET DATASET VERSION"),
    (0x38, "HALT PAYOUT"),
    (0x3B, "SET DENOMINATION ROUTE"),
    (0x3C, "GET DENOMINATION ROUTE"),
    (0x3F, "EMPTY ALL"),
    (0x41, "GET NOTE POSITIONS COMMAND"),
    (0x42, "PAYOUT LAST NOTE COMMAND"),
    (0x43, "STACK LAST NOTE COMMAND"),
    (0x45, "SET VALUE REPORTING TYPE COMMAND"),
    (0x4A, "SET GENERATOR COMMAND"),
    (0x4B, "SET MODULUS COMMAND"),
    (0x4C, "KEY EXCHANGE COMMAND"),
    (0x4F, "GET BUILD REVISION"),
    (0x52, "SMART EMPTY"),
    (0x56, "POLL WITH ACK"),
    (0x57, "EVENT ACK"),
    (0x58, "GET COUNTER"),
    (0x59, "RESET COUNTER"),
    (0x5B, "DISABLE PAYOUT COMMAND"),
    (0x5C, "ENABLE PAYOUT COMMAND"),
    (0xC9, "NOTE TRANSFERRED TO STACKER RESPONSE"),
    (0xCC, "STACKING RESPONSE"),
    (0xD2, "NOTE DISPENSED RESPONSE"),
    (0xDA, "NOTE DISPENSING RESPONSE"),
    (0xDB, "NOTE STORED RESPONSE"),
    (0xE1, "NOTE CLEARED FROM FRONT RESPONSE"),
    (0xE2, "NOTE CLEARED TO CASHBOX RESPONSE"),
    (0xE3, "CASHBOX REMOVED RESPONSE"),
    (0xE4, "CASHBOX REPLACED RESPONSE"),
    (0xE6, "FRAUD ATTEMPT RESPONSE"),
    (0xE7, "STACKER FULL RESPONSE"),
    (0xE8, "DISABLED RESPONSE"),
    (0xE9, "UNSAFE JAM RESPONSE"),
    (0xEA, "SAFE JAM RESPONSE"),
    (0xEB, "STACKED RESPONSE"),
    (0xEC, "REJECTED RESPONSE"),
    (0xED, "REJECTING RESPONSE"),
    (0xEE, "CREDIT RESPONSE"),
    (0xEF, "NOTE READ RESPONSE"),
    (0xF0, "OK RESPONSE"),
    (0xF1, "RESET RESPONSE"),
    (0xF2, "UNKNOWN RESPONSE"),
    (0xF3, "WRONG PARAMS RESPONSE"),
    (0xF4, "PARAM OUT OF RANGE RESPONSE"),
    (0xF5, "CANNOT PROCESS RESPONSE"),
    (0xF6, "SOFTWARE ERROR RESPONSE"),
    (0xF8, "FAIL RESPONSE"),
    (0xFA, "KEY NOT SET RESPONSE"),
];

/// Look up the name of a command, event or response byte
pub fn code_name(code: u8) -> &'static str {
    CODE_NAMES
        .binary_search_by_key(&code, |&(b, _)| b)
        .map(|i| CODE_NAMES[i].1)
        .unwrap_or("Byte command name unsupported")
}
