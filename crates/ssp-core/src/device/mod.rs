//! Device command sets
//!
//! Every SSP peripheral understands the base command set in [`SspDevice`].
//! Note validators and payout units add their own capabilities on top, so a
//! driver for a specific unit implements only the traits it supports.
//!
//! The methods here only build payloads and hand them to the connection;
//! interpreting reply data (note values, channel tables) is left to callers.

mod channel;
pub mod detector;

pub use channel::Channel;
pub use detector::{
    available_ports, detect, parse_setup_response, search_devices, DetectedDevice, SspPort,
    UnitInfo, UnitType,
};

use serialport::SerialPort;

use crate::protocol::{ByteChannel, Connection, PacketBuilder, Result, SspCommand};

/// Host protocol version negotiated by [`SspDevice::host_protocol_version`] by default
pub const DEFAULT_HOST_PROTOCOL_VERSION: u8 = 6;

/// Commands every SSP device implements
pub trait SspDevice {
    /// Send one command payload and return the reply data after the OK byte
    fn send(&mut self, payload: &[u8]) -> Result<Vec<u8>>;

    /// Send a command that takes no parameters
    fn send_simple(&mut self, cmd: SspCommand) -> Result<Vec<u8>> {
        self.send(&cmd.payload())
    }

    /// Restart the device
    fn reset(&mut self) -> Result<()> {
        self.send_simple(SspCommand::Reset).map(|_| ())
    }

    /// Resynchronise the sequence flag with the device
    fn sync(&mut self) -> Result<()> {
        self.send_simple(SspCommand::Sync).map(|_| ())
    }

    /// Select the protocol version the host speaks
    fn host_protocol_version(&mut self, version: u8) -> Result<()> {
        let payload = PacketBuilder::new()
            .command(SspCommand::HostProtocolVersion)
            .byte(version)
            .build();
        self.send(&payload).map(|_| ())
    }

    /// Raw setup request reply
    fn setup_request(&mut self) -> Result<Vec<u8>> {
        self.send_simple(SspCommand::SetupRequest)
    }

    /// Setup request reply decoded into a [`UnitInfo`]
    fn unit_info(&mut self) -> Result<UnitInfo> {
        let data = self.setup_request()?;
        parse_setup_response(&data)
    }

    /// Poll for events; returns the raw event bytes
    fn poll(&mut self) -> Result<Vec<u8>> {
        self.send_simple(SspCommand::Poll)
    }

    /// Poll, with events repeated until acknowledged
    fn poll_with_ack(&mut self) -> Result<Vec<u8>> {
        self.send_simple(SspCommand::PollWithAck)
    }

    /// Acknowledge the events of the last [`SspDevice::poll_with_ack`]
    fn event_ack(&mut self) -> Result<()> {
        self.send_simple(SspCommand::EventAck).map(|_| ())
    }

    /// Allow the device to accept or pay out cash
    fn enable(&mut self) -> Result<()> {
        self.send_simple(SspCommand::Enable).map(|_| ())
    }

    /// Stop the device from accepting or paying out cash
    fn disable(&mut self) -> Result<()> {
        self.send_simple(SspCommand::Disable).map(|_| ())
    }

    /// Raw serial number bytes
    fn serial_number(&mut self) -> Result<Vec<u8>> {
        self.send_simple(SspCommand::GetSerialNumber)
    }

    /// Firmware version string
    fn firmware_version(&mut self) -> Result<String> {
        let data = self.send_simple(SspCommand::FirmwareVersion)?;
        Ok(ascii_string(&data))
    }

    /// Dataset version string
    fn dataset_version(&mut self) -> Result<String> {
        let data = self.send_simple(SspCommand::GetDatasetVersion)?;
        Ok(ascii_string(&data))
    }

    /// Raw build revision bytes
    fn build_revision(&mut self) -> Result<Vec<u8>> {
        self.send_simple(SspCommand::GetBuildRevision)
    }
}

/// Note validator capabilities
pub trait NoteValidator: SspDevice {
    /// Set the channel inhibit mask; a set bit enables the channel
    fn set_inhibits(&mut self, mask: u16) -> Result<()> {
        let payload = PacketBuilder::new()
            .command(SspCommand::SetInhibits)
            .u16_le(mask)
            .build();
        self.send(&payload).map(|_| ())
    }

    /// Turn the bezel display on
    fn display_on(&mut self) -> Result<()> {
        self.send_simple(SspCommand::DisplayOn).map(|_| ())
    }

    /// Turn the bezel display off
    fn display_off(&mut self) -> Result<()> {
        self.send_simple(SspCommand::DisplayOff).map(|_| ())
    }

    /// Reject the note held in escrow
    fn reject_note(&mut self) -> Result<()> {
        self.send_simple(SspCommand::RejectNote).map(|_| ())
    }

    /// Keep the escrowed note held
    fn hold(&mut self) -> Result<()> {
        self.send_simple(SspCommand::Hold).map(|_| ())
    }

    /// Reason code for the last rejected note
    fn last_reject_code(&mut self) -> Result<Option<u8>> {
        let data = self.send_simple(SspCommand::LastRejectCode)?;
        Ok(data.first().copied())
    }

    /// Report credits as channel numbers (`false`) or values (`true`)
    fn set_value_reporting_type(&mut self, report_values: bool) -> Result<()> {
        let payload = PacketBuilder::new()
            .command(SspCommand::SetValueReportingType)
            .byte(report_values as u8)
            .build();
        self.send(&payload).map(|_| ())
    }

    /// Raw channel value table
    fn channel_values(&mut self) -> Result<Vec<u8>> {
        self.send_simple(SspCommand::ChannelValueRequest)
    }
}

/// Payout unit capabilities
pub trait PayoutUnit: SspDevice {
    /// Enable the payout mechanism
    fn enable_payout(&mut self) -> Result<()> {
        self.send_simple(SspCommand::EnablePayout).map(|_| ())
    }

    /// Disable the payout mechanism
    fn disable_payout(&mut self) -> Result<()> {
        self.send_simple(SspCommand::DisablePayout).map(|_| ())
    }

    /// Stop a payout in progress
    fn halt_payout(&mut self) -> Result<()> {
        self.send_simple(SspCommand::HaltPayout).map(|_| ())
    }

    /// Move all stored notes to the cashbox
    fn empty_all(&mut self) -> Result<()> {
        self.send_simple(SspCommand::EmptyAll).map(|_| ())
    }

    /// Move all stored notes to the cashbox, keeping a record of them
    fn smart_empty(&mut self) -> Result<()> {
        self.send_simple(SspCommand::SmartEmpty).map(|_| ())
    }

    /// Send the last stored note to the cashbox
    fn stack_last_note(&mut self) -> Result<()> {
        self.send_simple(SspCommand::StackLastNote).map(|_| ())
    }

    /// Pay out the last stored note
    fn payout_last_note(&mut self) -> Result<()> {
        self.send_simple(SspCommand::PayoutLastNote).map(|_| ())
    }

    /// Raw note position table
    fn note_positions(&mut self) -> Result<Vec<u8>> {
        self.send_simple(SspCommand::GetNotePositions)
    }
}

/// A unit driven through every command set
pub struct GenericUnit<C: ByteChannel = Box<dyn SerialPort>> {
    conn: Connection<C>,
}

impl<C: ByteChannel> GenericUnit<C> {
    /// Wrap a connection
    pub fn new(conn: Connection<C>) -> Self {
        Self { conn }
    }

    /// Get the underlying connection
    pub fn connection(&self) -> &Connection<C> {
        &self.conn
    }

    /// Get the underlying connection mutably (e.g. to retry)
    pub fn connection_mut(&mut self) -> &mut Connection<C> {
        &mut self.conn
    }

    /// Unwrap the connection
    pub fn into_inner(self) -> Connection<C> {
        self.conn
    }
}

impl<C: ByteChannel> SspDevice for GenericUnit<C> {
    fn send(&mut self, payload: &[u8]) -> Result<Vec<u8>> {
        self.conn.send_command(payload)
    }
}

impl<C: ByteChannel> NoteValidator for GenericUnit<C> {}

impl<C: ByteChannel> PayoutUnit for GenericUnit<C> {}

/// Decode an ASCII field, dropping NUL padding and surrounding whitespace
pub(crate) fn ascii_string(data: &[u8]) -> String {
    String::from_utf8_lossy(data)
        .trim_matches(|c: char| c == '\0' || c.is_whitespace())
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Records payloads and answers every command with OK plus `data`
    struct Recorder {
        sent: Vec<Vec<u8>>,
        data: Vec<u8>,
    }

    impl SspDevice for Recorder {
        fn send(&mut self, payload: &[u8]) -> Result<Vec<u8>> {
            self.sent.push(payload.to_vec());
            Ok(self.data.clone())
        }
    }

    impl NoteValidator for Recorder {}
    impl PayoutUnit for Recorder {}

    fn recorder(data: &[u8]) -> Recorder {
        Recorder {
            sent: Vec::new(),
            data: data.to_vec(),
        }
    }

    #[test]
    fn test_base_command_payloads() {
        let mut dev = recorder(&[]);
        dev.reset().unwrap();
        dev.sync().unwrap();
        dev.host_protocol_version(DEFAULT_HOST_PROTOCOL_VERSION).unwrap();
        dev.enable().unwrap();
        dev.disable().unwrap();
        dev.poll().unwrap();
        assert_eq!(
            dev.sent,
            vec![
                vec![0x01],
                vec![0x11],
                vec![0x06, 0x06],
                vec![0x0A],
                vec![0x09],
                vec![0x07],
            ]
        );
    }

    #[test]
    fn test_validator_payloads() {
        let mut dev = recorder(&[0x06]);
        dev.set_inhibits(0x00FF).unwrap();
        dev.set_value_reporting_type(true).unwrap();
        assert_eq!(dev.last_reject_code().unwrap(), Some(0x06));
        assert_eq!(
            dev.sent,
            vec![vec![0x02, 0xFF, 0x00], vec![0x45, 0x01], vec![0x17]]
        );
    }

    #[test]
    fn test_payout_payloads() {
        let mut dev = recorder(&[]);
        dev.enable_payout().unwrap();
        dev.disable_payout().unwrap();
        dev.halt_payout().unwrap();
        dev.empty_all().unwrap();
        dev.smart_empty().unwrap();
        assert_eq!(
            dev.sent,
            vec![vec![0x5C], vec![0x5B], vec![0x38], vec![0x3F], vec![0x52]]
        );
    }

    #[test]
    fn test_firmware_version_string() {
        let mut dev = recorder(b"NV0200403141498000\0");
        assert_eq!(dev.firmware_version().unwrap(), "NV0200403141498000");
    }
}
