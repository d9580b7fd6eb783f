//! Connection management
//!
//! Owns the byte channel and the sequence flag for one device and runs
//! strictly alternating command/reply exchanges over it.
//!
//! A connection performs no locking: every exchange takes `&mut self`, so
//! callers sharing one physical port must serialize access themselves (one
//! worker per port, or a mutex around the connection).

use serde::{Deserialize, Serialize};
use serialport::SerialPort;
use std::fs;
use std::io;
use std::path::Path;
use std::time::Duration;

use super::{
    classify, code_name, list_ports, open_port, pack,
    stuffing::{stuff_frame, unstuff_frame},
    transport::{read_frame, write_frame},
    unpack, ByteChannel, FrameTerminator, PortInfo, ProtocolError, ReadTimeouts, Result,
    SequenceTracker, DEFAULT_BAUD_RATE, DEFAULT_IDLE_TIMEOUT_US, DEFAULT_RESPONSE_TIMEOUT_MS,
    MAX_PAYLOAD_SIZE,
};

/// Connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionState {
    /// Not connected
    Disconnected,
    /// Connected and ready
    Connected,
    /// The channel reported an I/O error
    Error,
}

/// Connection configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Serial port name
    pub port_name: String,
    /// Baud rate
    pub baud_rate: u32,
    /// Device address, 0 in single-drop mode
    pub address: u8,
    /// Sequence flag carried by the first frame
    pub initial_sequence_flag: bool,
    /// Maximum wait for the first reply byte, in milliseconds
    pub response_timeout_ms: u64,
    /// Inter-byte silence that ends a reply, in microseconds
    pub idle_timeout_us: u64,
    /// Stuff STX bytes on transmit and collapse them on receive
    pub byte_stuffing: bool,
    /// How the end of a reply is detected
    pub terminator: FrameTerminator,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            port_name: String::new(),
            baud_rate: DEFAULT_BAUD_RATE,
            address: 0,
            initial_sequence_flag: false,
            response_timeout_ms: DEFAULT_RESPONSE_TIMEOUT_MS,
            idle_timeout_us: DEFAULT_IDLE_TIMEOUT_US,
            byte_stuffing: true,
            terminator: FrameTerminator::IdleTimeout,
        }
    }
}

impl ConnectionConfig {
    /// Load a configuration from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let content = fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    /// Save the configuration as pretty-printed JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        fs::write(path, content)
    }

    /// Read bounds derived from this configuration
    pub fn read_timeouts(&self) -> ReadTimeouts {
        ReadTimeouts {
            response: Duration::from_millis(self.response_timeout_ms),
            idle: Duration::from_micros(self.idle_timeout_us),
        }
    }
}

/// A connection to one SSP device
pub struct Connection<C: ByteChannel = Box<dyn SerialPort>> {
    /// Byte channel (None once closed)
    channel: Option<C>,
    /// Current connection state
    state: ConnectionState,
    /// Connection configuration
    config: ConnectionConfig,
    /// Sequence flag for this connection only
    sequence: SequenceTracker,
    /// Payload of the most recent command, kept for retransmission
    last_payload: Option<Vec<u8>>,
    /// Metrics: cumulative bytes/packets sent & received
    tx_bytes: u64,
    rx_bytes: u64,
    tx_packets: u64,
    rx_packets: u64,
}

impl Connection<Box<dyn SerialPort>> {
    /// Open the serial port named in `config`
    pub fn open(config: ConnectionConfig) -> Result<Self> {
        let port = open_port(&config.port_name, Some(config.baud_rate))?;
        tracing::debug!(
            "opened {} at {} baud",
            config.port_name,
            config.baud_rate
        );
        Ok(Self::with_channel(port, config))
    }

    /// Reopen the configured port after [`Connection::close`] or an I/O error
    pub fn reconnect(&mut self) -> Result<()> {
        if self.state == ConnectionState::Connected {
            return Err(ProtocolError::AlreadyConnected);
        }
        let port = open_port(&self.config.port_name, Some(self.config.baud_rate))?;
        self.attach(port);
        Ok(())
    }

    /// List available serial ports
    pub fn list_ports() -> Vec<PortInfo> {
        list_ports()
    }
}

impl<C: ByteChannel> Connection<C> {
    /// Wrap an already open channel
    pub fn with_channel(channel: C, config: ConnectionConfig) -> Self {
        let sequence = SequenceTracker::new(config.initial_sequence_flag);
        Self {
            channel: Some(channel),
            state: ConnectionState::Connected,
            config,
            sequence,
            last_payload: None,
            tx_bytes: 0,
            rx_bytes: 0,
            tx_packets: 0,
            rx_packets: 0,
        }
    }

    /// Replace the channel, restarting the sequence flag
    pub fn attach(&mut self, channel: C) {
        self.channel = Some(channel);
        self.sequence.reset(self.config.initial_sequence_flag);
        self.last_payload = None;
        self.state = ConnectionState::Connected;
    }

    /// Close the connection, returning the channel
    pub fn close(&mut self) -> Option<C> {
        self.state = ConnectionState::Disconnected;
        self.last_payload = None;
        self.channel.take()
    }

    /// Get current connection state
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Get the connection configuration
    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Get the sequence tracker
    pub fn sequence(&self) -> &SequenceTracker {
        &self.sequence
    }

    /// Get cumulative tx/rx bytes and packet counters
    pub fn counters(&self) -> (u64, u64, u64, u64) {
        (
            self.tx_bytes,
            self.rx_bytes,
            self.tx_packets,
            self.rx_packets,
        )
    }

    /// Send a new command, toggling the sequence flag
    ///
    /// Returns the reply data that follows the OK status byte.
    pub fn send_command(&mut self, payload: &[u8]) -> Result<Vec<u8>> {
        if payload.len() > MAX_PAYLOAD_SIZE {
            return Err(ProtocolError::PayloadTooLarge(payload.len()));
        }
        if self.channel.is_none() {
            return Err(ProtocolError::NotConnected);
        }
        let seq_addr = self.sequence.next_seq_addr(self.config.address);
        self.last_payload = Some(payload.to_vec());
        self.exchange(payload, seq_addr)
    }

    /// Retransmit the previous command with the same sequence flag
    ///
    /// The device recognises the repeated flag and answers with its previous
    /// reply instead of executing the command twice.
    pub fn retry(&mut self) -> Result<Vec<u8>> {
        let seq_addr = self
            .sequence
            .last_seq_addr()
            .ok_or(ProtocolError::NoRetryPending)?;
        let payload = self
            .last_payload
            .clone()
            .ok_or(ProtocolError::NoRetryPending)?;
        tracing::debug!("retransmitting with seq {:#04x}", seq_addr);
        self.exchange(&payload, seq_addr)
    }

    fn exchange(&mut self, payload: &[u8], seq_addr: u8) -> Result<Vec<u8>> {
        let frame = pack(payload, seq_addr)?;
        let wire = if self.config.byte_stuffing {
            stuff_frame(&frame)
        } else {
            frame
        };
        let terminator = self.config.terminator;
        let timeouts = self.config.read_timeouts();
        let stuffed = self.config.byte_stuffing;

        let channel = self.channel.as_mut().ok_or(ProtocolError::NotConnected)?;

        tracing::debug!(
            "send {} (seq {:#04x}): {:02X?}",
            payload.first().map(|&b| code_name(b)).unwrap_or("EMPTY"),
            seq_addr,
            wire
        );

        self.tx_bytes = self.tx_bytes.saturating_add(wire.len() as u64);
        self.tx_packets = self.tx_packets.saturating_add(1);
        let raw = write_frame(channel, &wire)
            .and_then(|_| read_frame(channel, terminator, timeouts, stuffed))
            .map_err(|e| {
                if matches!(e, ProtocolError::IoError(_)) {
                    self.state = ConnectionState::Error;
                }
                e
            })?;
        self.rx_bytes = self.rx_bytes.saturating_add(raw.len() as u64);
        tracing::debug!("read {} bytes: {:02X?}", raw.len(), raw);

        let frame = if stuffed { unstuff_frame(&raw) } else { raw };
        let reply = unpack(&frame).map_err(|e| {
            tracing::warn!("rejected reply: {}", e);
            e
        })?;
        self.rx_packets = self.rx_packets.saturating_add(1);

        if frame[1] != seq_addr {
            tracing::warn!(
                "reply seq {:#04x} does not match command seq {:#04x}",
                frame[1],
                seq_addr
            );
        }

        match classify(reply) {
            Ok(data) => Ok(data.to_vec()),
            Err(e) => {
                tracing::warn!("device refused command: {}", e);
                Err(e)
            }
        }
    }
}
