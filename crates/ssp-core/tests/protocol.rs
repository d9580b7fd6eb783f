use pretty_assertions::assert_eq;
use ssp_core::device::{detector, GenericUnit, SspDevice, UnitType};
use ssp_core::protocol::{
    pack, stuffing::stuff_frame, ByteChannel, Connection, ConnectionConfig, ConnectionState,
    FrameTerminator, ProtocolError, ResponseCode, STX,
};
use std::collections::VecDeque;
use std::io;
use std::time::Duration;

/// Mock serial line: every write queues the next scripted reply, which is
/// then handed out a few bytes per read
struct MockSerial {
    written: Vec<Vec<u8>>,
    replies: VecDeque<Vec<u8>>,
    pending: VecDeque<u8>,
    chunk: usize,
    fail_on_send: bool,
}

impl MockSerial {
    fn new() -> Self {
        Self {
            written: Vec::new(),
            replies: VecDeque::new(),
            pending: VecDeque::new(),
            chunk: 3,
            fail_on_send: false,
        }
    }

    fn with_replies(replies: Vec<Vec<u8>>) -> Self {
        Self {
            replies: replies.into(),
            ..Self::new()
        }
    }
}

impl ByteChannel for MockSerial {
    fn write_bytes(&mut self, data: &[u8]) -> io::Result<usize> {
        if self.fail_on_send {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "Serial write failed"));
        }
        self.written.push(data.to_vec());
        if let Some(reply) = self.replies.pop_front() {
            self.pending.extend(reply);
        }
        Ok(data.len())
    }

    fn read_available(&mut self, buf: &mut [u8], _wait: Duration) -> io::Result<usize> {
        let n = self.pending.len().min(self.chunk).min(buf.len());
        for slot in buf.iter_mut().take(n) {
            *slot = self.pending.pop_front().unwrap_or_default();
        }
        Ok(n)
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn reply(seq_addr: u8, payload: &[u8]) -> Vec<u8> {
    pack(payload, seq_addr).unwrap()
}

fn config() -> ConnectionConfig {
    ConnectionConfig {
        idle_timeout_us: 1000,
        response_timeout_ms: 10,
        ..Default::default()
    }
}

#[test]
fn test_send_command_alternates_sequence_flag() {
    init_tracing();
    let mock = MockSerial::with_replies(vec![reply(0x00, &[0xF0]), reply(0x80, &[0xF0])]);
    let mut conn = Connection::with_channel(mock, config());

    assert_eq!(conn.send_command(&[0x11]).unwrap(), Vec::<u8>::new());
    assert_eq!(conn.send_command(&[0x11]).unwrap(), Vec::<u8>::new());

    let mock = conn.close().unwrap();
    assert_eq!(mock.written[0], pack(&[0x11], 0x00).unwrap());
    assert_eq!(mock.written[1], pack(&[0x11], 0x80).unwrap());
}

#[test]
fn test_reply_data_after_ok_byte() {
    let mock = MockSerial::with_replies(vec![reply(0x00, &[0xF0, 0x01, 0x02, 0x03])]);
    let mut conn = Connection::with_channel(mock, config());
    assert_eq!(conn.send_command(&[0x0C]).unwrap(), vec![0x01, 0x02, 0x03]);
}

#[test]
fn test_retry_reuses_sequence_byte() {
    init_tracing();
    let mock = MockSerial::with_replies(vec![
        vec![],
        reply(0x00, &[0xF0]),
        reply(0x80, &[0xF0]),
    ]);
    let mut conn = Connection::with_channel(mock, config());

    // First attempt: reply lost
    let err = conn.send_command(&[0x07]).unwrap_err();
    assert!(matches!(err, ProtocolError::FrameTooShort { len: 0, .. }));

    conn.retry().unwrap();
    conn.send_command(&[0x07]).unwrap();

    let mock = conn.close().unwrap();
    assert_eq!(mock.written[0], mock.written[1]);
    assert_eq!(mock.written[0][1], 0x00);
    assert_eq!(mock.written[2][1], 0x80);
}

#[test]
fn test_retry_without_prior_command() {
    let mut conn = Connection::with_channel(MockSerial::new(), config());
    assert!(matches!(conn.retry(), Err(ProtocolError::NoRetryPending)));
}

#[test]
fn test_busy_and_cannot_process() {
    let mock = MockSerial::with_replies(vec![
        reply(0x00, &[0xF5, 0x03]),
        reply(0x80, &[0xF5, 0x07]),
        reply(0x00, &[0xF8]),
        reply(0x80, &[0xFA]),
    ]);
    let mut conn = Connection::with_channel(mock, config());

    assert!(matches!(
        conn.send_command(&[0x0A]),
        Err(ProtocolError::DeviceBusy)
    ));
    assert!(matches!(
        conn.send_command(&[0x0A]),
        Err(ProtocolError::CannotProcess(0x07))
    ));
    assert!(matches!(
        conn.send_command(&[0x0A]),
        Err(ProtocolError::Response(ResponseCode::Fail))
    ));
    let err = conn.send_command(&[0x0A]).unwrap_err();
    assert_eq!(err.response_code(), Some(ResponseCode::KeyNotSet));
}

#[test]
fn test_silent_device_is_frame_too_short() {
    let mut conn = Connection::with_channel(MockSerial::new(), config());
    let err = conn.send_command(&[0x11]).unwrap_err();
    assert!(matches!(err, ProtocolError::FrameTooShort { len: 0, .. }));
    assert_eq!(conn.state(), ConnectionState::Connected);
}

#[test]
fn test_corrupted_reply_is_checksum_mismatch() {
    let mut bad = reply(0x00, &[0xF0]);
    let last = bad.len() - 1;
    bad[last] ^= 0xFF;
    let mut conn = Connection::with_channel(MockSerial::with_replies(vec![bad]), config());
    assert!(matches!(
        conn.send_command(&[0x11]),
        Err(ProtocolError::ChecksumMismatch { .. })
    ));
}

#[test]
fn test_bad_start_marker() {
    let mut bad = reply(0x00, &[0xF0]);
    bad[0] = 0x00;
    let mut conn = Connection::with_channel(MockSerial::with_replies(vec![bad]), config());
    assert!(matches!(
        conn.send_command(&[0x11]),
        Err(ProtocolError::InvalidFraming { found: 0x00, .. })
    ));
}

#[test]
fn test_outbound_stuffing() {
    let mock = MockSerial::with_replies(vec![reply(0x00, &[0xF0])]);
    let mut conn = Connection::with_channel(mock, config());
    conn.send_command(&[0x02, STX, 0x00]).unwrap();

    let mock = conn.close().unwrap();
    let frame = pack(&[0x02, STX, 0x00], 0x00).unwrap();
    assert_eq!(mock.written[0], stuff_frame(&frame));
    assert_eq!(mock.written[0][4..6].to_vec(), vec![STX, STX]);
}

#[test]
fn test_inbound_unstuffing() {
    let wire = stuff_frame(&reply(0x00, &[0xF0, STX, 0x01]));
    let mock = MockSerial::with_replies(vec![wire]);
    let mut conn = Connection::with_channel(mock, config());
    assert_eq!(conn.send_command(&[0x0E]).unwrap(), vec![STX, 0x01]);
}

#[test]
fn test_stuffing_disabled_sends_raw_frame() {
    let mock = MockSerial::with_replies(vec![reply(0x00, &[0xF0])]);
    let cfg = ConnectionConfig {
        byte_stuffing: false,
        ..config()
    };
    let mut conn = Connection::with_channel(mock, cfg);
    conn.send_command(&[0x02, STX, 0x00]).unwrap();
    let mock = conn.close().unwrap();
    assert_eq!(mock.written[0], pack(&[0x02, STX, 0x00], 0x00).unwrap());
}

#[test]
fn test_length_prefixed_terminator_ignores_trailing_noise() {
    let mut wire = reply(0x00, &[0xF0, 0x42]);
    wire.extend_from_slice(&[0xAA, 0xBB, 0xCC, 0xDD]);
    let mut mock = MockSerial::with_replies(vec![wire]);
    mock.chunk = 1;
    let cfg = ConnectionConfig {
        terminator: FrameTerminator::LengthPrefixed,
        ..config()
    };
    let mut conn = Connection::with_channel(mock, cfg);
    assert_eq!(conn.send_command(&[0x17]).unwrap(), vec![0x42]);
}

#[test]
fn test_write_failure_sets_error_state() {
    let mut mock = MockSerial::new();
    mock.fail_on_send = true;
    let mut conn = Connection::with_channel(mock, config());
    assert!(matches!(
        conn.send_command(&[0x11]),
        Err(ProtocolError::IoError(_))
    ));
    assert_eq!(conn.state(), ConnectionState::Error);
}

#[test]
fn test_payload_too_large_does_not_consume_sequence() {
    let mock = MockSerial::with_replies(vec![reply(0x00, &[0xF0])]);
    let mut conn = Connection::with_channel(mock, config());
    assert!(matches!(
        conn.send_command(&[0u8; 256]),
        Err(ProtocolError::PayloadTooLarge(256))
    ));
    assert!(!conn.sequence().flag());
    conn.send_command(&[0x11]).unwrap();
    assert_eq!(conn.close().unwrap().written[0][1], 0x00);
}

#[test]
fn test_closed_connection() {
    let mut conn = Connection::with_channel(MockSerial::new(), config());
    conn.close();
    assert_eq!(conn.state(), ConnectionState::Disconnected);
    assert!(matches!(
        conn.send_command(&[0x11]),
        Err(ProtocolError::NotConnected)
    ));
}

#[test]
fn test_counters() {
    let mock = MockSerial::with_replies(vec![reply(0x00, &[0xF0])]);
    let mut conn = Connection::with_channel(mock, config());
    conn.send_command(&[0x11]).unwrap();
    assert_eq!(conn.counters(), (6, 6, 1, 1));
}

#[test]
fn test_generic_unit_host_protocol_version() {
    let mock = MockSerial::with_replies(vec![reply(0x80, &[0xF0])]);
    let cfg = ConnectionConfig {
        initial_sequence_flag: true,
        ..config()
    };
    let mut unit = GenericUnit::new(Connection::with_channel(mock, cfg));
    unit.host_protocol_version(6).unwrap();

    let mock = unit.connection_mut().close().unwrap();
    assert_eq!(mock.written[0], vec![STX, 0x80, 0x02, 0x06, 0x06, 0x24, 0x14]);
}

#[test]
fn test_probe_identifies_unit() {
    let mut setup = vec![0xF0, 0x00];
    setup.extend_from_slice(b"0370GBP");
    setup.extend_from_slice(&[0x00, 0x00, 0x00, 0x05]);
    let mock = MockSerial::with_replies(vec![reply(0x80, &setup)]);
    let cfg = ConnectionConfig {
        initial_sequence_flag: true,
        ..config()
    };
    let mut conn = Connection::with_channel(mock, cfg);

    let info = detector::probe(&mut conn).unwrap();
    assert_eq!(info.unit_type, UnitType::Validator);
    assert_eq!(info.firmware_version, "0370");
    assert_eq!(info.currency, "GBP");
    assert_eq!(info.channels, 5);

    let mock = conn.close().unwrap();
    assert_eq!(mock.written[0], vec![STX, 0x80, 0x01, 0x05, 0x1D, 0x82]);
}

#[test]
fn test_probe_silent_port() {
    let mut conn = Connection::with_channel(MockSerial::new(), config());
    assert!(matches!(
        detector::probe(&mut conn),
        Err(ProtocolError::NoDeviceFound)
    ));
}
