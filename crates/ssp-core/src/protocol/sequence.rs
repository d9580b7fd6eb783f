//! Sequence flag tracking
//!
//! The sequence flag lets a slave tell a retransmission from a new command.
//! Each new packet the master sends alternates the flag; if the slave sees the
//! same flag twice in a row it does not execute the command again but repeats
//! its last reply. Replies carry the same SEQ/ADDR byte as the command.

/// Alternating sequence flag owned by one logical connection
#[derive(Debug, Clone, Default)]
pub struct SequenceTracker {
    flag: bool,
    last: Option<u8>,
}

impl SequenceTracker {
    /// Create a tracker whose first frame is tagged with `initial_flag`
    pub fn new(initial_flag: bool) -> Self {
        Self {
            flag: initial_flag,
            last: None,
        }
    }

    /// SEQ/ADDR byte for a new command, then toggle the flag
    pub fn next_seq_addr(&mut self, address: u8) -> u8 {
        let seq_addr = ((self.flag as u8) << 7) | (address & 0x7F);
        self.flag = !self.flag;
        self.last = Some(seq_addr);
        seq_addr
    }

    /// SEQ/ADDR byte of the most recent command, reused for retransmission
    pub fn last_seq_addr(&self) -> Option<u8> {
        self.last
    }

    /// Flag the next new command will carry
    pub fn flag(&self) -> bool {
        self.flag
    }

    /// Forget the last command and restart from `initial_flag`
    pub fn reset(&mut self, initial_flag: bool) {
        self.flag = initial_flag;
        self.last = None;
    }
}
