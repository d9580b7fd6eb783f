use serde::{Deserialize, Serialize};
use std::fmt;

/// A note/coin channel as reported by a device's setup data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Channel {
    /// Denomination value in the smallest currency unit
    pub value: u32,
    /// Number of notes currently stored for this channel
    pub level: u32,
    /// Channel number, starting at 1
    pub channel: u8,
    /// Whether notes of this channel are routed to the payout store
    pub recycling: bool,
    /// Three-letter ISO currency code
    pub currency: String,
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_as_json() {
        let ch = Channel {
            value: 500,
            level: 3,
            channel: 1,
            recycling: true,
            currency: "EUR".to_string(),
        };
        assert_eq!(
            ch.to_string(),
            r#"{"Value":500,"Level":3,"Channel":1,"Recycling":true,"Currency":"EUR"}"#
        );
    }
}
