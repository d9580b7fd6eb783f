//! Frame checksum
//!
//! SSP uses CRC-16 with polynomial 0x8005, seed 0xFFFF, no reflection and no
//! final XOR (catalogued as CRC-16/CMS). It covers SEQ/ADDR, LEN and the
//! payload; the STX marker is never part of it.

use crc::{Crc, CRC_16_CMS};

const CRC16: Crc<u16> = Crc::<u16>::new(&CRC_16_CMS);

/// Calculate the CRC-16 of `data`
pub fn crc16(data: &[u8]) -> u16 {
    CRC16.checksum(data)
}

/// CRC-16 of `data` as it appears on the wire: `[lo, hi]`
pub fn crc16_bytes(data: &[u8]) -> [u8; 2] {
    crc16(data).to_le_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    const VECTORS: &[(&[u8], u16)] = &[
        (&[0x00, 0x01, 0x21], 0x08C6),
        (&[0x80, 0x01, 0x21], 0x82C5),
        (&[0x80, 0x01, 0x20], 0x02C0),
        (&[0x00, 0x01, 0x0C], 0x0828),
        (&[0x00, 0x02, 0x06, 0x06], 0x941B),
        (&[0x80, 0x02, 0x06, 0x07], 0x9421),
    ];

    #[test]
    fn test_crc16_vectors() {
        for (data, expected) in VECTORS {
            assert_eq!(crc16(data), *expected, "crc16 of {:02X?}", data);
        }
    }

    #[test]
    fn test_crc16_bytes_little_endian() {
        for (data, expected) in VECTORS {
            let bytes = crc16_bytes(data);
            assert_eq!(bytes[0], (*expected & 0xFF) as u8);
            assert_eq!(bytes[1], (*expected >> 8) as u8);
        }
    }

    #[test]
    fn test_crc16_check_value() {
        assert_eq!(crc16(b"123456789"), 0xAEE7);
    }

    #[test]
    fn test_crc16_empty_is_seed() {
        assert_eq!(crc16(&[]), 0xFFFF);
    }
}
