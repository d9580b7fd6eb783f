//! Byte stuffing
//!
//! If STX (0x7F) appears anywhere after the start marker it is sent twice.
//! Stuffing is applied after the CRC is calculated, so the CRC bytes themselves
//! may be stuffed.

use super::STX;

/// Double every STX byte in `data`
pub fn stuff(data: &[u8]) -> Vec<u8> {
    let extra = data.iter().filter(|&&b| b == STX).count();
    let mut out = Vec::with_capacity(data.len() + extra);
    for &b in data {
        out.push(b);
        if b == STX {
            out.push(STX);
        }
    }
    out
}

/// Collapse doubled STX pairs back to a single byte
///
/// A lone STX (not followed by another) is passed through unchanged.
pub fn unstuff(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len());
    let mut i = 0;
    while i < data.len() {
        out.push(data[i]);
        if data[i] == STX && data.get(i + 1) == Some(&STX) {
            i += 2;
        } else {
            i += 1;
        }
    }
    out
}

/// Stuff everything after the leading start marker of a packed frame
pub fn stuff_frame(frame: &[u8]) -> Vec<u8> {
    match frame.split_first() {
        Some((&first, rest)) => {
            let mut out = Vec::with_capacity(frame.len() + 4);
            out.push(first);
            out.extend(stuff(rest));
            out
        }
        None => Vec::new(),
    }
}

/// Undo [`stuff_frame`] on a received frame
pub fn unstuff_frame(frame: &[u8]) -> Vec<u8> {
    match frame.split_first() {
        Some((&first, rest)) => {
            let mut out = Vec::with_capacity(frame.len());
            out.push(first);
            out.extend(unstuff(rest));
            out
        }
        None => Vec::new(),
    }
}
