//! LZW stream decoder using the weezl crate.

use crate::error::Result;
use weezl::{BitOrder, decode::Decoder};

/// Decode LZW-encoded data (PDF variant: MSB first, 8-bit, EarlyChange 1).
pub fn lzwdecode(data: &[u8]) -> Result<Vec<u8>> {
    lzwdecode_with_earlychange(data, 1)
}

/// Decode LZW-encoded data with an explicit EarlyChange setting.
///
/// EarlyChange=1 widens codes one entry early, which weezl calls the TIFF
/// size switch.
pub fn lzwdecode_with_earlychange(data: &[u8], early_change: i64) -> Result<Vec<u8>> {
    let mut decoder = if early_change == 0 {
        Decoder::new(BitOrder::Msb, 8)
    } else {
        Decoder::with_tiff_size_switch(BitOrder::Msb, 8)
    };
    let mut output = Vec::new();
    // Corrupt tails keep whatever decoded before the error.
    let _ = decoder.into_vec(&mut output).decode(data);
    Ok(output)
}
