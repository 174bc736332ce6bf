//! ASCII85 and ASCIIHex stream decoders.

use crate::error::Result;

/// Decode ASCII85-encoded data (PDF variant).
/// Handles: z-encoding, <~ ~> markers, whitespace, missing EOD.
pub fn ascii85decode(data: &[u8]) -> Result<Vec<u8>> {
    let data = data.strip_prefix(b"<~").unwrap_or(data);

    // Everything after the first '~' is the end marker or trailing junk.
    let data = match data.iter().position(|&b| b == b'~') {
        Some(pos) => &data[..pos],
        None => data,
    };

    let mut filtered = Vec::with_capacity(data.len());
    for &byte in data {
        match byte {
            b'z' => filtered.extend_from_slice(b"!!!!!"),
            b'!'..=b'u' => filtered.push(byte),
            _ => {}
        }
    }

    let mut result = Vec::with_capacity(filtered.len() * 4 / 5 + 4);
    for chunk in filtered.chunks(5) {
        let mut padded = [b'u'; 5];
        padded[..chunk.len()].copy_from_slice(chunk);
        let value = padded
            .iter()
            .fold(0u32, |acc, &b| acc.wrapping_mul(85).wrapping_add((b - b'!') as u32));
        let bytes = value.to_be_bytes();
        if chunk.len() == 5 {
            result.extend_from_slice(&bytes);
        } else if chunk.len() > 1 {
            result.extend_from_slice(&bytes[..chunk.len() - 1]);
        }
    }
    Ok(result)
}

/// Decode ASCIIHex-encoded data. Decoding stops at '>'; an odd trailing
/// nibble is padded with zero.
pub fn asciihexdecode(data: &[u8]) -> Result<Vec<u8>> {
    let mut result = Vec::with_capacity(data.len() / 2);
    let mut pending: Option<u8> = None;
    for &byte in data {
        if byte == b'>' {
            break;
        }
        if let Some(nibble) = hex_nibble(byte) {
            match pending.take() {
                Some(high) => result.push((high << 4) | nibble),
                None => pending = Some(nibble),
            }
        }
    }
    if let Some(high) = pending {
        result.push(high << 4);
    }
    Ok(result)
}

pub(crate) fn hex_nibble(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn asciihex_decode_expected() {
        let data = b"48656c6c6f 20776f726c64>"; // "Hello world"
        assert_eq!(asciihexdecode(data).unwrap(), b"Hello world");
    }

    #[test]
    fn asciihex_odd_nibble_is_padded() {
        assert_eq!(asciihexdecode(b"414>").unwrap(), vec![0x41, 0x40]);
    }

    #[test]
    fn ascii85_decode_expected() {
        let data = b"<~87cURD]i,\"Ebo7~>";
        assert_eq!(ascii85decode(data).unwrap(), b"Hello World");
    }
}
