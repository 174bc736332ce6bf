//! Stream filter decoders for content streams and inline image data.
//!
//! - `ascii85`: ASCII85 and ASCIIHex
//! - `flate`: FlateDecode (flate2)
//! - `lzw`: LZWDecode (weezl)
//!
//! Image-only filters (DCT, CCITT, JBIG2, JPX) are not decoded here; their
//! bytes pass through untouched for the image collaborator.

pub mod ascii85;
pub mod flate;
pub mod lzw;

pub use ascii85::{ascii85decode, asciihexdecode};
pub use flate::{flate_encoded_len, flatedecode};
pub use lzw::{lzwdecode, lzwdecode_with_earlychange};

use crate::error::{PdfError, Result};
use crate::model::objects::Dictionary;

/// Filters whose output is image samples and are left encoded.
const IMAGE_FILTERS: [&str; 5] = [
    "DCTDecode",
    "CCITTFaxDecode",
    "JBIG2Decode",
    "JPXDecode",
    "RunLengthDecode",
];

/// Applies a filter chain in order. `params` lines up with `filters`.
///
/// Decoding stops (returning the bytes so far) at the first image filter.
pub fn decode_filters(
    data: &[u8],
    filters: &[String],
    params: &[Option<&Dictionary>],
) -> Result<Vec<u8>> {
    let mut output = data.to_vec();
    for (i, filter) in filters.iter().enumerate() {
        output = match filter.as_str() {
            "FlateDecode" | "Fl" => flatedecode(&output),
            "LZWDecode" | "LZW" => {
                let early_change = params
                    .get(i)
                    .copied()
                    .flatten()
                    .and_then(|p| p.get("EarlyChange"))
                    .and_then(|v| v.as_int().ok())
                    .unwrap_or(1);
                lzwdecode_with_earlychange(&output, early_change)?
            }
            "ASCIIHexDecode" | "AHx" => asciihexdecode(&output)?,
            "ASCII85Decode" | "A85" => ascii85decode(&output)?,
            name if IMAGE_FILTERS.contains(&name) => return Ok(output),
            other => return Err(PdfError::UnsupportedFilter(other.to_string())),
        };
    }
    Ok(output)
}

/// Length of the encoded data for `filter` at the start of `data`, when the
/// filter has a self-delimiting end. Zero means "unknown, scan for EI".
pub fn encoded_len(filter: &str, data: &[u8]) -> usize {
    match filter {
        "FlateDecode" | "Fl" => flate_encoded_len(data),
        "ASCIIHexDecode" | "AHx" => data
            .iter()
            .position(|&b| b == b'>')
            .map(|p| p + 1)
            .unwrap_or(data.len()),
        "ASCII85Decode" | "A85" => data
            .windows(2)
            .position(|w| w == b"~>")
            .map(|p| p + 2)
            .unwrap_or(data.len()),
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_applies_in_order() {
        let filters = vec!["ASCIIHexDecode".to_string()];
        let out = decode_filters(b"3020302030206d>", &filters, &[None]).unwrap();
        assert_eq!(out, b"0 0 0 m");
    }

    #[test]
    fn unknown_filter_is_an_error() {
        let filters = vec!["Crypt2".to_string()];
        assert!(decode_filters(b"", &filters, &[None]).is_err());
    }

    #[test]
    fn hex_length_includes_marker() {
        assert_eq!(encoded_len("AHx", b"ABCD> EI"), 5);
        assert_eq!(encoded_len("DCT", b"ABCD> EI"), 0);
    }
}
