//! FlateDecode via flate2.

use flate2::{Decompress, FlushDecompress, Status};
use std::io::Read;

/// Inflate zlib data. Corrupted input yields the bytes decoded before the
/// failure point.
pub fn flatedecode(data: &[u8]) -> Vec<u8> {
    let mut decoder = flate2::read::ZlibDecoder::new(data);
    let mut decompressed = Vec::new();
    if decoder.read_to_end(&mut decompressed).is_err() {
        return decompress_corrupted(data);
    }
    decompressed
}

/// Number of input bytes a complete zlib stream at the start of `data`
/// occupies. Used to find the end of filtered inline image data.
pub fn flate_encoded_len(data: &[u8]) -> usize {
    let mut decoder = Decompress::new(true);
    let mut buf = [0u8; 4096];
    loop {
        let before_in = decoder.total_in();
        let before_out = decoder.total_out();
        let start = before_in as usize;
        let res = decoder.decompress(&data[start..], &mut buf, FlushDecompress::None);
        let stalled = decoder.total_in() == before_in && decoder.total_out() == before_out;
        match res {
            Ok(Status::StreamEnd) | Err(_) => break,
            Ok(_) if stalled || decoder.total_in() as usize >= data.len() => break,
            Ok(_) => {}
        }
    }
    decoder.total_in() as usize
}

fn decompress_corrupted(data: &[u8]) -> Vec<u8> {
    let mut decoder = Decompress::new(true);
    let mut out = Vec::with_capacity(data.len() * 2);
    let mut buf = [0u8; 4096];
    let mut i = 0usize;
    while i < data.len() {
        let before_out = decoder.total_out();
        let before_in = decoder.total_in();
        let res = decoder.decompress(&data[i..i + 1], &mut buf, FlushDecompress::None);
        let produced = (decoder.total_out() - before_out) as usize;
        if produced > 0 {
            out.extend_from_slice(&buf[..produced]);
        }
        let consumed = (decoder.total_in() - before_in) as usize;
        i += consumed.max(1);
        match res {
            Ok(Status::StreamEnd) | Err(_) => break,
            Ok(_) => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::ZlibEncoder;
    use std::io::Write;

    fn compress(data: &[u8]) -> Vec<u8> {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn inflate_round_trip() {
        let packed = compress(b"0 0 m 10 10 l S");
        assert_eq!(flatedecode(&packed), b"0 0 m 10 10 l S");
    }

    #[test]
    fn encoded_len_stops_at_stream_end() {
        let mut packed = compress(b"abcdefabcdefabcdef");
        let len = packed.len();
        packed.extend_from_slice(b"\nEI Q");
        assert_eq!(flate_encoded_len(&packed), len);
    }
}
