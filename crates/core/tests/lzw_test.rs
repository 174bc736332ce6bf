//! LZW decoding.

use quire_core::codec::{lzwdecode, lzwdecode_with_earlychange};

#[test]
fn test_lzwdecode() {
    let input = b"\x80\x0b\x60\x50\x22\x0c\x0c\x85\x01";
    let expected = b"\x2d\x2d\x2d\x2d\x2d\x41\x2d\x2d\x2d\x42";
    assert_eq!(lzwdecode(input).unwrap(), expected);
}

#[test]
fn test_lzwdecode_early_change_only_matters_at_width_switch() {
    // Nine codes never reach the 9 to 10 bit switch, so both settings agree.
    let input = b"\x80\x0b\x60\x50\x22\x0c\x0c\x85\x01";
    let expected = b"\x2d\x2d\x2d\x2d\x2d\x41\x2d\x2d\x2d\x42";
    assert_eq!(lzwdecode_with_earlychange(input, 0).unwrap(), expected);
    assert_eq!(lzwdecode_with_earlychange(input, 1).unwrap(), lzwdecode(input).unwrap());
}
