//! WinAnsi encoding utilities for the standard PDF fonts
//!
//! The built-in Helvetica fonts are addressed with single-byte WinAnsi
//! (Windows-1252) strings. This module provides:
//! - Per-character conversion from UTF-8 to WinAnsi
//! - A replacement byte for characters the code page cannot express

/// Byte written for characters WinAnsi cannot represent
const REPLACEMENT: u8 = b'?';

/// Encode a single character, `None` if WinAnsi has no slot for it
pub(crate) fn winansi_byte(c: char) -> Option<u8> {
    if c.is_ascii() {
        return Some(c as u8);
    }
    let mut buf = [0u8; 4];
    let (cow, _, had_errors) = encoding_rs::WINDOWS_1252.encode(c.encode_utf8(&mut buf));
    if had_errors || cow.len() != 1 {
        None
    } else {
        Some(cow[0])
    }
}

/// Convert UTF-8 text to WinAnsi bytes
///
/// Characters are converted one at a time so an unmappable character turns
/// into a single `?` instead of a numeric character reference. Control
/// characters (tabs, stray newlines) become spaces.
pub fn to_winansi(s: &str) -> Vec<u8> {
    s.chars()
        .map(|c| {
            if c.is_control() {
                b' '
            } else {
                winansi_byte(c).unwrap_or(REPLACEMENT)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_passthrough() {
        assert_eq!(to_winansi("Quote 250115-001"), b"Quote 250115-001".to_vec());
    }

    #[test]
    fn test_latin_characters() {
        assert_eq!(to_winansi("£"), vec![0xA3]);
        assert_eq!(to_winansi("€"), vec![0x80]);
        assert_eq!(to_winansi("é"), vec![0xE9]);
    }

    #[test]
    fn test_unmappable_becomes_replacement() {
        assert_eq!(to_winansi("A中B"), b"A?B".to_vec());
    }

    #[test]
    fn test_control_characters_become_spaces() {
        assert_eq!(to_winansi("a\tb\nc"), b"a b c".to_vec());
    }
}
