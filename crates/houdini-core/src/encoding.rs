//! Transcoding between engine-native strings and Rust strings
//!
//! The engine hands out strings as NUL-terminated UTF-8 byte buffers and
//! takes NUL-terminated C strings back.

use crate::error::{Error, Result};
use std::ffi::CString;

/// Decode an engine string buffer
///
/// Everything from the first NUL on is ignored, so both exact-length and
/// over-allocated buffers decode the same way.
pub fn decode_engine_string(bytes: &[u8]) -> Result<String> {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    std::str::from_utf8(&bytes[..end])
        .map(str::to_owned)
        .map_err(|e| Error::InvalidEncoding(e.to_string()))
}

/// Encode a Rust string for the engine
///
/// Fails if the string contains an interior NUL, which the engine could not
/// represent.
pub fn encode_engine_string(value: &str) -> Result<CString> {
    CString::new(value).map_err(|e| Error::InvalidEncoding(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_stops_at_nul() {
        assert_eq!(decode_engine_string(b"size\0").unwrap(), "size");
        assert_eq!(decode_engine_string(b"size\0garbage").unwrap(), "size");
        assert_eq!(decode_engine_string(b"size").unwrap(), "size");
        assert_eq!(decode_engine_string(b"\0").unwrap(), "");
    }

    #[test]
    fn test_decode_utf8() {
        let bytes = "Größe\0".as_bytes();
        assert_eq!(decode_engine_string(bytes).unwrap(), "Größe");
    }

    #[test]
    fn test_decode_invalid_utf8() {
        assert!(matches!(
            decode_engine_string(&[0xFF, 0xFE, 0]),
            Err(Error::InvalidEncoding(_))
        ));
    }

    #[test]
    fn test_encode_roundtrip() {
        let encoded = encode_engine_string("Größe").unwrap();
        assert_eq!(decode_engine_string(encoded.as_bytes_with_nul()).unwrap(), "Größe");
        assert!(encode_engine_string("a\0b").is_err());
    }
}
