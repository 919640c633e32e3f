//! Text Decoding with Encoding Fallback
//!
//! The scraped dataset files are usually UTF-8, but some were exported from
//! spreadsheet tools as GBK. Reading tries strict UTF-8 first and falls back
//! to strict GBK; a file that is neither is an error, not silently mangled.
//!
//! Output CSVs are written with a UTF-8 byte-order mark so spreadsheet tools
//! pick the right encoding when opening them.

use std::fs;
use std::path::Path;

use encoding_rs::GBK;
use thiserror::Error;

/// Byte-order mark prepended to output CSVs for spreadsheet compatibility.
pub const UTF8_BOM: &[u8] = b"\xef\xbb\xbf";

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{path} is neither valid UTF-8 nor valid GBK")]
    Encoding { path: String },
}

/// Read a text file, decoding as strict UTF-8 with a strict GBK fallback.
///
/// A leading UTF-8 byte-order mark is stripped. Both decoders are strict:
/// malformed input falls through to the next attempt instead of being
/// replaced, and a file that fails both is reported as undecodable.
pub fn read_text(path: &Path) -> Result<String, DecodeError> {
    let bytes = fs::read(path).map_err(|source| DecodeError::Io {
        path: path.display().to_string(),
        source,
    })?;

    decode_text(&bytes).ok_or_else(|| DecodeError::Encoding {
        path: path.display().to_string(),
    })
}

/// Decode bytes as strict UTF-8, then strict GBK. `None` when both fail.
pub fn decode_text(bytes: &[u8]) -> Option<String> {
    if let Ok(s) = std::str::from_utf8(bytes) {
        let s = s.strip_prefix('\u{feff}').unwrap_or(s);
        return Some(s.to_string());
    }

    GBK.decode_without_bom_handling_and_without_replacement(bytes)
        .map(|cow| cow.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_utf8_passthrough() {
        let text = "批次,名称\n1,拙政园\n";
        assert_eq!(decode_text(text.as_bytes()).unwrap(), text);
    }

    #[test]
    fn test_decode_strips_bom() {
        let mut bytes = UTF8_BOM.to_vec();
        bytes.extend_from_slice("名称".as_bytes());
        assert_eq!(decode_text(&bytes).unwrap(), "名称");
    }

    #[test]
    fn test_decode_gbk_fallback() {
        // "苏州" in GBK
        let bytes = [0xcb, 0xd5, 0xd6, 0xdd];
        assert_eq!(decode_text(&bytes).unwrap(), "苏州");
    }

    #[test]
    fn test_decode_garbage_is_none() {
        // Truncated multi-byte sequence, invalid in both encodings
        let bytes = [0xff, 0xff, 0x81];
        assert!(decode_text(&bytes).is_none());
    }
}
