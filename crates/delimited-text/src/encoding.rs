//! Text encodings for delimited sources and sinks.

use encoding_rs::{Decoder, Encoding, UTF_16BE, UTF_16LE, UTF_8, WINDOWS_1252};
use entity_core::{ConversionError, Result};
use serde::Deserialize;
use std::str::FromStr;

/// Character encoding of a delimited stream.
///
/// Reading sniffs a byte-order mark first, so a UTF-16 file is decoded
/// correctly even when the configured encoding is the UTF-8 default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(try_from = "String")]
pub enum TextEncoding {
    /// UTF-8 without a byte-order mark
    #[default]
    Utf8,
    /// UTF-8 with a byte-order mark
    Utf8Bom,
    /// UTF-16 little endian, with a byte-order mark
    Utf16Le,
    /// UTF-16 big endian, with a byte-order mark
    Utf16Be,
    /// Windows-1252, the usual "Latin-1" of Concordance load files
    Latin1,
    /// 7-bit ASCII
    Ascii,
}

impl TextEncoding {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Utf8 => "utf-8",
            Self::Utf8Bom => "utf-8-bom",
            Self::Utf16Le => "utf-16le",
            Self::Utf16Be => "utf-16be",
            Self::Latin1 => "latin1",
            Self::Ascii => "ascii",
        }
    }

    fn encoding(&self) -> &'static Encoding {
        match self {
            Self::Utf8 | Self::Utf8Bom | Self::Ascii => UTF_8,
            Self::Utf16Le => UTF_16LE,
            Self::Utf16Be => UTF_16BE,
            Self::Latin1 => WINDOWS_1252,
        }
    }

    /// Decoder with byte-order-mark sniffing.
    pub(crate) fn new_decoder(&self) -> Decoder {
        self.encoding().new_decoder()
    }

    /// Byte-order mark written before the first row.
    pub fn bom(&self) -> &'static [u8] {
        match self {
            Self::Utf8Bom => b"\xEF\xBB\xBF",
            Self::Utf16Le => b"\xFF\xFE",
            Self::Utf16Be => b"\xFE\xFF",
            Self::Utf8 | Self::Latin1 | Self::Ascii => b"",
        }
    }

    /// Append `text` to `out` in this encoding.
    ///
    /// Characters the encoding cannot represent are an error rather than being
    /// replaced.
    pub fn encode_into(&self, text: &str, out: &mut Vec<u8>) -> Result<()> {
        match self {
            Self::Utf8 | Self::Utf8Bom => out.extend_from_slice(text.as_bytes()),
            Self::Utf16Le => out.extend(text.encode_utf16().flat_map(u16::to_le_bytes)),
            Self::Utf16Be => out.extend(text.encode_utf16().flat_map(u16::to_be_bytes)),
            Self::Latin1 => {
                let (bytes, _, had_unmappable) = WINDOWS_1252.encode(text);
                if had_unmappable {
                    return Err(self.unmappable(text));
                }
                out.extend_from_slice(&bytes);
            }
            Self::Ascii => {
                if !text.is_ascii() {
                    return Err(self.unmappable(text));
                }
                out.extend_from_slice(text.as_bytes());
            }
        }
        Ok(())
    }

    fn unmappable(&self, text: &str) -> ConversionError {
        let reason = text
            .chars()
            .find(|c| !self.can_represent(*c))
            .map(|c| format!("character {c:?} cannot be represented"))
            .unwrap_or_else(|| "unrepresentable character".to_string());
        ConversionError::EncodingFailure {
            encoding: self.name(),
            reason,
        }
    }

    fn can_represent(&self, c: char) -> bool {
        match self {
            Self::Ascii => c.is_ascii(),
            Self::Latin1 => {
                let mut buf = [0u8; 4];
                !WINDOWS_1252.encode(c.encode_utf8(&mut buf)).2
            }
            Self::Utf8 | Self::Utf8Bom | Self::Utf16Le | Self::Utf16Be => true,
        }
    }
}

impl FromStr for TextEncoding {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "utf8" | "utf-8" => Ok(Self::Utf8),
            "utf8-bom" | "utf-8-bom" => Ok(Self::Utf8Bom),
            "utf16le" | "utf-16le" | "unicode" => Ok(Self::Utf16Le),
            "utf16be" | "utf-16be" | "bigendianunicode" => Ok(Self::Utf16Be),
            "latin1" | "windows-1252" | "cp1252" => Ok(Self::Latin1),
            "ascii" | "us-ascii" => Ok(Self::Ascii),
            other => Err(ConversionError::invalid_config(
                "encoding",
                format!("unknown encoding '{other}'"),
            )),
        }
    }
}

impl TryFrom<String> for TextEncoding {
    type Error = ConversionError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use entity_core::ErrorCode;

    #[test]
    fn test_utf16_encoding() {
        let mut out = Vec::new();
        TextEncoding::Utf16Le.encode_into("Aþ", &mut out).unwrap();
        assert_eq!(out, vec![0x41, 0x00, 0xFE, 0x00]);

        let mut out = Vec::new();
        TextEncoding::Utf16Be.encode_into("A", &mut out).unwrap();
        assert_eq!(out, vec![0x00, 0x41]);
    }

    #[test]
    fn test_latin1_encoding() {
        let mut out = Vec::new();
        TextEncoding::Latin1.encode_into("þ|", &mut out).unwrap();
        assert_eq!(out, vec![0xFE, b'|']);

        let err = TextEncoding::Latin1
            .encode_into("snow ☃", &mut Vec::new())
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::EncodingFailure);
        assert!(err.to_string().contains('☃'));
    }

    #[test]
    fn test_ascii_rejects_non_ascii() {
        let err = TextEncoding::Ascii
            .encode_into("café", &mut Vec::new())
            .unwrap_err();
        assert!(err.to_string().contains("'é'"));
    }

    #[test]
    fn test_from_str() {
        assert_eq!("UTF-8".parse::<TextEncoding>().unwrap(), TextEncoding::Utf8);
        assert_eq!("unicode".parse::<TextEncoding>().unwrap(), TextEncoding::Utf16Le);
        assert_eq!("windows_1252".parse::<TextEncoding>().unwrap(), TextEncoding::Latin1);
        assert!("ebcdic".parse::<TextEncoding>().is_err());
    }

    #[test]
    fn test_bom() {
        assert!(TextEncoding::Utf8.bom().is_empty());
        assert_eq!(TextEncoding::Utf8Bom.bom(), b"\xEF\xBB\xBF");
    }
}
