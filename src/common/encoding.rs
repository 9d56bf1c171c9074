//! Candidate character encodings for delimited text sources.
//!
//! Every candidate decodes *strictly*: malformed input is reported as a
//! [`DecodeFault`] instead of being replaced with U+FFFD, which is what lets
//! the loader move on to the next candidate. `encoding_rs` covers the WHATWG
//! encodings; ISO-8859-1, 7-bit ASCII and strict Windows-1252 are handled
//! here because the WHATWG standard folds all three into a lenient
//! Windows-1252.

use std::fmt;

use encoding_rs::{DecoderResult, EncoderResult, Encoding};
use serde::{Deserialize, Serialize};

use crate::common::bom::BomKind;
use crate::common::{Error, Result};

/// A single character encoding the loader may try.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum CandidateEncoding {
    /// 7-bit US-ASCII. Any byte above 0x7F is a decode error.
    Ascii,
    /// ISO-8859-1. Every byte maps to the code point of the same value, so
    /// decoding never fails.
    Latin1,
    /// Windows-1252 with the five unassigned positions (0x81, 0x8D, 0x8F,
    /// 0x90, 0x9D) treated as decode errors.
    Cp1252,
    /// Any other encoding from the WHATWG Encoding Standard.
    Whatwg(&'static Encoding),
}

/// A candidate encoding rejected the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeFault {
    /// The candidate that failed.
    pub encoding: CandidateEncoding,
    /// Byte offset of the first malformed sequence in the source.
    pub offset: usize,
}

impl fmt::Display for DecodeFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} cannot decode byte {}", self.encoding, self.offset)
    }
}

impl CandidateEncoding {
    /// UTF-8, the default first candidate.
    #[inline]
    pub fn utf8() -> Self {
        CandidateEncoding::Whatwg(encoding_rs::UTF_8)
    }

    /// Resolve an encoding label such as `"utf-8"`, `"latin-1"` or `"cp1252"`.
    ///
    /// Matching is case-insensitive and `_` is treated like `-`, so codec
    /// spellings such as `"utf_8"` and `"latin_1"` resolve too. `cpNNN` labels
    /// go through [`CandidateEncoding::from_codepage`]; everything else is a
    /// WHATWG label.
    pub fn from_label(label: &str) -> Result<Self> {
        let normalized = label.trim().to_ascii_lowercase().replace('_', "-");
        let encoding = match normalized.as_str() {
            "ascii" | "us-ascii" | "646" => Some(CandidateEncoding::Ascii),
            "latin-1" | "latin1" | "l1" | "iso-8859-1" | "iso8859-1" | "iso-ir-100" | "cp819" => {
                Some(CandidateEncoding::Latin1)
            },
            "cp1252" | "windows-1252" | "1252" => Some(CandidateEncoding::Cp1252),
            "utf8" | "utf-8" | "utf-8-sig" | "u8" => Some(Self::utf8()),
            other => match other.strip_prefix("cp").and_then(|n| n.parse::<u32>().ok()) {
                Some(codepage) => Self::from_codepage(codepage),
                None => Encoding::for_label(label.trim().as_bytes())
                    .or_else(|| Encoding::for_label(other.as_bytes()))
                    .map(CandidateEncoding::Whatwg),
            },
        };

        encoding.ok_or_else(|| Error::InvalidConfig(format!("unknown encoding label '{}'", label)))
    }

    /// Map a Windows codepage identifier to a candidate encoding.
    ///
    /// Only exact mappings are listed; codepages `encoding_rs` can merely
    /// approximate (437, 850, ...) return `None`.
    pub fn from_codepage(codepage: u32) -> Option<Self> {
        let encoding = match codepage {
            20127 => return Some(CandidateEncoding::Ascii),
            28591 => return Some(CandidateEncoding::Latin1),
            1252 => return Some(CandidateEncoding::Cp1252),

            866 => encoding_rs::IBM866,
            874 => encoding_rs::WINDOWS_874,
            1250 => encoding_rs::WINDOWS_1250,
            1251 => encoding_rs::WINDOWS_1251,
            1253 => encoding_rs::WINDOWS_1253,
            1254 => encoding_rs::WINDOWS_1254,
            1255 => encoding_rs::WINDOWS_1255,
            1256 => encoding_rs::WINDOWS_1256,
            1257 => encoding_rs::WINDOWS_1257,
            1258 => encoding_rs::WINDOWS_1258,

            // East Asian
            932 => encoding_rs::SHIFT_JIS,
            936 => encoding_rs::GBK,
            949 => encoding_rs::EUC_KR,
            950 => encoding_rs::BIG5,
            20932 => encoding_rs::EUC_JP,
            54936 => encoding_rs::GB18030,

            // ISO 8859 series
            28592 => encoding_rs::ISO_8859_2,
            28593 => encoding_rs::ISO_8859_3,
            28594 => encoding_rs::ISO_8859_4,
            28595 => encoding_rs::ISO_8859_5,
            28596 => encoding_rs::ISO_8859_6,
            28597 => encoding_rs::ISO_8859_7,
            28598 => encoding_rs::ISO_8859_8,
            28603 => encoding_rs::ISO_8859_13,
            28605 => encoding_rs::ISO_8859_15,

            20866 => encoding_rs::KOI8_R,
            21866 => encoding_rs::KOI8_U,
            10000 => encoding_rs::MACINTOSH,

            // Unicode
            1200 => encoding_rs::UTF_16LE,
            1201 => encoding_rs::UTF_16BE,
            65001 => encoding_rs::UTF_8,

            _ => return None,
        };
        Some(CandidateEncoding::Whatwg(encoding))
    }

    /// Canonical lowercase label, as reported in errors.
    pub fn label(&self) -> String {
        match self {
            CandidateEncoding::Ascii => "ascii".to_string(),
            CandidateEncoding::Latin1 => "latin-1".to_string(),
            CandidateEncoding::Cp1252 => "cp1252".to_string(),
            CandidateEncoding::Whatwg(encoding) => encoding.name().to_ascii_lowercase(),
        }
    }

    /// The byte order mark that this encoding strips before decoding.
    pub fn bom(&self) -> Option<BomKind> {
        match self {
            CandidateEncoding::Whatwg(encoding) if *encoding == encoding_rs::UTF_8 => {
                Some(BomKind::Utf8)
            },
            CandidateEncoding::Whatwg(encoding) if *encoding == encoding_rs::UTF_16LE => {
                Some(BomKind::Utf16Le)
            },
            CandidateEncoding::Whatwg(encoding) if *encoding == encoding_rs::UTF_16BE => {
                Some(BomKind::Utf16Be)
            },
            _ => None,
        }
    }

    /// Decode `bytes` without replacement.
    ///
    /// A leading BOM belonging to this encoding is dropped; fault offsets
    /// still refer to positions in the original `bytes`.
    pub fn decode(&self, bytes: &[u8]) -> std::result::Result<String, DecodeFault> {
        let (body, skipped) = match self.bom() {
            Some(kind) => {
                let body = kind.strip(bytes);
                (body, bytes.len() - body.len())
            },
            None => (bytes, 0),
        };

        let fault = |offset: usize| DecodeFault {
            encoding: *self,
            offset: skipped + offset,
        };

        match self {
            CandidateEncoding::Ascii => match body.iter().position(|b| !b.is_ascii()) {
                Some(offset) => Err(fault(offset)),
                None => std::str::from_utf8(body)
                    .map(str::to_owned)
                    .map_err(|e| fault(e.valid_up_to())),
            },
            CandidateEncoding::Latin1 => Ok(body.iter().map(|&b| char::from(b)).collect()),
            CandidateEncoding::Cp1252 => match first_unassigned_cp1252(body) {
                Some(offset) => Err(fault(offset)),
                None => decode_strict(encoding_rs::WINDOWS_1252, body).map_err(fault),
            },
            CandidateEncoding::Whatwg(encoding) => decode_strict(*encoding, body).map_err(fault),
        }
    }

    /// Encode `text` without replacement.
    pub fn encode(&self, text: &str) -> Result<Vec<u8>> {
        let unencodable = |offset: usize| Error::Unencodable {
            encoding: self.label(),
            offset,
        };

        match self {
            CandidateEncoding::Ascii => match text.bytes().position(|b| !b.is_ascii()) {
                Some(offset) => Err(unencodable(offset)),
                None => Ok(text.as_bytes().to_vec()),
            },
            CandidateEncoding::Latin1 => {
                let mut out = Vec::with_capacity(text.len());
                for (offset, c) in text.char_indices() {
                    let byte = u8::try_from(u32::from(c)).map_err(|_| unencodable(offset))?;
                    out.push(byte);
                }
                Ok(out)
            },
            CandidateEncoding::Cp1252 => {
                encode_strict(encoding_rs::WINDOWS_1252, text).map_err(unencodable)
            },
            CandidateEncoding::Whatwg(encoding) => {
                if *encoding == encoding_rs::UTF_8 {
                    Ok(text.as_bytes().to_vec())
                } else if *encoding == encoding_rs::UTF_16LE {
                    Ok(text.encode_utf16().flat_map(u16::to_le_bytes).collect())
                } else if *encoding == encoding_rs::UTF_16BE {
                    Ok(text.encode_utf16().flat_map(u16::to_be_bytes).collect())
                } else if encoding.output_encoding() != *encoding {
                    Err(Error::InvalidConfig(format!(
                        "{} is decode-only",
                        self.label()
                    )))
                } else {
                    encode_strict(*encoding, text).map_err(unencodable)
                }
            },
        }
    }
}

impl fmt::Display for CandidateEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

impl TryFrom<String> for CandidateEncoding {
    type Error = Error;

    fn try_from(label: String) -> Result<Self> {
        Self::from_label(&label)
    }
}

impl From<CandidateEncoding> for String {
    fn from(encoding: CandidateEncoding) -> Self {
        encoding.label()
    }
}

/// Position of the first byte Windows-1252 leaves unassigned.
fn first_unassigned_cp1252(bytes: &[u8]) -> Option<usize> {
    let low = memchr::memchr3(0x81, 0x8D, 0x8F, bytes);
    let high = memchr::memchr2(0x90, 0x9D, bytes);
    match (low, high) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}

/// Decode with `encoding_rs` and report the offset of the first malformed sequence.
fn decode_strict(encoding: &'static Encoding, bytes: &[u8]) -> std::result::Result<String, usize> {
    let mut decoder = encoding.new_decoder_without_bom_handling();
    let mut out = String::with_capacity(
        decoder
            .max_utf8_buffer_length_without_replacement(bytes.len())
            .unwrap_or(bytes.len()),
    );

    let mut consumed = 0usize;
    loop {
        let (result, read) =
            decoder.decode_to_string_without_replacement(&bytes[consumed..], &mut out, true);
        consumed += read;
        match result {
            DecoderResult::InputEmpty => return Ok(out),
            DecoderResult::OutputFull => {
                let remaining = bytes.len() - consumed;
                out.reserve(
                    decoder
                        .max_utf8_buffer_length_without_replacement(remaining)
                        .unwrap_or(remaining.saturating_mul(3))
                        .max(4),
                );
            },
            DecoderResult::Malformed(bad, after) => {
                return Err(consumed - usize::from(bad) - usize::from(after));
            },
        }
    }
}

/// Encode with `encoding_rs` and report the UTF-8 offset of the first unmappable character.
fn encode_strict(encoding: &'static Encoding, text: &str) -> std::result::Result<Vec<u8>, usize> {
    let mut encoder = encoding.new_encoder();
    let mut out = Vec::with_capacity(
        encoder
            .max_buffer_length_from_utf8_without_replacement(text.len())
            .unwrap_or(text.len()),
    );

    let mut consumed = 0usize;
    loop {
        let (result, read) =
            encoder.encode_from_utf8_to_vec_without_replacement(&text[consumed..], &mut out, true);
        consumed += read;
        match result {
            EncoderResult::InputEmpty => return Ok(out),
            EncoderResult::OutputFull => {
                let remaining = text.len() - consumed;
                out.reserve(
                    encoder
                        .max_buffer_length_from_utf8_without_replacement(remaining)
                        .unwrap_or(remaining.saturating_mul(4))
                        .max(8),
                );
            },
            EncoderResult::Unmappable(c) => return Err(consumed - c.len_utf8()),
        }
    }
}

/// Ordered, non-empty list of encodings to try.
///
/// The first entry is the default encoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct CandidateEncodingList(Vec<CandidateEncoding>);

impl CandidateEncodingList {
    /// Build a list, rejecting an empty one.
    pub fn new(encodings: Vec<CandidateEncoding>) -> Result<Self> {
        if encodings.is_empty() {
            return Err(Error::InvalidConfig(
                "candidate encoding list must not be empty".to_string(),
            ));
        }
        Ok(Self(encodings))
    }

    /// Build a list from encoding labels.
    pub fn from_labels<I, S>(labels: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let encodings = labels
            .into_iter()
            .map(|label| CandidateEncoding::from_label(label.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Self::new(encodings)
    }

    /// The default (most likely) encoding.
    pub fn first(&self) -> CandidateEncoding {
        self.0[0]
    }

    pub fn iter(&self) -> impl Iterator<Item = CandidateEncoding> + '_ {
        self.0.iter().copied()
    }

    #[allow(clippy::len_without_is_empty)] // Never empty
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Canonical labels, in trial order.
    pub fn labels(&self) -> Vec<String> {
        self.0.iter().map(CandidateEncoding::label).collect()
    }
}

impl Default for CandidateEncodingList {
    /// UTF-8, then ISO-8859-1, then Windows-1252.
    ///
    /// ISO-8859-1 accepts every byte, so in this list Windows-1252 only
    /// matters when callers reorder or replace the earlier entries.
    fn default() -> Self {
        Self(vec![
            CandidateEncoding::utf8(),
            CandidateEncoding::Latin1,
            CandidateEncoding::Cp1252,
        ])
    }
}

impl TryFrom<Vec<String>> for CandidateEncodingList {
    type Error = Error;

    fn try_from(labels: Vec<String>) -> Result<Self> {
        Self::from_labels(labels)
    }
}

impl From<CandidateEncodingList> for Vec<String> {
    fn from(list: CandidateEncodingList) -> Self {
        list.labels()
    }
}

impl<'a> IntoIterator for &'a CandidateEncodingList {
    type Item = &'a CandidateEncoding;
    type IntoIter = std::slice::Iter<'a, CandidateEncoding>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_resolution() {
        assert_eq!(CandidateEncoding::from_label("UTF-8").unwrap(), CandidateEncoding::utf8());
        assert_eq!(CandidateEncoding::from_label("utf_8").unwrap(), CandidateEncoding::utf8());
        assert_eq!(CandidateEncoding::from_label("latin-1").unwrap(), CandidateEncoding::Latin1);
        assert_eq!(CandidateEncoding::from_label("ISO-8859-1").unwrap(), CandidateEncoding::Latin1);
        assert_eq!(CandidateEncoding::from_label("cp1252").unwrap(), CandidateEncoding::Cp1252);
        assert_eq!(CandidateEncoding::from_label("ascii").unwrap(), CandidateEncoding::Ascii);
        assert_eq!(
            CandidateEncoding::from_label("cp932").unwrap(),
            CandidateEncoding::Whatwg(encoding_rs::SHIFT_JIS)
        );
        assert_eq!(
            CandidateEncoding::from_label("shift_jis").unwrap(),
            CandidateEncoding::Whatwg(encoding_rs::SHIFT_JIS)
        );
        assert_eq!(
            CandidateEncoding::from_label("ms_kanji").unwrap(),
            CandidateEncoding::Whatwg(encoding_rs::SHIFT_JIS)
        );
        assert_eq!(
            CandidateEncoding::from_label("iso_8859-2:1987").unwrap(),
            CandidateEncoding::Whatwg(encoding_rs::ISO_8859_2)
        );
        assert!(matches!(
            CandidateEncoding::from_label("klingon"),
            Err(Error::InvalidConfig(_))
        ));
        assert!(CandidateEncoding::from_label("cp437").is_err());
    }

    #[test]
    fn test_canonical_labels() {
        assert_eq!(CandidateEncoding::utf8().label(), "utf-8");
        assert_eq!(CandidateEncoding::Latin1.label(), "latin-1");
        assert_eq!(CandidateEncoding::Cp1252.to_string(), "cp1252");
        assert_eq!(CandidateEncoding::Whatwg(encoding_rs::UTF_16LE).label(), "utf-16le");
    }

    #[test]
    fn test_utf8_rejects_latin1_bytes() {
        // "Peso teórico" in ISO-8859-1
        let bytes = b"Peso te\xF3rico";
        let fault = CandidateEncoding::utf8().decode(bytes).unwrap_err();
        assert_eq!(fault.offset, 7);
        assert_eq!(fault.encoding, CandidateEncoding::utf8());

        assert_eq!(CandidateEncoding::Latin1.decode(bytes).unwrap(), "Peso teórico");
        assert_eq!(CandidateEncoding::Cp1252.decode(bytes).unwrap(), "Peso teórico");
    }

    #[test]
    fn test_latin1_accepts_every_byte() {
        let bytes: Vec<u8> = (0u8..=255).collect();
        let text = CandidateEncoding::Latin1.decode(&bytes).unwrap();
        assert_eq!(text.chars().count(), 256);
        assert_eq!(text.chars().nth(0x81), Some('\u{81}'));
    }

    #[test]
    fn test_cp1252_unassigned_bytes() {
        for byte in [0x81u8, 0x8D, 0x8F, 0x90, 0x9D] {
            let bytes = [b'a', b'b', byte, b'c'];
            let fault = CandidateEncoding::Cp1252.decode(&bytes).unwrap_err();
            assert_eq!(fault.offset, 2, "byte {byte:#x}");
        }
        // 0x80 is the euro sign in Windows-1252 but a C1 control in ISO-8859-1
        assert_eq!(CandidateEncoding::Cp1252.decode(b"\x80").unwrap(), "€");
        assert_eq!(CandidateEncoding::Latin1.decode(b"\x80").unwrap(), "\u{80}");
    }

    #[test]
    fn test_ascii_is_strict() {
        assert_eq!(CandidateEncoding::Ascii.decode(b"plain").unwrap(), "plain");
        let fault = CandidateEncoding::Ascii.decode(b"caf\xE9").unwrap_err();
        assert_eq!(fault.offset, 3);
    }

    #[test]
    fn test_utf8_bom_is_dropped() {
        let text = CandidateEncoding::utf8().decode(b"\xEF\xBB\xBFEnvase").unwrap();
        assert_eq!(text, "Envase");

        let fault = CandidateEncoding::utf8().decode(b"\xEF\xBB\xBFab\xFF").unwrap_err();
        assert_eq!(fault.offset, 5);
    }

    #[test]
    fn test_utf16_round_trip() {
        let encoding = CandidateEncoding::from_label("utf-16le").unwrap();
        let bytes = encoding.encode("Año;Mes").unwrap();
        assert_eq!(encoding.decode(&bytes).unwrap(), "Año;Mes");

        // A dangling half code unit is malformed
        let mut truncated = bytes.clone();
        truncated.push(b'x');
        assert!(encoding.decode(&truncated).is_err());
    }

    #[test]
    fn test_encode_unmappable() {
        assert_eq!(CandidateEncoding::Latin1.encode("Jalapeño").unwrap(), b"Jalape\xF1o");
        let err = CandidateEncoding::Latin1.encode("ab€").unwrap_err();
        assert!(matches!(err, Error::Unencodable { offset: 2, .. }));

        assert_eq!(CandidateEncoding::Cp1252.encode("€").unwrap(), vec![0x80]);
        let err = CandidateEncoding::Cp1252.encode("x→").unwrap_err();
        assert!(matches!(err, Error::Unencodable { offset: 1, .. }));
    }

    #[test]
    fn test_candidate_list() {
        assert!(CandidateEncodingList::new(Vec::new()).is_err());

        let list = CandidateEncodingList::default();
        assert_eq!(list.first(), CandidateEncoding::utf8());
        assert_eq!(list.labels(), vec!["utf-8", "latin-1", "cp1252"]);

        let list = CandidateEncodingList::from_labels(["cp1252", "utf-8"]).unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list.first(), CandidateEncoding::Cp1252);
        assert!(CandidateEncodingList::from_labels(["utf-8", "nope"]).is_err());
    }
}
