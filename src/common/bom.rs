//! Byte order marks of the Unicode candidate encodings.
//!
//! A candidate only ever strips or writes its own mark; a file that starts
//! with some other mark is decoded with that mark as content.

use std::io::{self, Write};

/// UTF-8 BOM bytes.
pub const UTF8_BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];
/// UTF-16 little-endian BOM bytes.
pub const UTF16_LE_BOM: [u8; 2] = [0xFF, 0xFE];
/// UTF-16 big-endian BOM bytes.
pub const UTF16_BE_BOM: [u8; 2] = [0xFE, 0xFF];

/// The mark belonging to a candidate encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BomKind {
    Utf8,
    Utf16Le,
    Utf16Be,
}

impl BomKind {
    #[inline]
    pub const fn as_bytes(self) -> &'static [u8] {
        match self {
            BomKind::Utf8 => &UTF8_BOM,
            BomKind::Utf16Le => &UTF16_LE_BOM,
            BomKind::Utf16Be => &UTF16_BE_BOM,
        }
    }

    /// `bytes` without a leading mark of this kind.
    #[inline]
    pub fn strip(self, bytes: &[u8]) -> &[u8] {
        bytes.strip_prefix(self.as_bytes()).unwrap_or(bytes)
    }

    pub fn write_to<W: Write>(self, writer: &mut W) -> io::Result<()> {
        writer.write_all(self.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_only_matching_kind() {
        let bytes = b"\xEF\xBB\xBFname";
        assert_eq!(BomKind::Utf8.strip(bytes), b"name");
        assert_eq!(BomKind::Utf16Le.strip(bytes), bytes);
        assert_eq!(BomKind::Utf8.strip(b"name"), b"name");
    }

    #[test]
    fn test_utf16_marks_are_not_confused() {
        let le = b"\xFF\xFEa\x00";
        assert_eq!(BomKind::Utf16Le.strip(le), b"a\x00");
        assert_eq!(BomKind::Utf16Be.strip(le), le);
    }

    #[test]
    fn test_write_to() {
        let mut out = Vec::new();
        BomKind::Utf16Be.write_to(&mut out).unwrap();
        assert_eq!(out, UTF16_BE_BOM);
    }
}
