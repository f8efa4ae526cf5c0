//! Text charsets for thermal printers
//!
//! The printer never sees UTF-8: text has to arrive in whatever charset the
//! device is configured for. This module provides utilities for:
//! - Encoding UTF-8 into a printer charset (strict, no replacement glyphs)
//! - Calculating printed column widths
//! - Truncating/padding strings to column widths

use crate::error::{PrintError, PrintResult};
use encoding_rs::Encoding;

/// Printer-side text charset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Charset {
    /// Simplified Chinese (double-byte)
    Gbk,
    /// Japanese (double-byte)
    ShiftJis,
    /// Traditional Chinese (double-byte)
    Big5,
    /// Korean (double-byte)
    EucKr,
    /// Western European (single-byte, code page 16)
    Windows1252,
}

impl Charset {
    fn encoding(self) -> &'static Encoding {
        match self {
            Self::Gbk => encoding_rs::GBK,
            Self::ShiftJis => encoding_rs::SHIFT_JIS,
            Self::Big5 => encoding_rs::BIG5,
            Self::EucKr => encoding_rs::EUC_KR,
            Self::Windows1252 => encoding_rs::WINDOWS_1252,
        }
    }

    /// Double-byte charsets print in Kanji mode (`FS &` .. `FS .`)
    pub fn is_double_byte(self) -> bool {
        !matches!(self, Self::Windows1252)
    }

    /// `ESC t n` code page for single-byte charsets
    pub fn code_page(self) -> Option<u8> {
        match self {
            Self::Windows1252 => Some(16),
            _ => None,
        }
    }

    /// Encode a string, failing on any unmappable character
    pub fn encode(self, s: &str) -> PrintResult<Vec<u8>> {
        let (bytes, _, had_errors) = self.encoding().encode(s);
        if had_errors {
            let bad = s
                .chars()
                .find(|c| {
                    let mut tmp = [0u8; 4];
                    self.encoding().encode(c.encode_utf8(&mut tmp)).2
                })
                .unwrap_or(char::REPLACEMENT_CHARACTER);
            return Err(PrintError::invalid(format!(
                "character {:?} cannot be encoded as {}",
                bad,
                self.encoding().name()
            )));
        }
        Ok(bytes.into_owned())
    }

    /// Printed width in columns (one column per encoded byte)
    pub fn width(self, s: &str) -> usize {
        let (cow, _, _) = self.encoding().encode(s);
        cow.len()
    }

    /// Truncate a string to fit within `max_width` columns
    pub fn truncate(self, s: &str, max_width: usize) -> String {
        let mut width = 0;
        let mut result = String::new();
        let mut tmp = [0u8; 4];
        for c in s.chars() {
            let char_len = self.width(c.encode_utf8(&mut tmp));
            if width + char_len > max_width {
                break;
            }
            result.push(c);
            width += char_len;
        }
        result
    }

    /// Pad a string to exactly `width` columns
    ///
    /// If the string is longer than the width, it will be truncated.
    pub fn pad(self, s: &str, width: usize, align_right: bool) -> String {
        let current = self.width(s);
        if current >= width {
            return self.truncate(s, width);
        }
        let spaces = " ".repeat(width - current);
        if align_right {
            format!("{}{}", spaces, s)
        } else {
            format!("{}{}", s, spaces)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_width() {
        assert_eq!(Charset::Gbk.width("hello"), 5);
        assert_eq!(Charset::Gbk.width("你好"), 4);
        assert_eq!(Charset::Gbk.width("AB中文CD"), 8);
        assert_eq!(Charset::Windows1252.width("café"), 4);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(Charset::Gbk.truncate("hello world", 5), "hello");
        assert_eq!(Charset::Gbk.truncate("你好世界", 4), "你好");
        assert_eq!(Charset::Gbk.truncate("AB中文", 5), "AB中");
    }

    #[test]
    fn test_pad() {
        assert_eq!(Charset::Gbk.pad("hi", 5, false), "hi   ");
        assert_eq!(Charset::Gbk.pad("hi", 5, true), "   hi");
        assert_eq!(Charset::Gbk.pad("hello world", 5, false), "hello");
    }

    #[test]
    fn test_encode_strict() {
        assert_eq!(Charset::Windows1252.encode("é").unwrap(), vec![0xE9]);
        assert_eq!(Charset::Gbk.encode("中").unwrap(), vec![0xD6, 0xD0]);
        assert!(matches!(
            Charset::Windows1252.encode("中"),
            Err(PrintError::InvalidArgument(_))
        ));
    }
}
