//! Barcode symbologies for `GS k`
//!
//! Function A symbologies (m = 0..6) are NUL terminated, function B
//! symbologies (m = 72, 73) carry a length byte. Payloads are checked
//! against each symbology's charset and length rules before any bytes are
//! produced; anything that does not clearly fit is rejected.

use crate::error::{PrintError, PrintResult};

/// Barcode encoding scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Symbology {
    UpcA,
    UpcE,
    Ean13,
    Ean8,
    Code39,
    Itf,
    Codabar,
    Code93,
    Code128,
}

/// How the payload is delimited after the symbology selector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Framing {
    NulTerminated,
    LengthPrefixed,
}

const CODE39_SYMBOLS: &[u8] = b" $%*+-./";
const CODABAR_SYMBOLS: &[u8] = b"$+-./:";

impl Symbology {
    /// The `m` selector byte for `GS k m`
    pub fn selector(self) -> u8 {
        match self {
            Self::UpcA => 0,
            Self::UpcE => 1,
            Self::Ean13 => 2,
            Self::Ean8 => 3,
            Self::Code39 => 4,
            Self::Itf => 5,
            Self::Codabar => 6,
            Self::Code93 => 72,
            Self::Code128 => 73,
        }
    }

    fn framing(self) -> Framing {
        match self {
            Self::Code93 | Self::Code128 => Framing::LengthPrefixed,
            _ => Framing::NulTerminated,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::UpcA => "UPC-A",
            Self::UpcE => "UPC-E",
            Self::Ean13 => "EAN-13",
            Self::Ean8 => "EAN-8",
            Self::Code39 => "CODE39",
            Self::Itf => "ITF",
            Self::Codabar => "CODABAR",
            Self::Code93 => "CODE93",
            Self::Code128 => "CODE128",
        }
    }

    /// Validate `data` and return the complete `GS k` command
    pub fn encode(self, data: &[u8]) -> PrintResult<Vec<u8>> {
        let payload = self.payload(data)?;

        let mut cmd = Vec::with_capacity(payload.len() + 4);
        cmd.extend_from_slice(&[0x1D, 0x6B, self.selector()]);
        match self.framing() {
            Framing::NulTerminated => {
                cmd.extend_from_slice(&payload);
                cmd.push(0x00);
            }
            Framing::LengthPrefixed => {
                // payload() already capped the length at 255
                cmd.push(payload.len() as u8);
                cmd.extend_from_slice(&payload);
            }
        }
        Ok(cmd)
    }

    /// Checked payload bytes, possibly with a CODE128 code-set prefix added
    fn payload(self, data: &[u8]) -> PrintResult<Vec<u8>> {
        let len = data.len();
        match self {
            Self::UpcA => self.digits(data, &[11, 12])?,
            Self::UpcE => self.digits(data, &[6, 7, 8, 11, 12])?,
            Self::Ean13 => self.digits(data, &[12, 13])?,
            Self::Ean8 => self.digits(data, &[7, 8])?,
            Self::Itf => {
                self.charset(data, |b| b.is_ascii_digit())?;
                if len < 2 || len % 2 != 0 {
                    return Err(self.reject(format!("needs an even length >= 2, got {}", len)));
                }
            }
            Self::Code39 => {
                if data.is_empty() {
                    return Err(self.reject("payload is empty"));
                }
                self.charset(data, |b| {
                    b.is_ascii_digit() || b.is_ascii_uppercase() || CODE39_SYMBOLS.contains(&b)
                })?;
            }
            Self::Codabar => {
                if len < 2 {
                    return Err(self.reject("needs start and stop characters"));
                }
                let is_guard = |b: u8| matches!(b, b'A'..=b'D' | b'a'..=b'd');
                if !is_guard(data[0]) || !is_guard(data[len - 1]) {
                    return Err(self.reject("must start and end with A-D"));
                }
                self.charset(&data[1..len - 1], |b| {
                    b.is_ascii_digit() || CODABAR_SYMBOLS.contains(&b)
                })?;
            }
            Self::Code93 => {
                self.length(data, 1)?;
                self.charset(data, |b| b.is_ascii())?;
            }
            Self::Code128 => return self.code128(data),
        }
        Ok(data.to_vec())
    }

    fn code128(self, data: &[u8]) -> PrintResult<Vec<u8>> {
        let has_selector = matches!(data, [b'{', b'A' | b'B' | b'C', ..]);
        if has_selector {
            self.length(data, 3)?;
            self.code128_sets(data)?;
            return Ok(data.to_vec());
        }

        // Plain printable text without a selector is code set B
        if data.is_empty() {
            return Err(self.reject("payload is empty"));
        }
        self.charset(data, |b| (0x20..=0x7E).contains(&b) && b != b'{')?;

        let mut payload = Vec::with_capacity(data.len() + 2);
        payload.extend_from_slice(b"{B");
        payload.extend_from_slice(data);
        self.length(&payload, 2)?;
        Ok(payload)
    }

    /// Walk a selector-prefixed CODE128 payload
    ///
    /// Code set A takes 0x00-0x5F, B takes 0x20-0x7F and C takes values
    /// 0-99. `{` starts a two-byte escape: `{A`/`{B`/`{C` switch sets and
    /// `{1` is FNC1 everywhere; `{2`-`{4`, `{S` (shift) and `{{` (literal
    /// brace, B only) are not available in code set C.
    fn code128_sets(self, data: &[u8]) -> PrintResult<()> {
        let fits = |set: u8, b: u8| match set {
            b'A' => b <= 0x5F,
            b'B' => (0x20..=0x7F).contains(&b),
            _ => b <= 99,
        };

        let mut set = data[1];
        let mut shifted = false;
        let mut symbols = 0;
        let mut i = 2;
        while i < data.len() {
            let b = data[i];
            if b == b'{' {
                let Some(&code) = data.get(i + 1) else {
                    return Err(self.reject(format!("dangling `{{` at offset {}", i)));
                };
                let allowed = match code {
                    b'A' | b'B' | b'C' => !shifted,
                    b'1' => true,
                    b'2' | b'3' | b'4' => set != b'C',
                    b'S' => set != b'C' && !shifted,
                    b'{' => set == b'B' || (shifted && set == b'A'),
                    _ => false,
                };
                if !allowed {
                    return Err(self.reject(format!(
                        "escape `{{{}` at offset {} not allowed in code set {}",
                        code as char, i, set as char
                    )));
                }
                match code {
                    b'A' | b'B' | b'C' => set = code,
                    b'S' => shifted = true,
                    b'{' => shifted = false,
                    _ => {}
                }
                if code != b'S' {
                    symbols += 1;
                }
                i += 2;
                continue;
            }

            // A shift applies to exactly one character of the other A/B set
            let active = match (shifted, set) {
                (true, b'A') => b'B',
                (true, _) => b'A',
                (false, _) => set,
            };
            if !fits(active, b) {
                return Err(self.reject(format!(
                    "byte 0x{:02X} at offset {} is not in code set {}",
                    b, i, active as char
                )));
            }
            shifted = false;
            symbols += 1;
            i += 1;
        }

        if shifted {
            return Err(self.reject("shift `{S` is not followed by a character"));
        }
        if symbols == 0 {
            return Err(self.reject("no data after the code-set selector"));
        }
        Ok(())
    }

    fn digits(self, data: &[u8], lengths: &[usize]) -> PrintResult<()> {
        self.charset(data, |b| b.is_ascii_digit())?;
        if !lengths.contains(&data.len()) {
            return Err(self.reject(format!(
                "length {} not in {:?}",
                data.len(),
                lengths
            )));
        }
        Ok(())
    }

    fn length(self, data: &[u8], min: usize) -> PrintResult<()> {
        if data.len() < min || data.len() > 255 {
            return Err(self.reject(format!(
                "length {} outside {}..=255",
                data.len(),
                min
            )));
        }
        Ok(())
    }

    fn charset(self, data: &[u8], allowed: impl Fn(u8) -> bool) -> PrintResult<()> {
        match data.iter().position(|&b| !allowed(b)) {
            Some(idx) => Err(self.reject(format!(
                "byte 0x{:02X} at offset {} is not allowed",
                data[idx], idx
            ))),
            None => Ok(()),
        }
    }

    fn reject(self, why: impl std::fmt::Display) -> PrintError {
        PrintError::invalid(format!("{} barcode: {}", self.name(), why))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_invalid(r: PrintResult<Vec<u8>>) -> bool {
        matches!(r, Err(PrintError::InvalidArgument(_)))
    }

    #[test]
    fn test_code39_framing() {
        let cmd = Symbology::Code39.encode(b"TEST123").unwrap();
        assert_eq!(&cmd[..3], &[0x1D, 0x6B, 4]);
        assert_eq!(&cmd[3..10], b"TEST123");
        assert_eq!(cmd[10], 0x00);
        assert_eq!(cmd.len(), 11);
    }

    #[test]
    fn test_code39_rejects_nul_and_lowercase() {
        assert!(is_invalid(Symbology::Code39.encode(b"AB\0C")));
        assert!(is_invalid(Symbology::Code39.encode(b"abc")));
        assert!(is_invalid(Symbology::Code39.encode(b"")));
    }

    #[test]
    fn test_code128_adds_code_set_b() {
        let cmd = Symbology::Code128.encode(b"ABC123").unwrap();
        assert_eq!(&cmd[..4], &[0x1D, 0x6B, 73, 8]);
        assert_eq!(&cmd[4..], b"{BABC123");
    }

    #[test]
    fn test_code128_keeps_explicit_selector() {
        let cmd = Symbology::Code128.encode(b"{C\x0C\x22").unwrap();
        assert_eq!(&cmd[..4], &[0x1D, 0x6B, 73, 4]);
        assert_eq!(&cmd[4..], b"{C\x0C\x22");
    }

    #[test]
    fn test_code128_code_set_c_takes_pairs_only() {
        assert!(Symbology::Code128.encode(b"{C\x00\x63").is_ok());
        assert!(Symbology::Code128.encode(b"{C{1\x0C{BAB").is_ok());
        assert!(is_invalid(Symbology::Code128.encode(b"{C\x7F")));
        assert!(is_invalid(Symbology::Code128.encode(b"{C\x64")));
        assert!(is_invalid(Symbology::Code128.encode(b"{C{S\x01")));
    }

    #[test]
    fn test_code128_code_sets_a_and_b() {
        assert!(Symbology::Code128.encode(b"{AABC\x09").is_ok());
        assert!(Symbology::Code128.encode(b"{Babc{{x").is_ok());
        assert!(Symbology::Code128.encode(b"{AAB{Sc").is_ok());
        assert!(is_invalid(Symbology::Code128.encode(b"{Aabc")));
        assert!(is_invalid(Symbology::Code128.encode(b"{B\x09")));
        assert!(is_invalid(Symbology::Code128.encode(b"{A{{")));
        assert!(is_invalid(Symbology::Code128.encode(b"{BA{")));
        assert!(is_invalid(Symbology::Code128.encode(b"{BA{X")));
    }

    #[test]
    fn test_code128_selector_needs_data() {
        assert!(is_invalid(Symbology::Code128.encode(b"{B")));
        assert!(is_invalid(Symbology::Code128.encode(b"{A{S")));
    }

    #[test]
    fn test_code128_rejects_ambiguous_brace() {
        assert!(is_invalid(Symbology::Code128.encode(b"A{B")));
        assert!(is_invalid(Symbology::Code128.encode(&[0xC3, 0xA9])));
        assert!(is_invalid(Symbology::Code128.encode(&[b'A'; 254])));
    }

    #[test]
    fn test_ean13_lengths() {
        assert!(Symbology::Ean13.encode(b"400638133393").is_ok());
        assert!(Symbology::Ean13.encode(b"4006381333931").is_ok());
        assert!(is_invalid(Symbology::Ean13.encode(b"40063813339")));
        assert!(is_invalid(Symbology::Ean13.encode(b"40063813339X")));
    }

    #[test]
    fn test_itf_needs_even_length() {
        assert!(Symbology::Itf.encode(b"1234").is_ok());
        assert!(is_invalid(Symbology::Itf.encode(b"123")));
    }

    #[test]
    fn test_codabar_guards() {
        assert!(Symbology::Codabar.encode(b"A40156B").is_ok());
        assert!(is_invalid(Symbology::Codabar.encode(b"40156")));
        assert!(is_invalid(Symbology::Codabar.encode(b"A40X56B")));
    }

    #[test]
    fn test_code93_length_prefixed() {
        let cmd = Symbology::Code93.encode(b"ab-12").unwrap();
        assert_eq!(&cmd[..4], &[0x1D, 0x6B, 72, 5]);
        assert!(is_invalid(Symbology::Code93.encode(b"")));
    }
}
