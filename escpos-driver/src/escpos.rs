//! ESC/POS command builder
//!
//! Provides a fluent API for building ESC/POS print data. The builder never
//! performs I/O; it only accumulates bytes.
//!
//! Printer state set here is sticky on the device: size, font, bold and
//! justification stay in effect until changed or until `initialize()`.
//! Barcode height and HRI position must be sent before `barcode()`; the
//! builder does not enforce that ordering and the device falls back to its
//! own defaults when they were never set.

use crate::barcode::Symbology;
use crate::charset::Charset;
use crate::error::{PrintError, PrintResult};

const ESC: u8 = 0x1B;
const GS: u8 = 0x1D;
const FS: u8 = 0x1C;
const LF: u8 = 0x0A;

/// Largest payload accepted by QR model 2 (numeric mode)
const QR_MAX_DATA: usize = 7089;

/// Text justification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Justify {
    Left,
    Center,
    Right,
}

/// Device font slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Font {
    A,
    B,
    C,
}

/// Where the human-readable text of a barcode is printed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HriPosition {
    None,
    Above,
    Below,
    Both,
}

/// Underline thickness
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Underline {
    Off,
    Single,
    Double,
}

/// Cash drawer connector pin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawerPin {
    Pin2,
    Pin5,
}

/// ESC/POS command builder
///
/// Builds ESC/POS byte sequences for thermal printers. Text is copied as
/// given; use [`EscPosBuilder::text_in`] to convert to a printer charset.
pub struct EscPosBuilder {
    buf: Vec<u8>,
    width: usize,
}

impl EscPosBuilder {
    /// Create a new builder with the specified paper width in characters
    ///
    /// Common widths:
    /// - 58mm paper: 32 characters
    /// - 80mm paper: 48 characters
    pub fn new(width: usize) -> Self {
        Self {
            buf: Vec::with_capacity(256),
            width,
        }
    }

    /// Get the configured paper width
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of bytes accumulated so far
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Reset printer to factory defaults (ESC @)
    pub fn initialize(&mut self) -> &mut Self {
        self.buf.extend_from_slice(&[ESC, 0x40]);
        self
    }

    // === Text Output ===

    /// Write raw text bytes
    pub fn text(&mut self, s: &str) -> &mut Self {
        self.buf.extend_from_slice(s.as_bytes());
        self
    }

    /// Write text followed by newline
    pub fn line(&mut self, s: &str) -> &mut Self {
        self.text(s);
        self.buf.push(LF);
        self
    }

    /// Write empty line
    pub fn newline(&mut self) -> &mut Self {
        self.buf.push(LF);
        self
    }

    /// Write text converted to a printer charset
    pub fn text_in(&mut self, charset: Charset, s: &str) -> PrintResult<&mut Self> {
        let bytes = charset.encode(s)?;
        if charset.is_double_byte() {
            // FS & .. FS . - Enter/leave Kanji mode
            self.buf.extend_from_slice(&[FS, 0x26]);
            self.buf.extend_from_slice(&bytes);
            self.buf.extend_from_slice(&[FS, 0x2E]);
        } else {
            if let Some(page) = charset.code_page() {
                self.select_code_page(page);
            }
            self.buf.extend_from_slice(&bytes);
        }
        Ok(self)
    }

    /// Select character code table (ESC t n)
    pub fn select_code_page(&mut self, page: u8) -> &mut Self {
        self.buf.extend_from_slice(&[ESC, 0x74, page]);
        self
    }

    // === Paper Feed ===

    /// Print and feed n dots (ESC J n)
    pub fn feed_dots(&mut self, dots: u8) -> &mut Self {
        self.buf.extend_from_slice(&[ESC, 0x4A, dots]);
        self
    }

    /// Print and feed n lines (ESC d n)
    pub fn feed_lines(&mut self, lines: u8) -> &mut Self {
        self.buf.extend_from_slice(&[ESC, 0x64, lines]);
        self
    }

    // === Alignment ===

    /// Set justification (ESC a n)
    pub fn justify(&mut self, mode: Justify) -> &mut Self {
        let n = match mode {
            Justify::Left => 0,
            Justify::Center => 1,
            Justify::Right => 2,
        };
        self.buf.extend_from_slice(&[ESC, 0x61, n]);
        self
    }

    // === Text Style ===

    /// Turn emphasized mode on or off (ESC E n)
    pub fn bold(&mut self, enabled: bool) -> &mut Self {
        self.buf.extend_from_slice(&[ESC, 0x45, u8::from(enabled)]);
        self
    }

    /// Underline mode (ESC - n)
    pub fn underline(&mut self, mode: Underline) -> &mut Self {
        let n = match mode {
            Underline::Off => 0,
            Underline::Single => 1,
            Underline::Double => 2,
        };
        self.buf.extend_from_slice(&[ESC, 0x2D, n]);
        self
    }

    /// Character size multipliers (GS ! n)
    ///
    /// `width` and `height` are 0-based magnifications in `0..=7`
    /// (0 = normal, 1 = double, ...).
    pub fn character_size(&mut self, width: u8, height: u8) -> PrintResult<&mut Self> {
        if width > 7 || height > 7 {
            return Err(PrintError::invalid(format!(
                "character size {}x{} outside 0..=7",
                width, height
            )));
        }
        self.buf.extend_from_slice(&[GS, 0x21, (width << 4) | height]);
        Ok(self)
    }

    /// Select font (ESC M n)
    pub fn font(&mut self, font: Font) -> &mut Self {
        let n = match font {
            Font::A => 0,
            Font::B => 1,
            Font::C => 2,
        };
        self.buf.extend_from_slice(&[ESC, 0x4D, n]);
        self
    }

    // === Layout Helpers ===

    /// Print a full-width line of `ch`
    pub fn separator(&mut self, ch: char) -> &mut Self {
        let line: String = std::iter::repeat_n(ch, self.width).collect();
        self.line(&line)
    }

    /// Print left and right text on the same line
    ///
    /// Left text is left-aligned, right text is right-aligned, with spaces
    /// filling the gap. Widths are measured in `charset` columns.
    pub fn line_lr(
        &mut self,
        charset: Charset,
        left: &str,
        right: &str,
    ) -> PrintResult<&mut Self> {
        let lw = charset.width(left);
        let rw = charset.width(right);

        let gap = if lw + rw >= self.width {
            1
        } else {
            self.width - lw - rw
        };
        let row = format!("{}{}{}", left, " ".repeat(gap), right);
        self.text_in(charset, &row)?;
        self.buf.push(LF);
        Ok(self)
    }

    // === Barcodes ===

    /// HRI character position (GS H n)
    pub fn hri_position(&mut self, pos: HriPosition) -> &mut Self {
        let n = match pos {
            HriPosition::None => 0,
            HriPosition::Above => 1,
            HriPosition::Below => 2,
            HriPosition::Both => 3,
        };
        self.buf.extend_from_slice(&[GS, 0x48, n]);
        self
    }

    /// Barcode height in dots (GS h n), 1..=255
    pub fn barcode_height(&mut self, height: u8) -> PrintResult<&mut Self> {
        if height == 0 {
            return Err(PrintError::invalid("barcode height must be 1..=255"));
        }
        self.buf.extend_from_slice(&[GS, 0x68, height]);
        Ok(self)
    }

    /// Barcode module width (GS w n), 2..=6
    pub fn barcode_width(&mut self, width: u8) -> PrintResult<&mut Self> {
        if !(2..=6).contains(&width) {
            return Err(PrintError::invalid(format!(
                "barcode width {} outside 2..=6",
                width
            )));
        }
        self.buf.extend_from_slice(&[GS, 0x77, width]);
        Ok(self)
    }

    /// Print a barcode (GS k)
    pub fn barcode(&mut self, symbology: Symbology, data: &[u8]) -> PrintResult<&mut Self> {
        let cmd = symbology.encode(data)?;
        self.buf.extend_from_slice(&cmd);
        Ok(self)
    }

    // === QR Code ===

    /// Print a QR code (model 2, error correction L)
    ///
    /// `module_size`: 1-16 dots
    pub fn qr_code(&mut self, data: &[u8], module_size: u8) -> PrintResult<&mut Self> {
        if !(1..=16).contains(&module_size) {
            return Err(PrintError::invalid(format!(
                "QR module size {} outside 1..=16",
                module_size
            )));
        }
        if data.is_empty() || data.len() > QR_MAX_DATA {
            return Err(PrintError::invalid(format!(
                "QR payload of {} bytes outside 1..={}",
                data.len(),
                QR_MAX_DATA
            )));
        }

        // Function 165: Select model (Model 2)
        self.buf
            .extend_from_slice(&[GS, 0x28, 0x6B, 0x04, 0x00, 0x31, 0x41, 0x32, 0x00]);

        // Function 167: Set module size
        self.buf
            .extend_from_slice(&[GS, 0x28, 0x6B, 0x03, 0x00, 0x31, 0x43, module_size]);

        // Function 169: Set error correction (L)
        self.buf
            .extend_from_slice(&[GS, 0x28, 0x6B, 0x03, 0x00, 0x31, 0x45, 0x30]);

        // Function 180: Store data
        let len = data.len() + 3;
        let p_l = (len & 0xFF) as u8;
        let p_h = ((len >> 8) & 0xFF) as u8;
        self.buf
            .extend_from_slice(&[GS, 0x28, 0x6B, p_l, p_h, 0x31, 0x50, 0x30]);
        self.buf.extend_from_slice(data);

        // Function 181: Print
        self.buf
            .extend_from_slice(&[GS, 0x28, 0x6B, 0x03, 0x00, 0x31, 0x51, 0x30]);

        Ok(self)
    }

    // === Raster ===

    /// Emit a raster bit image (GS v 0) from pre-packed 1-bit rows
    ///
    /// `width_bytes` is the row stride in bytes (8 dots each), `height` the
    /// number of rows. `data` must hold exactly `width_bytes * height` bytes.
    pub fn raster(
        &mut self,
        width_bytes: u16,
        height: u16,
        data: &[u8],
    ) -> PrintResult<&mut Self> {
        if width_bytes == 0 || height == 0 {
            return Err(PrintError::invalid("raster dimensions must be non-zero"));
        }
        let expected = width_bytes as usize * height as usize;
        if data.len() != expected {
            return Err(PrintError::invalid(format!(
                "raster data is {} bytes, expected {}",
                data.len(),
                expected
            )));
        }

        // GS v 0 m xL xH yL yH
        self.buf.extend_from_slice(&[GS, 0x76, 0x30, 0x00]);
        self.buf.extend_from_slice(&width_bytes.to_le_bytes());
        self.buf.extend_from_slice(&height.to_le_bytes());
        self.buf.extend_from_slice(data);
        Ok(self)
    }

    // === Paper Control ===

    /// Cut paper (full cut)
    pub fn cut(&mut self) -> &mut Self {
        // GS V 0 - Full cut
        self.buf.extend_from_slice(&[GS, 0x56, 0x00]);
        self
    }

    /// Full cut with feed - feeds n lines then cuts.
    /// Uses GS V 66 n, which lets the printer manage cutter-to-head distance.
    pub fn cut_feed(&mut self, lines: u8) -> &mut Self {
        self.buf.extend_from_slice(&[GS, 0x56, 0x42, lines]);
        self
    }

    /// Partial cut (leave a small connection)
    pub fn partial_cut(&mut self) -> &mut Self {
        // GS V 1 - Partial cut
        self.buf.extend_from_slice(&[GS, 0x56, 0x01]);
        self
    }

    // === Pulse Outputs ===

    /// Open cash drawer (ESC p m t1 t2), pulse times in 2ms units
    pub fn open_drawer(&mut self, pin: DrawerPin, on: u8, off: u8) -> &mut Self {
        let m = match pin {
            DrawerPin::Pin2 => 0,
            DrawerPin::Pin5 => 1,
        };
        self.buf.extend_from_slice(&[ESC, 0x70, m, on, off]);
        self
    }

    /// Sound the buzzer `count` times
    ///
    /// Receipt-printer buzzers hang off the drawer kick connector, so each
    /// beep is one `ESC p 0 t t` pulse with `duration` as both on and off
    /// time. Devices without a buzzer ignore it.
    pub fn beep(&mut self, count: u8, duration: u8) -> PrintResult<&mut Self> {
        if !(1..=9).contains(&count) {
            return Err(PrintError::invalid(format!(
                "beep count {} outside 1..=9",
                count
            )));
        }
        if duration == 0 {
            return Err(PrintError::invalid("beep duration must be 1..=255"));
        }
        for _ in 0..count {
            self.open_drawer(DrawerPin::Pin2, duration, duration);
        }
        Ok(self)
    }

    // === Raw Commands ===

    /// Write raw bytes directly
    pub fn raw(&mut self, bytes: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(bytes);
        self
    }

    // === Build ===

    /// Take the accumulated bytes
    pub fn build(self) -> Vec<u8> {
        self.buf
    }

    /// Borrow the accumulated bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }
}

impl Default for EscPosBuilder {
    fn default() -> Self {
        Self::new(48)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_starts_empty() {
        let mut b = EscPosBuilder::new(32);
        assert!(b.is_empty());
        b.initialize();
        assert_eq!(b.build(), vec![0x1B, 0x40]);
    }

    #[test]
    fn test_character_size_all_values() {
        for w in 0..=7u8 {
            for h in 0..=7u8 {
                let mut b = EscPosBuilder::default();
                b.character_size(w, h).unwrap();
                assert_eq!(b.build(), vec![0x1D, 0x21, (w << 4) | h]);
            }
        }
    }

    #[test]
    fn test_character_size_rejects_out_of_range() {
        let mut b = EscPosBuilder::default();
        assert!(matches!(
            b.character_size(8, 0),
            Err(PrintError::InvalidArgument(_))
        ));
        assert!(matches!(
            b.character_size(0, 8),
            Err(PrintError::InvalidArgument(_))
        ));
        assert!(b.is_empty());
    }

    #[test]
    fn test_justify_parameters() {
        for (mode, n) in [(Justify::Left, 0), (Justify::Center, 1), (Justify::Right, 2)] {
            let mut b = EscPosBuilder::default();
            b.justify(mode);
            assert_eq!(b.build(), vec![0x1B, 0x61, n]);
        }
    }

    #[test]
    fn test_styles() {
        let mut b = EscPosBuilder::default();
        b.bold(true)
            .bold(false)
            .font(Font::B)
            .hri_position(HriPosition::Below);
        assert_eq!(
            b.build(),
            vec![0x1B, 0x45, 1, 0x1B, 0x45, 0, 0x1B, 0x4D, 1, 0x1D, 0x48, 2]
        );
    }

    #[test]
    fn test_barcode_settings() {
        let mut b = EscPosBuilder::default();
        b.barcode_height(50).unwrap();
        assert!(b.barcode_height(0).is_err());
        assert!(b.barcode_width(7).is_err());
        assert_eq!(b.build(), vec![0x1D, 0x68, 50]);
    }

    #[test]
    fn test_paper_control() {
        let mut b = EscPosBuilder::default();
        b.feed_lines(3).feed_dots(24).cut();
        assert_eq!(b.build(), vec![0x1B, 0x64, 3, 0x1B, 0x4A, 24, 0x1D, 0x56, 0]);
    }

    #[test]
    fn test_beep_pulses() {
        let mut b = EscPosBuilder::default();
        b.beep(2, 10).unwrap();
        assert_eq!(
            b.build(),
            vec![0x1B, 0x70, 0, 10, 10, 0x1B, 0x70, 0, 10, 10]
        );
        assert!(EscPosBuilder::default().beep(0, 10).is_err());
        assert!(EscPosBuilder::default().beep(1, 0).is_err());
    }

    #[test]
    fn test_text_in_gbk_wraps_kanji_mode() {
        let mut b = EscPosBuilder::default();
        b.text_in(Charset::Gbk, "中").unwrap();
        assert_eq!(b.build(), vec![0x1C, 0x26, 0xD6, 0xD0, 0x1C, 0x2E]);
    }

    #[test]
    fn test_line_lr() {
        let mut b = EscPosBuilder::new(10);
        b.line_lr(Charset::Windows1252, "ab", "cd").unwrap();
        let data = b.build();
        assert!(data.ends_with(b"ab      cd\n"));
    }

    #[test]
    fn test_separator() {
        let mut b = EscPosBuilder::new(10);
        b.separator('=');
        assert_eq!(b.build(), b"==========\n".to_vec());
    }

    #[test]
    fn test_qr_validation() {
        let mut b = EscPosBuilder::default();
        assert!(b.qr_code(b"hi", 0).is_err());
        assert!(b.qr_code(b"", 4).is_err());
        b.qr_code(b"hi", 4).unwrap();
        let data = b.build();
        // store-data header carries len + 3
        let store = [0x1D, 0x28, 0x6B, 5, 0, 0x31, 0x50, 0x30, b'h', b'i'];
        assert!(data.windows(store.len()).any(|w| w == store));
    }

    #[test]
    fn test_raster_header() {
        let mut b = EscPosBuilder::default();
        assert!(b.raster(2, 2, &[0; 3]).is_err());
        b.raster(2, 2, &[0xFF, 0x00, 0x0F, 0xF0]).unwrap();
        assert_eq!(
            b.build(),
            vec![0x1D, 0x76, 0x30, 0, 2, 0, 2, 0, 0xFF, 0x00, 0x0F, 0xF0]
        );
    }
}
