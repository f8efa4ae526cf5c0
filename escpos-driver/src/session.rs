//! Printer session - semantic print calls over one transport
//!
//! Each call encodes its command with [`EscPosBuilder`] and hands the bytes
//! to the transport in a single `write`. Nothing is cached or retried:
//! formatting lives on the device, and a failed write comes back to the
//! caller exactly as the transport reported it.

use crate::barcode::Symbology;
use crate::error::{PrintError, PrintResult};
use crate::escpos::{DrawerPin, EscPosBuilder, Font, HriPosition, Justify, Underline};
use crate::transport::Transport;
use tracing::{debug, instrument, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    Open,
    /// Close was attempted and failed; printing is over but teardown is not
    Closing,
    Closed,
}

/// A print session owning one transport
pub struct PrinterSession<T: Transport> {
    transport: T,
    lifecycle: Lifecycle,
}

impl<T: Transport> PrinterSession<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            lifecycle: Lifecycle::Open,
        }
    }

    /// No more printing is possible on this session
    pub fn is_closed(&self) -> bool {
        self.lifecycle != Lifecycle::Open
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Give back the transport without closing it
    pub fn into_inner(self) -> T {
        self.transport
    }

    fn ensure_open(&self, operation: &'static str) -> PrintResult<()> {
        if self.is_closed() {
            return Err(PrintError::ProtocolState {
                operation,
                state: format!("{:?}", self.lifecycle),
            });
        }
        Ok(())
    }

    /// Encode with a fresh builder, then write the result
    fn emit<F>(&mut self, operation: &'static str, encode: F) -> PrintResult<()>
    where
        F: FnOnce(&mut EscPosBuilder) -> PrintResult<()>,
    {
        self.ensure_open(operation)?;
        let mut builder = EscPosBuilder::default();
        encode(&mut builder)?;
        self.transport.write(builder.as_bytes())
    }

    /// Reset the printer to its defaults
    pub fn initialize(&mut self) -> PrintResult<()> {
        self.emit("initialize", |b| {
            b.initialize();
            Ok(())
        })
    }

    /// Print raw text (charset is the caller's responsibility)
    pub fn print(&mut self, text: &str) -> PrintResult<()> {
        self.emit("print", |b| {
            b.text(text);
            Ok(())
        })
    }

    pub fn println(&mut self, text: &str) -> PrintResult<()> {
        self.emit("println", |b| {
            b.line(text);
            Ok(())
        })
    }

    /// Line feed
    pub fn lf(&mut self) -> PrintResult<()> {
        self.emit("lf", |b| {
            b.newline();
            Ok(())
        })
    }

    pub fn justify(&mut self, mode: Justify) -> PrintResult<()> {
        self.emit("justify", |b| {
            b.justify(mode);
            Ok(())
        })
    }

    pub fn set_bold(&mut self, enabled: bool) -> PrintResult<()> {
        self.emit("set_bold", |b| {
            b.bold(enabled);
            Ok(())
        })
    }

    pub fn set_underline(&mut self, mode: Underline) -> PrintResult<()> {
        self.emit("set_underline", |b| {
            b.underline(mode);
            Ok(())
        })
    }

    /// Width/height magnification, each in `0..=7`
    pub fn set_character_size(&mut self, width: u8, height: u8) -> PrintResult<()> {
        self.emit("set_character_size", |b| {
            b.character_size(width, height)?;
            Ok(())
        })
    }

    pub fn set_font(&mut self, font: Font) -> PrintResult<()> {
        self.emit("set_font", |b| {
            b.font(font);
            Ok(())
        })
    }

    /// Must be sent before `print_barcode` to take effect
    pub fn set_hri_position(&mut self, pos: HriPosition) -> PrintResult<()> {
        self.emit("set_hri_position", |b| {
            b.hri_position(pos);
            Ok(())
        })
    }

    /// Must be sent before `print_barcode` to take effect
    pub fn set_barcode_height(&mut self, height: u8) -> PrintResult<()> {
        self.emit("set_barcode_height", |b| {
            b.barcode_height(height)?;
            Ok(())
        })
    }

    pub fn set_barcode_width(&mut self, width: u8) -> PrintResult<()> {
        self.emit("set_barcode_width", |b| {
            b.barcode_width(width)?;
            Ok(())
        })
    }

    /// Validate and print a barcode
    pub fn print_barcode(&mut self, symbology: Symbology, data: &str) -> PrintResult<()> {
        self.emit("print_barcode", |b| {
            b.barcode(symbology, data.as_bytes())?;
            Ok(())
        })
    }

    pub fn print_qr(&mut self, data: &str, module_size: u8) -> PrintResult<()> {
        self.emit("print_qr", |b| {
            b.qr_code(data.as_bytes(), module_size)?;
            Ok(())
        })
    }

    /// Print pre-packed 1-bit raster rows
    pub fn print_raster(
        &mut self,
        width_bytes: u16,
        height: u16,
        data: &[u8],
    ) -> PrintResult<()> {
        self.emit("print_raster", |b| {
            b.raster(width_bytes, height, data)?;
            Ok(())
        })
    }

    /// Feed paper by `dots`
    pub fn feed(&mut self, dots: u8) -> PrintResult<()> {
        self.emit("feed", |b| {
            b.feed_dots(dots);
            Ok(())
        })
    }

    pub fn feed_lines(&mut self, lines: u8) -> PrintResult<()> {
        self.emit("feed_lines", |b| {
            b.feed_lines(lines);
            Ok(())
        })
    }

    /// Full cut
    pub fn cut(&mut self) -> PrintResult<()> {
        self.emit("cut", |b| {
            b.cut();
            Ok(())
        })
    }

    pub fn partial_cut(&mut self) -> PrintResult<()> {
        self.emit("partial_cut", |b| {
            b.partial_cut();
            Ok(())
        })
    }

    pub fn beep(&mut self, count: u8, duration: u8) -> PrintResult<()> {
        self.emit("beep", |b| {
            b.beep(count, duration)?;
            Ok(())
        })
    }

    pub fn open_drawer(&mut self, pin: DrawerPin) -> PrintResult<()> {
        self.emit("open_drawer", |b| {
            b.open_drawer(pin, 25, 250);
            Ok(())
        })
    }

    /// Send bytes as they are
    pub fn write_raw(&mut self, data: &[u8]) -> PrintResult<()> {
        self.ensure_open("write_raw")?;
        self.transport.write(data)
    }

    /// Send everything a builder accumulated in one write
    pub fn send(&mut self, builder: &EscPosBuilder) -> PrintResult<()> {
        self.ensure_open("send")?;
        self.transport.write(builder.as_bytes())
    }

    /// Close the transport
    ///
    /// Once a close has succeeded, later calls return `Ok` without touching
    /// the transport. A failed close still ends printing on this session;
    /// calling `close` again lets the transport finish its teardown.
    #[instrument(skip(self), fields(lifecycle = ?self.lifecycle))]
    pub fn close(&mut self) -> PrintResult<()> {
        if self.lifecycle == Lifecycle::Closed {
            return Ok(());
        }
        match self.transport.close() {
            Ok(()) => {
                self.lifecycle = Lifecycle::Closed;
                debug!("Session closed");
                Ok(())
            }
            Err(e) => {
                self.lifecycle = Lifecycle::Closing;
                warn!(error = %e, "Session close failed");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Transport that keeps every write and counts closes
    #[derive(Default)]
    struct Recording {
        writes: Vec<Vec<u8>>,
        closes: usize,
        fail_writes: bool,
        fail_closes: usize,
    }

    impl Transport for Recording {
        fn write(&mut self, data: &[u8]) -> PrintResult<()> {
            if self.fail_writes {
                return Err(PrintError::TransportWrite {
                    written: 0,
                    expected: data.len(),
                    reason: "unplugged".to_string(),
                });
            }
            self.writes.push(data.to_vec());
            Ok(())
        }

        fn close(&mut self) -> PrintResult<()> {
            self.closes += 1;
            if self.fail_closes > 0 {
                self.fail_closes -= 1;
                return Err(PrintError::Teardown {
                    step: "release_handle",
                    reason: "busy".to_string(),
                });
            }
            Ok(())
        }
    }

    #[test]
    fn test_one_write_per_call() {
        let mut session = PrinterSession::new(Recording::default());
        session.initialize().unwrap();
        session.justify(Justify::Center).unwrap();
        session.set_character_size(1, 1).unwrap();
        session.println("TEST RECEIPT").unwrap();
        session.cut().unwrap();

        assert_eq!(
            session.transport().writes,
            vec![
                vec![0x1B, 0x40],
                vec![0x1B, 0x61, 1],
                vec![0x1D, 0x21, 0x11],
                b"TEST RECEIPT\n".to_vec(),
                vec![0x1D, 0x56, 0],
            ]
        );
    }

    #[test]
    fn test_invalid_argument_writes_nothing() {
        let mut session = PrinterSession::new(Recording::default());
        assert!(matches!(
            session.set_character_size(8, 1),
            Err(PrintError::InvalidArgument(_))
        ));
        assert!(matches!(
            session.print_barcode(Symbology::Code39, "A\0B"),
            Err(PrintError::InvalidArgument(_))
        ));
        assert!(session.transport().writes.is_empty());
    }

    #[test]
    fn test_write_error_passes_through() {
        let mut session = PrinterSession::new(Recording {
            fail_writes: true,
            ..Default::default()
        });
        match session.println("hello") {
            Err(PrintError::TransportWrite {
                written, expected, ..
            }) => assert_eq!((written, expected), (0, 6)),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_close_is_idempotent() {
        let mut session = PrinterSession::new(Recording::default());
        session.close().unwrap();
        session.close().unwrap();
        assert_eq!(session.transport().closes, 1);
        assert!(session.is_closed());
        assert!(matches!(
            session.cut(),
            Err(PrintError::ProtocolState { operation: "cut", .. })
        ));
    }

    #[test]
    fn test_failed_close_can_be_retried_by_caller() {
        let mut session = PrinterSession::new(Recording {
            fail_closes: 1,
            ..Default::default()
        });
        assert!(matches!(session.close(), Err(PrintError::Teardown { .. })));
        assert!(session.is_closed());
        assert!(session.println("late").is_err());

        session.close().unwrap();
        session.close().unwrap();
        assert_eq!(session.transport().closes, 2);
    }

    #[test]
    fn test_send_prebuilt_buffer() {
        let mut builder = EscPosBuilder::new(32);
        builder.initialize().bold(true).line("hi");

        let mut session = PrinterSession::new(Recording::default());
        session.send(&builder).unwrap();
        assert_eq!(session.transport().writes.len(), 1);
        assert_eq!(session.transport().writes[0], builder.as_bytes());
    }
}
