//! Generic byte-stream transport (USB printer node, file, opened serial port)

use super::Transport;
use crate::error::{PrintError, PrintResult};
use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::Path;
use tracing::{debug, info, instrument};

/// Pass-through transport over any `Write`
///
/// The stream is dropped on `close`; later writes fail.
pub struct StreamTransport<W: Write> {
    inner: Option<W>,
}

impl<W: Write> StreamTransport<W> {
    pub fn new(inner: W) -> Self {
        Self { inner: Some(inner) }
    }

    pub fn is_closed(&self) -> bool {
        self.inner.is_none()
    }

    /// Borrow the wrapped stream, if still open
    pub fn get_ref(&self) -> Option<&W> {
        self.inner.as_ref()
    }

    /// Unwrap the stream, if still open
    pub fn into_inner(mut self) -> Option<W> {
        self.inner.take()
    }
}

impl StreamTransport<File> {
    /// Open a printer device node such as `/dev/usb/lp0`
    ///
    /// The node is written as is. Serial ports need line settings; use
    /// [`StreamTransport::open_serial`] for those.
    #[instrument]
    pub fn open_device(path: &Path) -> PrintResult<Self> {
        let file = OpenOptions::new().write(true).open(path)?;
        info!("Device opened");
        Ok(Self::new(file))
    }
}

/// `write_all` that remembers how far it got
pub(super) fn write_all_counted<W: Write>(w: &mut W, data: &[u8]) -> PrintResult<()> {
    let expected = data.len();
    let mut written = 0;
    while written < expected {
        match w.write(&data[written..]) {
            Ok(0) => {
                return Err(PrintError::TransportWrite {
                    written,
                    expected,
                    reason: "stream accepted no more bytes".to_string(),
                });
            }
            Ok(n) => written += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => {
                return Err(PrintError::TransportWrite {
                    written,
                    expected,
                    reason: e.to_string(),
                });
            }
        }
    }
    w.flush().map_err(|e| PrintError::TransportWrite {
        written,
        expected,
        reason: format!("flush failed: {}", e),
    })
}

impl<W: Write> Transport for StreamTransport<W> {
    fn write(&mut self, data: &[u8]) -> PrintResult<()> {
        let inner = self.inner.as_mut().ok_or_else(|| PrintError::ProtocolState {
            operation: "write",
            state: "Closed".to_string(),
        })?;
        debug!(data_len = data.len(), "Stream write");
        write_all_counted(inner, data)
    }

    fn close(&mut self) -> PrintResult<()> {
        if let Some(mut inner) = self.inner.take() {
            inner.flush()?;
            debug!("Stream closed");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    /// Accepts at most `limit` bytes in total
    struct Tight {
        taken: Vec<u8>,
        limit: usize,
    }

    impl Write for Tight {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            let n = buf.len().min(self.limit - self.taken.len()).min(3);
            self.taken.extend_from_slice(&buf[..n]);
            Ok(n)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_stream_passthrough() {
        let mut t = StreamTransport::new(Vec::new());
        t.write(b"\x1B@").unwrap();
        t.write(b"hi\n").unwrap();
        assert_eq!(t.get_ref().unwrap().as_slice(), b"\x1B@hi\n");
    }

    #[test]
    fn test_short_write_reports_count() {
        let mut t = StreamTransport::new(Tight {
            taken: Vec::new(),
            limit: 5,
        });
        match t.write(b"0123456789") {
            Err(PrintError::TransportWrite {
                written, expected, ..
            }) => {
                assert_eq!(written, 5);
                assert_eq!(expected, 10);
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_close_is_idempotent() {
        let mut t = StreamTransport::new(Vec::new());
        t.close().unwrap();
        t.close().unwrap();
        assert!(t.is_closed());
        assert!(matches!(
            t.write(b"x"),
            Err(PrintError::ProtocolState { .. })
        ));
    }

    #[test]
    fn test_open_device_writes_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let mut t = StreamTransport::open_device(file.path()).unwrap();
        t.write(b"\x1B@TEST\n").unwrap();
        t.close().unwrap();
        assert_eq!(std::fs::read(file.path()).unwrap(), b"\x1B@TEST\n");
    }
}
