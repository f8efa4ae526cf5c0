//! Byte transports for sending ESC/POS data
//!
//! Supports:
//! - Network printers (TCP port 9100)
//! - Serial ports with configured line settings
//! - Raw device nodes and any other `std::io::Write`
//! - The OS print spooler (see [`crate::spooler`])

mod network;
mod serial;
mod stream;

pub use network::{NetworkTarget, NetworkTransport, DEFAULT_PORT};
pub use serial::{DEFAULT_BAUD_RATE, FlowControl, SerialSettings, SerialTransport};
pub use stream::StreamTransport;

use crate::error::PrintResult;

/// Anything that accepts a byte buffer and can be closed
///
/// This is the seam a [`crate::PrinterSession`] is built on. Writes are
/// blocking and never retried. `close` must be idempotent.
pub trait Transport {
    /// Deliver `data` to the device
    fn write(&mut self, data: &[u8]) -> PrintResult<()>;

    /// Release the underlying connection
    fn close(&mut self) -> PrintResult<()>;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn write(&mut self, data: &[u8]) -> PrintResult<()> {
        (**self).write(data)
    }

    fn close(&mut self) -> PrintResult<()> {
        (**self).close()
    }
}
