//! Serial printers (RS-232 / USB-serial adapters)
//!
//! The port is configured before the first byte goes out: baud rate, 8N1
//! framing and flow control. Once open it is just another byte stream, so
//! it rides on [`StreamTransport`].

use super::StreamTransport;
use crate::error::{PrintError, PrintResult};
use serde::{Deserialize, Serialize};
use serialport::{DataBits, Parity, SerialPort, StopBits};
use std::io;
use std::time::Duration;
use tracing::{info, instrument};

/// Factory setting of most receipt printers
pub const DEFAULT_BAUD_RATE: u32 = 9600;

const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(5);

/// Transport over an opened serial port
pub type SerialTransport = StreamTransport<Box<dyn SerialPort>>;

/// Handshake used to pause the host when the printer buffer fills
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowControl {
    #[default]
    None,
    /// XON/XOFF
    Software,
    /// RTS/CTS (DTR/DSR on printers that wire it that way)
    Hardware,
}

impl From<FlowControl> for serialport::FlowControl {
    fn from(fc: FlowControl) -> Self {
        match fc {
            FlowControl::None => Self::None,
            FlowControl::Software => Self::Software,
            FlowControl::Hardware => Self::Hardware,
        }
    }
}

/// Line settings, always 8 data bits, no parity, 1 stop bit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SerialSettings {
    pub baud_rate: u32,
    pub flow_control: FlowControl,
    /// How long a write may block on a full printer buffer
    pub write_timeout: Duration,
}

impl SerialSettings {
    pub fn new(baud_rate: u32) -> Self {
        Self {
            baud_rate,
            flow_control: FlowControl::None,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
        }
    }

    pub fn with_flow_control(mut self, flow_control: FlowControl) -> Self {
        self.flow_control = flow_control;
        self
    }

    pub fn with_write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }
}

impl Default for SerialSettings {
    fn default() -> Self {
        Self::new(DEFAULT_BAUD_RATE)
    }
}

impl StreamTransport<Box<dyn SerialPort>> {
    /// Open `path` (`/dev/ttyUSB0`, `COM3`) at `baud_rate` without flow control
    pub fn open_serial(path: &str, baud_rate: u32) -> PrintResult<Self> {
        Self::open_serial_with(path, &SerialSettings::new(baud_rate))
    }

    /// Open `path` with explicit line settings
    #[instrument(skip(settings), fields(baud_rate = settings.baud_rate))]
    pub fn open_serial_with(path: &str, settings: &SerialSettings) -> PrintResult<Self> {
        if settings.baud_rate == 0 {
            return Err(PrintError::invalid("baud rate must be non-zero"));
        }

        let port = serialport::new(path, settings.baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(settings.flow_control.into())
            .timeout(settings.write_timeout)
            .open()
            .map_err(|e| open_error(path, e))?;

        info!(flow_control = ?settings.flow_control, "Serial port opened");
        Ok(Self::new(port))
    }
}

fn open_error(path: &str, e: serialport::Error) -> PrintError {
    use serialport::ErrorKind;

    match e.kind() {
        ErrorKind::NoDevice | ErrorKind::Io(io::ErrorKind::NotFound) => {
            PrintError::NotFound(format!("{}: {}", path, e))
        }
        ErrorKind::Io(io::ErrorKind::PermissionDenied) => {
            PrintError::PermissionDenied(format!("{}: {}", path, e))
        }
        ErrorKind::InvalidInput => PrintError::invalid(format!("{}: {}", path, e)),
        _ => PrintError::Connection(format!("{}: {}", path, e)),
    }
}
