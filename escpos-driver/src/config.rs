//! Printer connection config
//!
//! Describes how to reach a printer, in the shape applications store it
//! (JSON settings, database rows). `connect()` turns it into a session.

use crate::error::{PrintError, PrintResult};
use crate::session::PrinterSession;
use crate::spooler::{JobOptions, SpoolerTransport, SystemSpooler, resolve_printer};
use crate::transport::{
    DEFAULT_BAUD_RATE, DEFAULT_PORT, FlowControl, NetworkTarget, SerialSettings, StreamTransport,
    Transport,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, instrument};

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_connect_timeout_ms() -> u64 {
    5000
}

fn default_baud_rate() -> u32 {
    DEFAULT_BAUD_RATE
}

fn default_doc_name() -> String {
    JobOptions::default().doc_name
}

/// Physical connection method
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "connection", rename_all = "snake_case")]
pub enum PrinterConfig {
    /// Raw TCP printing
    Network {
        host: String,
        #[serde(default = "default_port")]
        port: u16,
        #[serde(default = "default_connect_timeout_ms")]
        connect_timeout_ms: u64,
    },
    /// Serial port (`/dev/ttyUSB0`, `COM3`), 8N1
    Serial {
        path: String,
        #[serde(default = "default_baud_rate")]
        baud_rate: u32,
        #[serde(default)]
        flow_control: FlowControl,
    },
    /// Printer device node such as `/dev/usb/lp0`, written as is
    Device { path: PathBuf },
    /// Installed printer on the OS spooler; `None` picks the default
    Spooler {
        #[serde(default)]
        name: Option<String>,
        #[serde(default = "default_doc_name")]
        doc_name: String,
    },
}

impl PrinterConfig {
    /// Parse a JSON config
    pub fn from_json(s: &str) -> PrintResult<Self> {
        serde_json::from_str(s).map_err(|e| PrintError::InvalidConfig(e.to_string()))
    }

    /// Open the connection and wrap it in a session
    #[instrument]
    pub fn connect(&self) -> PrintResult<PrinterSession<Box<dyn Transport>>> {
        let transport: Box<dyn Transport> = match self {
            Self::Network {
                host,
                port,
                connect_timeout_ms,
            } => Box::new(
                NetworkTarget::new(host, *port)?
                    .with_timeout(Duration::from_millis(*connect_timeout_ms))
                    .connect()?,
            ),
            Self::Serial {
                path,
                baud_rate,
                flow_control,
            } => {
                let settings = SerialSettings::new(*baud_rate).with_flow_control(*flow_control);
                Box::new(StreamTransport::open_serial_with(path, &settings)?)
            }
            Self::Device { path } => Box::new(StreamTransport::open_device(path)?),
            Self::Spooler { name, doc_name } => {
                let api = SystemSpooler::default();
                let printer = resolve_printer(&api, name.as_deref())?;
                let options = JobOptions {
                    doc_name: doc_name.clone(),
                    ..JobOptions::default()
                };
                Box::new(SpoolerTransport::open_job(api, &printer, options)?)
            }
        };

        info!("Printer session ready");
        Ok(PrinterSession::new(transport))
    }
}
