//! # escpos-driver
//!
//! ESC/POS thermal printer library: command encoding plus delivery.
//!
//! ## Scope
//!
//! This crate handles HOW to print:
//! - ESC/POS command building, including validated barcodes
//! - Network printing (TCP port 9100)
//! - Serial ports (baud rate, flow control) and USB printer device nodes
//! - Native OS spooler printing (Windows; other targets report no printers)
//!
//! What to print (receipt layout, templates) stays in application code.
//!
//! ## Example
//!
//! ```ignore
//! use escpos_driver::{Justify, NetworkTransport, PrinterSession, Symbology};
//!
//! let transport = NetworkTransport::connect("192.168.1.100", 9100)?;
//! let mut printer = PrinterSession::new(transport);
//! printer.initialize()?;
//! printer.justify(Justify::Center)?;
//! printer.set_bold(true)?;
//! printer.println("TEST RECEIPT")?;
//! printer.set_bold(false)?;
//! printer.set_barcode_height(50)?;
//! printer.print_barcode(Symbology::Code39, "TEST123")?;
//! printer.feed_lines(3)?;
//! printer.cut()?;
//! printer.close()?;
//! ```

mod barcode;
mod charset;
mod config;
mod error;
mod escpos;
mod session;
pub mod spooler;
pub mod transport;

// Re-exports
pub use barcode::Symbology;
pub use charset::Charset;
pub use config::PrinterConfig;
pub use error::{PrintError, PrintResult};
pub use escpos::{DrawerPin, EscPosBuilder, Font, HriPosition, Justify, Underline};
pub use session::PrinterSession;
pub use spooler::{JobOptions, JobState, SpoolerApi, SpoolerTransport, SystemSpooler};
pub use transport::{
    FlowControl, NetworkTarget, NetworkTransport, SerialSettings, StreamTransport, Transport,
};
