//! Native print-spooler transport
//!
//! The OS spooler wants every raw job bracketed: acquire a printer handle,
//! start a document declared as `RAW`, start a page, write, then end the
//! page, end the document and release the handle. [`SpoolerTransport`]
//! drives that lifecycle as an explicit state machine over a
//! [`SpoolerApi`] binding so that skipped framing fails loudly instead of
//! silently printing nothing.

mod fetch;
mod transport;

#[cfg(not(windows))]
mod unsupported;
#[cfg(windows)]
mod win32;

pub use fetch::{Fetched, query_then_fetch};
pub use transport::SpoolerTransport;

#[cfg(not(windows))]
pub use unsupported::UnsupportedSpooler;
#[cfg(windows)]
pub use win32::WinSpool;

use crate::error::{PrintError, PrintResult};
use std::fmt;
use tracing::{debug, instrument};

/// Spooler binding for the current platform
#[cfg(windows)]
pub type SystemSpooler = WinSpool;
/// Spooler binding for the current platform
#[cfg(not(windows))]
pub type SystemSpooler = UnsupportedSpooler;

/// Lifecycle of one spooler job
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Unopened,
    Opened,
    DocumentStarted,
    PageStarted,
    Closed,
}

impl JobState {
    /// A printer handle is held
    pub fn holds_handle(self) -> bool {
        matches!(
            self,
            Self::Opened | Self::DocumentStarted | Self::PageStarted
        )
    }

    /// A document has been started and not yet ended
    pub fn in_document(self) -> bool {
        matches!(self, Self::DocumentStarted | Self::PageStarted)
    }

    /// A page has been started and not yet ended
    pub fn in_page(self) -> bool {
        self == Self::PageStarted
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Unopened => "Unopened",
            Self::Opened => "Opened",
            Self::DocumentStarted => "DocumentStarted",
            Self::PageStarted => "PageStarted",
            Self::Closed => "Closed",
        };
        f.write_str(s)
    }
}

/// Document framing parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobOptions {
    /// Name shown in the OS print queue
    pub doc_name: String,
    /// Spooler datatype; `RAW` keeps the bytes uninterpreted
    pub datatype: String,
}

impl Default for JobOptions {
    fn default() -> Self {
        Self {
            doc_name: "ESC/POS Document".to_string(),
            datatype: "RAW".to_string(),
        }
    }
}

/// OS print-spooler calls, one per framing step
///
/// Implementations are thin bindings; ordering and state checks live in
/// [`SpoolerTransport`].
pub trait SpoolerApi {
    /// OS printer handle
    type Handle: Copy + fmt::Debug;

    /// Acquire a handle; `PermissionDenied` or `ResourceBusy` on refusal
    fn open_printer(&self, name: &str) -> PrintResult<Self::Handle>;

    fn start_document(&self, handle: Self::Handle, options: &JobOptions) -> PrintResult<()>;

    fn start_page(&self, handle: Self::Handle) -> PrintResult<()>;

    /// Write raw bytes, returning how many the OS reports as written
    fn write(&self, handle: Self::Handle, data: &[u8]) -> PrintResult<usize>;

    fn end_page(&self, handle: Self::Handle) -> PrintResult<()>;

    fn end_document(&self, handle: Self::Handle) -> PrintResult<()>;

    /// Release the handle
    fn close_printer(&self, handle: Self::Handle) -> PrintResult<()>;

    /// Names of local and connected printers, in OS order
    fn enumerate_printers(&self) -> PrintResult<Vec<String>>;

    /// The user's default printer, if the platform has the concept
    fn default_printer(&self) -> PrintResult<Option<String>> {
        Ok(None)
    }
}

/// Resolve a printer name - returns the name if installed, else the
/// default printer, else the first one enumerated
#[instrument(skip(api))]
pub fn resolve_printer<A: SpoolerApi>(api: &A, name: Option<&str>) -> PrintResult<String> {
    if let Some(name) = name {
        let printers = api.enumerate_printers()?;
        if printers.iter().any(|p| p == name) {
            return Ok(name.to_string());
        }
        return Err(PrintError::NotFound(name.to_string()));
    }

    if let Some(default) = api.default_printer()? {
        debug!(printer = %default, "Using default printer");
        return Ok(default);
    }

    api.enumerate_printers()?
        .into_iter()
        .next()
        .ok_or_else(|| PrintError::NotFound("no printers installed".to_string()))
}
