//! Error types for the printer library

use thiserror::Error;

/// Printer error types
#[derive(Debug, Error)]
pub enum PrintError {
    /// Malformed formatting parameter or barcode payload
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Printer name absent from the enumerated set
    #[error("Printer not found: {0}")]
    NotFound(String),

    /// The OS refused to hand out a printer handle
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// The printer exists but its handle cannot be acquired right now
    #[error("Resource busy: {0}")]
    ResourceBusy(String),

    /// Partial or failed byte delivery
    #[error("Write failed after {written} of {expected} bytes: {reason}")]
    TransportWrite {
        written: usize,
        expected: usize,
        reason: String,
    },

    /// Operation attempted outside the required framing order
    #[error("`{operation}` is not allowed in state {state}")]
    ProtocolState {
        operation: &'static str,
        state: String,
    },

    /// Failure during close; the remaining teardown steps still ran
    #[error("Teardown step `{step}` failed: {reason}")]
    Teardown { step: &'static str, reason: String },

    /// Spooler call failed while framing a job
    #[error("Spooler call `{operation}` failed: {reason}")]
    Spooler {
        operation: &'static str,
        reason: String,
    },

    /// Network connection error
    #[error("Connection failed: {0}")]
    Connection(String),

    /// Timeout waiting for printer
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Invalid printer configuration
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// Transport not available on this platform
    #[error("Unsupported: {0}")]
    Unsupported(String),

    /// IO error while opening a device
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PrintError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }
}

/// Result type for printer operations
pub type PrintResult<T> = Result<T, PrintError>;
