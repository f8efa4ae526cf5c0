//! Spooler job state machine

use super::{JobOptions, JobState, SpoolerApi};
use crate::error::{PrintError, PrintResult};
use crate::transport::Transport;
use tracing::{debug, info, instrument, warn};

/// One raw print job on the OS spooler
///
/// ```text
/// Unopened -> Opened -> DocumentStarted -> PageStarted -> Closed
/// ```
///
/// Every step must be taken in order; anything else fails with
/// `ProtocolState` and leaves the state untouched. `close` is valid from
/// any state and unwinds whatever was reached. Dropping an unclosed
/// transport closes it.
pub struct SpoolerTransport<A: SpoolerApi> {
    api: A,
    options: JobOptions,
    printer: Option<String>,
    handle: Option<A::Handle>,
    state: JobState,
    bytes_written: u64,
}

impl<A: SpoolerApi> SpoolerTransport<A> {
    /// Create an unopened transport over `api`
    pub fn new(api: A) -> Self {
        Self {
            api,
            options: JobOptions::default(),
            printer: None,
            handle: None,
            state: JobState::Unopened,
            bytes_written: 0,
        }
    }

    /// Use custom document framing parameters
    pub fn with_options(mut self, options: JobOptions) -> Self {
        self.options = options;
        self
    }

    /// Open `name` and start a document and a page in one go
    ///
    /// If any step fails, the steps already taken are unwound before the
    /// original error is returned.
    pub fn open_job(api: A, name: &str, options: JobOptions) -> PrintResult<Self> {
        let mut job = Self::new(api).with_options(options);
        if let Err(e) = job.frame(name) {
            if let Err(teardown) = job.close() {
                warn!(printer = name, error = %teardown, "Unwind after failed open also failed");
            }
            return Err(e);
        }
        Ok(job)
    }

    fn frame(&mut self, name: &str) -> PrintResult<()> {
        self.open(name)?;
        self.start_document()?;
        self.start_page()
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    /// Name of the opened printer
    pub fn printer(&self) -> Option<&str> {
        self.printer.as_deref()
    }

    /// Bytes the spooler has accepted for this job, short writes included
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Installed and connected printers, in OS order
    pub fn enumerate_printers(&self) -> PrintResult<Vec<String>> {
        self.api.enumerate_printers()
    }

    /// Acquire a handle for `name`
    ///
    /// The name must match an enumerated printer exactly (case-sensitive).
    #[instrument(skip(self), fields(state = %self.state))]
    pub fn open(&mut self, name: &str) -> PrintResult<()> {
        self.require("open", JobState::Unopened)?;

        let printers = self.api.enumerate_printers()?;
        if !printers.iter().any(|p| p == name) {
            return Err(PrintError::NotFound(name.to_string()));
        }

        let handle = self.api.open_printer(name)?;
        self.handle = Some(handle);
        self.printer = Some(name.to_string());
        self.advance(JobState::Opened);
        info!("Printer handle acquired");
        Ok(())
    }

    /// Start a document with the configured datatype (normally `RAW`)
    pub fn start_document(&mut self) -> PrintResult<()> {
        let handle = self.handle_in("start_document", JobState::Opened)?;
        self.api.start_document(handle, &self.options)?;
        self.advance(JobState::DocumentStarted);
        Ok(())
    }

    pub fn start_page(&mut self) -> PrintResult<()> {
        let handle = self.handle_in("start_page", JobState::DocumentStarted)?;
        self.api.start_page(handle)?;
        self.advance(JobState::PageStarted);
        Ok(())
    }

    /// Write raw bytes to the open page
    ///
    /// A short write is an error carrying the count the OS accepted; nothing
    /// is retried.
    pub fn write(&mut self, data: &[u8]) -> PrintResult<()> {
        let handle = self.handle_in("write", JobState::PageStarted)?;
        if data.is_empty() {
            return Ok(());
        }

        let written = match self.api.write(handle, data) {
            Ok(n) => n,
            Err(e) => {
                if let PrintError::TransportWrite { written, .. } = &e {
                    self.bytes_written += *written as u64;
                }
                return Err(e);
            }
        };
        self.bytes_written += written as u64;
        if written != data.len() {
            return Err(PrintError::TransportWrite {
                written,
                expected: data.len(),
                reason: "spooler accepted fewer bytes than requested".to_string(),
            });
        }
        debug!(data_len = data.len(), total = self.bytes_written, "Spooler write");
        Ok(())
    }

    /// End the page, end the document and release the handle, as far as
    /// each was reached
    ///
    /// Every applicable step runs even when an earlier one fails; the first
    /// failure is returned. A second call does nothing.
    #[instrument(skip(self), fields(printer = ?self.printer, state = %self.state))]
    pub fn close(&mut self) -> PrintResult<()> {
        let reached = self.state;
        if reached == JobState::Closed {
            return Ok(());
        }
        self.state = JobState::Closed;

        let Some(handle) = self.handle.take() else {
            debug!("Closed without a handle");
            return Ok(());
        };

        let mut first_err: Option<PrintError> = None;
        let mut record = |step: &'static str, result: PrintResult<()>| {
            if let Err(e) = result {
                warn!(step, error = %e, "Teardown step failed");
                if first_err.is_none() {
                    first_err = Some(PrintError::Teardown {
                        step,
                        reason: e.to_string(),
                    });
                }
            }
        };

        if reached.in_page() {
            record("end_page", self.api.end_page(handle));
        }
        if reached.in_document() {
            record("end_document", self.api.end_document(handle));
        }
        if reached.holds_handle() {
            record("release_handle", self.api.close_printer(handle));
        }

        match first_err {
            Some(e) => Err(e),
            None => {
                info!("Print job closed");
                Ok(())
            }
        }
    }

    /// Fail with `ProtocolState` unless the job is in `expected`
    fn require(&self, operation: &'static str, expected: JobState) -> PrintResult<()> {
        if self.state != expected {
            return Err(PrintError::ProtocolState {
                operation,
                state: self.state.to_string(),
            });
        }
        Ok(())
    }

    /// Like `require`, also handing out the handle the state implies
    fn handle_in(&self, operation: &'static str, expected: JobState) -> PrintResult<A::Handle> {
        self.require(operation, expected)?;
        self.handle.ok_or_else(|| PrintError::ProtocolState {
            operation,
            state: format!("{} without handle", self.state),
        })
    }

    fn advance(&mut self, next: JobState) {
        debug!(from = %self.state, to = %next, "Job state");
        self.state = next;
    }
}

impl<A: SpoolerApi> Transport for SpoolerTransport<A> {
    fn write(&mut self, data: &[u8]) -> PrintResult<()> {
        SpoolerTransport::write(self, data)
    }

    fn close(&mut self) -> PrintResult<()> {
        SpoolerTransport::close(self)
    }
}

impl<A: SpoolerApi> Drop for SpoolerTransport<A> {
    fn drop(&mut self) {
        if self.state.holds_handle() {
            warn!(state = %self.state, "Spooler job dropped without close");
            if let Err(e) = self.close() {
                warn!(error = %e, "Teardown on drop failed");
            }
        }
    }
}
