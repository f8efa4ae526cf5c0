//! Fallback for platforms without a bound spooler

use super::{JobOptions, SpoolerApi};
use crate::error::{PrintError, PrintResult};
use tracing::debug;

/// Spooler for targets with no native binding
///
/// There are no printers to enumerate and no handle can be acquired.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnsupportedSpooler;

fn unsupported() -> PrintError {
    PrintError::Unsupported(format!(
        "native spooler printing is not available on {}",
        std::env::consts::OS
    ))
}

impl SpoolerApi for UnsupportedSpooler {
    type Handle = ();

    fn open_printer(&self, _name: &str) -> PrintResult<()> {
        Err(unsupported())
    }

    fn start_document(&self, _handle: (), _options: &JobOptions) -> PrintResult<()> {
        Err(unsupported())
    }

    fn start_page(&self, _handle: ()) -> PrintResult<()> {
        Err(unsupported())
    }

    fn write(&self, _handle: (), _data: &[u8]) -> PrintResult<usize> {
        Err(unsupported())
    }

    fn end_page(&self, _handle: ()) -> PrintResult<()> {
        Err(unsupported())
    }

    fn end_document(&self, _handle: ()) -> PrintResult<()> {
        Err(unsupported())
    }

    fn close_printer(&self, _handle: ()) -> PrintResult<()> {
        Err(unsupported())
    }

    fn enumerate_printers(&self) -> PrintResult<Vec<String>> {
        debug!("No spooler binding, reporting no printers");
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spooler::SpoolerTransport;

    #[test]
    fn test_no_printers_and_no_handles() {
        let mut job = SpoolerTransport::new(UnsupportedSpooler);
        assert!(job.enumerate_printers().unwrap().is_empty());
        // Not enumerated, so the name lookup fails first
        assert!(matches!(job.open("Any"), Err(PrintError::NotFound(_))));
        assert!(matches!(
            UnsupportedSpooler.open_printer("Any"),
            Err(PrintError::Unsupported(_))
        ));
    }
}
