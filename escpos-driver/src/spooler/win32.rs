//! Windows spooler binding (winspool via Win32 API)

use super::{JobOptions, SpoolerApi, query_then_fetch};
use crate::error::{PrintError, PrintResult};
use core::ffi::c_void;
use tracing::{debug, instrument};
use windows::Win32::Foundation::{
    ERROR_ACCESS_DENIED, ERROR_FILE_NOT_FOUND, ERROR_INSUFFICIENT_BUFFER,
    ERROR_INVALID_PRINTER_NAME, GetLastError, WIN32_ERROR,
};
use windows::Win32::Graphics::Printing::{
    ClosePrinter, DOC_INFO_1W, EndDocPrinter, EndPagePrinter, EnumPrintersW, GetDefaultPrinterW,
    OpenPrinterW, PRINTER_ENUM_CONNECTIONS, PRINTER_ENUM_LOCAL, PRINTER_HANDLE, PRINTER_INFO_4W,
    StartDocPrinterW, StartPagePrinter, WritePrinter,
};
use windows::core::{PCWSTR, PWSTR};

fn to_wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}

fn last_error(operation: &'static str) -> PrintError {
    win32_error(operation, unsafe { GetLastError() })
}

fn win32_error(operation: &'static str, code: WIN32_ERROR) -> PrintError {
    PrintError::Spooler {
        operation,
        reason: format!("Win32 error {}", code.0),
    }
}

/// Sort a failed `GetDefaultPrinterW` call into "keep going" or an error
///
/// On the size query, "buffer too small" is the expected answer and "file
/// not found" means no default printer is configured (reported as size 0).
/// Every other code, and any failure of the fetch itself, is an error.
fn default_printer_failure(code: WIN32_ERROR, probing: bool, needed: &mut u32) -> PrintResult<()> {
    match code {
        ERROR_INSUFFICIENT_BUFFER if probing => Ok(()),
        ERROR_FILE_NOT_FOUND if probing => {
            *needed = 0;
            Ok(())
        }
        code => Err(win32_error("GetDefaultPrinterW", code)),
    }
}

/// Win32 print spooler
#[derive(Debug, Default, Clone, Copy)]
pub struct WinSpool;

impl SpoolerApi for WinSpool {
    type Handle = PRINTER_HANDLE;

    #[instrument(skip(self))]
    fn open_printer(&self, name: &str) -> PrintResult<PRINTER_HANDLE> {
        let mut handle = PRINTER_HANDLE::default();
        let name_w = to_wide(name);

        unsafe { OpenPrinterW(PCWSTR::from_raw(name_w.as_ptr()), &mut handle, None) }.map_err(
            |e| {
                if e.code() == ERROR_ACCESS_DENIED.to_hresult() {
                    PrintError::PermissionDenied(format!("{}: {}", name, e))
                } else if e.code() == ERROR_INVALID_PRINTER_NAME.to_hresult() {
                    PrintError::NotFound(name.to_string())
                } else {
                    PrintError::ResourceBusy(format!("{}: {}", name, e))
                }
            },
        )?;

        Ok(handle)
    }

    fn start_document(&self, handle: PRINTER_HANDLE, options: &JobOptions) -> PrintResult<()> {
        let doc_name_w = to_wide(&options.doc_name);
        let datatype_w = to_wide(&options.datatype);
        let doc_info = DOC_INFO_1W {
            pDocName: PWSTR(doc_name_w.as_ptr() as *mut _),
            pOutputFile: PWSTR::null(),
            pDatatype: PWSTR(datatype_w.as_ptr() as *mut _),
        };

        let job_id = unsafe { StartDocPrinterW(handle, 1, &doc_info as *const DOC_INFO_1W) };
        if job_id == 0 {
            return Err(last_error("StartDocPrinterW"));
        }
        debug!(job_id, "Document started");
        Ok(())
    }

    fn start_page(&self, handle: PRINTER_HANDLE) -> PrintResult<()> {
        if !unsafe { StartPagePrinter(handle) }.as_bool() {
            return Err(last_error("StartPagePrinter"));
        }
        Ok(())
    }

    fn write(&self, handle: PRINTER_HANDLE, data: &[u8]) -> PrintResult<usize> {
        let len = u32::try_from(data.len()).map_err(|_| {
            PrintError::invalid(format!("{} bytes exceed a single spooler write", data.len()))
        })?;

        let mut written: u32 = 0;
        let ok = unsafe {
            WritePrinter(
                handle,
                data.as_ptr() as *const c_void,
                len,
                &mut written,
            )
        };

        if !ok.as_bool() {
            let code = unsafe { GetLastError() };
            return Err(PrintError::TransportWrite {
                written: written as usize,
                expected: data.len(),
                reason: format!("WritePrinter failed: Win32 error {}", code.0),
            });
        }
        Ok(written as usize)
    }

    fn end_page(&self, handle: PRINTER_HANDLE) -> PrintResult<()> {
        if !unsafe { EndPagePrinter(handle) }.as_bool() {
            return Err(last_error("EndPagePrinter"));
        }
        Ok(())
    }

    fn end_document(&self, handle: PRINTER_HANDLE) -> PrintResult<()> {
        if !unsafe { EndDocPrinter(handle) }.as_bool() {
            return Err(last_error("EndDocPrinter"));
        }
        Ok(())
    }

    fn close_printer(&self, handle: PRINTER_HANDLE) -> PrintResult<()> {
        unsafe { ClosePrinter(handle) }.map_err(|e| PrintError::Spooler {
            operation: "ClosePrinter",
            reason: e.to_string(),
        })
    }

    #[instrument(skip(self))]
    fn enumerate_printers(&self) -> PrintResult<Vec<String>> {
        let flags = PRINTER_ENUM_LOCAL | PRINTER_ENUM_CONNECTIONS;

        let fetched = query_then_fetch::<u8, _>(|buf, needed, returned| {
            let probing = buf.is_none();
            match unsafe { EnumPrintersW(flags, None, 4, buf, needed, returned) } {
                Ok(()) => Ok(()),
                // The size query answers "buffer too small" whenever printers exist
                Err(e) if probing && e.code() == ERROR_INSUFFICIENT_BUFFER.to_hresult() => {
                    Ok(())
                }
                Err(e) => Err(PrintError::Spooler {
                    operation: "EnumPrintersW",
                    reason: e.to_string(),
                }),
            }
        })?;

        let mut names = Vec::with_capacity(fetched.count as usize);
        let base = fetched.buf.as_ptr() as *const PRINTER_INFO_4W;
        for i in 0..fetched.count as usize {
            // The byte buffer carries no alignment guarantee
            let info = unsafe { std::ptr::read_unaligned(base.add(i)) };
            if info.pPrinterName.is_null() {
                continue;
            }
            let name = unsafe { info.pPrinterName.to_string() }.map_err(|e| {
                PrintError::Spooler {
                    operation: "EnumPrintersW",
                    reason: format!("UTF-16 decode failed: {}", e),
                }
            })?;
            names.push(name);
        }

        debug!(count = names.len(), "Printers enumerated");
        Ok(names)
    }

    fn default_printer(&self) -> PrintResult<Option<String>> {
        let fetched = query_then_fetch::<u16, _>(|buf, needed, _| {
            let probing = buf.is_none();
            let ptr = buf.map(|b| PWSTR(b.as_mut_ptr()));
            if unsafe { GetDefaultPrinterW(ptr, needed) }.as_bool() {
                return Ok(());
            }
            default_printer_failure(unsafe { GetLastError() }, probing, needed)
        })?;

        if fetched.buf.is_empty() {
            return Ok(None);
        }

        let end = fetched
            .buf
            .iter()
            .position(|&c| c == 0)
            .unwrap_or(fetched.buf.len());
        let name = String::from_utf16(&fetched.buf[..end]).map_err(|e| PrintError::Spooler {
            operation: "GetDefaultPrinterW",
            reason: format!("UTF-16 decode failed: {}", e),
        })?;
        Ok(Some(name))
    }
}
