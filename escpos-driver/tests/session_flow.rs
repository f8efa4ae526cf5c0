//! End-to-end print flows through the public API

use escpos_driver::{
    HriPosition, JobOptions, JobState, Justify, PrintError, PrintResult, PrinterSession,
    SpoolerApi, SpoolerTransport, StreamTransport, Symbology, Transport,
};
use std::cell::RefCell;
use std::rc::Rc;

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("escpos_driver=debug")
        .with_test_writer()
        .try_init();
}

/// Spooler with one printer that logs every call by name
#[derive(Clone, Default)]
struct LoggingSpooler {
    log: Rc<RefCell<Vec<String>>>,
}

impl LoggingSpooler {
    fn push(&self, entry: impl Into<String>) {
        self.log.borrow_mut().push(entry.into());
    }
}

impl SpoolerApi for LoggingSpooler {
    type Handle = usize;

    fn open_printer(&self, name: &str) -> PrintResult<usize> {
        self.push(format!("open:{}", name));
        Ok(1)
    }

    fn start_document(&self, _: usize, options: &JobOptions) -> PrintResult<()> {
        self.push(format!("start_document:{}", options.datatype));
        Ok(())
    }

    fn start_page(&self, _: usize) -> PrintResult<()> {
        self.push("start_page");
        Ok(())
    }

    fn write(&self, _: usize, data: &[u8]) -> PrintResult<usize> {
        self.push(format!("write:{}", data.len()));
        Ok(data.len())
    }

    fn end_page(&self, _: usize) -> PrintResult<()> {
        self.push("end_page");
        Ok(())
    }

    fn end_document(&self, _: usize) -> PrintResult<()> {
        self.push("end_document");
        Ok(())
    }

    fn close_printer(&self, _: usize) -> PrintResult<()> {
        self.push("release_handle");
        Ok(())
    }

    fn enumerate_printers(&self) -> PrintResult<Vec<String>> {
        Ok(vec!["Receipt Printer".to_string()])
    }
}

#[test]
fn barcode_receipt_over_stream() {
    init_logging();
    let mut printer = PrinterSession::new(StreamTransport::new(Vec::new()));

    printer.initialize().unwrap();
    printer.justify(Justify::Center).unwrap();
    printer.set_hri_position(HriPosition::Below).unwrap();
    printer.set_barcode_height(50).unwrap();
    printer.print_barcode(Symbology::Code39, "TEST123").unwrap();
    printer.print_barcode(Symbology::Code128, "ABC123").unwrap();
    printer.feed_lines(3).unwrap();
    printer.cut().unwrap();

    let bytes = printer.transport().get_ref().unwrap().clone();
    let mut expected = vec![0x1B, 0x40, 0x1B, 0x61, 1, 0x1D, 0x48, 2, 0x1D, 0x68, 50];
    expected.extend_from_slice(&[0x1D, 0x6B, 4]);
    expected.extend_from_slice(b"TEST123\0");
    expected.extend_from_slice(&[0x1D, 0x6B, 73, 8]);
    expected.extend_from_slice(b"{BABC123");
    expected.extend_from_slice(&[0x1B, 0x64, 3, 0x1D, 0x56, 0]);
    assert_eq!(bytes, expected);

    printer.close().unwrap();
    printer.close().unwrap();
}

#[test]
fn session_over_spooler_job() {
    init_logging();
    let api = LoggingSpooler::default();
    let log = Rc::clone(&api.log);

    let job = SpoolerTransport::open_job(api, "Receipt Printer", JobOptions::default()).unwrap();
    assert_eq!(job.state(), JobState::PageStarted);

    let mut printer = PrinterSession::new(job);
    printer.initialize().unwrap();
    printer.println("Thank you!").unwrap();
    printer.close().unwrap();
    assert_eq!(printer.transport().state(), JobState::Closed);

    printer.close().unwrap();
    assert_eq!(
        *log.borrow(),
        vec![
            "open:Receipt Printer",
            "start_document:RAW",
            "start_page",
            "write:2",
            "write:11",
            "end_page",
            "end_document",
            "release_handle",
        ]
    );
}

#[test]
fn spooler_rejects_unknown_printer() {
    let result = SpoolerTransport::open_job(
        LoggingSpooler::default(),
        "receipt printer",
        JobOptions::default(),
    );
    assert!(matches!(result, Err(PrintError::NotFound(_))));
}

#[test]
fn boxed_transport_backs_a_session() {
    let transport: Box<dyn Transport> = Box::new(StreamTransport::new(Vec::new()));
    let mut printer = PrinterSession::new(transport);
    printer.set_bold(true).unwrap();
    assert!(matches!(
        printer.beep(0, 5),
        Err(PrintError::InvalidArgument(_))
    ));
    printer.close().unwrap();
    assert!(printer.set_bold(false).is_err());
}
