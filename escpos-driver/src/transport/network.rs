//! Network printer transport (raw TCP, port 9100)

use super::Transport;
use super::stream::write_all_counted;
use crate::error::{PrintError, PrintResult};
use std::io::{ErrorKind, Write};
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Raw printing port most thermal printers listen on
pub const DEFAULT_PORT: u16 = 9100;

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Where to dial a network printer
///
/// The timeout only bounds connection setup; writes block until the
/// printer accepts the data.
#[derive(Debug, Clone)]
pub struct NetworkTarget {
    addr: SocketAddr,
    timeout: Duration,
}

impl NetworkTarget {
    /// Resolve `host:port`
    pub fn new(host: &str, port: u16) -> PrintResult<Self> {
        let addr = (host, port)
            .to_socket_addrs()
            .map_err(|e| {
                PrintError::InvalidConfig(format!("Invalid address {}:{}: {}", host, port, e))
            })?
            .next()
            .ok_or_else(|| {
                PrintError::InvalidConfig(format!("No address for {}:{}", host, port))
            })?;

        Ok(Self {
            addr,
            timeout: DEFAULT_CONNECT_TIMEOUT,
        })
    }

    /// Create from a socket address string (e.g., "192.168.1.100:9100")
    pub fn from_addr(addr: &str) -> PrintResult<Self> {
        let addr: SocketAddr = addr
            .parse()
            .map_err(|_| PrintError::InvalidConfig(format!("Invalid address: {}", addr)))?;

        Ok(Self {
            addr,
            timeout: DEFAULT_CONNECT_TIMEOUT,
        })
    }

    /// Set connection timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Get the printer address
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Open the TCP connection
    #[instrument(fields(addr = %self.addr))]
    pub fn connect(&self) -> PrintResult<NetworkTransport> {
        info!("Connecting to printer");

        let stream = TcpStream::connect_timeout(&self.addr, self.timeout).map_err(|e| {
            if e.kind() == ErrorKind::TimedOut {
                PrintError::Timeout(format!("Connection timeout: {}", self.addr))
            } else {
                PrintError::Connection(format!("{}: {}", self.addr, e))
            }
        })?;
        // Receipts are small bursts; don't let Nagle hold back the tail
        stream.set_nodelay(true)?;

        info!("Connected");
        Ok(NetworkTransport {
            addr: self.addr,
            stream: Some(stream),
        })
    }

    /// Check if the printer accepts connections
    #[instrument(fields(addr = %self.addr))]
    pub fn is_online(&self) -> bool {
        let check_timeout = Duration::from_millis(500);

        match TcpStream::connect_timeout(&self.addr, check_timeout) {
            Ok(_) => {
                info!("Printer online");
                true
            }
            Err(e) if e.kind() == ErrorKind::TimedOut => {
                warn!("Printer check timeout");
                false
            }
            Err(e) => {
                warn!(error = %e, "Printer offline");
                false
            }
        }
    }
}

/// Connected network printer
pub struct NetworkTransport {
    addr: SocketAddr,
    stream: Option<TcpStream>,
}

impl NetworkTransport {
    /// Connect with default settings
    pub fn connect(host: &str, port: u16) -> PrintResult<Self> {
        NetworkTarget::new(host, port)?.connect()
    }

    /// Get the printer address
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }
}

impl Transport for NetworkTransport {
    fn write(&mut self, data: &[u8]) -> PrintResult<()> {
        let stream = self.stream.as_mut().ok_or_else(|| PrintError::ProtocolState {
            operation: "write",
            state: "Closed".to_string(),
        })?;
        debug!(addr = %self.addr, data_len = data.len(), "Sending");
        write_all_counted(stream, data)
    }

    #[instrument(skip(self), fields(addr = %self.addr))]
    fn close(&mut self) -> PrintResult<()> {
        let Some(mut stream) = self.stream.take() else {
            return Ok(());
        };
        stream.flush()?;
        match stream.shutdown(Shutdown::Both) {
            // Peer already hung up
            Err(e) if e.kind() == ErrorKind::NotConnected => {}
            Err(e) => {
                return Err(PrintError::Teardown {
                    step: "shutdown",
                    reason: e.to_string(),
                });
            }
            Ok(()) => {}
        }
        info!("Connection closed");
        Ok(())
    }
}
