use std::io::Read;
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::shutdown::{Registration, ShutdownSignal};

/// Factory address of the unit's GSOF data port.
pub const DEFAULT_ADDRESS: &str = "192.168.53.100:5017";

/// A connected, receive-only telemetry stream.
pub struct TelemetryStream {
    inner: TcpStream,
    peer: SocketAddr,
    registration: Option<Registration>,
}

impl Read for TelemetryStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.inner.read(buf)
    }
}

impl TelemetryStream {
    fn new(inner: TcpStream, peer: SocketAddr) -> Self {
        Self {
            inner,
            peer,
            registration: None,
        }
    }

    /// Register with `signal` for as long as this stream lives.
    pub fn register_shutdown(&mut self, signal: &ShutdownSignal) -> Result<()> {
        self.registration = Some(signal.register(self)?);
        Ok(())
    }

    /// Set read timeout on the underlying socket.
    pub fn set_read_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        self.inner.set_read_timeout(timeout).map_err(Into::into)
    }

    /// Address of the unit this stream is connected to.
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    /// Try to clone this stream (creates a new file descriptor). The clone
    /// is not registered with any shutdown signal.
    pub fn try_clone(&self) -> Result<Self> {
        Ok(Self::new(self.inner.try_clone()?, self.peer))
    }

    /// Close both directions; a blocked `read` on any clone returns.
    pub fn shutdown(&self) -> Result<()> {
        match self.inner.shutdown(Shutdown::Both) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotConnected => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

impl std::fmt::Debug for TelemetryStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelemetryStream")
            .field("peer", &self.peer)
            .field("registered", &self.registration.is_some())
            .finish()
    }
}

/// Opens TCP connections to the unit.
pub struct TcpTransport;

impl TcpTransport {
    /// Connect to `address` (`host:port`), trying each resolved address in turn.
    ///
    /// With `timeout`, each attempt is bounded; otherwise the OS default applies.
    pub fn connect(address: &str, timeout: Option<Duration>) -> Result<TelemetryStream> {
        let candidates = resolve(address)?;

        let mut last_err = None;
        for addr in candidates {
            let attempt = match timeout {
                Some(timeout) => TcpStream::connect_timeout(&addr, timeout),
                None => TcpStream::connect(addr),
            };
            match attempt {
                Ok(stream) => {
                    info!(%addr, "connected to telemetry port");
                    return Ok(TelemetryStream::new(stream, addr));
                }
                Err(err) => {
                    debug!(%addr, error = %err, "connect attempt failed");
                    last_err = Some(err);
                }
            }
        }

        Err(TransportError::Connect {
            address: address.to_string(),
            source: last_err.unwrap_or_else(|| {
                std::io::Error::new(std::io::ErrorKind::NotFound, "no addresses resolved")
            }),
        })
    }

    /// Transport name for diagnostics.
    pub fn transport_name() -> &'static str {
        "tcp"
    }
}

fn resolve(address: &str) -> Result<Vec<SocketAddr>> {
    let addrs: Vec<SocketAddr> = address
        .to_socket_addrs()
        .map_err(|source| TransportError::Resolve {
            address: address.to_string(),
            source,
        })?
        .collect();

    if addrs.is_empty() {
        return Err(TransportError::Resolve {
            address: address.to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no addresses resolved"),
        });
    }
    Ok(addrs)
}

/// Connect with tokio, bounded by `timeout` when given.
#[cfg(feature = "async")]
pub async fn connect_async(
    address: &str,
    timeout: Option<Duration>,
) -> Result<tokio::net::TcpStream> {
    let connect = tokio::net::TcpStream::connect(address);
    let result = match timeout {
        Some(timeout) => match tokio::time::timeout(timeout, connect).await {
            Ok(result) => result,
            Err(_) => Err(std::io::Error::new(
                std::io::ErrorKind::TimedOut,
                "connect timed out",
            )),
        },
        None => connect.await,
    };

    let stream = result.map_err(|source| TransportError::Connect {
        address: address.to_string(),
        source,
    })?;
    info!(address, "connected to telemetry port");
    Ok(stream)
}
