//! TCP transport for the POS LV data port.
//!
//! This is the lowest layer: it only knows how to open a connected byte
//! stream and how to abandon a blocking read on shutdown. Framing lives in
//! `poslv-frame`.

pub mod error;
pub mod shutdown;
pub mod tcp;

pub use error::{Result, TransportError};
pub use shutdown::{Registration, ShutdownSignal};
pub use tcp::{TcpTransport, TelemetryStream, DEFAULT_ADDRESS};

#[cfg(feature = "async")]
pub use tcp::connect_async;
