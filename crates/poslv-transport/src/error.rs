/// Errors that can occur opening or using the telemetry stream.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The address did not resolve to any socket address.
    #[error("failed to resolve {address}: {source}")]
    Resolve {
        address: String,
        source: std::io::Error,
    },

    /// Failed to connect to the unit.
    #[error("failed to connect to {address}: {source}")]
    Connect {
        address: String,
        source: std::io::Error,
    },

    /// An I/O error occurred on the stream.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TransportError>;
