use std::time::Duration;

use poslv_frame::FrameConfig;
use poslv_transport::DEFAULT_ADDRESS;

/// Default connect timeout.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Connection and reading settings for a pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverConfig {
    /// `host:port` of the unit's GSOF data port.
    pub address: String,
    /// Bound on each connect attempt.
    pub connect_timeout: Option<Duration>,
    /// Idle time after which a silent stream counts as failed. `None` waits forever.
    pub read_timeout: Option<Duration>,
    /// Read size and reassembly bounds.
    pub frame: FrameConfig,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS.to_string(),
            connect_timeout: Some(DEFAULT_CONNECT_TIMEOUT),
            read_timeout: None,
            frame: FrameConfig::default(),
        }
    }
}

impl DriverConfig {
    /// Default settings for a specific address.
    pub fn for_address(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            ..Self::default()
        }
    }
}
