use poslv_frame::FrameError;

/// Errors that end a pipeline run.
///
/// Frame- and record-level problems never surface here; they are counted in
/// [`PipelineStats`](crate::PipelineStats) and skipped.
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    /// Transport-level error (connect, socket options).
    #[error("transport error: {0}")]
    Transport(#[from] poslv_transport::TransportError),

    /// The byte stream failed or closed.
    #[error("stream error: {0}")]
    Frame(#[from] FrameError),

    /// A sink stopped accepting samples.
    #[error("{channel} sink closed")]
    SinkClosed { channel: &'static str },
}

impl DriverError {
    /// Whether the run ended because the source reached EOF.
    pub fn is_end_of_stream(&self) -> bool {
        matches!(self, DriverError::Frame(FrameError::ConnectionClosed))
    }
}

pub type Result<T> = std::result::Result<T, DriverError>;
