//! `tokio_util` codec over the same reassembly rules as [`FrameReader`](crate::FrameReader).

use bytes::BytesMut;
use tokio_util::codec::Decoder;

use crate::assembler::{enforce_bound, take_frame, AssemblerConfig, AssemblerStats};
use crate::codec::OuterFrame;
use crate::error::{FrameError, FramingError};

/// Decodes GSOF outer frames for `FramedRead`.
///
/// Validation failures are yielded as `Ok(Some(Err(..)))` items so one bad
/// frame never terminates the stream; only I/O errors do.
#[derive(Debug, Default)]
pub struct GsofFrameCodec {
    config: AssemblerConfig,
    stats: AssemblerStats,
}

impl GsofFrameCodec {
    /// Create a codec with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a codec with explicit reassembly configuration.
    pub fn with_config(config: AssemblerConfig) -> Self {
        Self {
            config,
            stats: AssemblerStats::default(),
        }
    }

    /// Reassembly counters so far.
    pub fn stats(&self) -> AssemblerStats {
        self.stats
    }
}

impl Decoder for GsofFrameCodec {
    type Item = Result<OuterFrame, FramingError>;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        enforce_bound(src, self.config.effective_max(), &mut self.stats);
        Ok(take_frame(src, &mut self.stats))
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.decode(src)? {
            Some(item) => Ok(Some(item)),
            None => {
                if !src.is_empty() {
                    tracing::debug!(remaining = src.len(), "dropping partial frame at EOF");
                    src.clear();
                }
                Ok(None)
            }
        }
    }
}
