/// Frame-local protocol violations.
///
/// None of these are fatal to the stream: the offending frame (or payload)
/// is dropped and decoding resumes at the next delimited frame.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FramingError {
    /// The first byte is not the `0x02` start marker.
    #[error("invalid start marker 0x{found:02x} (expected 0x02)")]
    BadStart { found: u8 },

    /// The packet type is not GSOF (`0x40`).
    #[error("unsupported packet type 0x{found:02x} (expected 0x40)")]
    UnsupportedPacketType { found: u8 },

    /// The frame is one page of a multi-page transmission.
    #[error("multi-page transmission not supported (page {page_index}/{max_page_index})")]
    MultiPageUnsupported { page_index: u8, max_page_index: u8 },

    /// The trailing checksum does not match the frame contents.
    #[error("checksum mismatch (computed 0x{computed:02x}, received 0x{received:02x})")]
    ChecksumMismatch { computed: u8, received: u8 },

    /// The last byte is not the `0x03` end marker.
    #[error("invalid end marker 0x{found:02x} (expected 0x03)")]
    BadEnd { found: u8 },

    /// A sub-record declares more bytes than remain in the payload.
    #[error("truncated sub-record 0x{record_type:02x} ({declared} bytes declared, {available} available)")]
    TruncatedSubRecord {
        record_type: u8,
        declared: usize,
        available: usize,
    },

    /// The byte count does not agree with the frame's length field.
    #[error("frame length mismatch (header implies {expected} bytes, got {actual})")]
    LengthMismatch { expected: usize, actual: usize },

    /// The payload does not fit in a single frame.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },
}

/// Errors surfaced while reading frames from a byte stream.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// A delimited frame failed validation. Recoverable.
    #[error("framing error: {0}")]
    Framing(#[from] FramingError),

    /// An I/O error occurred while reading the stream.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream reached EOF.
    #[error("connection closed")]
    ConnectionClosed,
}

impl FrameError {
    /// Whether reading can continue after this error.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, FrameError::Framing(_))
    }
}

pub type Result<T> = std::result::Result<T, FrameError>;
