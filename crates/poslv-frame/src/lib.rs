//! GSOF transport framing for the POS LV telemetry stream.
//!
//! The unit wraps every GSOF payload in a small checksummed envelope:
//! - `0x02` start marker, status, packet type (`0x40`) and a 1-byte length
//! - transmission number and page indices
//! - the GSOF payload
//! - an 8-bit additive checksum and the `0x03` end marker
//!
//! A TCP read has no relationship to frame boundaries, so bytes go through a
//! [`StreamAssembler`], which delimits frames and validates them with
//! [`parse_frame`]'s rules.

pub mod assembler;
pub mod be;
pub mod codec;
pub mod error;
pub mod reader;

#[cfg(feature = "async")]
pub mod async_codec;

pub use assembler::{AssemblerConfig, AssemblerStats, StreamAssembler, DEFAULT_MAX_BUFFERED};
pub use codec::{
    checksum, encode_frame, parse_frame, FrameHeader, OuterFrame, END_MARKER, GSOF_PACKET_TYPE,
    HEADER_SIZE, MAX_FRAME_SIZE, MAX_PAYLOAD, START_MARKER, TRAILER_SIZE,
};
pub use error::{FrameError, FramingError, Result};
pub use reader::{FrameConfig, FrameReader, DEFAULT_READ_CHUNK};

#[cfg(feature = "async")]
pub use async_codec::GsofFrameCodec;
