//! Decoder for the Applanix POS LV GSOF telemetry stream.
//!
//! The unit pushes INS solutions over TCP as checksummed GSOF frames. This
//! crate re-exports the layers that turn that byte stream into samples.
//!
//! # Crate Structure
//!
//! - [`frame`]: outer frame validation and stream reassembly
//! - [`gsof`]: sub-record walking and INS / INS-RMS decoding
//! - [`transport`]: TCP connection and cooperative shutdown
//! - [`driver`]: the stream-to-sample pipeline and its sinks

/// Re-export frame types.
pub mod frame {
    pub use poslv_frame::*;
}

/// Re-export GSOF record types.
pub mod gsof {
    pub use poslv_gsof::*;
}

/// Re-export transport types.
pub mod transport {
    pub use poslv_transport::*;
}

/// Re-export pipeline types.
pub mod driver {
    pub use poslv_driver::*;
}
