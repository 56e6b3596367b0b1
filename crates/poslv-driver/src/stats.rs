use poslv_frame::{AssemblerStats, FramingError};
use poslv_gsof::RecordError;
use serde::Serialize;

/// Counters for one pipeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PipelineStats {
    /// Frames that passed validation.
    pub frames_accepted: u64,
    /// Frames dropped, by reason.
    pub bad_start: u64,
    pub unsupported_packet_type: u64,
    pub multi_page: u64,
    pub checksum_mismatch: u64,
    pub bad_end: u64,
    pub length_mismatch: u64,
    /// Payloads discarded because a sub-record overran them.
    pub truncated_payloads: u64,
    pub ins_samples: u64,
    pub ins_rms_samples: u64,
    /// Records of a recognized type with no decoder (type 51).
    pub unimplemented_records: u64,
    pub unknown_records: u64,
    pub short_records: u64,
    /// Bytes skipped by reassembly while hunting for a start marker.
    pub discarded_bytes: u64,
    /// Times the reassembly buffer hit its bound.
    pub buffer_overflows: u64,
}

impl PipelineStats {
    /// Frames that failed outer validation.
    pub fn frames_rejected(&self) -> u64 {
        self.bad_start
            + self.unsupported_packet_type
            + self.multi_page
            + self.checksum_mismatch
            + self.bad_end
            + self.length_mismatch
    }

    /// Samples handed to sinks.
    pub fn samples_published(&self) -> u64 {
        self.ins_samples + self.ins_rms_samples
    }

    pub(crate) fn count_framing(&mut self, err: &FramingError) {
        let counter = match err {
            FramingError::BadStart { .. } => &mut self.bad_start,
            FramingError::UnsupportedPacketType { .. } => &mut self.unsupported_packet_type,
            FramingError::MultiPageUnsupported { .. } => &mut self.multi_page,
            FramingError::ChecksumMismatch { .. } => &mut self.checksum_mismatch,
            FramingError::BadEnd { .. } => &mut self.bad_end,
            FramingError::TruncatedSubRecord { .. } => &mut self.truncated_payloads,
            FramingError::LengthMismatch { .. } | FramingError::PayloadTooLarge { .. } => {
                &mut self.length_mismatch
            }
        };
        *counter += 1;
    }

    pub(crate) fn count_record(&mut self, err: &RecordError) {
        match err {
            RecordError::UnknownOrUnimplementedRecordType { .. } if err.is_unimplemented() => {
                self.unimplemented_records += 1;
            }
            RecordError::UnknownOrUnimplementedRecordType { .. } => self.unknown_records += 1,
            RecordError::RecordTooShort { .. } => self.short_records += 1,
        }
    }

    pub(crate) fn absorb_reassembly(&mut self, stats: AssemblerStats) {
        self.discarded_bytes = stats.discarded_bytes;
        self.buffer_overflows = stats.overflows;
    }
}
