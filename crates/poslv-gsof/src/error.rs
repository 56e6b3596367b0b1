use crate::record::RecordType;

/// Errors decoding a single GSOF sub-record.
///
/// Local to the sub-record: siblings in the same payload still decode.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecordError {
    /// No decoder exists for this record type.
    #[error("unknown or unimplemented GSOF record type 0x{record_type:02x} ({record_type})")]
    UnknownOrUnimplementedRecordType { record_type: u8 },

    /// The body is shorter than the record's fixed layout.
    #[error("GSOF record {record_type} too short ({actual} bytes, need {expected})")]
    RecordTooShort {
        record_type: u8,
        expected: usize,
        actual: usize,
    },
}

impl RecordError {
    /// True for a record type this crate recognizes but does not decode.
    ///
    /// Such records are a normal part of the stream, unlike unknown types.
    pub fn is_unimplemented(&self) -> bool {
        matches!(
            self,
            Self::UnknownOrUnimplementedRecordType { record_type }
                if RecordType::from_byte(*record_type).is_recognized()
        )
    }
}

pub type Result<T> = std::result::Result<T, RecordError>;
