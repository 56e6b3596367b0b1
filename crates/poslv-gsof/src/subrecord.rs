use poslv_frame::FramingError;
use tracing::trace;

/// Type byte plus length byte.
pub const SUBRECORD_HEADER_SIZE: usize = 2;

/// One type-length-value record borrowed from a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubRecord<'a> {
    pub record_type: u8,
    /// Bytes after the 2-byte header, exactly as long as declared.
    pub body: &'a [u8],
}

impl SubRecord<'_> {
    /// Bytes this record occupies in the payload.
    pub fn wire_size(&self) -> usize {
        SUBRECORD_HEADER_SIZE + self.body.len()
    }
}

/// Iterator over the sub-records of a GSOF payload.
///
/// Yields records in payload order. A record that claims more bytes than
/// remain yields [`FramingError::TruncatedSubRecord`] and ends iteration.
#[derive(Debug, Clone)]
pub struct SubRecords<'a> {
    remaining: &'a [u8],
    failed: bool,
}

impl<'a> SubRecords<'a> {
    pub fn new(payload: &'a [u8]) -> Self {
        Self {
            remaining: payload,
            failed: false,
        }
    }
}

impl<'a> Iterator for SubRecords<'a> {
    type Item = Result<SubRecord<'a>, FramingError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.remaining.is_empty() {
            return None;
        }

        let record_type = self.remaining[0];
        let declared = match self.remaining.get(1) {
            Some(len) => *len as usize,
            None => {
                self.failed = true;
                return Some(Err(FramingError::TruncatedSubRecord {
                    record_type,
                    declared: SUBRECORD_HEADER_SIZE,
                    available: self.remaining.len(),
                }));
            }
        };

        let available = self.remaining.len() - SUBRECORD_HEADER_SIZE;
        if available < declared {
            self.failed = true;
            return Some(Err(FramingError::TruncatedSubRecord {
                record_type,
                declared,
                available,
            }));
        }

        let (record, rest) = self.remaining.split_at(SUBRECORD_HEADER_SIZE + declared);
        self.remaining = rest;
        trace!(record_type, len = declared, "sub-record");
        Some(Ok(SubRecord {
            record_type,
            body: &record[SUBRECORD_HEADER_SIZE..],
        }))
    }
}

impl std::iter::FusedIterator for SubRecords<'_> {}

/// Split a whole payload, or reject it if any record is truncated.
///
/// Nothing from a malformed payload is returned.
pub fn split_payload(payload: &[u8]) -> Result<Vec<SubRecord<'_>>, FramingError> {
    SubRecords::new(payload).collect()
}
