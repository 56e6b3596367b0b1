//! GSOF (General Serial Output Format) payload decoding.
//!
//! A validated outer frame carries a payload made of self-length-prefixed
//! sub-records. [`SubRecords`] walks them and [`decode_record`] turns the
//! ones this crate understands into [`Measurement`]s:
//!
//! | type | record | output |
//! |------|--------|--------|
//! | `0x31` (49) | INS full navigation | [`InsSample`] |
//! | `0x32` (50) | INS RMS | [`InsRmsSample`] |
//! | `0x33` (51) | recognized, not decoded | [`RecordError::UnknownOrUnimplementedRecordType`] |

pub mod error;
pub mod ins;
pub mod ins_rms;
pub mod record;
pub mod subrecord;

pub use error::RecordError;
pub use ins::{InsSample, INS_BODY_LEN};
pub use ins_rms::{InsRmsSample, INS_RMS_BODY_LEN};
pub use record::{decode_record, InsStatus, Measurement, RecordType};
pub use subrecord::{split_payload, SubRecord, SubRecords, SUBRECORD_HEADER_SIZE};
