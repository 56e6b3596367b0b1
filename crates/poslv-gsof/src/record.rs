use std::time::SystemTime;

use bytes::{BufMut, BytesMut};
use poslv_frame::be::{u16_at, u32_at, u8_at};
use serde::Serialize;

use crate::error::{RecordError, Result};
use crate::ins::InsSample;
use crate::ins_rms::InsRmsSample;
use crate::subrecord::SubRecord;

/// GSOF record types seen on the INS output stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordType {
    /// 0x31: full INS navigation solution.
    Ins,
    /// 0x32: INS solution RMS.
    InsRms,
    /// 0x33: configured on the unit but its layout is not decoded.
    Type51,
    /// Anything else.
    Unknown(u8),
}

impl RecordType {
    pub const INS: u8 = 0x31;
    pub const INS_RMS: u8 = 0x32;
    pub const TYPE_51: u8 = 0x33;

    pub fn from_byte(byte: u8) -> Self {
        match byte {
            Self::INS => RecordType::Ins,
            Self::INS_RMS => RecordType::InsRms,
            Self::TYPE_51 => RecordType::Type51,
            other => RecordType::Unknown(other),
        }
    }

    pub fn as_byte(self) -> u8 {
        match self {
            RecordType::Ins => Self::INS,
            RecordType::InsRms => Self::INS_RMS,
            RecordType::Type51 => Self::TYPE_51,
            RecordType::Unknown(byte) => byte,
        }
    }

    /// Whether the record type is known to appear on this stream.
    pub fn is_recognized(self) -> bool {
        !matches!(self, RecordType::Unknown(_))
    }
}

impl From<u8> for RecordType {
    fn from(byte: u8) -> Self {
        Self::from_byte(byte)
    }
}

/// Time and status block shared by the INS records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct InsStatus {
    pub gps_week: u16,
    /// GPS time of week, milliseconds.
    pub gps_time_ms: u32,
    pub imu_alignment_status: u8,
    pub gnss_status: u8,
}

impl InsStatus {
    /// Encoded size at the start of every INS record body.
    pub const SIZE: usize = 8;

    pub(crate) fn parse(body: &[u8]) -> Option<Self> {
        Some(Self {
            gps_week: u16_at(body, 0)?,
            gps_time_ms: u32_at(body, 2)?,
            imu_alignment_status: u8_at(body, 6)?,
            gnss_status: u8_at(body, 7)?,
        })
    }

    pub(crate) fn put(&self, dst: &mut BytesMut) {
        dst.put_u16(self.gps_week);
        dst.put_u32(self.gps_time_ms);
        dst.put_u8(self.imu_alignment_status);
        dst.put_u8(self.gnss_status);
    }
}

/// A decoded measurement, tagged by record type.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "record", rename_all = "snake_case")]
pub enum Measurement {
    Ins(InsSample),
    InsRms(InsRmsSample),
}

impl Measurement {
    pub fn record_type(&self) -> RecordType {
        match self {
            Measurement::Ins(_) => RecordType::Ins,
            Measurement::InsRms(_) => RecordType::InsRms,
        }
    }

    pub fn status(&self) -> &InsStatus {
        match self {
            Measurement::Ins(sample) => &sample.status,
            Measurement::InsRms(sample) => &sample.status,
        }
    }

    pub fn captured_at(&self) -> SystemTime {
        match self {
            Measurement::Ins(sample) => sample.captured_at,
            Measurement::InsRms(sample) => sample.captured_at,
        }
    }
}

/// Decode one sub-record, stamping it with `captured_at`.
pub fn decode_record(record: &SubRecord<'_>, captured_at: SystemTime) -> Result<Measurement> {
    match RecordType::from_byte(record.record_type) {
        RecordType::Ins => InsSample::decode(record.body, captured_at).map(Measurement::Ins),
        RecordType::InsRms => {
            InsRmsSample::decode(record.body, captured_at).map(Measurement::InsRms)
        }
        RecordType::Type51 | RecordType::Unknown(_) => {
            Err(RecordError::UnknownOrUnimplementedRecordType {
                record_type: record.record_type,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, UNIX_EPOCH};

    use super::*;
    use crate::subrecord::SubRecords;

    fn at() -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(1_700_000_000)
    }

    #[test]
    fn record_type_byte_mapping() {
        assert_eq!(RecordType::from_byte(0x31), RecordType::Ins);
        assert_eq!(RecordType::from_byte(0x32), RecordType::InsRms);
        assert_eq!(RecordType::from_byte(0x33), RecordType::Type51);
        assert_eq!(RecordType::from_byte(0x01), RecordType::Unknown(0x01));
        for byte in [0x31, 0x32, 0x33, 0x01, 0xFF] {
            assert_eq!(RecordType::from(byte).as_byte(), byte);
        }
        assert!(RecordType::Type51.is_recognized());
        assert!(!RecordType::Unknown(9).is_recognized());
    }

    #[test]
    fn type_51_is_unimplemented() {
        let record = SubRecord {
            record_type: 0x33,
            body: &[0u8; 16],
        };
        assert_eq!(
            decode_record(&record, at()),
            Err(RecordError::UnknownOrUnimplementedRecordType { record_type: 0x33 })
        );
    }

    #[test]
    fn unknown_type_is_rejected() {
        let record = SubRecord {
            record_type: 0x01,
            body: &[],
        };
        assert_eq!(
            decode_record(&record, at()),
            Err(RecordError::UnknownOrUnimplementedRecordType { record_type: 0x01 })
        );
    }

    #[test]
    fn type_51_does_not_affect_neighbours() {
        let rms = InsRmsSample {
            status: InsStatus {
                gps_week: 2200,
                gps_time_ms: 10,
                imu_alignment_status: 1,
                gnss_status: 2,
            },
            north_position_rms: 0.1,
            east_position_rms: 0.2,
            down_position_rms: 0.3,
            north_velocity_rms: 0.01,
            east_velocity_rms: 0.02,
            down_velocity_rms: 0.03,
            roll_rms: 0.001,
            pitch_rms: 0.002,
            heading_rms: 0.003,
            captured_at: at(),
        };

        let mut payload = BytesMut::new();
        rms.encode_record(&mut payload);
        payload.put_slice(&[0x33, 0x03, 0x01, 0x02, 0x03]);
        rms.encode_record(&mut payload);

        let results: Vec<_> = SubRecords::new(&payload)
            .map(|r| decode_record(&r.unwrap(), at()))
            .collect();

        assert_eq!(results.len(), 3);
        assert_eq!(results[0], Ok(Measurement::InsRms(rms.clone())));
        assert_eq!(
            results[1],
            Err(RecordError::UnknownOrUnimplementedRecordType { record_type: 0x33 })
        );
        assert_eq!(results[2], Ok(Measurement::InsRms(rms)));
    }

    #[test]
    fn measurement_accessors() {
        let mut body = BytesMut::new();
        InsStatus {
            gps_week: 7,
            gps_time_ms: 8,
            imu_alignment_status: 9,
            gnss_status: 10,
        }
        .put(&mut body);
        body.put_slice(&[0u8; crate::INS_RMS_BODY_LEN - InsStatus::SIZE]);

        let record = SubRecord {
            record_type: 0x32,
            body: &body,
        };
        let measurement = decode_record(&record, at()).unwrap();
        assert_eq!(measurement.record_type(), RecordType::InsRms);
        assert_eq!(measurement.status().gps_week, 7);
        assert_eq!(measurement.status().gnss_status, 10);
        assert_eq!(measurement.captured_at(), at());
    }
}
