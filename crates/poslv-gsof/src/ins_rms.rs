//! GSOF 50: INS solution RMS.
//!
//! After the shared 8-byte status block the body holds nine big-endian f32s:
//! position RMS N/E/D at 8/12/16, velocity RMS N/E/D at 20/24/28 and
//! attitude RMS roll/pitch/heading at 32/36/40.

use std::time::SystemTime;

use bytes::{BufMut, BytesMut};
use poslv_frame::be::f32_at;
use serde::Serialize;

use crate::error::{RecordError, Result};
use crate::record::{InsStatus, RecordType};

/// Minimum body length of a GSOF 50 record.
pub const INS_RMS_BODY_LEN: usize = 44;

/// Solution uncertainty from GSOF record 50.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InsRmsSample {
    pub status: InsStatus,
    pub north_position_rms: f32,
    pub east_position_rms: f32,
    pub down_position_rms: f32,
    pub north_velocity_rms: f32,
    pub east_velocity_rms: f32,
    pub down_velocity_rms: f32,
    pub roll_rms: f32,
    pub pitch_rms: f32,
    pub heading_rms: f32,
    /// Host time at which the record was decoded.
    pub captured_at: SystemTime,
}

impl InsRmsSample {
    /// Decode a record body. Bytes past the fixed layout are ignored.
    pub fn decode(body: &[u8], captured_at: SystemTime) -> Result<Self> {
        Self::parse(body, captured_at).ok_or(RecordError::RecordTooShort {
            record_type: RecordType::INS_RMS,
            expected: INS_RMS_BODY_LEN,
            actual: body.len(),
        })
    }

    fn parse(body: &[u8], captured_at: SystemTime) -> Option<Self> {
        Some(Self {
            status: InsStatus::parse(body)?,
            north_position_rms: f32_at(body, 8)?,
            east_position_rms: f32_at(body, 12)?,
            down_position_rms: f32_at(body, 16)?,
            north_velocity_rms: f32_at(body, 20)?,
            east_velocity_rms: f32_at(body, 24)?,
            down_velocity_rms: f32_at(body, 28)?,
            roll_rms: f32_at(body, 32)?,
            pitch_rms: f32_at(body, 36)?,
            heading_rms: f32_at(body, 40)?,
            captured_at,
        })
    }

    /// Append this sample as a complete sub-record (header and body).
    pub fn encode_record(&self, dst: &mut BytesMut) {
        dst.reserve(2 + INS_RMS_BODY_LEN);
        dst.put_u8(RecordType::INS_RMS);
        dst.put_u8(INS_RMS_BODY_LEN as u8);
        self.status.put(dst);
        for value in [
            self.north_position_rms,
            self.east_position_rms,
            self.down_position_rms,
            self.north_velocity_rms,
            self.east_velocity_rms,
            self.down_velocity_rms,
            self.roll_rms,
            self.pitch_rms,
            self.heading_rms,
        ] {
            dst.put_f32(value);
        }
    }
}
