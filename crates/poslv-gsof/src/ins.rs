//! GSOF 49: INS full navigation information.
//!
//! Body layout (offsets after the 2-byte sub-record header, big-endian):
//!
//! | offset | field | type |
//! |-------:|-------|------|
//! | 0 | GPS week | u16 |
//! | 2 | GPS time of week (ms) | u32 |
//! | 6 | IMU alignment status | u8 |
//! | 7 | GNSS status | u8 |
//! | 8 / 16 / 24 | latitude / longitude / altitude | f64 |
//! | 32 / 36 / 40 / 44 | north / east / down velocity, total speed | f32 |
//! | 48 / 56 / 64 / 72 | roll / pitch / heading / track angle | f64 |
//! | 80 / 84 / 88 | angular rate x / y / z | f32 |
//! | 92 / 96 / 100 | acceleration x / y / z | f32 |

use std::time::SystemTime;

use bytes::{BufMut, BytesMut};
use poslv_frame::be::{f32_at, f64_at};
use serde::Serialize;

use crate::error::{RecordError, Result};
use crate::record::{InsStatus, RecordType};

/// Minimum body length of a GSOF 49 record.
pub const INS_BODY_LEN: usize = 104;

/// Navigation solution from GSOF record 49.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InsSample {
    pub status: InsStatus,
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
    pub north_velocity: f32,
    pub east_velocity: f32,
    pub down_velocity: f32,
    pub total_speed: f32,
    pub roll: f64,
    pub pitch: f64,
    pub heading: f64,
    pub track_angle: f64,
    pub angular_rate_x: f32,
    pub angular_rate_y: f32,
    pub angular_rate_z: f32,
    pub acceleration_x: f32,
    pub acceleration_y: f32,
    pub acceleration_z: f32,
    /// Host time at which the record was decoded.
    pub captured_at: SystemTime,
}

impl InsSample {
    /// Decode a record body. Bytes past the fixed layout are ignored.
    pub fn decode(body: &[u8], captured_at: SystemTime) -> Result<Self> {
        Self::parse(body, captured_at).ok_or(RecordError::RecordTooShort {
            record_type: RecordType::INS,
            expected: INS_BODY_LEN,
            actual: body.len(),
        })
    }

    fn parse(body: &[u8], captured_at: SystemTime) -> Option<Self> {
        Some(Self {
            status: InsStatus::parse(body)?,
            latitude: f64_at(body, 8)?,
            longitude: f64_at(body, 16)?,
            altitude: f64_at(body, 24)?,
            north_velocity: f32_at(body, 32)?,
            east_velocity: f32_at(body, 36)?,
            down_velocity: f32_at(body, 40)?,
            total_speed: f32_at(body, 44)?,
            roll: f64_at(body, 48)?,
            pitch: f64_at(body, 56)?,
            heading: f64_at(body, 64)?,
            track_angle: f64_at(body, 72)?,
            angular_rate_x: f32_at(body, 80)?,
            angular_rate_y: f32_at(body, 84)?,
            angular_rate_z: f32_at(body, 88)?,
            acceleration_x: f32_at(body, 92)?,
            acceleration_y: f32_at(body, 96)?,
            acceleration_z: f32_at(body, 100)?,
            captured_at,
        })
    }

    /// Append this sample as a complete sub-record (header and body).
    pub fn encode_record(&self, dst: &mut BytesMut) {
        dst.reserve(2 + INS_BODY_LEN);
        dst.put_u8(RecordType::INS);
        dst.put_u8(INS_BODY_LEN as u8);
        self.status.put(dst);
        dst.put_f64(self.latitude);
        dst.put_f64(self.longitude);
        dst.put_f64(self.altitude);
        dst.put_f32(self.north_velocity);
        dst.put_f32(self.east_velocity);
        dst.put_f32(self.down_velocity);
        dst.put_f32(self.total_speed);
        dst.put_f64(self.roll);
        dst.put_f64(self.pitch);
        dst.put_f64(self.heading);
        dst.put_f64(self.track_angle);
        dst.put_f32(self.angular_rate_x);
        dst.put_f32(self.angular_rate_y);
        dst.put_f32(self.angular_rate_z);
        dst.put_f32(self.acceleration_x);
        dst.put_f32(self.acceleration_y);
        dst.put_f32(self.acceleration_z);
    }
}
