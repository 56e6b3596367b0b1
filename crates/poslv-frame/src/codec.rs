use bytes::{BufMut, Bytes, BytesMut};

use crate::error::FramingError;

/// Start-of-transmission marker.
pub const START_MARKER: u8 = 0x02;

/// End-of-transmission marker.
pub const END_MARKER: u8 = 0x03;

/// Packet type carrying a GSOF payload.
pub const GSOF_PACKET_TYPE: u8 = 0x40;

/// Start, status, type, length, transmission number, page index, max page index.
pub const HEADER_SIZE: usize = 7;

/// Checksum and end marker.
pub const TRAILER_SIZE: usize = 2;

/// Bytes preceding the region counted by the length field.
pub(crate) const LENGTH_PREFIX: usize = 4;

/// Offset of the packet type byte.
pub(crate) const PACKET_TYPE_OFFSET: usize = 2;

/// Offset of the length byte.
pub(crate) const LENGTH_OFFSET: usize = 3;

/// Transmission number and page indices, counted by the length field.
pub(crate) const COUNTED_HEADER: usize = HEADER_SIZE - LENGTH_PREFIX;

/// Largest payload a 1-byte length field can describe.
pub const MAX_PAYLOAD: usize = u8::MAX as usize - COUNTED_HEADER;

/// Largest frame on the wire.
pub const MAX_FRAME_SIZE: usize = LENGTH_PREFIX + u8::MAX as usize + TRAILER_SIZE;

/// Wire size of a frame whose length byte is `length`.
#[inline]
pub(crate) fn frame_size(length: u8) -> usize {
    LENGTH_PREFIX + length as usize + TRAILER_SIZE
}

/// A validated outer frame.
///
/// Wire format:
/// ```text
/// ┌──────┬────────┬──────┬────────┬─────┬──────┬──────────┬─────────┬──────────┬──────┐
/// │ 0x02 │ status │ 0x40 │ length │ txn │ page │ max page │ payload │ checksum │ 0x03 │
/// └──────┴────────┴──────┴────────┴─────┴──────┴──────────┴─────────┴──────────┴──────┘
///                                 └─────────── length ────────────┘
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OuterFrame {
    pub start_byte: u8,
    pub status: u8,
    pub packet_type: u8,
    pub length: u8,
    pub transmission_number: u8,
    pub page_index: u8,
    pub max_page_index: u8,
    /// Concatenated GSOF sub-records.
    pub payload: Bytes,
    pub checksum: u8,
    pub end_byte: u8,
}

impl OuterFrame {
    /// The total wire size of this frame.
    pub fn wire_size(&self) -> usize {
        frame_size(self.length)
    }
}

/// Header fields chosen by the sender when encoding a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub status: u8,
    pub packet_type: u8,
    pub transmission_number: u8,
    pub page_index: u8,
    pub max_page_index: u8,
}

impl Default for FrameHeader {
    fn default() -> Self {
        Self {
            status: 0,
            packet_type: GSOF_PACKET_TYPE,
            transmission_number: 0,
            page_index: 0,
            max_page_index: 0,
        }
    }
}

/// 8-bit additive checksum over the header bytes and `body`.
///
/// `body` runs from the transmission number through the last payload byte.
pub fn checksum(status: u8, packet_type: u8, length: u8, body: &[u8]) -> u8 {
    body.iter().fold(
        status.wrapping_add(packet_type).wrapping_add(length),
        |acc, b| acc.wrapping_add(*b),
    )
}

/// Validate one delimited frame and split off its payload.
///
/// Checks run in a fixed order: size, start marker, packet type, length
/// consistency, paging, checksum, end marker. The payload is a zero-copy
/// slice of `frame`.
pub fn parse_frame(frame: Bytes) -> Result<OuterFrame, FramingError> {
    check_frame(&frame)?;
    Ok(split_checked(frame))
}

/// Run every [`parse_frame`] check without taking ownership of the bytes.
pub(crate) fn check_frame(frame: &[u8]) -> Result<(), FramingError> {
    if frame.len() < HEADER_SIZE + TRAILER_SIZE {
        return Err(FramingError::LengthMismatch {
            expected: HEADER_SIZE + TRAILER_SIZE,
            actual: frame.len(),
        });
    }

    let start_byte = frame[0];
    if start_byte != START_MARKER {
        return Err(FramingError::BadStart { found: start_byte });
    }

    let status = frame[1];
    let packet_type = frame[PACKET_TYPE_OFFSET];
    if packet_type != GSOF_PACKET_TYPE {
        return Err(FramingError::UnsupportedPacketType { found: packet_type });
    }

    let length = frame[LENGTH_OFFSET];
    let expected = frame_size(length.max(COUNTED_HEADER as u8));
    if frame.len() != expected || (length as usize) < COUNTED_HEADER {
        return Err(FramingError::LengthMismatch {
            expected: frame_size(length),
            actual: frame.len(),
        });
    }

    let page_index = frame[5];
    let max_page_index = frame[6];
    if page_index != 0 || max_page_index != 0 {
        return Err(FramingError::MultiPageUnsupported {
            page_index,
            max_page_index,
        });
    }

    let checksum_at = frame.len() - TRAILER_SIZE;
    let received = frame[checksum_at];
    let computed = checksum(
        status,
        packet_type,
        length,
        &frame[LENGTH_PREFIX..checksum_at],
    );
    if computed != received {
        return Err(FramingError::ChecksumMismatch { computed, received });
    }

    let end_byte = frame[frame.len() - 1];
    if end_byte != END_MARKER {
        return Err(FramingError::BadEnd { found: end_byte });
    }

    Ok(())
}

/// Build an [`OuterFrame`] from bytes that already passed [`check_frame`].
pub(crate) fn split_checked(frame: Bytes) -> OuterFrame {
    let checksum_at = frame.len() - TRAILER_SIZE;
    OuterFrame {
        start_byte: frame[0],
        status: frame[1],
        packet_type: frame[PACKET_TYPE_OFFSET],
        length: frame[LENGTH_OFFSET],
        transmission_number: frame[4],
        page_index: frame[5],
        max_page_index: frame[6],
        checksum: frame[checksum_at],
        end_byte: frame[frame.len() - 1],
        payload: frame.slice(HEADER_SIZE..checksum_at),
    }
}

/// Encode a frame around `payload`, computing length and checksum.
pub fn encode_frame(
    header: &FrameHeader,
    payload: &[u8],
    dst: &mut BytesMut,
) -> Result<(), FramingError> {
    if payload.len() > MAX_PAYLOAD {
        return Err(FramingError::PayloadTooLarge {
            size: payload.len(),
            max: MAX_PAYLOAD,
        });
    }
    let length = (COUNTED_HEADER + payload.len()) as u8;

    dst.reserve(frame_size(length));
    dst.put_u8(START_MARKER);
    dst.put_u8(header.status);
    dst.put_u8(header.packet_type);
    dst.put_u8(length);
    let body_start = dst.len();
    dst.put_u8(header.transmission_number);
    dst.put_u8(header.page_index);
    dst.put_u8(header.max_page_index);
    dst.put_slice(payload);
    let cs = checksum(header.status, header.packet_type, length, &dst[body_start..]);
    dst.put_u8(cs);
    dst.put_u8(END_MARKER);
    Ok(())
}
