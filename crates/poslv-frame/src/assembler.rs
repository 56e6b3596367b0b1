use bytes::{Buf, BytesMut};
use tracing::{debug, warn};

use crate::codec::{
    check_frame, frame_size, split_checked, OuterFrame, COUNTED_HEADER, END_MARKER,
    GSOF_PACKET_TYPE, LENGTH_OFFSET, LENGTH_PREFIX, MAX_FRAME_SIZE, PACKET_TYPE_OFFSET,
    START_MARKER,
};
use crate::error::FramingError;

/// Default bound on bytes retained between reads: 64 KiB.
pub const DEFAULT_MAX_BUFFERED: usize = 64 * 1024;

/// Configuration for stream reassembly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssemblerConfig {
    /// Maximum bytes retained. Never less than one maximum-size frame.
    pub max_buffered: usize,
}

impl Default for AssemblerConfig {
    fn default() -> Self {
        Self {
            max_buffered: DEFAULT_MAX_BUFFERED,
        }
    }
}

impl AssemblerConfig {
    pub(crate) fn effective_max(&self) -> usize {
        self.max_buffered.max(MAX_FRAME_SIZE)
    }
}

/// Reassembly counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssemblerStats {
    /// Candidate frames delimited.
    pub candidates: u64,
    /// Candidates that failed validation.
    pub rejected: u64,
    /// Bytes skipped as noise while hunting for a frame.
    pub discarded_bytes: u64,
    /// Times the retention bound forced bytes to be dropped.
    pub overflows: u64,
}

/// Reassembles validated frames from arbitrarily sized stream chunks.
///
/// A start marker only opens a candidate when the packet type, length and
/// end marker around it line up; anything else is skipped as noise. A
/// candidate that then fails [`parse_frame`](crate::parse_frame) is reported
/// and only its start marker is consumed, so frames it overlapped are still
/// found.
#[derive(Debug)]
pub struct StreamAssembler {
    buf: BytesMut,
    config: AssemblerConfig,
    stats: AssemblerStats,
}

impl Default for StreamAssembler {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamAssembler {
    /// Create an assembler with default configuration.
    pub fn new() -> Self {
        Self::with_config(AssemblerConfig::default())
    }

    /// Create an assembler with explicit configuration.
    pub fn with_config(config: AssemblerConfig) -> Self {
        Self {
            buf: BytesMut::with_capacity(MAX_FRAME_SIZE * 2),
            config,
            stats: AssemblerStats::default(),
        }
    }

    /// Append a chunk read from the stream.
    pub fn push(&mut self, chunk: &[u8]) {
        self.buf.extend_from_slice(chunk);
        enforce_bound(&mut self.buf, self.config.effective_max(), &mut self.stats);
    }

    /// Take the next complete frame, if one is buffered.
    ///
    /// Returns `None` when more input is needed.
    pub fn next_frame(&mut self) -> Option<Result<OuterFrame, FramingError>> {
        take_frame(&mut self.buf, &mut self.stats)
    }

    /// Bytes currently retained.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Reassembly counters so far.
    pub fn stats(&self) -> AssemblerStats {
        self.stats
    }

    /// Drop all retained bytes, e.g. after a reconnect.
    pub fn clear(&mut self) {
        self.buf.clear();
    }
}

/// Validate and split one frame at the front of `buf`.
pub(crate) fn take_frame(
    buf: &mut BytesMut,
    stats: &mut AssemblerStats,
) -> Option<Result<OuterFrame, FramingError>> {
    let size = delimit(buf, stats)?;
    stats.candidates += 1;

    match check_frame(&buf[..size]) {
        Ok(()) => Some(Ok(split_checked(buf.split_to(size).freeze()))),
        Err(err) => {
            stats.rejected += 1;
            debug!(size, error = %err, "rejected candidate; rescanning after its start marker");
            buf.advance(1);
            Some(Err(err))
        }
    }
}

/// Find the size of a plausible frame starting at the front of `buf`.
///
/// Leading bytes before a start marker are discarded, as is a start marker
/// whose packet type, length or end marker cannot belong to a frame. Returns
/// `None` until `4 + length + 2` bytes are present.
fn delimit(buf: &mut BytesMut, stats: &mut AssemblerStats) -> Option<usize> {
    loop {
        match buf.iter().position(|b| *b == START_MARKER) {
            Some(0) => {}
            Some(skip) => discard(buf, skip, stats),
            None => {
                let all = buf.len();
                discard(buf, all, stats);
                return None;
            }
        }

        if buf.len() > PACKET_TYPE_OFFSET && buf[PACKET_TYPE_OFFSET] != GSOF_PACKET_TYPE {
            discard(buf, 1, stats);
            continue;
        }
        if buf.len() < LENGTH_PREFIX {
            return None;
        }

        let length = buf[LENGTH_OFFSET];
        if usize::from(length) < COUNTED_HEADER {
            discard(buf, 1, stats);
            continue;
        }
        let size = frame_size(length);
        if buf.len() < size {
            return None;
        }
        if buf[size - 1] != END_MARKER {
            discard(buf, 1, stats);
            continue;
        }
        return Some(size);
    }
}

/// Drop the oldest bytes when `buf` exceeds `max`; the next
/// [`take_frame`] resynchronises on a start marker.
pub(crate) fn enforce_bound(buf: &mut BytesMut, max: usize, stats: &mut AssemblerStats) {
    if buf.len() <= max {
        return;
    }
    let excess = buf.len() - max;
    warn!(
        buffered = buf.len(),
        max, excess, "reassembly buffer over limit; dropping oldest bytes"
    );
    stats.overflows += 1;
    discard(buf, excess, stats);
}

fn discard(buf: &mut BytesMut, count: usize, stats: &mut AssemblerStats) {
    if count == 0 {
        return;
    }
    debug!(count, "discarding bytes outside a frame");
    buf.advance(count);
    stats.discarded_bytes += count as u64;
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::codec::{encode_frame, FrameHeader};

    fn wire(txn: u8, payload: &[u8]) -> Vec<u8> {
        let mut buf = BytesMut::new();
        encode_frame(
            &FrameHeader {
                transmission_number: txn,
                ..FrameHeader::default()
            },
            payload,
            &mut buf,
        )
        .unwrap();
        buf.to_vec()
    }

    fn drain(assembler: &mut StreamAssembler) -> Vec<Result<OuterFrame, FramingError>> {
        std::iter::from_fn(|| assembler.next_frame()).collect()
    }

    fn txns(frames: Vec<Result<OuterFrame, FramingError>>) -> Vec<u8> {
        frames
            .into_iter()
            .map(|f| f.unwrap().transmission_number)
            .collect()
    }

    #[test]
    fn whole_frame_in_one_chunk() {
        let frame = wire(1, b"\x31\x00");
        let mut assembler = StreamAssembler::new();
        assembler.push(&frame);

        let out = drain(&mut assembler);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].as_ref().unwrap().payload.as_ref(), b"\x31\x00");
        assert_eq!(assembler.buffered(), 0);
    }

    #[test]
    fn several_frames_in_one_chunk() {
        let mut chunk = wire(1, b"one");
        chunk.extend(wire(2, b"two"));
        chunk.extend(wire(3, b"three"));

        let mut assembler = StreamAssembler::new();
        assembler.push(&chunk);

        assert_eq!(txns(drain(&mut assembler)), vec![1, 2, 3]);
        assert_eq!(assembler.stats().candidates, 3);
    }

    #[test]
    fn waits_for_length_byte() {
        let frame = wire(1, b"abc");
        let mut assembler = StreamAssembler::new();
        assembler.push(&frame[..3]);
        assert!(assembler.next_frame().is_none());
        assert_eq!(assembler.buffered(), 3);

        assembler.push(&frame[3..]);
        assert_eq!(assembler.next_frame().unwrap().unwrap().payload.as_ref(), b"abc");
    }

    #[test]
    fn waits_for_trailer() {
        let frame = wire(1, b"abc");
        let mut assembler = StreamAssembler::new();
        assembler.push(&frame[..frame.len() - 1]);
        assert!(assembler.next_frame().is_none());

        assembler.push(&frame[frame.len() - 1..]);
        assert!(assembler.next_frame().unwrap().is_ok());
    }

    #[test]
    fn skips_garbage_before_start_marker() {
        let mut chunk = vec![0xFF, 0x00, 0x41];
        chunk.extend(wire(9, b"xyz"));

        let mut assembler = StreamAssembler::new();
        assembler.push(&chunk);

        assert_eq!(txns(drain(&mut assembler)), vec![9]);
        assert_eq!(assembler.stats().discarded_bytes, 3);
    }

    #[test]
    fn garbage_without_marker_is_dropped() {
        let mut assembler = StreamAssembler::new();
        assembler.push(&[0x10, 0x20, 0x30]);
        assert!(assembler.next_frame().is_none());
        assert_eq!(assembler.buffered(), 0);
        assert_eq!(assembler.stats().discarded_bytes, 3);
    }

    #[test]
    fn stray_start_marker_does_not_swallow_frames() {
        let mut chunk = vec![START_MARKER];
        for txn in 0..10 {
            chunk.extend(wire(txn, &[0x31, 0x02, 0xAA, 0xBB]));
        }

        let mut assembler = StreamAssembler::new();
        assembler.push(&chunk);

        assert_eq!(txns(drain(&mut assembler)), (0..10).collect::<Vec<u8>>());
        assert_eq!(assembler.stats().discarded_bytes, 1);
        assert_eq!(assembler.stats().rejected, 0);
        assert_eq!(assembler.buffered(), 0);
    }

    #[test]
    fn stray_start_marker_before_short_burst_does_not_stall() {
        let mut chunk = vec![START_MARKER];
        for txn in 0..3 {
            chunk.extend(wire(txn, &[0x31, 0x02, 0xAA, 0xBB]));
        }

        let mut assembler = StreamAssembler::new();
        assembler.push(&chunk);

        assert_eq!(txns(drain(&mut assembler)), vec![0, 1, 2]);
    }

    #[test]
    fn start_marker_with_bad_length_is_noise() {
        let mut chunk = vec![START_MARKER, 0x00, GSOF_PACKET_TYPE, 0x01];
        chunk.extend(wire(5, b"ok"));

        let mut assembler = StreamAssembler::new();
        assembler.push(&chunk);

        assert_eq!(txns(drain(&mut assembler)), vec![5]);
        assert_eq!(assembler.stats().discarded_bytes, 4);
    }

    #[test]
    fn rejected_candidate_rescans_from_next_byte() {
        // An envelope that lines up structurally around a real frame but
        // carries paging indices taken from the frame's own header.
        let inner = wire(0x21, &[0x31, 0x02, 0xAA, 0xBB]);
        let mut chunk = vec![START_MARKER, 0x00, GSOF_PACKET_TYPE, inner.len() as u8];
        chunk.extend_from_slice(&inner);
        chunk.extend_from_slice(&[0x00, END_MARKER]);

        let mut assembler = StreamAssembler::new();
        assembler.push(&chunk);
        let out = drain(&mut assembler);

        assert_eq!(out.len(), 2);
        assert!(matches!(
            out[0],
            Err(FramingError::MultiPageUnsupported { .. })
        ));
        assert_eq!(out[1].as_ref().unwrap().transmission_number, 0x21);
        assert_eq!(assembler.stats().candidates, 2);
        assert_eq!(assembler.stats().rejected, 1);
        assert_eq!(assembler.buffered(), 0);
    }

    #[test]
    fn corrupted_frame_is_reported_once() {
        let mut bad = wire(1, b"bad");
        let at = bad.len() - 2;
        bad[at] ^= 0xFF;
        bad.extend(wire(2, b"good"));

        let mut assembler = StreamAssembler::new();
        assembler.push(&bad);
        let out = drain(&mut assembler);

        assert_eq!(out.len(), 2);
        assert!(matches!(out[0], Err(FramingError::ChecksumMismatch { .. })));
        assert_eq!(out[1].as_ref().unwrap().payload.as_ref(), b"good");
    }

    #[test]
    fn overflow_drops_oldest_and_resyncs() {
        let mut assembler = StreamAssembler::with_config(AssemblerConfig {
            max_buffered: MAX_FRAME_SIZE,
        });
        // A stalled partial frame followed by more data than the bound allows.
        let mut chunk = vec![0x02, 0x00, 0x40, 0xFF];
        chunk.extend(std::iter::repeat(0xEE).take(MAX_FRAME_SIZE));
        chunk.extend(wire(4, b"ok"));

        assembler.push(&chunk);
        assert!(assembler.buffered() <= MAX_FRAME_SIZE);
        assert_eq!(assembler.stats().overflows, 1);

        assert_eq!(txns(drain(&mut assembler)), vec![4]);
    }

    #[test]
    fn max_buffered_never_below_one_frame() {
        let mut assembler = StreamAssembler::with_config(AssemblerConfig { max_buffered: 1 });
        let frame = wire(1, &[0x55; 200]);
        assembler.push(&frame);
        assert_eq!(assembler.stats().overflows, 0);
        assert!(assembler.next_frame().unwrap().is_ok());
    }

    #[test]
    fn clear_drops_partial_frame() {
        let frame = wire(1, b"abc");
        let mut assembler = StreamAssembler::new();
        assembler.push(&frame[..5]);
        assembler.clear();
        assembler.push(&frame);
        assert_eq!(drain(&mut assembler).len(), 1);
    }

    proptest! {
        #[test]
        fn prop_chunking_does_not_change_output(
            payloads in proptest::collection::vec(
                proptest::collection::vec(any::<u8>(), 0..40), 1..6),
            chunk in 1usize..32,
        ) {
            let mut stream = Vec::new();
            for (i, p) in payloads.iter().enumerate() {
                stream.extend(wire(i as u8, p));
            }

            let mut whole = StreamAssembler::new();
            whole.push(&stream);
            let expected = drain(&mut whole);

            let mut pieces = StreamAssembler::new();
            let mut got = Vec::new();
            for part in stream.chunks(chunk) {
                pieces.push(part);
                got.extend(drain(&mut pieces));
            }

            prop_assert_eq!(expected.len(), payloads.len());
            prop_assert_eq!(got, expected);
        }

        #[test]
        fn prop_leading_noise_never_loses_frames(
            noise in proptest::collection::vec(
                any::<u8>().prop_filter("packet type byte", |b| *b != GSOF_PACKET_TYPE), 0..8),
            count in 1usize..8,
        ) {
            let mut stream = noise;
            for txn in 0..count {
                stream.extend(wire(txn as u8, &[0x31, 0x02, 0xAA, 0xBB]));
            }

            let mut assembler = StreamAssembler::new();
            assembler.push(&stream);
            let got: Vec<u8> = drain(&mut assembler)
                .into_iter()
                .filter_map(|f| f.ok().map(|f| f.transmission_number))
                .collect();

            prop_assert_eq!(got, (0..count as u8).collect::<Vec<u8>>());
        }
    }
}
