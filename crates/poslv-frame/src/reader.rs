use std::io::{ErrorKind, Read};

use crate::assembler::{AssemblerConfig, AssemblerStats, StreamAssembler};
use crate::codec::OuterFrame;
use crate::error::{FrameError, Result};

/// Default read size, matching the unit's typical burst.
pub const DEFAULT_READ_CHUNK: usize = 512;

/// Configuration for [`FrameReader`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameConfig {
    /// Maximum bytes requested per `read` call.
    pub read_chunk_size: usize,
    /// Reassembly settings.
    pub assembler: AssemblerConfig,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            read_chunk_size: DEFAULT_READ_CHUNK,
            assembler: AssemblerConfig::default(),
        }
    }
}

/// Reads validated frames from any `Read` stream.
///
/// Handles partial reads internally. A frame that fails validation is
/// returned as [`FrameError::Framing`] and the reader stays usable; the next
/// call resumes at the following frame.
pub struct FrameReader<T> {
    inner: T,
    assembler: StreamAssembler,
    chunk: Vec<u8>,
}

impl<T: Read> FrameReader<T> {
    /// Create a new frame reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new frame reader with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            assembler: StreamAssembler::with_config(config.assembler),
            chunk: vec![0u8; config.read_chunk_size.max(1)],
        }
    }

    /// Read the next frame (blocking).
    ///
    /// Returns `Err(FrameError::ConnectionClosed)` when EOF is reached; any
    /// partial frame still buffered at that point is dropped.
    pub fn read_frame(&mut self) -> Result<OuterFrame> {
        loop {
            if let Some(frame) = self.assembler.next_frame() {
                return frame.map_err(FrameError::from);
            }

            let read = match self.inner.read(&mut self.chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            };

            if read == 0 {
                return Err(FrameError::ConnectionClosed);
            }

            self.assembler.push(&self.chunk[..read]);
        }
    }

    /// Reassembly counters so far.
    pub fn assembler_stats(&self) -> AssemblerStats {
        self.assembler.stats()
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use bytes::BytesMut;

    use super::*;
    use crate::codec::{encode_frame, FrameHeader};
    use crate::error::FramingError;

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

    #[test]
    fn read_single_frame() {
        let mut reader = FrameReader::new(Cursor::new(wire(1, b"hello")));
        let frame = reader.read_frame().unwrap();

        assert_eq!(frame.transmission_number, 1);
        assert_eq!(frame.payload.as_ref(), b"hello");
    }

    #[test]
    fn read_multiple_frames() {
        let mut bytes = wire(1, b"one");
        bytes.extend(wire(2, b"two"));
        bytes.extend(wire(3, b"three"));

        let mut reader = FrameReader::new(Cursor::new(bytes));
        let f1 = reader.read_frame().unwrap();
        let f2 = reader.read_frame().unwrap();
        let f3 = reader.read_frame().unwrap();

        assert_eq!(f1.payload.as_ref(), b"one");
        assert_eq!(f2.payload.as_ref(), b"two");
        assert_eq!(f3.payload.as_ref(), b"three");
        assert!(matches!(
            reader.read_frame(),
            Err(FrameError::ConnectionClosed)
        ));
    }

    #[test]
    fn partial_read_handling() {
        let bytes = wire(4, b"slow");
        let mut reader = FrameReader::new(ByteByByteReader { bytes, pos: 0 });

        let frame = reader.read_frame().unwrap();
        assert_eq!(frame.transmission_number, 4);
        assert_eq!(frame.payload.as_ref(), b"slow");
    }

    #[test]
    fn bad_frame_is_recoverable() {
        let mut bad = wire(1, b"bad");
        let at = bad.len() - 2;
        bad[at] ^= 0xFF;
        bad.extend(wire(2, b"good"));

        let mut reader = FrameReader::new(Cursor::new(bad));
        let err = reader.read_frame().unwrap_err();
        assert!(err.is_recoverable());
        assert!(matches!(
            err,
            FrameError::Framing(FramingError::ChecksumMismatch { .. })
        ));

        let frame = reader.read_frame().unwrap();
        assert_eq!(frame.payload.as_ref(), b"good");
    }

    #[test]
    fn stray_start_marker_read_byte_by_byte() {
        let mut bytes = vec![0x02];
        for txn in 0..3 {
            bytes.extend(wire(txn, &[0x31, 0x02, 0xAA, 0xBB]));
        }
        let mut reader = FrameReader::new(ByteByByteReader { bytes, pos: 0 });

        for txn in 0..3 {
            assert_eq!(reader.read_frame().unwrap().transmission_number, txn);
        }
        assert!(matches!(
            reader.read_frame(),
            Err(FrameError::ConnectionClosed)
        ));
        assert_eq!(reader.assembler_stats().discarded_bytes, 1);
    }

    #[test]
    fn connection_closed_cleanly() {
        let mut reader = FrameReader::new(Cursor::new(Vec::<u8>::new()));
        let err = reader.read_frame().unwrap_err();
        assert!(matches!(err, FrameError::ConnectionClosed));
        assert!(!err.is_recoverable());
    }

    #[test]
    fn connection_closed_mid_frame() {
        let bytes = wire(1, b"truncated");
        let mut reader = FrameReader::new(Cursor::new(bytes[..6].to_vec()));
        assert!(matches!(
            reader.read_frame(),
            Err(FrameError::ConnectionClosed)
        ));
    }

    #[test]
    fn small_read_chunks() {
        let mut bytes = wire(1, &[0xAB; 200]);
        bytes.extend(wire(2, &[0xCD; 100]));
        let config = FrameConfig {
            read_chunk_size: 7,
            ..FrameConfig::default()
        };
        let mut reader = FrameReader::with_config(Cursor::new(bytes), config);

        assert_eq!(reader.read_frame().unwrap().payload.len(), 200);
        assert_eq!(reader.read_frame().unwrap().payload.len(), 100);
        assert_eq!(reader.assembler_stats().candidates, 2);
    }

    #[test]
    fn interrupted_read_retries() {
        let reader = InterruptedThenData {
            interrupted: false,
            inner: Cursor::new(wire(8, b"ok")),
        };
        let mut framed = FrameReader::new(reader);
        let frame = framed.read_frame().unwrap();
        assert_eq!(frame.transmission_number, 8);
    }

    #[test]
    fn timeout_propagates_io_error() {
        let mut framed = FrameReader::new(TimesOut);
        let err = framed.read_frame().unwrap_err();
        assert!(matches!(err, FrameError::Io(e) if e.kind() == ErrorKind::TimedOut));
    }

    #[test]
    fn accessors_and_into_inner() {
        let mut reader = FrameReader::new(Cursor::new(Vec::<u8>::new()));
        let _ = reader.get_ref();
        let _ = reader.get_mut();
        let _inner = reader.into_inner();
    }

    struct ByteByByteReader {
        bytes: Vec<u8>,
        pos: usize,
    }

    impl Read for ByteByByteReader {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.pos >= self.bytes.len() || buf.is_empty() {
                return Ok(0);
            }
            buf[0] = self.bytes[self.pos];
            self.pos += 1;
            Ok(1)
        }
    }

    struct InterruptedThenData {
        interrupted: bool,
        inner: Cursor<Vec<u8>>,
    }

    impl Read for InterruptedThenData {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if !self.interrupted {
                self.interrupted = true;
                return Err(std::io::Error::from(ErrorKind::Interrupted));
            }
            self.inner.read(buf)
        }
    }

    struct TimesOut;

    impl Read for TimesOut {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            Err(std::io::Error::from(ErrorKind::TimedOut))
        }
    }
}
