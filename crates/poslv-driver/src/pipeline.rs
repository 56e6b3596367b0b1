use std::io::Read;
use std::time::SystemTime;

use poslv_frame::{FrameError, FrameReader, FramingError, OuterFrame};
use poslv_gsof::{
    decode_record, split_payload, InsRmsSample, InsSample, Measurement,
};
use poslv_transport::ShutdownSignal;
use tracing::{debug, info, trace, warn};

use crate::error::{DriverError, Result};
use crate::sink::Sink;
use crate::stats::PipelineStats;

/// Turns validated frames into published samples.
///
/// Each sample type has its own sink. Frame and record errors are counted
/// and skipped; a closed sink or a failed stream ends the run.
pub struct Pipeline<I, R> {
    ins: I,
    ins_rms: R,
    stats: PipelineStats,
}

impl<I, R> Pipeline<I, R>
where
    I: Sink<InsSample>,
    R: Sink<InsRmsSample>,
{
    pub fn new(ins: I, ins_rms: R) -> Self {
        Self {
            ins,
            ins_rms,
            stats: PipelineStats::default(),
        }
    }

    pub fn stats(&self) -> &PipelineStats {
        &self.stats
    }

    /// Give back the sinks, e.g. to inspect collected samples.
    pub fn into_sinks(self) -> (I, R) {
        (self.ins, self.ins_rms)
    }

    /// Process one reassembled frame, or the reason it was rejected.
    ///
    /// Returns the number of samples published.
    pub fn handle_frame(
        &mut self,
        frame: std::result::Result<OuterFrame, FramingError>,
    ) -> Result<usize> {
        match frame {
            Ok(frame) => {
                self.stats.frames_accepted += 1;
                trace!(
                    txn = frame.transmission_number,
                    payload = frame.payload.len(),
                    "frame accepted"
                );
                self.handle_payload(&frame.payload)
            }
            Err(err) => {
                warn!(error = %err, "dropping frame");
                self.stats.count_framing(&err);
                Ok(0)
            }
        }
    }

    /// Decode and publish every record in a GSOF payload.
    ///
    /// All records share one capture time. A sub-record that overruns the
    /// payload discards the whole payload.
    pub fn handle_payload(&mut self, payload: &[u8]) -> Result<usize> {
        let captured_at = SystemTime::now();

        let records = match split_payload(payload) {
            Ok(records) => records,
            Err(err) => {
                warn!(error = %err, "dropping payload");
                self.stats.count_framing(&err);
                return Ok(0);
            }
        };

        let mut published = 0;
        for record in &records {
            match decode_record(record, captured_at) {
                Ok(measurement) => {
                    self.publish(measurement)?;
                    published += 1;
                }
                Err(err) => {
                    if err.is_unimplemented() {
                        debug!(error = %err, "skipping record");
                    } else {
                        warn!(error = %err, "skipping record");
                    }
                    self.stats.count_record(&err);
                }
            }
        }
        Ok(published)
    }

    fn publish(&mut self, measurement: Measurement) -> Result<()> {
        match measurement {
            Measurement::Ins(sample) => {
                self.ins
                    .publish(sample)
                    .map_err(|_| DriverError::SinkClosed { channel: "ins" })?;
                self.stats.ins_samples += 1;
            }
            Measurement::InsRms(sample) => {
                self.ins_rms
                    .publish(sample)
                    .map_err(|_| DriverError::SinkClosed { channel: "ins_rms" })?;
                self.stats.ins_rms_samples += 1;
            }
        }
        Ok(())
    }

    /// Read frames until the stream fails or `shutdown` is triggered.
    ///
    /// A stream error observed after shutdown was requested ends the run
    /// cleanly. EOF is reported as [`FrameError::ConnectionClosed`].
    pub fn run<T: Read>(
        &mut self,
        reader: &mut FrameReader<T>,
        shutdown: &ShutdownSignal,
    ) -> Result<PipelineStats> {
        loop {
            if shutdown.is_triggered() {
                info!("shutdown requested, stopping pipeline");
                return Ok(self.stats);
            }

            let result = reader.read_frame();
            self.stats.absorb_reassembly(reader.assembler_stats());

            match result {
                Ok(frame) => {
                    self.handle_frame(Ok(frame))?;
                }
                Err(FrameError::Framing(err)) => {
                    self.handle_frame(Err(err))?;
                }
                Err(err) if shutdown.is_triggered() => {
                    debug!(error = %err, "stream ended during shutdown");
                    return Ok(self.stats);
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// Async counterpart of [`run`](Self::run) over any `AsyncRead`.
    ///
    /// Cancellation is observed between frames; a frame already read is
    /// always fully published. With `read_timeout`, waiting longer than that
    /// for the next frame fails the run with a `TimedOut` I/O error.
    #[cfg(feature = "async")]
    pub async fn run_async<S>(
        &mut self,
        stream: S,
        config: poslv_frame::FrameConfig,
        read_timeout: Option<std::time::Duration>,
        cancel: &tokio_util::sync::CancellationToken,
    ) -> Result<PipelineStats>
    where
        S: tokio::io::AsyncRead + Unpin,
    {
        use futures_util::StreamExt;
        use poslv_frame::GsofFrameCodec;
        use tokio_util::codec::FramedRead;

        let mut framed = FramedRead::with_capacity(
            stream,
            GsofFrameCodec::with_config(config.assembler),
            config.read_chunk_size.max(1),
        );

        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!("cancelled, stopping pipeline");
                    return Ok(self.stats);
                }
                next = next_with_timeout(&mut framed, read_timeout) => next?,
            };

            match next {
                Some(Ok(item)) => {
                    self.stats.absorb_reassembly(framed.decoder().stats());
                    self.handle_frame(item)?;
                }
                Some(Err(err)) => return Err(err.into()),
                None => return Err(FrameError::ConnectionClosed.into()),
            }
        }
    }
}

#[cfg(feature = "async")]
async fn next_with_timeout<St>(
    framed: &mut St,
    timeout: Option<std::time::Duration>,
) -> std::result::Result<Option<St::Item>, FrameError>
where
    St: futures_util::Stream + Unpin,
{
    use futures_util::StreamExt;

    match timeout {
        Some(timeout) => tokio::time::timeout(timeout, framed.next())
            .await
            .map_err(|_| {
                FrameError::Io(std::io::Error::new(
                    std::io::ErrorKind::TimedOut,
                    "no data within read timeout",
                ))
            }),
        None => Ok(framed.next().await),
    }
}

impl<I, R> std::fmt::Debug for Pipeline<I, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}
