use poslv_frame::FrameReader;
use poslv_gsof::{InsRmsSample, InsSample};
use poslv_transport::{ShutdownSignal, TcpTransport, TelemetryStream};
use tracing::info;

use crate::config::DriverConfig;
use crate::error::Result;
use crate::pipeline::Pipeline;
use crate::sink::Sink;
use crate::stats::PipelineStats;

/// Connect to the unit and wrap the socket in a frame reader.
///
/// The stream is registered with `shutdown` until the reader is dropped, so
/// triggering it unblocks a pending read.
pub fn connect(
    config: &DriverConfig,
    shutdown: &ShutdownSignal,
) -> Result<FrameReader<TelemetryStream>> {
    let mut stream = TcpTransport::connect(&config.address, config.connect_timeout)?;
    stream.set_read_timeout(config.read_timeout)?;
    stream.register_shutdown(shutdown)?;
    Ok(FrameReader::with_config(stream, config.frame))
}

/// Connect and run `pipeline` until shutdown or a stream failure.
pub fn connect_and_run<I, R>(
    config: &DriverConfig,
    pipeline: &mut Pipeline<I, R>,
    shutdown: &ShutdownSignal,
) -> Result<PipelineStats>
where
    I: Sink<InsSample>,
    R: Sink<InsRmsSample>,
{
    let mut reader = connect(config, shutdown)?;
    info!(
        peer = %reader.get_ref().peer_addr(),
        transport = TcpTransport::transport_name(),
        "reading telemetry"
    );
    pipeline.run(&mut reader, shutdown)
}

/// Async counterpart of [`connect_and_run`].
#[cfg(feature = "async")]
pub async fn connect_and_run_async<I, R>(
    config: &DriverConfig,
    pipeline: &mut Pipeline<I, R>,
    cancel: &tokio_util::sync::CancellationToken,
) -> Result<PipelineStats>
where
    I: Sink<InsSample>,
    R: Sink<InsRmsSample>,
{
    let stream = poslv_transport::connect_async(&config.address, config.connect_timeout).await?;
    info!(address = %config.address, "reading telemetry");
    pipeline
        .run_async(stream, config.frame, config.read_timeout, cancel)
        .await
}
