//! Stream-to-event pipeline for POS LV GSOF telemetry.
//!
//! One reader pulls bytes from the unit, reassembles and validates frames,
//! walks their GSOF sub-records and publishes decoded samples to two injected
//! sinks: one for [`InsSample`]s, one for [`InsRmsSample`]s. Bad frames and
//! records are counted and skipped; only stream failures end a run.

pub mod config;
pub mod connector;
pub mod error;
pub mod pipeline;
pub mod sink;
pub mod stats;

pub use config::DriverConfig;
pub use connector::{connect, connect_and_run};
pub use error::{DriverError, Result};
pub use pipeline::Pipeline;
pub use sink::{Discard, FnSink, Sink, SinkClosed};
pub use stats::PipelineStats;

#[cfg(feature = "async")]
pub use connector::connect_and_run_async;

pub use poslv_gsof::{InsRmsSample, InsSample, InsStatus, Measurement};
pub use poslv_transport::ShutdownSignal;
