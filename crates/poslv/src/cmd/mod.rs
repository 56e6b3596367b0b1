use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Subcommand};
use poslv_transport::DEFAULT_ADDRESS;

use crate::exit::{CliError, CliResult, USAGE};
use crate::output::{OutputFormat, RecordKind};

pub mod decode;
pub mod listen;
pub mod simulate;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Connect to a unit and print decoded samples.
    Listen(ListenArgs),
    /// Decode a raw capture of the telemetry stream.
    Decode(DecodeArgs),
    /// Serve synthetic INS frames over TCP.
    Simulate(SimulateArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Listen(args) => listen::run(args, format),
        Command::Decode(args) => decode::run(args, format),
        Command::Simulate(args) => simulate::run(args),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct ListenArgs {
    /// Unit address (host:port).
    #[arg(env = "POSLV_ADDRESS", default_value = DEFAULT_ADDRESS)]
    pub address: String,
    /// Only print these record types (comma-separated).
    #[arg(long, value_delimiter = ',')]
    pub records: Option<Vec<RecordKind>>,
    /// Exit after printing N samples.
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub count: Option<u64>,
    /// Connection timeout (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s")]
    pub connect_timeout: String,
    /// Fail if no data arrives for this long (e.g. 10s). Default: wait forever.
    #[arg(long)]
    pub read_timeout: Option<String>,
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Capture file holding raw stream bytes.
    pub file: PathBuf,
    /// Only print these record types (comma-separated).
    #[arg(long, value_delimiter = ',')]
    pub records: Option<Vec<RecordKind>>,
    /// Stop after printing N samples.
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub count: Option<u64>,
    /// Print pipeline counters after the samples.
    #[arg(long)]
    pub stats: bool,
}

#[derive(Args, Debug)]
pub struct SimulateArgs {
    /// Address to listen on.
    #[arg(default_value = "127.0.0.1:5017")]
    pub bind: String,
    /// Frames per second per client.
    #[arg(long, default_value = "10", value_parser = clap::value_parser!(u32).range(1..=1000))]
    pub rate: u32,
    /// Frames to send per client before closing it. Default: unlimited.
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub count: Option<u64>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Parse `500ms`, `5s` or a bare number of seconds.
pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, millis) = if let Some(num) = input.strip_suffix("ms") {
        (num, true)
    } else if let Some(num) = input.strip_suffix('s') {
        (num, false)
    } else {
        (input, false)
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    Ok(if millis {
        Duration::from_millis(value)
    } else {
        Duration::from_secs(value)
    })
}
