use poslv_driver::{connect_and_run, DriverConfig, Pipeline, ShutdownSignal};
use tracing::info;

use crate::cmd::{parse_duration, ListenArgs};
use crate::exit::{driver_error, CliError, CliResult, INTERNAL, SUCCESS};
use crate::output::{OutputFormat, SampleWriter};

pub fn run(args: ListenArgs, format: OutputFormat) -> CliResult<i32> {
    let config = DriverConfig {
        connect_timeout: Some(parse_duration(&args.connect_timeout)?),
        read_timeout: args.read_timeout.as_deref().map(parse_duration).transpose()?,
        ..DriverConfig::for_address(args.address)
    };

    let shutdown = ShutdownSignal::new();
    install_ctrlc_handler(shutdown.clone())?;

    let writer = SampleWriter::new(format, args.records, args.count, shutdown.clone());
    let mut pipeline = Pipeline::new(&writer, &writer);

    let stats = connect_and_run(&config, &mut pipeline, &shutdown)
        .map_err(|err| driver_error("listen failed", err))?;

    info!(
        frames = stats.frames_accepted,
        rejected = stats.frames_rejected(),
        printed = writer.printed(),
        "stopped"
    );
    Ok(SUCCESS)
}

fn install_ctrlc_handler(shutdown: ShutdownSignal) -> CliResult<()> {
    ctrlc::set_handler(move || shutdown.trigger()).map_err(|err| {
        CliError::new(INTERNAL, format!("signal handler setup failed: {err}"))
    })
}
