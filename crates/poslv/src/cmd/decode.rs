use std::fs::File;

use poslv_driver::{Pipeline, ShutdownSignal};
use poslv_frame::FrameReader;

use crate::cmd::DecodeArgs;
use crate::exit::{driver_error, io_error, CliResult, SUCCESS};
use crate::output::{print_stats, OutputFormat, SampleWriter};

pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let file = File::open(&args.file)
        .map_err(|err| io_error(&format!("cannot open {}", args.file.display()), err))?;

    let shutdown = ShutdownSignal::new();
    let writer = SampleWriter::new(format, args.records, args.count, shutdown.clone());
    let mut pipeline = Pipeline::new(&writer, &writer);
    let mut reader = FrameReader::new(file);

    let stats = match pipeline.run(&mut reader, &shutdown) {
        Ok(stats) => stats,
        Err(err) if err.is_end_of_stream() => *pipeline.stats(),
        Err(err) => return Err(driver_error("decode failed", err)),
    };

    if args.stats {
        print_stats(&stats, format);
    }
    Ok(SUCCESS)
}
