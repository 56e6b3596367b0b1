use std::cell::Cell;
use std::io::IsTerminal;

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use poslv_driver::{PipelineStats, ShutdownSignal, Sink, SinkClosed};
use poslv_gsof::{InsRmsSample, InsSample, Measurement, RecordType};
use serde::Serialize;

#[derive(Clone, Debug, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

/// Record types selectable on the command line.
#[derive(Clone, Debug, Copy, PartialEq, Eq, ValueEnum)]
pub enum RecordKind {
    /// GSOF 49, full navigation solution.
    Ins,
    /// GSOF 50, solution RMS.
    Rms,
}

impl RecordKind {
    fn matches(self, record_type: RecordType) -> bool {
        matches!(
            (self, record_type),
            (RecordKind::Ins, RecordType::Ins) | (RecordKind::Rms, RecordType::InsRms)
        )
    }
}

/// Prints samples as they arrive; serves as both pipeline sinks.
///
/// With a limit, requests shutdown once that many samples were printed and
/// ignores anything published afterwards.
pub struct SampleWriter {
    format: OutputFormat,
    records: Option<Vec<RecordKind>>,
    limit: Option<u64>,
    printed: Cell<u64>,
    shutdown: ShutdownSignal,
}

impl SampleWriter {
    pub fn new(
        format: OutputFormat,
        records: Option<Vec<RecordKind>>,
        limit: Option<u64>,
        shutdown: ShutdownSignal,
    ) -> Self {
        Self {
            format,
            records,
            limit,
            printed: Cell::new(0),
            shutdown,
        }
    }

    pub fn printed(&self) -> u64 {
        self.printed.get()
    }

    fn write(&self, measurement: &Measurement) {
        if let Some(records) = &self.records {
            if !records.iter().any(|kind| kind.matches(measurement.record_type())) {
                return;
            }
        }
        if self.limit.is_some_and(|limit| self.printed.get() >= limit) {
            return;
        }

        print_measurement(measurement, self.format);
        let printed = self.printed.get().saturating_add(1);
        self.printed.set(printed);

        if self.limit.is_some_and(|limit| printed >= limit) {
            self.shutdown.trigger();
        }
    }
}

impl Sink<InsSample> for &SampleWriter {
    fn publish(&mut self, sample: InsSample) -> Result<(), SinkClosed> {
        self.write(&Measurement::Ins(sample));
        Ok(())
    }
}

impl Sink<InsRmsSample> for &SampleWriter {
    fn publish(&mut self, sample: InsRmsSample) -> Result<(), SinkClosed> {
        self.write(&Measurement::InsRms(sample));
        Ok(())
    }
}

pub fn print_measurement(measurement: &Measurement, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(measurement).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let (header, row) = match measurement {
                Measurement::Ins(sample) => ins_row(sample),
                Measurement::InsRms(sample) => rms_row(sample),
            };
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(header)
                .add_row(row);
            println!("{table}");
        }
        OutputFormat::Pretty => println!("{}", pretty(measurement)),
    }
}

fn ins_row(sample: &InsSample) -> (Vec<&'static str>, Vec<String>) {
    (
        vec![
            "RECORD", "WEEK", "TOW MS", "LAT", "LON", "ALT", "ROLL", "PITCH", "HEADING", "SPEED",
        ],
        vec![
            "ins".to_string(),
            sample.status.gps_week.to_string(),
            sample.status.gps_time_ms.to_string(),
            format!("{:.7}", sample.latitude),
            format!("{:.7}", sample.longitude),
            format!("{:.3}", sample.altitude),
            format!("{:.3}", sample.roll),
            format!("{:.3}", sample.pitch),
            format!("{:.3}", sample.heading),
            format!("{:.3}", sample.total_speed),
        ],
    )
}

fn rms_row(sample: &InsRmsSample) -> (Vec<&'static str>, Vec<String>) {
    (
        vec!["RECORD", "WEEK", "TOW MS", "POS RMS N/E/D", "VEL RMS N/E/D", "ATT RMS R/P/H"],
        vec![
            "ins_rms".to_string(),
            sample.status.gps_week.to_string(),
            sample.status.gps_time_ms.to_string(),
            triple(
                sample.north_position_rms,
                sample.east_position_rms,
                sample.down_position_rms,
            ),
            triple(
                sample.north_velocity_rms,
                sample.east_velocity_rms,
                sample.down_velocity_rms,
            ),
            triple(sample.roll_rms, sample.pitch_rms, sample.heading_rms),
        ],
    )
}

fn triple(a: f32, b: f32, c: f32) -> String {
    format!("{a:.3} / {b:.3} / {c:.3}")
}

fn pretty(measurement: &Measurement) -> String {
    match measurement {
        Measurement::Ins(s) => format!(
            "ins week={} tow_ms={} lat={:.7} lon={:.7} alt={:.3} roll={:.3} pitch={:.3} heading={:.3} speed={:.3} align={} gnss={}",
            s.status.gps_week,
            s.status.gps_time_ms,
            s.latitude,
            s.longitude,
            s.altitude,
            s.roll,
            s.pitch,
            s.heading,
            s.total_speed,
            s.status.imu_alignment_status,
            s.status.gnss_status,
        ),
        Measurement::InsRms(s) => format!(
            "ins_rms week={} tow_ms={} pos_rms={} vel_rms={} att_rms={}",
            s.status.gps_week,
            s.status.gps_time_ms,
            triple(s.north_position_rms, s.east_position_rms, s.down_position_rms),
            triple(s.north_velocity_rms, s.east_velocity_rms, s.down_velocity_rms),
            triple(s.roll_rms, s.pitch_rms, s.heading_rms),
        ),
    }
}

#[derive(Serialize)]
struct StatsOutput<'a> {
    record: &'static str,
    #[serde(flatten)]
    stats: &'a PipelineStats,
    frames_rejected: u64,
}

pub fn print_stats(stats: &PipelineStats, format: OutputFormat) {
    let out = StatsOutput {
        record: "stats",
        stats,
        frames_rejected: stats.frames_rejected(),
    };

    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["COUNTER", "VALUE"]);
            for (name, value) in stat_rows(&out) {
                table.add_row(vec![name, value]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            let line: Vec<String> = stat_rows(&out)
                .into_iter()
                .map(|(name, value)| format!("{name}={value}"))
                .collect();
            println!("stats {}", line.join(" "));
        }
    }
}

fn stat_rows(out: &StatsOutput<'_>) -> Vec<(String, String)> {
    match serde_json::to_value(out) {
        Ok(serde_json::Value::Object(map)) => map
            .into_iter()
            .filter(|(name, _)| name != "record")
            .map(|(name, value)| (name, value.to_string()))
            .collect(),
        _ => Vec::new(),
    }
}
