use clap::ValueEnum;
use tracing_subscriber::EnvFilter;

/// Filter directives in this variable replace `--log-level` entirely.
pub const LOG_ENV: &str = "POSLV_LOG";

/// Crates whose events `--log-level` controls.
const CRATES: [&str; 5] = [
    "poslv",
    "poslv_frame",
    "poslv_gsof",
    "poslv_transport",
    "poslv_driver",
];

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn name(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }

    /// Our crates at this level; dependencies never louder than warn.
    pub fn directives(self) -> String {
        let fallback = match self {
            LogLevel::Error => LogLevel::Error,
            _ => LogLevel::Warn,
        };
        let mut directives = fallback.name().to_string();
        for krate in CRATES {
            directives.push_str(&format!(",{krate}={}", self.name()));
        }
        directives
    }
}

/// Logs go to stderr so stdout stays machine-readable.
pub fn init_logging(format: LogFormat, level: LogLevel) {
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(level.directives()));
    let builder = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_ansi(false)
        .with_target(level == LogLevel::Trace);

    match format {
        LogFormat::Text => {
            let _ = builder.try_init();
        }
        LogFormat::Json => {
            let _ = builder.json().try_init();
        }
    }
}
