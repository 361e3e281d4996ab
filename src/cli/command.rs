use std::path::PathBuf;

use clap::{Args, Parser as ClapParser, Subcommand, ValueEnum};
use pintrace::process::decode::DEFAULT_REPORT_WINDOW;

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (pintrace ",
    env!("PINTRACE_VERSION"),
    ", built ",
    env!("BUILD_TIMESTAMP"),
    ")"
);

#[derive(Debug, ClapParser)]
#[command(
    name         = env!("CARGO_PKG_NAME"),
    version      = env!("CARGO_PKG_VERSION"),
    long_version = LONG_VERSION,
    about        = "Tools for inspecting and validating binary memory-access traces",
    long_about   = None,
)]
pub struct Cli {
    /// Set the log level
    #[arg(long, global = true, value_enum, default_value_t = LogLevel::Info)]
    pub loglevel: LogLevel,

    /// Exit with an error if any malformed frame is found.
    #[arg(long, global = true)]
    pub strict: bool,

    /// Log output format.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Plain)]
    pub log_format: LogFormat,

    /// Show progress spinners during operations.
    #[arg(long, global = true)]
    pub progress: bool,

    /// Choose an operation to perform.
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print the first frames of a trace without validating tags.
    Dump(DumpArgs),

    /// Check every tag and report the frames around the first malformed one.
    Validate(ValidateArgs),

    /// Print access statistics of a trace.
    Stats(StatsArgs),

    /// Convert between the binary and text trace formats.
    Convert(ConvertArgs),
}

#[derive(Debug, Args)]
pub struct DumpArgs {
    /// Input binary trace (use "-" for stdin).
    #[arg(value_name = "INPUT", default_value = "-")]
    pub input: PathBuf,

    /// Number of frames to print.
    #[arg(short = 'n', long, value_name = "N", default_value_t = 4)]
    pub count: u64,
}

#[derive(Debug, Args)]
pub struct ValidateArgs {
    /// Input binary trace (use "-" for stdin).
    #[arg(value_name = "INPUT", default_value = "-")]
    pub input: PathBuf,

    /// Frames to report after the first malformed frame.
    #[arg(short, long, value_name = "W", default_value_t = DEFAULT_REPORT_WINDOW)]
    pub window: u32,
}

#[derive(Debug, Args)]
pub struct StatsArgs {
    /// Input binary trace (use "-" for stdin).
    #[arg(value_name = "INPUT", default_value = "-")]
    pub input: PathBuf,

    /// Also print statistics every N records (0 disables).
    #[arg(long, value_name = "N", default_value_t = 0)]
    pub interval: u64,

    /// Group digits with thousands separators.
    #[arg(long)]
    pub sep: bool,

    /// Report format.
    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,
}

#[derive(Debug, Args)]
pub struct ConvertArgs {
    /// Input trace (use "-" for stdin).
    #[arg(value_name = "INPUT", default_value = "-")]
    pub input: PathBuf,

    /// Format to convert to. The input is expected in the other format.
    #[arg(long, value_enum)]
    pub to: TraceFormat,

    /// Output path (stdout when omitted).
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogLevel {
    /// Disable logging output.
    Off,
    /// No output except errors.
    Error,
    /// Show warnings and errors.
    Warn,
    /// Show info, warnings and errors (default).
    Info,
    /// Show debug, info, warnings and errors.
    Debug,
    /// Show all log messages including trace.
    Trace,
}

impl LogLevel {
    /// Convert LogLevel to log::LevelFilter
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Off => log::LevelFilter::Off,
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogFormat {
    /// Colorized human-readable text.
    Plain,
    /// Structured JSON per log record.
    Json,
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq)]
pub enum ReportFormat {
    /// `label: value` lines terminated by `#eof`.
    Text,
    /// A single YAML document.
    Yaml,
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq)]
pub enum TraceFormat {
    /// 9-byte binary frames.
    Binary,
    /// One `<tag> 0x<address>` line per access.
    Text,
}

impl TraceFormat {
    pub fn extension(self) -> &'static str {
        match self {
            TraceFormat::Binary => "trace",
            TraceFormat::Text => "txt",
        }
    }
}
