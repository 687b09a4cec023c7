//! CLI argument definitions for the registry dataset tool.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "nsqip",
    version,
    about = "NSQIP dataset tool - harmonize multi-year registry extracts",
    long_about = "Open a directory of per-year surgical registry files as one table.\n\n\
                  Year-to-year schema drift is reconciled into a single widened schema;\n\
                  describe summarizes the result, export writes a filtered extract."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for debug, -vv for trace, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Allow row-level clinical values in log output.
    ///
    /// By default cell values are replaced with a redaction token before
    /// they reach the log stream.
    #[arg(long = "log-data", global = true)]
    pub log_data: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Summarize a dataset directory: kind, sources, rows, schema.
    Describe(DescribeArgs),

    /// Write a filtered extract of a dataset directory.
    Export(ExportArgs),
}

#[derive(Parser)]
pub struct DescribeArgs {
    /// Directory of per-year registry files (CSV or parquet).
    #[arg(value_name = "DATA_DIR")]
    pub dir: PathBuf,

    /// Execution mode used to open the dataset.
    #[arg(long = "mode", value_enum, default_value = "lazy")]
    pub mode: ModeArg,

    /// Print the report as JSON instead of tables.
    #[arg(long = "json")]
    pub json: bool,

    /// Re-type a text column as numeric, e.g. AGE=integer.
    ///
    /// Sources that store the column as text get a strict parse; any value
    /// that is neither numeric nor blank fails the run.
    #[arg(long = "numeric-override", value_name = "COLUMN=TYPE")]
    pub numeric_overrides: Vec<String>,
}

#[derive(Parser)]
pub struct ExportArgs {
    /// Directory of per-year registry files (CSV or parquet).
    #[arg(value_name = "DATA_DIR")]
    pub dir: PathBuf,

    /// Destination file; the extension picks the format (.csv or .parquet).
    #[arg(long = "output", short = 'o', value_name = "FILE")]
    pub output: PathBuf,

    /// Keep only these operation years.
    #[arg(long = "years", value_name = "YEAR", value_delimiter = ',')]
    pub years: Vec<i64>,

    /// Keep only these CPT procedure codes.
    #[arg(long = "cpt", value_name = "CODE", value_delimiter = ',')]
    pub cpt: Vec<String>,

    /// Keep only these postoperative diagnosis codes (ICD-9 or ICD-10).
    #[arg(long = "diagnosis", value_name = "CODE", value_delimiter = ',')]
    pub diagnosis: Vec<String>,

    /// Restrict the extract to these columns, in the given order.
    #[arg(long = "columns", value_name = "NAME", value_delimiter = ',')]
    pub columns: Vec<String>,

    /// Re-type a text column as numeric, e.g. AGE=integer.
    #[arg(long = "numeric-override", value_name = "COLUMN=TYPE")]
    pub numeric_overrides: Vec<String>,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ModeArg {
    Eager,
    Lazy,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
