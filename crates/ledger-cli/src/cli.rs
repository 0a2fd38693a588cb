//! CLI argument definitions for `ledger-load`.

use std::path::PathBuf;

use clap::builder::NonEmptyStringValueParser;
use clap::{Parser, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "ledger-load",
    version,
    about = "Load a stock-control CSV export into the finance warehouse",
    long_about = "Load a stock-control CSV export into the finance warehouse.\n\n\
                  Headers are normalized, known columns are typed, and every row is\n\
                  tagged with the business id and audit timestamps before a single\n\
                  append. Prints {\"success\":true} or {\"error\":\"...\"} on stdout."
)]
pub struct Cli {
    /// CSV file to load.
    #[arg(value_name = "CSV_PATH")]
    pub csv_path: PathBuf,

    /// Business (restaurant) id written into every record.
    #[arg(value_name = "BUSINESS_ID", value_parser = NonEmptyStringValueParser::new())]
    pub business_id: String,

    /// Run every stage except the warehouse append.
    #[arg(long = "dry-run", conflicts_with = "output_ndjson")]
    pub dry_run: bool,

    /// Append records to a local NDJSON file instead of the warehouse.
    #[arg(long = "output-ndjson", value_name = "PATH")]
    pub output_ndjson: Option<PathBuf>,

    /// Fail when two headers normalize to the same name instead of suffixing.
    #[arg(long = "reject-header-collisions")]
    pub reject_header_collisions: bool,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(long = "log-format", value_enum, default_value = "pretty")]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}

#[cfg(test)]
mod tests {
    use clap::error::ErrorKind;

    use super::*;

    #[test]
    fn test_positionals() {
        let cli = Cli::try_parse_from(["ledger-load", "stock.csv", "rest-42"]).unwrap();
        assert_eq!(cli.csv_path, PathBuf::from("stock.csv"));
        assert_eq!(cli.business_id, "rest-42");
        assert!(!cli.dry_run);
        assert!(cli.output_ndjson.is_none());
        assert!(!cli.reject_header_collisions);
    }

    #[test]
    fn test_missing_business_id() {
        let err = Cli::try_parse_from(["ledger-load", "stock.csv"]).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn test_empty_business_id() {
        let err = Cli::try_parse_from(["ledger-load", "stock.csv", ""]).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::InvalidValue);
    }

    #[test]
    fn test_dry_run_conflicts_with_ndjson() {
        let err = Cli::try_parse_from([
            "ledger-load",
            "stock.csv",
            "rest-42",
            "--dry-run",
            "--output-ndjson",
            "out.ndjson",
        ])
        .err()
        .unwrap();
        assert_eq!(err.kind(), ErrorKind::ArgumentConflict);
    }

    #[test]
    fn test_local_output() {
        let cli = Cli::try_parse_from([
            "ledger-load",
            "stock.csv",
            "rest-42",
            "--output-ndjson",
            "out.ndjson",
            "--log-format",
            "json",
        ])
        .unwrap();
        assert_eq!(cli.output_ndjson, Some(PathBuf::from("out.ndjson")));
        assert!(matches!(cli.log_format, LogFormatArg::Json));
    }
}
