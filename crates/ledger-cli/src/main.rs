//! `ledger-load` entry point.

use std::io::{self, IsTerminal};
use std::process::ExitCode;

use clap::error::ErrorKind;
use clap::{ColorChoice, Parser};
use ledger_cli::config::{self, WarehouseConfig};
use ledger_cli::envelope::Envelope;
use ledger_cli::logging::{LogConfig, LogFormat, init_logging};
use ledger_cli::pipeline::{PipelineOptions, connect_bigquery, run_ingest};
use ledger_ingest::HeaderCollisionPolicy;
use ledger_warehouse::{LoadReceipt, MemoryLoader, NdjsonFileLoader};
use tracing::level_filters::LevelFilter;
use tracing::{debug, error, info};

mod cli;

use crate::cli::{Cli, LogFormatArg, LogLevelArg};

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ErrorKind::DisplayHelp
            | ErrorKind::DisplayVersion
            | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => err.exit(),
            _ => return Envelope::failure(argument_error_message(&err)).emit(),
        },
    };
    cli.color.write_global();
    if let Err(error) = init_logging(&log_config_from_cli(&cli)) {
        return Envelope::failure(format!("failed to initialize logging: {error}")).emit();
    }

    match run(&cli) {
        Ok(receipt) => {
            info!(
                destination = %receipt.destination,
                rows = receipt.rows,
                job_id = receipt.job_id.as_deref().unwrap_or_default(),
                "ingestion finished"
            );
            Envelope::success().emit()
        }
        Err(err) => {
            error!("ingestion failed: {err:?}");
            Envelope::failure(err.to_string()).emit()
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<LoadReceipt> {
    if let Some(path) = config::load_dotenv()? {
        debug!(path = %path.display(), "loaded environment file");
    }

    let options = PipelineOptions {
        collision_policy: if cli.reject_header_collisions {
            HeaderCollisionPolicy::Reject
        } else {
            HeaderCollisionPolicy::Disambiguate
        },
        business_id_column: config::business_id_column(config::lookup_env),
        ..PipelineOptions::default()
    };

    if cli.dry_run {
        let loader = MemoryLoader::new();
        let receipt = run_ingest(
            &cli.csv_path,
            &cli.business_id,
            &config::local_destination(),
            &loader,
            &options,
        )?;
        info!(
            records = loader.record_count(),
            "dry run: nothing written to the warehouse"
        );
        return Ok(receipt);
    }

    if let Some(path) = &cli.output_ndjson {
        let loader = NdjsonFileLoader::new(path);
        return Ok(run_ingest(
            &cli.csv_path,
            &cli.business_id,
            &config::local_destination(),
            &loader,
            &options,
        )?);
    }

    let warehouse = WarehouseConfig::from_env()?;
    debug!(config = ?warehouse, "warehouse configuration");
    let loader = connect_bigquery(&warehouse)?;
    Ok(run_ingest(
        &cli.csv_path,
        &cli.business_id,
        &warehouse.destination(),
        &loader,
        &options,
    )?)
}

/// First line of clap's rendered error, without the `error: ` prefix.
fn argument_error_message(err: &clap::Error) -> String {
    let rendered = err.to_string();
    let first = rendered.lines().next().unwrap_or_default().trim();
    first.strip_prefix("error: ").unwrap_or(first).to_string()
}

/// Build logging configuration from CLI flags with consistent precedence.
fn log_config_from_cli(cli: &Cli) -> LogConfig {
    let mut config = LogConfig {
        level_filter: cli.verbosity.tracing_level_filter(),
        ..LogConfig::default()
    };
    config.use_env_filter = !(cli.verbosity.is_present() || cli.log_level.is_some());
    if let Some(level) = cli.log_level {
        config.level_filter = match level {
            LogLevelArg::Error => LevelFilter::ERROR,
            LogLevelArg::Warn => LevelFilter::WARN,
            LogLevelArg::Info => LevelFilter::INFO,
            LogLevelArg::Debug => LevelFilter::DEBUG,
            LogLevelArg::Trace => LevelFilter::TRACE,
        };
    }
    config.format = match cli.log_format {
        LogFormatArg::Pretty => LogFormat::Pretty,
        LogFormatArg::Compact => LogFormat::Compact,
        LogFormatArg::Json => LogFormat::Json,
    };
    config.log_file = cli.log_file.clone();
    config.with_ansi = match cli.color.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => cli.log_file.is_none() && io::stderr().is_terminal(),
    };
    config
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_argument_error_message() {
        let err = Cli::try_parse_from(["ledger-load", "stock.csv"]).err().unwrap();
        let message = argument_error_message(&err);
        assert!(message.starts_with("the following required arguments were not provided"));
    }

    #[test]
    fn test_log_level_disables_env_filter() {
        let cli = Cli::try_parse_from(["ledger-load", "a.csv", "b", "--log-level", "debug"])
            .unwrap();
        let config = log_config_from_cli(&cli);
        assert_eq!(config.level_filter, LevelFilter::DEBUG);
        assert!(!config.use_env_filter);
    }

    #[test]
    fn test_default_log_config() {
        let cli = Cli::try_parse_from(["ledger-load", "a.csv", "b", "--color", "never"]).unwrap();
        let config = log_config_from_cli(&cli);
        assert_eq!(config.level_filter, LevelFilter::WARN);
        assert!(config.use_env_filter);
        assert!(!config.with_ansi);
        assert_eq!(config.format, LogFormat::Pretty);
    }
}
