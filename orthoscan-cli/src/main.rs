//! Orthoscan CLI - Command-line interface
//!
//! Downloads satellite imagery for a GeoJSON area, stitches it into
//! composites and runs object detection over them.

mod commands;
mod error;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use orthoscan::logging::{init_logging, LoggingOptions};
use tracing::error;

use commands::config::ConfigCommands;
use commands::run::{BothArgs, DetectArgs, DownloadArgs};
use error::CliError;

#[derive(Debug, Parser)]
#[command(name = "orthoscan", version, about, long_about = None)]
struct Cli {
    /// Configuration file [default: <config dir>/orthoscan/config.ini]
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Also write log output to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Download and stitch imagery tiles covering an area
    Download(DownloadArgs),

    /// Run object detection over previously downloaded composites
    Detect(DetectArgs),

    /// Download, then detect
    Both(BothArgs),

    /// Inspect configuration
    #[command(subcommand)]
    Config(ConfigCommands),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let _guard = match init_logging(&LoggingOptions {
        verbose: cli.verbose,
        log_file: cli.log_file.clone(),
    }) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let explicit_config = cli.config.as_deref();

    match cli.command {
        Commands::Config(command) => commands::config::run(command, explicit_config),
        Commands::Download(args) => {
            let config = commands::common::load_config(explicit_config)?;
            commands::run::run_download(args, &config)
        }
        Commands::Detect(args) => {
            let config = commands::common::load_config(explicit_config)?;
            commands::run::run_detect(args, &config)
        }
        Commands::Both(args) => {
            let config = commands::common::load_config(explicit_config)?;
            commands::run::run_both(args, &config)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_both() {
        let cli = Cli::try_parse_from([
            "orthoscan",
            "-v",
            "both",
            "--output-name",
            "harbour",
            "--geojson",
            "area.geojson",
            "--zoom",
            "17",
            "--model",
            "ships/2",
            "--api-key",
            "k",
            "--confidence",
            "0.4",
        ])
        .unwrap();

        assert!(cli.verbose);
        match cli.command {
            Commands::Both(args) => {
                assert_eq!(args.output.output_name, "harbour");
                assert_eq!(args.download.zoom, Some(17));
                assert_eq!(args.detect.model.as_deref(), Some("ships/2"));
                assert_eq!(args.detect.confidence, Some(0.4));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_output_name_required() {
        let result = Cli::try_parse_from(["orthoscan", "download", "--geojson", "a.geojson"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_download_requires_geojson() {
        let result = Cli::try_parse_from(["orthoscan", "download", "--output-name", "x"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "orthoscan",
            "detect",
            "--output-name",
            "x",
            "--config",
            "/tmp/c.ini",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/c.ini")));
    }

    #[test]
    fn test_config_subcommands() {
        let cli = Cli::try_parse_from(["orthoscan", "config", "show"]).unwrap();
        assert!(matches!(cli.command, Commands::Config(ConfigCommands::Show)));
    }
}
