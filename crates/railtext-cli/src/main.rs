//! `railtext`: read the stamped fields off rail weld marking photos.
//!
//! Logs go to stderr so that records printed to stdout stay pipeable.
//! `-v` raises the level one step per flag; `RAILTEXT_LOG` takes a full
//! filter directive (`railtext_core=trace`) and wins over `-v`.

mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{batch, config, fields, process};

const LOG_ENV: &str = "RAILTEXT_LOG";

#[derive(Parser)]
#[command(name = "railtext", author, version)]
#[command(about = "Extract DATE, WELDER, KM, RAIL TYPE and the other marking fields from photos")]
struct Cli {
    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Config file to use instead of the per-user one
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Read one photo (or a .txt of recognized text)
    Process(process::ProcessArgs),

    /// Read every file matching a glob
    Batch(batch::BatchArgs),

    /// Show the field table in use
    Fields(fields::FieldsArgs),

    /// Create, inspect or edit the config file
    Config(config::ConfigArgs),
}

fn level_for(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

fn init_logging(verbose: u8) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(level_for(verbose)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("cannot install logger: {}", e))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Process(args) => process::run(args, config_path).await,
        Commands::Batch(args) => batch::run(args, config_path).await,
        Commands::Fields(args) => fields::run(args, config_path).await,
        Commands::Config(args) => config::run(args, config_path).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_verbosity_levels() {
        assert_eq!(level_for(0), "warn");
        assert_eq!(level_for(2), "debug");
        assert_eq!(level_for(9), "trace");
    }

    #[test]
    fn test_verbose_after_subcommand() {
        let cli = Cli::try_parse_from(["railtext", "fields", "-vv"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.command, Commands::Fields(_)));
    }
}
