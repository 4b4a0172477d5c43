//! aptgen - incremental annotation processing for Java sources
//!
//! Runs `javac -proc:only` over the sources that changed since the last
//! run and registers the generated-sources directory:
//! - `aptgen process` for main sources
//! - `aptgen test-process` for test sources

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;
mod error;
mod output;

use commands::{Mode, RunOptions};
use config::AptgenConfig;
use error::CliResult;

/// aptgen CLI application
#[derive(Parser)]
#[command(name = "aptgen")]
#[command(about = "Incremental javac annotation processing", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "APTGEN_CONFIG", default_value = config::DEFAULT_CONFIG_FILE, global = true)]
    config: PathBuf,

    /// javac executable (default: $JAVA_HOME/bin/javac, then PATH)
    #[arg(long, env = "APTGEN_JAVAC", global = true)]
    javac: Option<PathBuf>,

    /// Process every matching source, not only changed ones
    #[arg(long, global = true)]
    full: bool,

    /// Output format (text, json)
    #[arg(short, long, value_enum, default_value = "text", global = true)]
    output: output::OutputFormat,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand)]
enum Commands {
    /// Run annotation processors over main sources
    Process,

    /// Run annotation processors over test sources
    TestProcess,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .without_time()
                .with_writer(std::io::stderr),
        )
        .init();

    match run(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            output::print_error(&e.to_string());
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> CliResult<bool> {
    let config = AptgenConfig::load(&cli.config)?;
    let mode = match cli.command {
        Commands::Process => Mode::Main,
        Commands::TestProcess => Mode::Test,
    };
    let options = RunOptions {
        full: cli.full,
        javac: cli.javac.clone(),
    };

    let record = commands::execute(mode, &config, &options)?;
    output::print_record(&record, cli.output)?;
    Ok(record.success)
}
