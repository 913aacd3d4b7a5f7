//! Command-line entry point.
//!
//! # Responsibility
//! - Load configuration once and hand it to the core by reference.
//! - Map subcommands onto service calls and print results as JSON.
//!
//! # Invariants
//! - Errors go to stderr with exit code 1; nothing is retried.

use clap::{Parser, Subcommand};
use log::info;
use mascotas_core::{AppConfig, LoggingConfig, LoggingError, SqliteConnectionProvider};
use std::error::Error;
use std::path::PathBuf;

mod commands;

const STDERR_DEFAULT_LEVEL: &str = "warn";

#[derive(Debug, Parser)]
#[command(name = "mascotas")]
#[command(about = "Pet and identification chip records", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, global = true, default_value = "mascotas.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Open and close one unit of work against the configured database
    Check,
    /// Pet operations
    Pet(commands::pet::PetArgs),
    /// Chip operations
    Chip(commands::chip::ChipArgs),
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let config = AppConfig::load(&cli.config)?;
    start_logging(&config.logging)?;
    let provider = SqliteConnectionProvider::new(&config.database)?;
    info!(
        "event=cli_start module=cli status=ok command={}",
        command_name(&cli.command)
    );

    match cli.command {
        Commands::Check => commands::check::execute(&provider),
        Commands::Pet(args) => commands::pet::execute(&provider, args),
        Commands::Chip(args) => commands::chip::execute(&provider, args),
    }
}

fn start_logging(config: &LoggingConfig) -> Result<(), LoggingError> {
    match config.dir.as_deref() {
        Some(dir) => init_file_logging(config, dir),
        None => mascotas_core::init_stderr_logging(
            config.level.as_deref().unwrap_or(STDERR_DEFAULT_LEVEL),
        ),
    }
}

fn init_file_logging(config: &LoggingConfig, dir: &str) -> Result<(), LoggingError> {
    let level = config
        .level
        .as_deref()
        .unwrap_or_else(|| mascotas_core::default_log_level());
    mascotas_core::init_logging(level, dir)
}

fn command_name(command: &Commands) -> &'static str {
    match command {
        Commands::Check => "check",
        Commands::Pet(_) => "pet",
        Commands::Chip(_) => "chip",
    }
}
