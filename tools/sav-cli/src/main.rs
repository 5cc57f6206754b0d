//! sav - inspect and re-encode chunked save game files
//!
//! # Commands
//!
//! - `sav inspect <file>` - Header, per-level counts and chunk count
//! - `sav dump <file> <pathName>` - One record and its entity as JSON
//! - `sav roundtrip <in> <out>` - Decode and re-encode with the configured codec settings
//! - `sav config` - Print the effective configuration as TOML
//!
//! Settings are read from `--config <path>`, else `sav.toml` in the platform
//! config directory. Logging follows `RUST_LOG` (default `info`).

mod commands;
mod settings;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

/// sav - inspect and re-encode chunked save game files
#[derive(Parser)]
#[command(name = "sav")]
#[command(about = "Inspect and re-encode chunked save game files")]
#[command(version)]
struct Cli {
    /// Configuration file (defaults to sav.toml in the config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print header, per-level counts and chunk count
    Inspect(commands::InspectArgs),

    /// Print one object record and its entity as JSON
    Dump(commands::DumpArgs),

    /// Decode a save and write it back out
    Roundtrip(commands::RoundtripArgs),

    /// Print the effective configuration as TOML
    Config(settings::CodecOverrides),
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = settings::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Inspect(args) => commands::inspect(args),
        Commands::Dump(args) => commands::dump(args),
        Commands::Roundtrip(args) => commands::roundtrip(args, &config),
        Commands::Config(overrides) => commands::print_config(overrides, &config),
    }
}
