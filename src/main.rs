//! Rift Music CLI
//!
//! Command-line front end for the adaptive area music player.

use anyhow::Context;
use clap::Parser;
use env_logger::Env;
use log::info;

use rift_music::cli::commands;
use rift_music::cli::{Cli, Commands};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logger
    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter)).init();

    info!("Rift Music v{}", env!("CARGO_PKG_VERSION"));

    let config = commands::load_config(cli.config.as_deref()).with_context(|| {
        match &cli.config {
            Some(path) => format!("loading configuration from {}", path.display()),
            None => "building default configuration".to_string(),
        }
    })?;

    match cli.command {
        Some(cmd) => handle_command(cmd, &config),
        None => {
            println!("Rift Music v{}", env!("CARGO_PKG_VERSION"));
            println!("Use --help for available commands");
            Ok(())
        }
    }
}

fn handle_command(cmd: Commands, config: &rift_music::MusicConfig) -> anyhow::Result<()> {
    match cmd {
        Commands::Areas => commands::list_areas(config)?,
        Commands::Map { danger, layers } => commands::print_map(config, danger, layers)?,
        Commands::Session {
            layers,
            render,
            steps,
        } => commands::run_session(config, layers, render, &steps).context("session failed")?,
    }
    Ok(())
}
