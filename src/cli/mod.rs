//! CLI Module
//!
//! Command-line presentation surface for the area player.

pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Rift Music - adaptive area music driven by a danger level
#[derive(Parser, Debug)]
#[command(name = "rift-music")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// JSON configuration file (defaults to the built-in area table)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the configured areas and their trim values
    #[command(name = "areas")]
    Areas,

    /// Print the layer volumes for a danger level
    #[command(name = "map")]
    Map {
        /// Danger level
        #[arg(short, long)]
        danger: f64,

        /// Number of layers in the stack
        #[arg(short, long, default_value_t = 3)]
        layers: usize,
    },

    /// Drive a player over synthesized layers
    ///
    /// Steps are `area=<name>`, `area=none` or `danger=<level>`. Without
    /// steps on the command line, one step per line is read from stdin.
    #[command(name = "session")]
    Session {
        /// Layers synthesized per area
        #[arg(short, long, default_value_t = 3)]
        layers: usize,

        /// Seconds of audio to render and measure after each step
        #[arg(short, long)]
        render: Option<f64>,

        /// Steps to run
        steps: Vec<String>,
    },
}
