//! rift-music - Adaptive Area Music
//!
//! Plays a stack of synchronized looping layers for the selected area and
//! remaps a single danger level into per-layer volumes, crossfading from
//! calm to intense without restarting or desynchronizing the tracks.
//!
//! # Architecture
//!
//! - `engine`: the volume mapper and the area player state machine
//! - `layers`: areas, trim settings and layer stack loaders
//! - `playback`: the `Playable` trait, an oddio-backed mixer and a test double
//! - `config`: constants and the area table
//! - `cli`: command-line presentation surface

pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod layers;
pub mod playback;

pub use config::MusicConfig;
pub use engine::{AreaPlayer, PlaybackState, VolumeMapper};
pub use error::{InvalidAreaError, InvalidDangerLevelError, MusicError, Result};
