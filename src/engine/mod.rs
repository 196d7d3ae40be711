//! Music Engine Module
//!
//! The adaptive core:
//! - Danger-to-volume mapping
//! - Area player state machine

pub mod mapper;
pub mod player;

pub use mapper::{map_danger_to_volumes, VolumeMapper, VolumeVector};
pub use player::{AreaPlayer, PlaybackState, PlayerSnapshot};
