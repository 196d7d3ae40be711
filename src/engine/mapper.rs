//! Danger-to-Volume Mapper
//!
//! Turns a danger level into one volume per layer. The base layer is always
//! at the ceiling; the layers above it come in one at a time, left to right,
//! each ramping linearly from silent to full over one unit of "spread"
//! before the next one starts.
//!
//! With three layers and a 0..100 scale:
//!
//! | danger | spread | volumes           |
//! |--------|--------|-------------------|
//! | 0      | 0.0    | `[0.5, 0.0, 0.0]` |
//! | 50     | 1.0    | `[0.5, 0.5, 0.0]` |
//! | 75     | 1.5    | `[0.5, 0.5, 0.25]`|
//! | 100    | 2.0    | `[0.5, 0.5, 0.5]` |

use crate::config::MusicConfig;

/// Per-layer volumes, index-aligned with a layer stack
pub type VolumeVector = Vec<f32>;

/// Map a danger level onto `layer_count` volumes
///
/// The caller is responsible for `danger_level` being inside
/// `[0, max_danger_level]`; the player validates before calling this.
/// A zero-layer stack maps to an empty vector.
///
/// # Example
/// ```
/// use rift_music::engine::map_danger_to_volumes;
/// let volumes = map_danger_to_volumes(75.0, 3, 100.0, 0.5);
/// assert_eq!(volumes, vec![0.5, 0.5, 0.25]);
/// ```
pub fn map_danger_to_volumes(
    danger_level: f64,
    layer_count: usize,
    max_danger_level: f64,
    max_audio_vol: f32,
) -> VolumeVector {
    if layer_count == 0 {
        return Vec::new();
    }

    let extra = (layer_count - 1) as f64;
    let spread = (danger_level / max_danger_level) * extra;

    let mut volumes = Vec::with_capacity(layer_count);
    volumes.push(max_audio_vol);
    for i in 0..layer_count - 1 {
        let raw = (spread - i as f64).max(0.0).min(1.0);
        volumes.push(raw as f32 * max_audio_vol);
    }
    volumes
}

/// The mapper with its two constants fixed
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolumeMapper {
    max_danger_level: f64,
    max_audio_vol: f32,
}

impl VolumeMapper {
    pub fn new(max_danger_level: f64, max_audio_vol: f32) -> Self {
        Self {
            max_danger_level,
            max_audio_vol,
        }
    }

    pub fn from_config(config: &MusicConfig) -> Self {
        Self::new(config.max_danger_level, config.max_audio_vol)
    }

    pub fn max_danger_level(&self) -> f64 {
        self.max_danger_level
    }

    pub fn max_audio_vol(&self) -> f32 {
        self.max_audio_vol
    }

    /// Whether `level` lies on the danger scale (NaN never does)
    pub fn accepts(&self, level: f64) -> bool {
        (0.0..=self.max_danger_level).contains(&level)
    }

    pub fn map(&self, danger_level: f64, layer_count: usize) -> VolumeVector {
        map_danger_to_volumes(
            danger_level,
            layer_count,
            self.max_danger_level,
            self.max_audio_vol,
        )
    }
}

impl Default for VolumeMapper {
    fn default() -> Self {
        Self::from_config(&MusicConfig::default())
    }
}
