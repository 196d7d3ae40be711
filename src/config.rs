//! Player configuration
//!
//! Everything the player needs to know up front: the volume ceiling, the
//! top of the danger scale and the set of areas with their trim values.
//! Defaults reproduce the Solar Rift soundtrack table.

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{MusicError, Result};
use crate::layers::{Area, TrimConfig};

/// Loudest volume any layer is set to, in engine units
pub const DEFAULT_MAX_AUDIO_VOL: f32 = 0.5;

/// Top of the danger scale
pub const DEFAULT_MAX_DANGER_LEVEL: f64 = 100.0;

/// Longest lead or trail silence an area may declare
pub const MAX_TRIM_SECS: f64 = 10.0;

/// One configured area
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaConfig {
    pub name: String,
    /// Leading silence in seconds
    #[serde(default)]
    pub lead_secs: f64,
    /// Trailing silence in seconds
    #[serde(default)]
    pub trail_secs: f64,
}

impl AreaConfig {
    pub fn new(name: impl Into<String>, lead_secs: f64, trail_secs: f64) -> Self {
        Self {
            name: name.into(),
            lead_secs,
            trail_secs,
        }
    }
}

/// Fixed-at-construction settings for an [`AreaPlayer`](crate::engine::AreaPlayer)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MusicConfig {
    #[serde(default = "default_max_audio_vol")]
    pub max_audio_vol: f32,
    #[serde(default = "default_max_danger_level")]
    pub max_danger_level: f64,
    #[serde(default = "default_areas")]
    pub areas: Vec<AreaConfig>,
}

fn default_max_audio_vol() -> f32 {
    DEFAULT_MAX_AUDIO_VOL
}

fn default_max_danger_level() -> f64 {
    DEFAULT_MAX_DANGER_LEVEL
}

fn default_areas() -> Vec<AreaConfig> {
    vec![
        AreaConfig::new("Moras", 0.15, 0.033),
        AreaConfig::new("Niveus", 0.1, 0.07),
        AreaConfig::new("Pyre", 0.1, 0.031),
    ]
}

impl Default for MusicConfig {
    fn default() -> Self {
        Self {
            max_audio_vol: DEFAULT_MAX_AUDIO_VOL,
            max_danger_level: DEFAULT_MAX_DANGER_LEVEL,
            areas: default_areas(),
        }
    }
}

impl MusicConfig {
    /// Load and validate a configuration from a JSON file
    ///
    /// Missing fields fall back to the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(MusicError::FileNotFound {
                path: path.display().to_string(),
                source: None,
            });
        }

        let file = File::open(path)?;
        let config: MusicConfig = serde_json::from_reader(BufReader::new(file))?;
        config.validate()?;

        log::info!(
            "Loaded configuration from {} ({} areas)",
            path.display(),
            config.areas.len()
        );
        Ok(config)
    }

    /// Write the configuration as pretty JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path)?;
        serde_json::to_writer_pretty(BufWriter::new(file), self)?;
        Ok(())
    }

    /// Check the constants and area table for values the player cannot use
    pub fn validate(&self) -> Result<()> {
        if !(self.max_audio_vol > 0.0 && self.max_audio_vol <= 1.0) {
            return Err(invalid(format!(
                "max_audio_vol must be in (0, 1], got {}",
                self.max_audio_vol
            )));
        }

        if !(self.max_danger_level.is_finite() && self.max_danger_level > 0.0) {
            return Err(invalid(format!(
                "max_danger_level must be positive and finite, got {}",
                self.max_danger_level
            )));
        }

        let mut seen = HashSet::new();
        for area in &self.areas {
            if area.name.trim().is_empty() {
                return Err(invalid("area names must not be empty".to_string()));
            }
            if !seen.insert(area.name.as_str()) {
                return Err(invalid(format!("duplicate area '{}'", area.name)));
            }
            for (label, secs) in [("lead_secs", area.lead_secs), ("trail_secs", area.trail_secs)] {
                if !(0.0..=MAX_TRIM_SECS).contains(&secs) {
                    return Err(invalid(format!(
                        "area '{}': {} must be between 0 and {} seconds, got {}",
                        area.name, label, MAX_TRIM_SECS, secs
                    )));
                }
            }
        }

        Ok(())
    }

    /// The configured areas, in table order
    pub fn areas(&self) -> Vec<Area> {
        self.areas
            .iter()
            .map(|a| Area::new(a.name.as_str(), TrimConfig::new(a.lead_secs, a.trail_secs)))
            .collect()
    }
}

fn invalid(reason: String) -> MusicError {
    MusicError::InvalidConfig { reason }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_is_valid() {
        let config = MusicConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_audio_vol, 0.5);
        assert_eq!(config.max_danger_level, 100.0);

        let names: Vec<String> = config.areas().iter().map(|a| a.id().to_string()).collect();
        assert_eq!(names, vec!["Moras", "Niveus", "Pyre"]);
    }

    #[test]
    fn test_reference_trim_table() {
        let areas = MusicConfig::default().areas();
        assert_eq!(areas[0].trim(), TrimConfig::new(0.15, 0.033));
        assert_eq!(areas[2].trim(), TrimConfig::new(0.1, 0.031));
    }

    #[test]
    fn test_rejects_bad_volume_ceiling() {
        for vol in [0.0, -0.5, 1.5, f32::NAN] {
            let config = MusicConfig {
                max_audio_vol: vol,
                ..MusicConfig::default()
            };
            let err = config.validate().unwrap_err();
            assert_eq!(err.error_code(), "INVALID_CONFIG");
        }
    }

    #[test]
    fn test_rejects_bad_danger_scale() {
        for max in [0.0, -10.0, f64::INFINITY, f64::NAN] {
            let config = MusicConfig {
                max_danger_level: max,
                ..MusicConfig::default()
            };
            assert!(config.validate().is_err());
        }
    }

    #[test]
    fn test_rejects_duplicate_and_empty_areas() {
        let mut config = MusicConfig::default();
        config.areas.push(AreaConfig::new("Moras", 0.0, 0.0));
        assert!(config.validate().is_err());

        config.areas = vec![AreaConfig::new("  ", 0.0, 0.0)];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_negative_trim() {
        let config = MusicConfig {
            areas: vec![AreaConfig::new("Moras", -0.1, 0.0)],
            ..MusicConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_oversized_trim() {
        for (lead, trail) in [(1e300, 1e300), (0.0, MAX_TRIM_SECS + 0.5), (f64::INFINITY, 0.0)] {
            let config = MusicConfig {
                areas: vec![AreaConfig::new("X", lead, trail)],
                ..MusicConfig::default()
            };
            let err = config.validate().unwrap_err();
            assert_eq!(err.error_code(), "INVALID_CONFIG");
        }

        let config = MusicConfig {
            areas: vec![AreaConfig::new("X", MAX_TRIM_SECS, MAX_TRIM_SECS)],
            ..MusicConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("music.json");

        let config = MusicConfig {
            max_audio_vol: 0.8,
            max_danger_level: 10.0,
            areas: vec![AreaConfig::new("Depths", 0.2, 0.05)],
        };
        config.save(&path).unwrap();

        let loaded = MusicConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("music.json");
        std::fs::write(&path, r#"{ "max_danger_level": 10 }"#).unwrap();

        let loaded = MusicConfig::load(&path).unwrap();
        assert_eq!(loaded.max_danger_level, 10.0);
        assert_eq!(loaded.max_audio_vol, DEFAULT_MAX_AUDIO_VOL);
        assert_eq!(loaded.areas.len(), 3);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempdir().unwrap();
        let err = MusicConfig::load(&dir.path().join("nope.json")).unwrap_err();
        assert_eq!(err.error_code(), "FILE_NOT_FOUND");
    }
}
