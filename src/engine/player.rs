//! Area Player state machine
//!
//! Owns every loaded layer stack, the current area and the current danger
//! level. Two setters drive it:
//! - `select_area`: stop whatever plays, then start the new area's stack
//! - `set_danger_level`: remap volumes on the running stack, no restart
//!
//! Both validate before touching anything. A rejected call leaves the
//! player, and everything it is playing, exactly as it was.
//!
//! The danger level survives a trip through `Silent`: selecting an area
//! again picks up where the last one left off.

use std::collections::HashMap;
use std::fmt;

use log::{debug, info, warn};
use num_traits::ToPrimitive;
use serde::Serialize;

use crate::config::MusicConfig;
use crate::engine::mapper::{VolumeMapper, VolumeVector};
use crate::error::{InvalidAreaError, InvalidDangerLevelError, MusicError, Result};
use crate::layers::{Area, AreaId, LayerStackLoader};
use crate::playback::Playable;

/// What the player is doing
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackState {
    /// Nothing plays
    Silent,
    /// `area`'s stack loops at volumes mapped from `danger_level`
    Active { area: AreaId, danger_level: f64 },
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaybackState::Silent => write!(f, "Silent"),
            PlaybackState::Active { area, danger_level } => {
                write!(f, "Active({}, danger {})", area, danger_level)
            }
        }
    }
}

/// Serializable view of the player for presentation layers
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerSnapshot {
    pub area: Option<String>,
    pub danger_level: f64,
    pub volumes: VolumeVector,
}

/// Plays one area's layer stack at a time, mixed by danger level
///
/// Single-threaded: every method takes `&self` or `&mut self` and runs to
/// completion. Callers on several threads must serialize access themselves.
///
/// # Example
/// ```
/// use rift_music::config::MusicConfig;
/// use rift_music::engine::AreaPlayer;
/// use rift_music::playback::{Journal, MockLoader};
///
/// let journal = Journal::new();
/// let mut loader = MockLoader::new(&journal, 3);
/// let mut player = AreaPlayer::load_all(&MusicConfig::default(), &mut loader).unwrap();
///
/// player.select_area(Some("Moras")).unwrap();
/// player.set_danger_level(75).unwrap();
/// assert_eq!(player.current_volumes(), vec![0.5, 0.5, 0.25]);
///
/// assert!(player.set_danger_level(101).is_err());
/// assert_eq!(player.current_danger_level(), 75.0);
/// ```
pub struct AreaPlayer<P: Playable> {
    mapper: VolumeMapper,
    areas: Vec<Area>,
    stacks: HashMap<AreaId, Vec<P>>,
    area: Option<AreaId>,
    danger_level: f64,
}

impl<P: Playable> AreaPlayer<P> {
    /// Create a silent player with no stacks installed
    ///
    /// Stacks are added with [`install_stack`](Self::install_stack); an
    /// area cannot be selected until its stack is installed.
    pub fn new(config: &MusicConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            mapper: VolumeMapper::from_config(config),
            areas: config.areas(),
            stacks: HashMap::new(),
            area: None,
            danger_level: 0.0,
        })
    }

    /// Create a player and eagerly load every configured area
    ///
    /// The first loader failure aborts construction.
    pub fn load_all<L>(config: &MusicConfig, loader: &mut L) -> Result<Self>
    where
        L: LayerStackLoader<Layer = P>,
    {
        let mut player = Self::new(config)?;
        for area in config.areas() {
            let layers = loader.load(&area)?;
            player.install_stack(area.id().as_str(), layers)?;
        }
        Ok(player)
    }

    /// Hand the layer stack for a known area to the player
    ///
    /// Stacks are fixed once installed; a second install for the same area
    /// is rejected.
    pub fn install_stack(&mut self, area: &str, layers: Vec<P>) -> Result<()> {
        let id = self
            .areas
            .iter()
            .map(Area::id)
            .find(|id| id.as_str() == area)
            .cloned()
            .ok_or_else(|| InvalidAreaError {
                area: area.to_string(),
            })?;

        if self.stacks.contains_key(&id) {
            return Err(MusicError::Load {
                area: area.to_string(),
                reason: "layer stack already installed".to_string(),
            });
        }

        info!("Installed {} layers for {}", layers.len(), id);
        self.stacks.insert(id, layers);
        Ok(())
    }

    // ========================================================================
    // Setters
    // ========================================================================

    /// Switch to `new_area`, or go silent with `None`
    ///
    /// The outgoing stack is stopped, the incoming one gets its volumes for
    /// the current danger level and then starts looping, every layer in the
    /// same call. Reselecting the playing area restarts it.
    pub fn select_area(
        &mut self,
        new_area: Option<&str>,
    ) -> std::result::Result<(), InvalidAreaError> {
        let next = match new_area {
            None => None,
            Some(name) => match self.stacks.get_key_value(name) {
                Some((id, _)) => Some(id.clone()),
                None => {
                    warn!("Rejected area '{}': not a loaded area", name);
                    return Err(InvalidAreaError {
                        area: name.to_string(),
                    });
                }
            },
        };

        self.stop_current();

        match &next {
            None => debug!("Silent"),
            Some(id) => debug!("Playing {} at danger {}", id, self.danger_level),
        }
        self.area = next;
        self.apply_volumes();
        self.start_current();
        Ok(())
    }

    /// Set the danger level
    ///
    /// Accepts any numeric type. Values outside `[0, max_danger_level]` and
    /// NaN are rejected, never clamped. While silent the level is stored
    /// for the next area.
    pub fn set_danger_level<L: ToPrimitive>(
        &mut self,
        level: L,
    ) -> std::result::Result<(), InvalidDangerLevelError> {
        let value = level.to_f64().unwrap_or(f64::NAN);
        if !self.mapper.accepts(value) {
            warn!("Rejected danger level {}", value);
            return Err(InvalidDangerLevelError {
                level: value,
                max: self.mapper.max_danger_level(),
            });
        }

        self.danger_level = value;
        self.apply_volumes();
        Ok(())
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn current_area(&self) -> Option<&AreaId> {
        self.area.as_ref()
    }

    pub fn current_danger_level(&self) -> f64 {
        self.danger_level
    }

    pub fn state(&self) -> PlaybackState {
        match &self.area {
            None => PlaybackState::Silent,
            Some(area) => PlaybackState::Active {
                area: area.clone(),
                danger_level: self.danger_level,
            },
        }
    }

    pub fn is_silent(&self) -> bool {
        self.area.is_none()
    }

    /// Volumes the active stack is set to; empty while silent
    pub fn current_volumes(&self) -> VolumeVector {
        match self.active_stack() {
            Some(stack) => self.mapper.map(self.danger_level, stack.len()),
            None => Vec::new(),
        }
    }

    /// Number of layers installed for `area`
    pub fn layer_count(&self, area: &str) -> Option<usize> {
        self.stacks.get(area).map(Vec::len)
    }

    /// Configured areas, in configuration order
    pub fn areas(&self) -> &[Area] {
        &self.areas
    }

    pub fn is_loaded(&self, area: &str) -> bool {
        self.stacks.contains_key(area)
    }

    pub fn mapper(&self) -> &VolumeMapper {
        &self.mapper
    }

    /// Layers of the active stack
    pub fn active_layers(&self) -> &[P] {
        self.active_stack().map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn snapshot(&self) -> PlayerSnapshot {
        PlayerSnapshot {
            area: self.area.as_ref().map(AreaId::to_string),
            danger_level: self.danger_level,
            volumes: self.current_volumes(),
        }
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn active_stack(&self) -> Option<&Vec<P>> {
        self.area.as_ref().and_then(|id| self.stacks.get(id))
    }

    fn active_stack_mut(&mut self) -> Option<&mut Vec<P>> {
        match &self.area {
            Some(id) => self.stacks.get_mut(id),
            None => None,
        }
    }

    fn apply_volumes(&mut self) {
        let mapper = self.mapper;
        let danger_level = self.danger_level;
        if let Some(stack) = self.active_stack_mut() {
            let volumes = mapper.map(danger_level, stack.len());
            debug!("Volumes {:?}", volumes);
            for (layer, volume) in stack.iter_mut().zip(volumes) {
                layer.set_volume(volume);
            }
        }
    }

    fn start_current(&mut self) {
        if let Some(stack) = self.active_stack_mut() {
            stack.iter_mut().for_each(Playable::play_looping);
        }
    }

    fn stop_current(&mut self) {
        if let Some(stack) = self.active_stack_mut() {
            stack.iter_mut().for_each(Playable::stop);
        }
    }
}

impl<P: Playable> fmt::Debug for AreaPlayer<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AreaPlayer")
            .field("state", &self.state())
            .field("loaded", &self.stacks.len())
            .field("mapper", &self.mapper)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AreaConfig;
    use crate::playback::{Journal, MockLayer, MockLoader, PlaybackCall};
    use pretty_assertions::assert_eq;

    fn player(journal: &Journal) -> AreaPlayer<MockLayer> {
        let mut loader = MockLoader::new(journal, 3).with_layers("Pyre", 2);
        AreaPlayer::load_all(&MusicConfig::default(), &mut loader).unwrap()
    }

    fn call(kind: &str, layer: &str) -> PlaybackCall {
        match kind {
            "play" => PlaybackCall::PlayLooping {
                layer: layer.to_string(),
            },
            _ => PlaybackCall::Stop {
                layer: layer.to_string(),
            },
        }
    }

    fn volume(layer: &str, volume: f32) -> PlaybackCall {
        PlaybackCall::SetVolume {
            layer: layer.to_string(),
            volume,
        }
    }

    #[test]
    fn test_initial_state() {
        let journal = Journal::new();
        let player = player(&journal);
        assert_eq!(player.state(), PlaybackState::Silent);
        assert_eq!(player.current_danger_level(), 0.0);
        assert!(player.current_volumes().is_empty());
        assert!(journal.is_empty());
    }

    #[test]
    fn test_select_sets_volumes_then_plays() {
        let journal = Journal::new();
        let mut player = player(&journal);

        player.select_area(Some("Moras")).unwrap();

        assert_eq!(
            journal.calls(),
            vec![
                volume("Moras-0", 0.5),
                volume("Moras-1", 0.0),
                volume("Moras-2", 0.0),
                call("play", "Moras-0"),
                call("play", "Moras-1"),
                call("play", "Moras-2"),
            ]
        );
        assert_eq!(
            player.state(),
            PlaybackState::Active {
                area: AreaId::new("Moras"),
                danger_level: 0.0
            }
        );
    }

    #[test]
    fn test_switch_stops_old_before_starting_new() {
        let journal = Journal::new();
        let mut player = player(&journal);
        player.select_area(Some("Moras")).unwrap();
        journal.clear();

        player.select_area(Some("Pyre")).unwrap();

        assert_eq!(journal.stopped(), vec!["Moras-0", "Moras-1", "Moras-2"]);
        assert_eq!(journal.started(), vec!["Pyre-0", "Pyre-1"]);
        let calls = journal.calls();
        let last_stop = calls
            .iter()
            .rposition(|c| matches!(c, PlaybackCall::Stop { .. }))
            .unwrap();
        let first_play = calls
            .iter()
            .position(|c| matches!(c, PlaybackCall::PlayLooping { .. }))
            .unwrap();
        assert!(last_stop < first_play);
    }

    #[test]
    fn test_select_none_stops_each_layer_once() {
        let journal = Journal::new();
        let mut player = player(&journal);
        player.select_area(Some("Moras")).unwrap();
        journal.clear();

        player.select_area(None).unwrap();
        assert_eq!(journal.stopped(), vec!["Moras-0", "Moras-1", "Moras-2"]);
        assert_eq!(journal.len(), 3);
        assert!(player.is_silent());

        // Already silent: nothing to stop
        journal.clear();
        player.select_area(None).unwrap();
        assert!(journal.is_empty());
    }

    #[test]
    fn test_reselect_restarts() {
        let journal = Journal::new();
        let mut player = player(&journal);
        player.select_area(Some("Pyre")).unwrap();
        journal.clear();

        player.select_area(Some("Pyre")).unwrap();
        assert_eq!(journal.stopped(), vec!["Pyre-0", "Pyre-1"]);
        assert_eq!(journal.started(), vec!["Pyre-0", "Pyre-1"]);
    }

    #[test]
    fn test_invalid_area_changes_nothing() {
        let journal = Journal::new();
        let mut player = player(&journal);
        player.select_area(Some("Moras")).unwrap();
        player.set_danger_level(40).unwrap();
        journal.clear();

        let err = player.select_area(Some("Atlantis")).unwrap_err();
        assert_eq!(err.area, "Atlantis");
        assert!(journal.is_empty());
        assert_eq!(player.current_area(), Some(&AreaId::new("Moras")));
        assert_eq!(player.current_danger_level(), 40.0);
    }

    #[test]
    fn test_known_but_unloaded_area_is_invalid() {
        let journal = Journal::new();
        let mut player: AreaPlayer<MockLayer> = AreaPlayer::new(&MusicConfig::default()).unwrap();
        player.install_stack("Moras", journal.stack("Moras", 2)).unwrap();

        assert!(player.select_area(Some("Niveus")).is_err());
        assert!(player.select_area(Some("Moras")).is_ok());
        assert!(!player.is_loaded("Niveus"));
        assert_eq!(player.layer_count("Moras"), Some(2));
    }

    #[test]
    fn test_danger_change_only_touches_volumes() {
        let journal = Journal::new();
        let mut player = player(&journal);
        player.select_area(Some("Moras")).unwrap();
        journal.clear();

        player.set_danger_level(75.0).unwrap();
        assert_eq!(
            journal.calls(),
            vec![
                volume("Moras-0", 0.5),
                volume("Moras-1", 0.5),
                volume("Moras-2", 0.25),
            ]
        );
    }

    #[test]
    fn test_danger_while_silent_is_stored() {
        let journal = Journal::new();
        let mut player = player(&journal);

        player.set_danger_level(50_u8).unwrap();
        assert!(journal.is_empty());
        assert_eq!(player.current_danger_level(), 50.0);

        player.select_area(Some("Moras")).unwrap();
        assert_eq!(player.current_volumes(), vec![0.5, 0.5, 0.0]);
        assert_eq!(journal.last_volume("Moras-1"), Some(0.5));
    }

    #[test]
    fn test_invalid_danger_levels() {
        let journal = Journal::new();
        let mut player = player(&journal);
        player.select_area(Some("Moras")).unwrap();
        player.set_danger_level(20).unwrap();
        journal.clear();

        for bad in [-1.0, 101.0, f64::NAN, f64::INFINITY] {
            let err = player.set_danger_level(bad).unwrap_err();
            assert_eq!(err.max, 100.0);
        }
        assert!(player.set_danger_level(-1_i32).is_err());
        assert!(journal.is_empty());
        assert_eq!(player.current_danger_level(), 20.0);
    }

    #[test]
    fn test_boundary_danger_levels_accepted() {
        let journal = Journal::new();
        let mut player = player(&journal);
        player.select_area(Some("Moras")).unwrap();

        player.set_danger_level(0).unwrap();
        assert_eq!(player.current_volumes(), vec![0.5, 0.0, 0.0]);
        player.set_danger_level(100).unwrap();
        assert_eq!(player.current_volumes(), vec![0.5, 0.5, 0.5]);
    }

    #[test]
    fn test_empty_stack_is_playable() {
        let journal = Journal::new();
        let config = MusicConfig {
            areas: vec![AreaConfig::new("Void", 0.0, 0.0)],
            ..MusicConfig::default()
        };
        let mut loader = MockLoader::new(&journal, 0);
        let mut player = AreaPlayer::load_all(&config, &mut loader).unwrap();

        player.select_area(Some("Void")).unwrap();
        player.set_danger_level(60).unwrap();
        assert!(player.current_volumes().is_empty());
        assert!(player.active_layers().is_empty());
        assert!(journal.is_empty());
        assert!(!player.is_silent());
    }

    #[test]
    fn test_custom_scale() {
        let journal = Journal::new();
        let config = MusicConfig {
            max_audio_vol: 1.0,
            max_danger_level: 10.0,
            ..MusicConfig::default()
        };
        let mut loader = MockLoader::new(&journal, 2);
        let mut player = AreaPlayer::load_all(&config, &mut loader).unwrap();

        player.select_area(Some("Niveus")).unwrap();
        player.set_danger_level(5).unwrap();
        assert_eq!(player.current_volumes(), vec![1.0, 0.5]);
        assert!(player.set_danger_level(11).is_err());
    }

    #[test]
    fn test_install_stack_rules() {
        let journal = Journal::new();
        let mut player: AreaPlayer<MockLayer> = AreaPlayer::new(&MusicConfig::default()).unwrap();

        let err = player
            .install_stack("Atlantis", journal.stack("Atlantis", 1))
            .unwrap_err();
        assert_eq!(err.error_code(), "INVALID_AREA");

        player.install_stack("Pyre", journal.stack("Pyre", 1)).unwrap();
        let err = player
            .install_stack("Pyre", journal.stack("Pyre", 1))
            .unwrap_err();
        assert_eq!(err.error_code(), "LOAD_ERROR");
    }

    #[test]
    fn test_loader_failure_aborts_construction() {
        let journal = Journal::new();
        let mut loader = MockLoader::new(&journal, 3).failing("Niveus");
        let err = AreaPlayer::load_all(&MusicConfig::default(), &mut loader).unwrap_err();
        assert_eq!(err.error_code(), "LOAD_ERROR");
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = MusicConfig {
            max_audio_vol: 2.0,
            ..MusicConfig::default()
        };
        assert!(AreaPlayer::<MockLayer>::new(&config).is_err());
    }

    #[test]
    fn test_snapshot_and_display() {
        let journal = Journal::new();
        let mut player = player(&journal);
        player.select_area(Some("Pyre")).unwrap();
        player.set_danger_level(50).unwrap();

        let snapshot = player.snapshot();
        assert_eq!(snapshot.area.as_deref(), Some("Pyre"));
        assert_eq!(snapshot.volumes, vec![0.5, 0.25]);

        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["area"], "Pyre");
        assert_eq!(player.state().to_string(), "Active(Pyre, danger 50)");
    }
}
