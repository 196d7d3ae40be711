//! Journaling test double for [`Playable`]
//!
//! Every layer created from the same [`Journal`] appends to one shared,
//! ordered call log, so tests can assert on exactly what the player did and
//! in which order.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::error::{MusicError, Result};
use crate::layers::{Area, LayerStackLoader};
use crate::playback::Playable;

/// One call made on a [`MockLayer`]
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackCall {
    PlayLooping { layer: String },
    Stop { layer: String },
    SetVolume { layer: String, volume: f32 },
}

impl PlaybackCall {
    pub fn layer(&self) -> &str {
        match self {
            PlaybackCall::PlayLooping { layer }
            | PlaybackCall::Stop { layer }
            | PlaybackCall::SetVolume { layer, .. } => layer,
        }
    }
}

/// Shared, ordered call log
#[derive(Debug, Clone, Default)]
pub struct Journal {
    calls: Rc<RefCell<Vec<PlaybackCall>>>,
}

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a layer that records into this journal
    pub fn layer(&self, label: impl Into<String>) -> MockLayer {
        MockLayer {
            label: label.into(),
            volume: None,
            playing: false,
            journal: self.clone(),
        }
    }

    /// Create `count` layers labelled `"{prefix}-0"`, `"{prefix}-1"`, ...
    pub fn stack(&self, prefix: &str, count: usize) -> Vec<MockLayer> {
        (0..count)
            .map(|i| self.layer(format!("{}-{}", prefix, i)))
            .collect()
    }

    pub fn calls(&self) -> Vec<PlaybackCall> {
        self.calls.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.calls.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.borrow().is_empty()
    }

    pub fn clear(&self) {
        self.calls.borrow_mut().clear();
    }

    /// Labels of layers stopped, in call order
    pub fn stopped(&self) -> Vec<String> {
        self.filter_labels(|c| matches!(c, PlaybackCall::Stop { .. }))
    }

    /// Labels of layers started, in call order
    pub fn started(&self) -> Vec<String> {
        self.filter_labels(|c| matches!(c, PlaybackCall::PlayLooping { .. }))
    }

    /// Most recent volume set on `label`
    pub fn last_volume(&self, label: &str) -> Option<f32> {
        self.calls.borrow().iter().rev().find_map(|c| match c {
            PlaybackCall::SetVolume { layer, volume } if layer == label => Some(*volume),
            _ => None,
        })
    }

    fn filter_labels(&self, keep: impl Fn(&PlaybackCall) -> bool) -> Vec<String> {
        self.calls
            .borrow()
            .iter()
            .filter(|c| keep(*c))
            .map(|c| c.layer().to_string())
            .collect()
    }

    fn record(&self, call: PlaybackCall) {
        self.calls.borrow_mut().push(call);
    }
}

/// A layer that plays nothing and remembers everything
#[derive(Debug)]
pub struct MockLayer {
    label: String,
    volume: Option<f32>,
    playing: bool,
    journal: Journal,
}

impl MockLayer {
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn volume(&self) -> Option<f32> {
        self.volume
    }
}

impl Playable for MockLayer {
    fn play_looping(&mut self) {
        self.playing = true;
        self.journal.record(PlaybackCall::PlayLooping {
            layer: self.label.clone(),
        });
    }

    fn stop(&mut self) {
        self.playing = false;
        self.journal.record(PlaybackCall::Stop {
            layer: self.label.clone(),
        });
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = Some(volume);
        self.journal.record(PlaybackCall::SetVolume {
            layer: self.label.clone(),
            volume,
        });
    }
}

/// Loader handing out [`MockLayer`] stacks of configurable size
///
/// Areas without an explicit count get `default_layers`. Layers are
/// labelled `"{area}-{index}"`.
#[derive(Debug, Clone)]
pub struct MockLoader {
    journal: Journal,
    default_layers: usize,
    layer_counts: HashMap<String, usize>,
    failing: Vec<String>,
}

impl MockLoader {
    pub fn new(journal: &Journal, default_layers: usize) -> Self {
        Self {
            journal: journal.clone(),
            default_layers,
            layer_counts: HashMap::new(),
            failing: Vec::new(),
        }
    }

    pub fn with_layers(mut self, area: &str, count: usize) -> Self {
        self.layer_counts.insert(area.to_string(), count);
        self
    }

    /// Make loading `area` fail, as a missing asset would
    pub fn failing(mut self, area: &str) -> Self {
        self.failing.push(area.to_string());
        self
    }
}

impl LayerStackLoader for MockLoader {
    type Layer = MockLayer;

    fn load(&mut self, area: &Area) -> Result<Vec<MockLayer>> {
        let name = area.id().as_str();
        if self.failing.iter().any(|f| f == name) {
            return Err(MusicError::Load {
                area: name.to_string(),
                reason: "asset missing".to_string(),
            });
        }
        let count = self
            .layer_counts
            .get(name)
            .copied()
            .unwrap_or(self.default_layers);
        Ok(self.journal.stack(name, count))
    }
}
