//! Areas and their trim settings

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Name of an in-game area with its own layer stack
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AreaId(String);

impl AreaId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AreaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for AreaId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for AreaId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for AreaId {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// Silence to cut from the start and end of each layer so it loops cleanly
///
/// Only loaders look at this; the player never does.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TrimConfig {
    /// Leading silence in seconds
    pub lead_secs: f64,
    /// Trailing silence in seconds
    pub trail_secs: f64,
}

impl TrimConfig {
    pub fn new(lead_secs: f64, trail_secs: f64) -> Self {
        Self {
            lead_secs,
            trail_secs,
        }
    }

    /// Total seconds removed from a layer
    pub fn total_secs(&self) -> f64 {
        self.lead_secs + self.trail_secs
    }
}

/// An area: immutable once defined
#[derive(Debug, Clone, PartialEq)]
pub struct Area {
    id: AreaId,
    trim: TrimConfig,
}

impl Area {
    pub fn new(id: impl Into<AreaId>, trim: TrimConfig) -> Self {
        Self {
            id: id.into(),
            trim,
        }
    }

    pub fn id(&self) -> &AreaId {
        &self.id
    }

    pub fn trim(&self) -> TrimConfig {
        self.trim
    }
}
