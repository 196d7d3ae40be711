//! Layer stack loading
//!
//! A loader turns an [`Area`] into its ordered stack of playable layers,
//! base layer first. Layers come out trimmed so they loop without a gap;
//! the player takes that for granted.

use std::f64::consts::PI;

use crate::config::MAX_TRIM_SECS;
use crate::error::{MusicError, Result};
use crate::layers::{Area, TrimConfig};
use crate::playback::{LoopVoice, Mixer, Playable};

/// Length of a synthesized loop before trimming
pub const DEFAULT_LOOP_SECS: f64 = 2.0;

/// Longest loop the synth loader will render
pub const MAX_LOOP_SECS: f64 = 60.0;

/// Peak amplitude of the synthesized base layer
const BASE_AMPLITUDE: f64 = 0.5;

/// Produces the layer stack for an area
pub trait LayerStackLoader {
    type Layer: Playable;

    /// Load every layer of `area`, base layer first
    ///
    /// An empty stack is allowed; missing or unusable assets are errors.
    fn load(&mut self, area: &Area) -> Result<Vec<Self::Layer>>;
}

/// Cut the area's leading and trailing silence off a clip
///
/// Returns an empty vector if the trim covers the whole clip.
pub fn trim_loop(samples: &[f32], sample_rate: u32, trim: &TrimConfig) -> Vec<f32> {
    let lead = secs_to_frames(trim.lead_secs, sample_rate);
    let trail = secs_to_frames(trim.trail_secs, sample_rate);

    if lead.saturating_add(trail) >= samples.len() {
        return Vec::new();
    }
    samples[lead..samples.len() - trail].to_vec()
}

fn secs_to_frames(secs: f64, sample_rate: u32) -> usize {
    (secs.max(0.0) * sample_rate as f64).round() as usize
}

/// Loader that synthesizes tone layers onto a [`Mixer`]
///
/// Each area gets its own root pitch; layer `i` plays harmonic `i + 1` of
/// it, a little quieter per step. Every layer is rendered with the area's
/// lead and trail silence around a whole number of cycles, then trimmed,
/// so the trimmed loops wrap cleanly and share a common period.
#[derive(Debug, Clone)]
pub struct SynthLoader {
    mixer: Mixer,
    layers_per_area: usize,
    loop_secs: f64,
}

impl SynthLoader {
    pub fn new(mixer: Mixer, layers_per_area: usize) -> Self {
        Self {
            mixer,
            layers_per_area,
            loop_secs: DEFAULT_LOOP_SECS,
        }
    }

    pub fn with_loop_secs(mut self, loop_secs: f64) -> Self {
        self.loop_secs = loop_secs;
        self
    }

    pub fn mixer(&self) -> &Mixer {
        &self.mixer
    }

    /// Root pitch for an area, one of twelve semitones above A2
    pub fn root_frequency(area: &Area) -> f64 {
        let semitone = area.id().as_str().bytes().map(u32::from).sum::<u32>() % 12;
        110.0 * 2f64.powf(semitone as f64 / 12.0)
    }

    /// Reject loop and trim lengths too long to render
    fn check_lengths(&self, area: &Area) -> Result<()> {
        let trim = area.trim();
        let checks = [
            ("loop length", self.loop_secs, MAX_LOOP_SECS),
            ("lead trim", trim.lead_secs, MAX_TRIM_SECS),
            ("trail trim", trim.trail_secs, MAX_TRIM_SECS),
        ];
        for (label, secs, limit) in checks {
            if !(0.0..=limit).contains(&secs) {
                return Err(MusicError::Load {
                    area: area.id().to_string(),
                    reason: format!("{} must be between 0 and {} seconds, got {}", label, limit, secs),
                });
            }
        }
        Ok(())
    }

    /// Render one untrimmed layer: lead silence, tone, trail silence
    ///
    /// Lengths must already have passed `check_lengths`.
    fn render_layer(&self, area: &Area, layer: usize) -> Vec<f32> {
        let sample_rate = self.mixer.sample_rate();
        let trim = area.trim();
        let body = secs_to_frames(self.loop_secs, sample_rate);

        // Snap to a whole number of cycles over the loop body
        let target = Self::root_frequency(area) * (layer + 1) as f64;
        let cycles = (target * body as f64 / sample_rate as f64).round().max(1.0);
        let amplitude = BASE_AMPLITUDE / (layer + 1) as f64;

        let mut samples = vec![0.0_f32; secs_to_frames(trim.lead_secs, sample_rate)];
        samples.extend((0..body).map(|n| {
            let phase = 2.0 * PI * cycles * n as f64 / body as f64;
            (amplitude * phase.sin()) as f32
        }));
        samples.resize(samples.len() + secs_to_frames(trim.trail_secs, sample_rate), 0.0);
        samples
    }
}

impl LayerStackLoader for SynthLoader {
    type Layer = LoopVoice;

    fn load(&mut self, area: &Area) -> Result<Vec<LoopVoice>> {
        self.check_lengths(area)?;

        let sample_rate = self.mixer.sample_rate();
        let mut stack = Vec::with_capacity(self.layers_per_area);

        for layer in 0..self.layers_per_area {
            let raw = self.render_layer(area, layer);
            let trimmed = trim_loop(&raw, sample_rate, &area.trim());
            if trimmed.is_empty() {
                return Err(MusicError::Load {
                    area: area.id().to_string(),
                    reason: format!("layer {} is empty after trimming", layer),
                });
            }
            stack.push(self.mixer.add_loop(trimmed));
        }

        log::info!(
            "Synthesized {} layers for {} ({:.1} Hz root)",
            stack.len(),
            area.id(),
            Self::root_frequency(area)
        );
        Ok(stack)
    }
}
