//! oddio-backed loop mixer
//!
//! Each [`LoopVoice`] owns one pre-trimmed mono loop. Starting a voice plays
//! a fresh `Gain<Cycle<_>>` chain on the shared oddio mixer, so every start
//! begins at the top of the loop; stopping or dropping the voice stops that
//! chain and oddio releases it on the next render.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::Arc;

use oddio::{Cycle, Frames, Gain, GainControl, Mixed, MixerControl};

use crate::playback::Playable;

/// Frames rendered per oddio call when measuring
const RENDER_BLOCK: usize = 1024;

/// Peak and RMS of a rendered block
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RenderStats {
    pub peak: f32,
    pub rms: f32,
}

impl RenderStats {
    pub fn measure(block: &[f32]) -> Self {
        let mut meter = Meter::default();
        meter.add(block);
        meter.finish()
    }
}

#[derive(Default)]
struct Meter {
    peak: f32,
    sum_sq: f64,
    count: usize,
}

impl Meter {
    fn add(&mut self, block: &[f32]) {
        for s in block {
            self.peak = self.peak.max(s.abs());
            self.sum_sq += (*s as f64) * (*s as f64);
        }
        self.count += block.len();
    }

    fn finish(self) -> RenderStats {
        if self.count == 0 {
            return RenderStats::default();
        }
        RenderStats {
            peak: self.peak,
            rms: (self.sum_sq / self.count as f64).sqrt() as f32,
        }
    }
}

struct Engine {
    control: MixerControl<f32>,
    output: oddio::Mixer<f32>,
    /// Playing flag of every voice handed out; dead entries belong to dropped voices
    voices: Vec<Weak<Cell<bool>>>,
}

impl Engine {
    fn prune(&mut self) {
        self.voices.retain(|flag| flag.strong_count() > 0);
    }
}

/// Mono mixer over an oddio [`oddio::Mixer`]
///
/// Cloning yields another handle onto the same engine. The engine is
/// rendered on demand through [`Mixer::render`].
#[derive(Clone)]
pub struct Mixer {
    sample_rate: u32,
    engine: Rc<RefCell<Engine>>,
}

impl Mixer {
    pub fn new(sample_rate: u32) -> Self {
        let (control, output) = oddio::Mixer::new();
        Self {
            sample_rate,
            engine: Rc::new(RefCell::new(Engine {
                control,
                output,
                voices: Vec::new(),
            })),
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Register a loop and return the handle controlling it
    ///
    /// The voice starts stopped at volume 1.0.
    pub fn add_loop(&self, samples: Vec<f32>) -> LoopVoice {
        let playing = Rc::new(Cell::new(false));
        self.engine.borrow_mut().voices.push(Rc::downgrade(&playing));

        LoopVoice {
            engine: Rc::clone(&self.engine),
            frames: Frames::from_slice(self.sample_rate, &samples),
            volume: 1.0,
            playing,
            live: None,
        }
    }

    /// Voices that have not been dropped
    pub fn voice_count(&self) -> usize {
        let mut engine = self.engine.borrow_mut();
        engine.prune();
        engine.voices.len()
    }

    pub fn playing_count(&self) -> usize {
        let mut engine = self.engine.borrow_mut();
        engine.prune();
        engine
            .voices
            .iter()
            .filter_map(Weak::upgrade)
            .filter(|flag| flag.get())
            .count()
    }

    /// Mix every playing voice into `out`, overwriting it
    pub fn render(&self, out: &mut [f32]) {
        let mut engine = self.engine.borrow_mut();
        oddio::run(&mut engine.output, self.sample_rate, out);
    }

    /// Render `secs` seconds and measure the result
    ///
    /// Renders block by block; non-finite or negative durations render nothing.
    pub fn render_stats(&self, secs: f64) -> RenderStats {
        let mut remaining = if secs.is_finite() && secs > 0.0 {
            (secs * self.sample_rate as f64).round() as usize
        } else {
            0
        };

        let mut block = [0.0_f32; RENDER_BLOCK];
        let mut meter = Meter::default();
        while remaining > 0 {
            let n = remaining.min(RENDER_BLOCK);
            self.render(&mut block[..n]);
            meter.add(&block[..n]);
            remaining -= n;
        }
        meter.finish()
    }
}

impl fmt::Debug for Mixer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mixer")
            .field("sample_rate", &self.sample_rate)
            .field("voices", &self.engine.borrow().voices.len())
            .finish()
    }
}

/// The oddio chain currently playing a voice
struct Live {
    mixed: Mixed,
    gain: GainControl,
}

/// Control handle for one loop on a [`Mixer`]
///
/// Dropping the handle stops the loop.
pub struct LoopVoice {
    engine: Rc<RefCell<Engine>>,
    frames: Arc<Frames<f32>>,
    volume: f32,
    playing: Rc<Cell<bool>>,
    live: Option<Live>,
}

impl LoopVoice {
    pub fn is_playing(&self) -> bool {
        self.playing.get()
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    /// Loop length in samples
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    fn halt(&mut self) {
        if let Some(mut live) = self.live.take() {
            live.mixed.stop();
        }
    }
}

impl Playable for LoopVoice {
    fn play_looping(&mut self) {
        self.halt();
        self.playing.set(true);

        // Cycle cannot wrap a zero-length loop
        if self.frames.is_empty() {
            return;
        }

        let (gain, mut signal) = Gain::new(Cycle::new(Arc::clone(&self.frames)));
        signal.set_amplitude_ratio(self.volume);
        let mixed = self.engine.borrow_mut().control.play(signal);
        self.live = Some(Live { mixed, gain });
    }

    fn stop(&mut self) {
        self.halt();
        self.playing.set(false);
    }

    fn set_volume(&mut self, volume: f32) {
        let volume = if volume.is_nan() { 0.0 } else { volume.clamp(0.0, 1.0) };
        self.volume = volume;
        if let Some(live) = &mut self.live {
            live.gain.set_amplitude_ratio(volume);
        }
    }
}

impl Drop for LoopVoice {
    fn drop(&mut self) {
        self.halt();
    }
}

impl fmt::Debug for LoopVoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoopVoice")
            .field("len", &self.frames.len())
            .field("volume", &self.volume)
            .field("playing", &self.playing.get())
            .finish()
    }
}
