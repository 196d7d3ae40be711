//! Playback primitives
//!
//! The player only ever asks a layer to loop, stop, or change volume.
//! Anything that can do those three things can be a layer:
//! - [`LoopVoice`]: a voice on the in-process software [`Mixer`]
//! - [`MockLayer`]: records calls into a [`Journal`] for tests

pub mod mixer;
pub mod mock;

pub use mixer::{LoopVoice, Mixer, RenderStats};
pub use mock::{Journal, MockLayer, MockLoader, PlaybackCall};

/// A loop-capable sound handle
///
/// Layers are assumed to be pre-trimmed so they loop seamlessly; the player
/// never asks about position or duration.
pub trait Playable {
    /// Begin playing from the top, looping forever
    fn play_looping(&mut self);

    /// Stop playback
    fn stop(&mut self);

    /// Set the playback volume, 0.0 (silent) to 1.0 (engine full scale)
    fn set_volume(&mut self, volume: f32);
}

impl<P: Playable + ?Sized> Playable for Box<P> {
    fn play_looping(&mut self) {
        (**self).play_looping()
    }

    fn stop(&mut self) {
        (**self).stop()
    }

    fn set_volume(&mut self, volume: f32) {
        (**self).set_volume(volume)
    }
}
