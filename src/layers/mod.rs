//! Areas and their layer stacks
//!
//! - [`Area`]: a named location plus the silence to trim from its layers
//! - [`LayerStackLoader`]: produces the ordered layers for an area

mod area;
pub mod loader;

pub use area::{Area, AreaId, TrimConfig};
pub use loader::{trim_loop, LayerStackLoader, SynthLoader};
