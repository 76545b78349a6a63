//! Rain and snow particle emitter.
//!
//! A [`ParticleEmitter`] spawns particles into a host [`Surface`] at an
//! interval derived from its density and removes each one when its fall
//! completes. Time is virtual: the host drives the emitter with
//! [`ParticleEmitter::advance_to`], which runs timers and transition ends in
//! order on a single thread.

mod chars;
mod controller;
mod layer;
mod render;
mod scheduler;
mod stylesheet;
mod surface;

pub use controller::{ParticleEmitter, RenderedParticle, Setup, add_particles};
pub use drizzle_core::{
    Density, EmitterError, Overflow, ParticleKind, Point, Settings, Size, geometry,
};
pub use layer::{Layer, Particle, ParticleId};
pub use render::{CellMetrics, ParticleCanvas};
pub use scheduler::{TimerId, Timers};
pub use stylesheet::{ParticleStyle, Stylesheet};
pub use surface::{MemorySurface, Surface};
