//! Core types for the drizzle particle emitter.
//!
//! Holds the value types shared by the emitter, the configuration loader and
//! the terminal application: particle kinds, densities, surface overflow,
//! emitter settings, the error taxonomy and the geometry helpers used to place
//! falling particles.

mod error;
pub mod geometry;
mod types;

pub use error::EmitterError;
pub use geometry::{Point, Size};
pub use types::{Density, Overflow, ParticleKind, Settings};
