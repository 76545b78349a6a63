//! Emitter error taxonomy.

use thiserror::Error;

/// Errors raised synchronously by emitter construction and setters.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EmitterError {
    /// A required construction option was not supplied.
    #[error("constructor error: missing required option `{0}`")]
    MissingOption(&'static str),
    /// Particle size must be a positive number of pixels.
    #[error("particle size must be positive, got {0}")]
    InvalidSize(f32),
    /// Fall duration must be a positive number of milliseconds.
    #[error("fall duration must be positive")]
    InvalidDuration,
    /// Particle kind outside the known set.
    #[error("unknown type `{0}`")]
    UnknownType(String),
    /// Density outside the known set.
    #[error("unknown density `{0}`")]
    UnknownDensity(String),
    /// Fall angle outside the open interval (-90°, 90°).
    #[error("angle {0}° not supported, expected a value strictly between -90° and 90°")]
    AngleNotSupported(f32),
}
