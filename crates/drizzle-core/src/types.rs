//! Particle kinds, densities and emitter settings.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::EmitterError;

/// Kind of particle the emitter spawns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParticleKind {
    #[default]
    Rain,
    Snow,
}

impl ParticleKind {
    /// Every known kind, in cycling order.
    pub const ALL: [ParticleKind; 2] = [ParticleKind::Rain, ParticleKind::Snow];

    /// Name used for the surface marker and in configuration files.
    pub fn as_str(self) -> &'static str {
        match self {
            ParticleKind::Rain => "rain",
            ParticleKind::Snow => "snow",
        }
    }

    /// Cycle to the next kind.
    pub fn next(self) -> Self {
        match self {
            ParticleKind::Rain => ParticleKind::Snow,
            ParticleKind::Snow => ParticleKind::Rain,
        }
    }
}

impl fmt::Display for ParticleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParticleKind {
    type Err = EmitterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ParticleKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| EmitterError::UnknownType(s.to_string()))
    }
}

/// Qualitative spawn rate, mapped to a fixed timer interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Density {
    Low,
    #[default]
    Normal,
    Dense,
    Storm,
}

impl Density {
    /// Every known density, from sparsest to densest.
    pub const ALL: [Density; 4] = [
        Density::Low,
        Density::Normal,
        Density::Dense,
        Density::Storm,
    ];

    /// Spawn interval in milliseconds. Denser settings spawn more often.
    pub fn interval_ms(self) -> u64 {
        match self {
            Density::Low => 400,
            Density::Normal => 200,
            Density::Dense => 120,
            Density::Storm => 20,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Density::Low => "low",
            Density::Normal => "normal",
            Density::Dense => "dense",
            Density::Storm => "storm",
        }
    }

    /// Cycle to the next density, wrapping from storm back to low.
    pub fn next(self) -> Self {
        match self {
            Density::Low => Density::Normal,
            Density::Normal => Density::Dense,
            Density::Dense => Density::Storm,
            Density::Storm => Density::Low,
        }
    }
}

impl fmt::Display for Density {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Density {
    type Err = EmitterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Density::ALL
            .into_iter()
            .find(|density| density.as_str() == s)
            .ok_or_else(|| EmitterError::UnknownDensity(s.to_string()))
    }
}

/// Overflow behaviour of a host surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Overflow {
    /// Particles may be drawn outside the surface bounds.
    #[default]
    Visible,
    /// Particles are clipped to the surface bounds.
    Hidden,
}

/// Emitter settings, everything but the surface handle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Particle kind.
    pub kind: ParticleKind,
    /// Time a particle takes to cross the surface, in milliseconds.
    pub fall_duration_ms: u64,
    /// Spawn rate.
    pub density: Density,
    /// Particle edge length in surface pixels.
    pub particle_size: f32,
    /// Clip the surface overflow while the emitter is active.
    pub clip_overflow: bool,
    /// Start spawning immediately.
    pub active: bool,
    /// Fall angle in degrees; positive drifts right.
    pub angle: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            kind: ParticleKind::Rain,
            fall_duration_ms: 3000,
            density: Density::Normal,
            particle_size: 5.0,
            clip_overflow: false,
            active: true,
            angle: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_density_interval_ordering() {
        let storm = Density::Storm.interval_ms();
        let dense = Density::Dense.interval_ms();
        let normal = Density::Normal.interval_ms();
        let low = Density::Low.interval_ms();
        assert!(storm < dense);
        assert!(dense < normal);
        assert!(normal < low);
    }

    #[test]
    fn test_parse_kind() {
        assert_eq!("rain".parse::<ParticleKind>(), Ok(ParticleKind::Rain));
        assert_eq!("snow".parse::<ParticleKind>(), Ok(ParticleKind::Snow));
        assert_eq!(
            "hail".parse::<ParticleKind>(),
            Err(EmitterError::UnknownType("hail".to_string()))
        );
    }

    #[test]
    fn test_parse_density() {
        for density in Density::ALL {
            assert_eq!(density.as_str().parse::<Density>(), Ok(density));
        }
        assert_eq!(
            "Storm".parse::<Density>(),
            Err(EmitterError::UnknownDensity("Storm".to_string()))
        );
    }

    #[test]
    fn test_cycling_visits_every_value() {
        let mut density = Density::Low;
        for _ in 0..Density::ALL.len() {
            density = density.next();
        }
        assert_eq!(density, Density::Low);
        assert_eq!(ParticleKind::Rain.next().next(), ParticleKind::Rain);
    }

    #[test]
    fn test_settings_default() {
        let settings = Settings::default();
        assert_eq!(settings.kind, ParticleKind::Rain);
        assert_eq!(settings.fall_duration_ms, 3000);
        assert_eq!(settings.density, Density::Normal);
        assert_eq!(settings.particle_size, 5.0);
        assert!(!settings.clip_overflow);
        assert!(settings.active);
        assert_eq!(settings.angle, 0.0);
    }
}
