//! Process-wide particle styles.
//!
//! The stylesheet is installed once per process and shared by every emitter.

use std::sync::OnceLock;

use drizzle_core::ParticleKind;
use log::info;
use ratatui::style::{Color, Modifier, Style};

use crate::chars::{RAIN_CHARS, SNOW_CHARS};
use crate::controller::RenderedParticle;

static STYLESHEET: OnceLock<Stylesheet> = OnceLock::new();

/// Rain falling within this many degrees of vertical is drawn straight.
const STRAIGHT_RAIN_DEGREES: f32 = 10.0;

/// Appearance of one particle kind.
#[derive(Debug, Clone, PartialEq)]
pub struct ParticleStyle {
    pub glyphs: &'static [char],
    pub style: Style,
}

/// Styles for every particle kind and for the particle container.
#[derive(Debug, Clone, PartialEq)]
pub struct Stylesheet {
    rain: ParticleStyle,
    snow: ParticleStyle,
    container: Style,
}

impl Stylesheet {
    /// Install the stylesheet, or return the one already installed.
    pub fn install() -> &'static Stylesheet {
        let mut created = false;
        let sheet = STYLESHEET.get_or_init(|| {
            created = true;
            Self::build()
        });
        if created {
            info!("particle stylesheet installed");
        }
        sheet
    }

    /// The installed stylesheet, if any emitter has been created yet.
    pub fn installed() -> Option<&'static Stylesheet> {
        STYLESHEET.get()
    }

    fn build() -> Self {
        Self {
            rain: ParticleStyle {
                glyphs: RAIN_CHARS,
                style: Style::new().fg(Color::Rgb(100, 120, 150)),
            },
            snow: ParticleStyle {
                glyphs: SNOW_CHARS,
                style: Style::new().fg(Color::Rgb(65, 105, 225)),
            },
            container: Style::new().fg(Color::Rgb(80, 80, 100)),
        }
    }

    pub fn particle(&self, kind: ParticleKind) -> &ParticleStyle {
        match kind {
            ParticleKind::Rain => &self.rain,
            ParticleKind::Snow => &self.snow,
        }
    }

    /// Style of the box surrounding the particles.
    pub fn container(&self) -> Style {
        self.container
    }

    /// Glyph for a particle: rain by fall direction, snow by size.
    pub fn glyph(&self, particle: &RenderedParticle) -> char {
        let glyphs = self.particle(particle.kind).glyphs;
        let idx = match particle.kind {
            ParticleKind::Rain if particle.angle.abs() < STRAIGHT_RAIN_DEGREES => 0,
            ParticleKind::Rain if particle.angle > 0.0 => 1,
            ParticleKind::Rain => 2,
            ParticleKind::Snow => match particle.size {
                s if s < 3.0 => 0,
                s if s < 6.0 => 1,
                s if s < 10.0 => 2,
                _ => 3,
            },
        };
        glyphs[idx.min(glyphs.len() - 1)]
    }

    /// Style for a particle. Frozen particles are dimmed.
    pub fn style(&self, particle: &RenderedParticle) -> Style {
        let style = self.particle(particle.kind).style;
        if particle.frozen {
            style.add_modifier(Modifier::DIM)
        } else {
            style
        }
    }
}
