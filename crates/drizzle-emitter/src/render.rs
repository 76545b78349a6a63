//! Drawing particles into a ratatui buffer.

use ratatui::{
    buffer::Buffer,
    layout::{Position, Rect},
    widgets::Widget,
};

use crate::controller::RenderedParticle;
use crate::stylesheet::Stylesheet;

/// Size of one terminal cell in surface pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellMetrics {
    pub width_px: f32,
    pub height_px: f32,
}

impl Default for CellMetrics {
    fn default() -> Self {
        // Terminal cells are roughly twice as tall as they are wide.
        Self {
            width_px: 8.0,
            height_px: 16.0,
        }
    }
}

/// Widget drawing particles positioned relative to a surface rectangle.
///
/// With `clip` set, particles outside the surface are skipped; otherwise they
/// may land anywhere in the render area.
#[derive(Debug)]
pub struct ParticleCanvas<'a> {
    particles: &'a [RenderedParticle],
    stylesheet: &'a Stylesheet,
    surface: Rect,
    cell: CellMetrics,
    clip: bool,
}

impl<'a> ParticleCanvas<'a> {
    pub fn new(particles: &'a [RenderedParticle], stylesheet: &'a Stylesheet, surface: Rect) -> Self {
        Self {
            particles,
            stylesheet,
            surface,
            cell: CellMetrics::default(),
            clip: false,
        }
    }

    pub fn cell(mut self, cell: CellMetrics) -> Self {
        self.cell = cell;
        self
    }

    pub fn clip(mut self, clip: bool) -> Self {
        self.clip = clip;
        self
    }

    /// Terminal cell a particle falls in, if it is addressable.
    fn cell_of(&self, particle: &RenderedParticle) -> Option<Position> {
        let col = f32::from(self.surface.x) + (particle.position.x / self.cell.width_px).floor();
        let row = f32::from(self.surface.y) + (particle.position.y / self.cell.height_px).floor();
        let range = 0.0..=f32::from(u16::MAX);
        if !range.contains(&col) || !range.contains(&row) {
            return None;
        }
        Some(Position::new(col as u16, row as u16))
    }
}

impl Widget for ParticleCanvas<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let bounds = if self.clip {
            self.surface.intersection(area)
        } else {
            area
        };

        for particle in self.particles {
            let Some(position) = self.cell_of(particle) else {
                continue;
            };
            if !bounds.contains(position) {
                continue;
            }
            if let Some(cell) = buf.cell_mut(position) {
                cell.set_char(self.stylesheet.glyph(particle))
                    .set_style(self.stylesheet.style(particle));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use drizzle_core::{ParticleKind, Point};

    use super::*;
    use crate::layer::Layer;

    fn particle_at(x: f32, y: f32) -> RenderedParticle {
        let mut layer = Layer::new();
        let id = layer.append(ParticleKind::Rain, 5.0, 0.0, Point::new(x, y));
        RenderedParticle {
            id,
            kind: ParticleKind::Rain,
            size: 5.0,
            angle: 0.0,
            position: Point::new(x, y),
            frozen: false,
        }
    }

    #[test]
    fn test_particle_lands_in_surface_cell() {
        let area = Rect::new(0, 0, 20, 10);
        let surface = Rect::new(2, 1, 10, 5);
        let particles = [particle_at(17.0, 33.0)];
        let mut buf = Buffer::empty(area);

        ParticleCanvas::new(&particles, Stylesheet::install(), surface).render(area, &mut buf);

        // 17px / 8 -> column 2, 33px / 16 -> row 2, offset by the surface origin
        assert_eq!(buf[Position::new(4, 3)].symbol(), "|");
    }

    #[test]
    fn test_clip_hides_particles_outside_surface() {
        let area = Rect::new(0, 0, 20, 10);
        let surface = Rect::new(2, 1, 4, 4);
        // 10 cells to the right of the surface origin, outside its width
        let particles = [particle_at(80.0, 0.0)];

        let mut clipped = Buffer::empty(area);
        ParticleCanvas::new(&particles, Stylesheet::install(), surface)
            .clip(true)
            .render(area, &mut clipped);
        assert_eq!(clipped[Position::new(12, 1)].symbol(), " ");

        let mut overflowing = Buffer::empty(area);
        ParticleCanvas::new(&particles, Stylesheet::install(), surface)
            .render(area, &mut overflowing);
        assert_eq!(overflowing[Position::new(12, 1)].symbol(), "|");
    }

    #[test]
    fn test_particles_above_the_surface_are_skipped() {
        let area = Rect::new(0, 0, 10, 10);
        let particles = [particle_at(8.0, -5.0)];
        let mut buf = Buffer::empty(area);
        ParticleCanvas::new(&particles, Stylesheet::install(), Rect::new(0, 0, 10, 10))
            .render(area, &mut buf);
        assert!((0..10).all(|x| buf[Position::new(x, 0)].symbol() == " "));
    }
}
