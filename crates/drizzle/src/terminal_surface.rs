//! Terminal rectangle used as the particle surface.

use drizzle_emitter::{CellMetrics, Overflow, ParticleKind, Size, Surface};
use ratatui::layout::Rect;

/// A region of the terminal particles fall through.
///
/// Sizes are reported in surface pixels, one cell being
/// `CellMetrics::width_px × CellMetrics::height_px`.
#[derive(Debug, Clone, Default)]
pub struct TerminalSurface {
    area: Rect,
    cell: CellMetrics,
    overflow: Overflow,
    marker: Option<ParticleKind>,
    hidden: bool,
    layer_mounted: bool,
}

impl TerminalSurface {
    pub fn area(&self) -> Rect {
        self.area
    }

    /// Follow the terminal layout; called every frame so resizes apply to the
    /// next spawn.
    pub fn set_area(&mut self, area: Rect) {
        self.area = area;
    }

    pub fn cell(&self) -> CellMetrics {
        self.cell
    }

    pub fn toggle_display(&mut self) {
        self.hidden = !self.hidden;
    }

    pub fn has_layer(&self) -> bool {
        self.layer_mounted
    }
}

impl Surface for TerminalSurface {
    fn size(&self) -> Size {
        Size::new(
            f32::from(self.area.width) * self.cell.width_px,
            f32::from(self.area.height) * self.cell.height_px,
        )
    }

    fn overflow(&self) -> Overflow {
        self.overflow
    }

    fn set_overflow(&mut self, overflow: Overflow) {
        self.overflow = overflow;
    }

    fn kind_marker(&self) -> Option<ParticleKind> {
        self.marker
    }

    fn set_kind_marker(&mut self, kind: Option<ParticleKind>) {
        self.marker = kind;
    }

    fn mount_layer(&mut self) {
        self.layer_mounted = true;
    }

    fn unmount_layer(&mut self) {
        self.layer_mounted = false;
    }

    fn is_displayed(&self) -> bool {
        !self.hidden
    }
}
