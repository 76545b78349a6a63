//! Host surfaces particles are rendered into.

use drizzle_core::{Overflow, ParticleKind, Size};

/// A host area an emitter renders particles into.
///
/// The emitter queries the size on every spawn since the surface may be
/// resized between ticks.
pub trait Surface {
    /// Current dimensions in pixels.
    fn size(&self) -> Size;

    fn overflow(&self) -> Overflow;

    fn set_overflow(&mut self, overflow: Overflow);

    /// Kind marker used purely as a styling hook.
    fn kind_marker(&self) -> Option<ParticleKind>;

    fn set_kind_marker(&mut self, kind: Option<ParticleKind>);

    /// Attach the emitter's particle layer.
    fn mount_layer(&mut self);

    /// Detach the emitter's particle layer.
    fn unmount_layer(&mut self);

    /// Whether the surface is displayed. Hidden surfaces never report
    /// transition completion.
    fn is_displayed(&self) -> bool {
        true
    }
}

/// Headless surface that records what the emitter does to it.
#[derive(Debug, Clone, PartialEq)]
pub struct MemorySurface {
    pub size: Size,
    pub overflow: Overflow,
    pub marker: Option<ParticleKind>,
    pub displayed: bool,
    pub mounted_layers: usize,
}

impl MemorySurface {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            size: Size::new(width, height),
            overflow: Overflow::Visible,
            marker: None,
            displayed: true,
            mounted_layers: 0,
        }
    }
}

impl Default for MemorySurface {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

impl Surface for MemorySurface {
    fn size(&self) -> Size {
        self.size
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
        self.mounted_layers += 1;
    }

    fn unmount_layer(&mut self) {
        self.mounted_layers = self.mounted_layers.saturating_sub(1);
    }

    fn is_displayed(&self) -> bool {
        self.displayed
    }
}
