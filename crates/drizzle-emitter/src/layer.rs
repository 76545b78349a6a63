//! The particle container owned by an emitter.

use std::collections::BTreeMap;

use drizzle_core::{ParticleKind, Point};

/// Identifier of a particle within its layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParticleId(u64);

#[derive(Debug, Clone, Copy, PartialEq)]
enum Motion {
    /// Appended, transition not started yet.
    Resting,
    /// Linear transition from `from` to `to`.
    Falling { started_ms: u64, duration_ms: u64 },
    /// Pinned at `from` with the fall time left when it was frozen.
    Frozen { remaining_ms: u64 },
}

/// A single falling sprite.
#[derive(Debug, Clone)]
pub struct Particle {
    id: ParticleId,
    kind: ParticleKind,
    size: f32,
    angle: f32,
    origin: Point,
    from: Point,
    to: Point,
    motion: Motion,
}

impl Particle {
    pub fn id(&self) -> ParticleId {
        self.id
    }

    pub fn kind(&self) -> ParticleKind {
        self.kind
    }

    pub fn size(&self) -> f32 {
        self.size
    }

    /// Fall angle in degrees at spawn time.
    pub fn angle(&self) -> f32 {
        self.angle
    }

    /// Position the particle was spawned at.
    pub fn origin(&self) -> Point {
        self.origin
    }

    /// Position the particle is heading to.
    pub fn destination(&self) -> Point {
        self.to
    }

    pub fn is_frozen(&self) -> bool {
        matches!(self.motion, Motion::Frozen { .. })
    }

    /// Position at `now_ms`.
    pub fn position_at(&self, now_ms: u64) -> Point {
        match self.motion {
            Motion::Resting | Motion::Frozen { .. } => self.from,
            Motion::Falling {
                started_ms,
                duration_ms,
            } => {
                if duration_ms == 0 {
                    return self.to;
                }
                let t = now_ms.saturating_sub(started_ms) as f32 / duration_ms as f32;
                self.from.lerp(self.to, t)
            }
        }
    }

    /// Time the running transition completes, if one is running.
    pub fn transition_end_ms(&self) -> Option<u64> {
        match self.motion {
            Motion::Falling {
                started_ms,
                duration_ms,
            } => Some(started_ms.saturating_add(duration_ms)),
            _ => None,
        }
    }
}

/// Ordered collection of live particles.
#[derive(Debug, Default)]
pub struct Layer {
    next_id: u64,
    particles: BTreeMap<ParticleId, Particle>,
}

impl Layer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a resting particle at `at`.
    pub fn append(&mut self, kind: ParticleKind, size: f32, angle: f32, at: Point) -> ParticleId {
        let id = ParticleId(self.next_id);
        self.next_id += 1;
        self.particles.insert(
            id,
            Particle {
                id,
                kind,
                size,
                angle,
                origin: at,
                from: at,
                to: at,
                motion: Motion::Resting,
            },
        );
        id
    }

    /// Start a linear transition from the current position to `to`.
    pub fn start_transition(&mut self, id: ParticleId, to: Point, now_ms: u64, duration_ms: u64) -> bool {
        let Some(particle) = self.particles.get_mut(&id) else {
            return false;
        };
        particle.from = particle.position_at(now_ms);
        particle.to = to;
        particle.motion = Motion::Falling {
            started_ms: now_ms,
            duration_ms,
        };
        true
    }

    pub fn remove(&mut self, id: ParticleId) -> Option<Particle> {
        self.particles.remove(&id)
    }

    /// Remove every particle.
    pub fn clear(&mut self) {
        self.particles.clear();
    }

    pub fn get(&self, id: ParticleId) -> Option<&Particle> {
        self.particles.get(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Particle> {
        self.particles.values()
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Earliest running transition to complete.
    pub fn next_transition_end(&self) -> Option<(u64, ParticleId)> {
        self.particles
            .values()
            .filter_map(|p| p.transition_end_ms().map(|end| (end, p.id)))
            .min()
    }

    /// Pin every falling particle at its position at `now_ms`.
    /// Returns the ids that were frozen.
    pub fn freeze_all(&mut self, now_ms: u64) -> Vec<ParticleId> {
        let mut frozen = Vec::new();
        for particle in self.particles.values_mut() {
            if let Some(end_ms) = particle.transition_end_ms() {
                particle.from = particle.position_at(now_ms);
                particle.motion = Motion::Frozen {
                    remaining_ms: end_ms.saturating_sub(now_ms),
                };
                frozen.push(particle.id);
            }
        }
        frozen
    }

    /// Restart every frozen particle towards its destination with the time it
    /// had left. Returns each resumed id with that remaining time.
    pub fn resume_all(&mut self, now_ms: u64) -> Vec<(ParticleId, u64)> {
        let mut resumed = Vec::new();
        for particle in self.particles.values_mut() {
            if let Motion::Frozen { remaining_ms } = particle.motion {
                particle.motion = Motion::Falling {
                    started_ms: now_ms,
                    duration_ms: remaining_ms,
                };
                resumed.push((particle.id, remaining_ms));
            }
        }
        resumed
    }
}
