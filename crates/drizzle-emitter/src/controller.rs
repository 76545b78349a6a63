//! Particle emitter lifecycle controller.
//!
//! The emitter owns a host [`Surface`], a particle [`Layer`] mounted on it and
//! a virtual-time timer queue. A spawn interval derived from the density adds
//! one particle per tick; each particle is removed when its fall transition
//! ends or, if that notification never arrives, when its fallback timer fires.

use std::collections::HashMap;
use std::time::Duration;

use drizzle_core::{
    Density, EmitterError, Overflow, ParticleKind, Point, Settings, Size, geometry,
};
use fastrand::Rng;
use log::{debug, trace};

use crate::layer::{Layer, ParticleId};
use crate::scheduler::{TimerId, Timers};
use crate::stylesheet::Stylesheet;
use crate::surface::Surface;

/// Events delivered by the emitter's timer queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimerEvent {
    /// Spawn one particle.
    Spawn,
    /// Fallback removal of a particle whose transition end never arrived.
    Expire(ParticleId),
}

/// Construction options. Unset options are filled in by [`add_particles`].
#[derive(Debug, Clone)]
pub struct Setup<S> {
    pub surface: Option<S>,
    pub kind: Option<ParticleKind>,
    pub fall_duration_ms: Option<u64>,
    pub density: Option<Density>,
    pub particle_size: Option<f32>,
    pub clip_overflow: bool,
    pub active: bool,
    pub angle: f32,
    /// Seed for start position sampling. Random when unset.
    pub seed: Option<u64>,
}

impl<S> Default for Setup<S> {
    fn default() -> Self {
        Self {
            surface: None,
            kind: None,
            fall_duration_ms: None,
            density: None,
            particle_size: None,
            clip_overflow: false,
            active: true,
            angle: 0.0,
            seed: None,
        }
    }
}

impl<S> Setup<S> {
    pub fn new(surface: S) -> Self {
        Self {
            surface: Some(surface),
            ..Self::default()
        }
    }

    /// Setup with every option taken from `settings`.
    pub fn from_settings(surface: S, settings: &Settings) -> Self {
        Self {
            surface: Some(surface),
            kind: Some(settings.kind),
            fall_duration_ms: Some(settings.fall_duration_ms),
            density: Some(settings.density),
            particle_size: Some(settings.particle_size),
            clip_overflow: settings.clip_overflow,
            active: settings.active,
            angle: settings.angle,
            seed: None,
        }
    }

    pub fn kind(mut self, kind: ParticleKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn fall_duration_ms(mut self, duration_ms: u64) -> Self {
        self.fall_duration_ms = Some(duration_ms);
        self
    }

    pub fn density(mut self, density: Density) -> Self {
        self.density = Some(density);
        self
    }

    pub fn particle_size(mut self, size: f32) -> Self {
        self.particle_size = Some(size);
        self
    }

    pub fn clip_overflow(mut self, clip: bool) -> Self {
        self.clip_overflow = clip;
        self
    }

    pub fn active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    pub fn angle(mut self, angle: f32) -> Self {
        self.angle = angle;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Fill unset options with their defaults.
    fn with_defaults(mut self) -> Self {
        let defaults = Settings::default();
        self.kind.get_or_insert(defaults.kind);
        self.fall_duration_ms.get_or_insert(defaults.fall_duration_ms);
        self.density.get_or_insert(defaults.density);
        self.particle_size.get_or_insert(defaults.particle_size);
        self
    }
}

/// Create an emitter, filling unset options with defaults (rain, 3000 ms,
/// normal density, 5 px, 0°) and installing the shared stylesheet.
pub fn add_particles<S: Surface>(setup: Setup<S>) -> Result<ParticleEmitter<S>, EmitterError> {
    Stylesheet::install();
    ParticleEmitter::new(setup.with_defaults())
}

/// A particle as it should be drawn at the emitter's current time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderedParticle {
    pub id: ParticleId,
    pub kind: ParticleKind,
    pub size: f32,
    pub angle: f32,
    pub position: Point,
    pub frozen: bool,
}

/// Spawns falling particles into a surface.
///
/// Invariant: a spawn timer exists if and only if the emitter is active.
#[derive(Debug)]
pub struct ParticleEmitter<S: Surface> {
    surface: S,
    layer: Layer,
    timers: Timers<TimerEvent>,
    /// Running spawn interval, present iff active.
    spawn_timer: Option<TimerId>,
    /// Fallback removal timer of every falling particle.
    expiry: HashMap<ParticleId, TimerId>,
    kind: ParticleKind,
    density: Density,
    fall_duration_ms: u64,
    particle_size: f32,
    angle: f32,
    clip_overflow: bool,
    initial_overflow: Overflow,
    active: bool,
    /// Set by `pause`, cleared by `enable` and forced `disable`.
    paused: bool,
    spawned: u64,
    rng: Rng,
}

impl<S: Surface> ParticleEmitter<S> {
    /// Construct an emitter from a fully specified setup.
    pub fn new(setup: Setup<S>) -> Result<Self, EmitterError> {
        let Setup {
            surface,
            kind,
            fall_duration_ms,
            density,
            particle_size,
            clip_overflow,
            active,
            angle,
            seed,
        } = setup;

        let surface = surface.ok_or(EmitterError::MissingOption("surface"))?;
        let kind = kind.ok_or(EmitterError::MissingOption("type"))?;
        let fall_duration_ms = fall_duration_ms.ok_or(EmitterError::MissingOption("fall_duration"))?;
        let density = density.ok_or(EmitterError::MissingOption("density"))?;
        let particle_size = particle_size.ok_or(EmitterError::MissingOption("size"))?;

        if fall_duration_ms == 0 {
            return Err(EmitterError::InvalidDuration);
        }
        if !(particle_size.is_finite() && particle_size > 0.0) {
            return Err(EmitterError::InvalidSize(particle_size));
        }
        // Reject before the surface is touched.
        if active && !geometry::is_supported_angle(angle) {
            return Err(EmitterError::AngleNotSupported(angle));
        }

        let initial_overflow = surface.overflow();
        let mut emitter = Self {
            surface,
            layer: Layer::new(),
            timers: Timers::new(),
            spawn_timer: None,
            expiry: HashMap::new(),
            kind,
            density,
            fall_duration_ms,
            particle_size,
            angle,
            clip_overflow,
            initial_overflow,
            active: false,
            paused: false,
            spawned: 0,
            rng: seed.map_or_else(Rng::new, Rng::with_seed),
        };

        if clip_overflow {
            emitter.surface.set_overflow(Overflow::Hidden);
        }
        emitter.surface.mount_layer();
        emitter.surface.set_kind_marker(Some(kind));

        if active {
            emitter.enable()?;
        }

        debug!(
            "emitter created: kind={kind} density={density} size={particle_size} duration={fall_duration_ms}ms angle={angle}"
        );
        Ok(emitter)
    }

    /// Start spawning. No-op when already active. Particles frozen by
    /// [`pause`](Self::pause) resume their fall.
    pub fn enable(&mut self) -> Result<&S, EmitterError> {
        if self.active {
            return Ok(&self.surface);
        }

        self.start_timer()?;
        self.active = true;
        self.paused = false;
        if self.clip_overflow {
            self.surface.set_overflow(Overflow::Hidden);
        }
        self.resume_frozen();

        debug!("emitter enabled at {}ms", self.now_ms());
        Ok(&self.surface)
    }

    /// Stop spawning and restore the surface overflow. With `force`, every
    /// rendered particle is removed right away instead of finishing its fall,
    /// frozen ones included, even when the emitter is already inactive.
    pub fn disable(&mut self, force: bool) -> &S {
        if force {
            self.clear_particles();
            self.paused = false;
        }
        if !self.active {
            return &self.surface;
        }

        self.active = false;
        self.stop_timer();
        self.surface.set_overflow(self.initial_overflow);

        debug!("emitter disabled at {}ms (force={force})", self.now_ms());
        &self.surface
    }

    /// Disable, then pin every rendered particle at its current position.
    pub fn pause(&mut self) -> &S {
        self.disable(false);
        self.paused = true;

        let now_ms = self.now_ms();
        for id in self.layer.freeze_all(now_ms) {
            if let Some(timer) = self.expiry.remove(&id) {
                self.timers.clear(timer);
            }
        }

        debug!("emitter paused with {} particles", self.layer.len());
        &self.surface
    }

    /// Stop spawning, remove every particle, detach the layer and clear the
    /// kind marker. Returns the surface.
    pub fn destroy(mut self) -> S {
        self.disable(true);
        self.clear_particles();
        self.surface.set_overflow(self.initial_overflow);
        self.surface.set_kind_marker(None);
        self.surface.unmount_layer();

        debug!("emitter destroyed after {} spawns", self.spawned);
        self.surface
    }

    pub fn kind(&self) -> ParticleKind {
        self.kind
    }

    /// Change the kind of particles spawned from now on.
    pub fn set_kind(&mut self, kind: ParticleKind) {
        self.kind = kind;
        self.surface.set_kind_marker(Some(kind));
    }

    /// Change the kind by name. Unknown names leave the kind unchanged.
    pub fn set_kind_named(&mut self, name: &str) -> Result<(), EmitterError> {
        let kind = name.parse()?;
        self.set_kind(kind);
        Ok(())
    }

    pub fn density(&self) -> Density {
        self.density
    }

    /// Change the density. An active emitter reschedules its spawn timer so
    /// the new interval applies immediately.
    pub fn set_density(&mut self, density: Density) {
        self.density = density;
        if self.active {
            self.schedule_spawns();
        }
    }

    /// Change the density by name. Unknown names leave the density unchanged.
    pub fn set_density_named(&mut self, name: &str) -> Result<(), EmitterError> {
        let density = name.parse()?;
        self.set_density(density);
        Ok(())
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn set_active(&mut self, active: bool) -> Result<(), EmitterError> {
        if active {
            self.enable()?;
        } else {
            self.disable(false);
        }
        Ok(())
    }

    pub fn angle(&self) -> f32 {
        self.angle
    }

    /// Change the fall angle. An active emitter rejects unsupported angles
    /// and keeps the previous one; an inactive emitter checks on `enable`.
    pub fn set_angle(&mut self, angle: f32) -> Result<(), EmitterError> {
        if self.active && !geometry::is_supported_angle(angle) {
            return Err(EmitterError::AngleNotSupported(angle));
        }
        self.angle = angle;
        Ok(())
    }

    pub fn particle_size(&self) -> f32 {
        self.particle_size
    }

    pub fn fall_duration(&self) -> Duration {
        Duration::from_millis(self.fall_duration_ms)
    }

    /// Whether [`pause`](Self::pause) was called and nothing has resumed or
    /// cleared the emitter since.
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Current spawn interval, `None` while inactive.
    pub fn spawn_interval(&self) -> Option<Duration> {
        self.spawn_timer
            .map(|_| Duration::from_millis(self.density.interval_ms()))
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    /// Virtual time of the emitter in milliseconds.
    pub fn now_ms(&self) -> u64 {
        self.timers.now_ms()
    }

    pub fn particle_count(&self) -> usize {
        self.layer.len()
    }

    /// Total particles spawned since construction.
    pub fn spawned_count(&self) -> u64 {
        self.spawned
    }

    /// Rendered particles at the current time, oldest first.
    pub fn particles(&self) -> impl Iterator<Item = RenderedParticle> + '_ {
        let now_ms = self.now_ms();
        self.layer.iter().map(move |p| RenderedParticle {
            id: p.id(),
            kind: p.kind(),
            size: p.size(),
            angle: p.angle(),
            position: p.position_at(now_ms),
            frozen: p.is_frozen(),
        })
    }

    /// Advance by `delta` of wall-clock time.
    pub fn advance(&mut self, delta: Duration) {
        let delta_ms = u64::try_from(delta.as_millis()).unwrap_or(u64::MAX);
        self.advance_to(self.now_ms().saturating_add(delta_ms));
    }

    /// Run every timer and transition end due up to `now_ms`, in time order.
    /// A transition end sharing a deadline with a timer is delivered first.
    pub fn advance_to(&mut self, now_ms: u64) {
        self.skip_idle_time(now_ms);
        loop {
            let transition = if self.surface.is_displayed() {
                self.layer.next_transition_end()
            } else {
                None
            };
            let timer = self.timers.next_deadline();

            match (transition, timer) {
                (Some((end_ms, id)), timer)
                    if end_ms <= now_ms && timer.is_none_or(|due| end_ms <= due) =>
                {
                    self.timers.advance_clock(end_ms);
                    self.on_transition_end(id);
                }
                (_, Some(due)) if due <= now_ms => {
                    if let Some((_, event)) = self.timers.pop_due(now_ms) {
                        self.on_timer(event);
                    }
                }
                _ => break,
            }
        }
        self.timers.advance_clock(now_ms);
    }

    /// Jump over a gap long enough that everything falling now has landed and
    /// nothing spawned inside it survives past `now_ms`. Only the last
    /// `fall duration + interval` before `now_ms` is simulated tick by tick.
    fn skip_idle_time(&mut self, now_ms: u64) {
        let horizon = self
            .fall_duration_ms
            .saturating_add(self.density.interval_ms());
        if now_ms.saturating_sub(self.now_ms()) <= horizon.saturating_mul(2) {
            return;
        }
        let skip_to = now_ms - horizon;

        let landed: Vec<ParticleId> = self
            .layer
            .iter()
            .filter(|p| !p.is_frozen())
            .map(|p| p.id())
            .collect();
        for id in landed {
            self.layer.remove(id);
            if let Some(timer) = self.expiry.remove(&id) {
                self.timers.clear(timer);
            }
        }

        self.timers.advance_clock(skip_to);
        if self.active {
            self.schedule_spawns();
        }
        trace!("skipped idle time up to {skip_to}ms");
    }

    fn on_timer(&mut self, event: TimerEvent) {
        match event {
            TimerEvent::Spawn => self.spawn(),
            TimerEvent::Expire(id) => {
                self.expiry.remove(&id);
                if self.layer.remove(id).is_some() {
                    trace!("particle {id:?} removed by fallback timer");
                }
            }
        }
    }

    fn on_transition_end(&mut self, id: ParticleId) {
        if self.layer.remove(id).is_some() {
            if let Some(timer) = self.expiry.remove(&id) {
                self.timers.clear(timer);
            }
            trace!("particle {id:?} finished falling");
        }
    }

    /// One spawn tick: place a particle above the surface and start its fall.
    fn spawn(&mut self) {
        if !self.active {
            return;
        }

        let Size { width, height } = self.surface.size();
        let size = self.particle_size;
        let drift = geometry::drift(height, self.angle);
        let (min_x, max_x) = geometry::start_x_range(width, drift);
        let start_x = geometry::random_in_range(&mut self.rng, min_x, max_x);

        let start = Point::new(start_x, -size);
        let end = Point::new(start_x + drift, height + size);
        let now_ms = self.now_ms();

        let id = self.layer.append(self.kind, size, self.angle, start);
        self.layer
            .start_transition(id, end, now_ms, self.fall_duration_ms);
        let fallback = self
            .timers
            .set_timeout(self.fall_duration_ms, TimerEvent::Expire(id));
        self.expiry.insert(id, fallback);
        self.spawned += 1;

        trace!("spawned {id:?} at ({start_x:.1}, {:.1}) -> ({:.1}, {:.1})", start.y, end.x, end.y);
    }

    fn start_timer(&mut self) -> Result<(), EmitterError> {
        if !geometry::is_supported_angle(self.angle) {
            return Err(EmitterError::AngleNotSupported(self.angle));
        }
        self.schedule_spawns();
        Ok(())
    }

    fn schedule_spawns(&mut self) {
        self.stop_timer();
        let interval_ms = self.density.interval_ms();
        self.spawn_timer = Some(self.timers.set_interval(interval_ms, TimerEvent::Spawn));
    }

    fn stop_timer(&mut self) {
        if let Some(timer) = self.spawn_timer.take() {
            self.timers.clear(timer);
        }
    }

    fn clear_particles(&mut self) {
        for (_, timer) in self.expiry.drain() {
            self.timers.clear(timer);
        }
        self.layer.clear();
    }

    fn resume_frozen(&mut self) {
        let now_ms = self.now_ms();
        for (id, remaining_ms) in self.layer.resume_all(now_ms) {
            let timer = self.timers.set_timeout(remaining_ms, TimerEvent::Expire(id));
            self.expiry.insert(id, timer);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::surface::MemorySurface;

    const EPSILON: f32 = 1e-2;

    fn surface() -> MemorySurface {
        MemorySurface::new(400.0, 300.0)
    }

    fn emitter(setup: Setup<MemorySurface>) -> ParticleEmitter<MemorySurface> {
        add_particles(setup.seed(42)).unwrap()
    }

    fn assert_timer_invariant(emitter: &ParticleEmitter<MemorySurface>) {
        assert_eq!(emitter.spawn_timer.is_some(), emitter.is_active());
    }

    #[test]
    fn test_factory_defaults() {
        let emitter = emitter(Setup::new(surface()));
        assert_eq!(emitter.kind(), ParticleKind::Rain);
        assert_eq!(emitter.density(), Density::Normal);
        assert_eq!(emitter.particle_size(), 5.0);
        assert_eq!(emitter.fall_duration(), Duration::from_millis(3000));
        assert_eq!(emitter.angle(), 0.0);
        assert!(emitter.is_active());
        assert_eq!(emitter.spawn_interval(), Some(Duration::from_millis(200)));
        assert_eq!(emitter.surface().marker, Some(ParticleKind::Rain));
        assert_eq!(emitter.surface().mounted_layers, 1);
        assert_eq!(emitter.surface().overflow, Overflow::Visible);
        assert!(Stylesheet::installed().is_some());
        assert_timer_invariant(&emitter);
    }

    #[test]
    fn test_missing_options() {
        let err = add_particles(Setup::<MemorySurface>::default()).unwrap_err();
        assert_eq!(err, EmitterError::MissingOption("surface"));

        let err = ParticleEmitter::new(Setup::new(surface())).unwrap_err();
        assert_eq!(err, EmitterError::MissingOption("type"));

        let setup = Setup::new(surface())
            .kind(ParticleKind::Snow)
            .fall_duration_ms(1000)
            .density(Density::Low);
        let err = ParticleEmitter::new(setup).unwrap_err();
        assert_eq!(err, EmitterError::MissingOption("size"));
    }

    #[test]
    fn test_non_positive_values_rejected() {
        let err = add_particles(Setup::new(surface()).particle_size(0.0)).unwrap_err();
        assert_eq!(err, EmitterError::InvalidSize(0.0));

        let err = add_particles(Setup::new(surface()).fall_duration_ms(0)).unwrap_err();
        assert_eq!(err, EmitterError::InvalidDuration);
    }

    #[test]
    fn test_unsupported_angle() {
        let err = add_particles(Setup::new(surface()).angle(95.0)).unwrap_err();
        assert_eq!(err, EmitterError::AngleNotSupported(95.0));

        // inactive emitters only check once the timer would start
        let mut emitter = emitter(Setup::new(surface()).angle(95.0).active(false));
        assert_eq!(
            emitter.enable().unwrap_err(),
            EmitterError::AngleNotSupported(95.0)
        );
        assert!(!emitter.is_active());
        assert_timer_invariant(&emitter);
        emitter.advance_to(5000);
        assert_eq!(emitter.spawned_count(), 0);
    }

    #[test]
    fn test_straight_fall_has_no_drift() {
        let mut emitter = emitter(Setup::new(surface()));
        emitter.advance_to(2000);
        assert_eq!(emitter.spawned_count(), 10);
        for particle in emitter.layer.iter() {
            assert_eq!(particle.origin().x, particle.destination().x);
            assert_eq!(particle.origin().y, -5.0);
            assert_eq!(particle.destination().y, 305.0);
            assert!((0.0..400.0).contains(&particle.origin().x));
        }
    }

    #[test]
    fn test_angled_fall_drifts_and_stays_in_bounds() {
        for angle in [30.0_f32, -30.0] {
            let mut emitter = emitter(Setup::new(surface()).angle(angle).density(Density::Storm));
            emitter.advance_to(1000);
            let drift = 300.0 * angle.to_radians().tan();
            assert!(emitter.particle_count() > 0);
            for particle in emitter.layer.iter() {
                let start = particle.origin().x;
                let end = particle.destination().x;
                assert!((end - start - drift).abs() < EPSILON);
                assert!(end >= -EPSILON && end <= 400.0 + EPSILON);
                assert_eq!(particle.angle(), angle);
            }
        }
    }

    #[test]
    fn test_disable_enable_cycle_keeps_configuration() {
        let mut emitter = emitter(
            Setup::new(surface())
                .kind(ParticleKind::Snow)
                .density(Density::Dense)
                .particle_size(8.0),
        );
        emitter.advance_to(500);
        emitter.disable(false);
        assert!(!emitter.is_active());
        assert_timer_invariant(&emitter);
        emitter.enable().unwrap();
        assert!(emitter.is_active());
        assert_timer_invariant(&emitter);

        assert_eq!(emitter.kind(), ParticleKind::Snow);
        assert_eq!(emitter.density(), Density::Dense);
        assert_eq!(emitter.particle_size(), 8.0);

        let before = emitter.spawned_count();
        emitter.advance_to(500 + 1200);
        assert_eq!(emitter.spawned_count(), before + 10);
    }

    #[test]
    fn test_enable_and_disable_are_idempotent() {
        let mut emitter = emitter(Setup::new(surface()));
        let timer = emitter.spawn_timer;
        emitter.enable().unwrap();
        assert_eq!(emitter.spawn_timer, timer);

        emitter.disable(false);
        emitter.disable(true);
        assert!(!emitter.is_active());
        assert_timer_invariant(&emitter);
    }

    #[test]
    fn test_force_disable_removes_particles() {
        let mut emitter = emitter(Setup::new(surface()));
        emitter.advance_to(1000);
        assert_eq!(emitter.particle_count(), 5);
        emitter.disable(true);
        assert_eq!(emitter.particle_count(), 0);
        assert!(emitter.expiry.is_empty());
        assert!(emitter.timers.is_empty());
    }

    #[test]
    fn test_soft_disable_lets_particles_finish() {
        let mut emitter = emitter(Setup::new(surface()));
        emitter.advance_to(1000);
        emitter.disable(false);
        assert_eq!(emitter.particle_count(), 5);

        // last particle spawned at 1000ms lands at 4000ms
        emitter.advance_to(3999);
        assert_eq!(emitter.particle_count(), 1);
        emitter.advance_to(4000);
        assert_eq!(emitter.particle_count(), 0);
        assert!(emitter.timers.is_empty());
        assert_eq!(emitter.spawned_count(), 5);
    }

    #[test]
    fn test_transition_end_cancels_fallback() {
        let mut emitter = emitter(Setup::new(surface()));
        emitter.advance_to(200);
        emitter.disable(false);
        assert_eq!(emitter.expiry.len(), 1);
        emitter.advance_to(3200);
        assert_eq!(emitter.particle_count(), 0);
        assert!(emitter.expiry.is_empty());
        assert!(emitter.timers.is_empty());
    }

    #[test]
    fn test_hidden_surface_relies_on_fallback() {
        let mut hidden = surface();
        hidden.displayed = false;
        let mut emitter = emitter(Setup::new(hidden));
        emitter.advance_to(200);
        emitter.disable(false);

        emitter.advance_to(3199);
        assert_eq!(emitter.particle_count(), 1);
        emitter.advance_to(3200);
        assert_eq!(emitter.particle_count(), 0);
        assert!(emitter.timers.is_empty());
    }

    #[test]
    fn test_unknown_type_keeps_previous() {
        let mut emitter = emitter(Setup::new(surface()));
        let err = emitter.set_kind_named("hail").unwrap_err();
        assert_eq!(err, EmitterError::UnknownType("hail".to_string()));
        assert_eq!(emitter.kind(), ParticleKind::Rain);
        assert_eq!(emitter.surface().marker, Some(ParticleKind::Rain));

        emitter.set_kind_named("snow").unwrap();
        assert_eq!(emitter.kind(), ParticleKind::Snow);
        assert_eq!(emitter.surface().marker, Some(ParticleKind::Snow));
        emitter.advance_to(200);
        assert!(emitter.particles().all(|p| p.kind == ParticleKind::Snow));
    }

    #[test]
    fn test_unknown_density_keeps_previous() {
        let mut emitter = emitter(Setup::new(surface()));
        let err = emitter.set_density_named("drizzle").unwrap_err();
        assert_eq!(err, EmitterError::UnknownDensity("drizzle".to_string()));
        assert_eq!(emitter.density(), Density::Normal);
    }

    #[test]
    fn test_density_change_reschedules_immediately() {
        let mut emitter = emitter(Setup::new(surface()));
        emitter.advance_to(1000);
        assert_eq!(emitter.spawned_count(), 5);

        emitter.set_density_named("storm").unwrap();
        assert_eq!(emitter.spawn_interval(), Some(Duration::from_millis(20)));
        emitter.advance_to(1200);
        assert_eq!(emitter.spawned_count(), 15);
        assert_timer_invariant(&emitter);
    }

    #[test]
    fn test_density_change_while_inactive_does_not_start() {
        let mut emitter = emitter(Setup::new(surface()).active(false));
        emitter.set_density(Density::Storm);
        assert_timer_invariant(&emitter);
        emitter.advance_to(1000);
        assert_eq!(emitter.spawned_count(), 0);
    }

    #[test]
    fn test_active_setter() {
        let mut emitter = emitter(Setup::new(surface()).active(false));
        emitter.set_active(true).unwrap();
        assert!(emitter.is_active());
        assert_timer_invariant(&emitter);
        emitter.set_active(false).unwrap();
        assert!(!emitter.is_active());
        assert_timer_invariant(&emitter);
    }

    #[test]
    fn test_angle_setter() {
        let mut emitter = emitter(Setup::new(surface()));
        assert_eq!(
            emitter.set_angle(-90.0).unwrap_err(),
            EmitterError::AngleNotSupported(-90.0)
        );
        assert_eq!(emitter.angle(), 0.0);
        emitter.set_angle(45.0).unwrap();
        assert_eq!(emitter.angle(), 45.0);
    }

    #[test]
    fn test_clip_overflow_is_restored() {
        let mut emitter = emitter(Setup::new(surface()).clip_overflow(true));
        assert_eq!(emitter.surface().overflow, Overflow::Hidden);
        emitter.disable(false);
        assert_eq!(emitter.surface().overflow, Overflow::Visible);
        emitter.enable().unwrap();
        assert_eq!(emitter.surface().overflow, Overflow::Hidden);

        let surface = emitter.destroy();
        assert_eq!(surface.overflow, Overflow::Visible);
    }

    #[test]
    fn test_pause_freezes_and_enable_resumes() {
        let mut emitter = emitter(Setup::new(surface()));
        emitter.advance_to(1000);
        emitter.pause();
        assert!(!emitter.is_active());
        assert!(emitter.is_paused());
        assert_timer_invariant(&emitter);

        let frozen: Vec<RenderedParticle> = emitter.particles().collect();
        assert_eq!(frozen.len(), 5);
        assert!(emitter.timers.is_empty());

        emitter.advance_to(2000);
        let later: Vec<RenderedParticle> = emitter.particles().collect();
        assert_eq!(frozen, later);

        emitter.enable().unwrap();
        assert!(!emitter.is_paused());
        let first = frozen[0].id;
        // spawned at 200ms, frozen at 1000ms with 2200ms left
        emitter.advance_to(4199);
        assert!(emitter.layer.get(first).is_some());
        emitter.advance_to(4200);
        assert!(emitter.layer.get(first).is_none());
    }

    #[test]
    fn test_positions_move_down_over_time() {
        let mut emitter = emitter(Setup::new(surface()).fall_duration_ms(1000));
        emitter.advance_to(200);
        let start = emitter.particles().next().unwrap().position;
        emitter.advance_to(700);
        let middle = emitter.particles().next().unwrap().position;
        assert_eq!(start.y, -5.0);
        assert!((middle.y - 150.0).abs() < EPSILON);
        assert_eq!(start.x, middle.x);
    }

    #[test]
    fn test_size_is_queried_on_every_spawn() {
        let mut emitter = emitter(Setup::new(surface()));
        emitter.advance_to(200);
        emitter.surface_mut().size = Size::new(400.0, 1000.0);
        emitter.advance_to(400);
        let destinations: Vec<f32> = emitter.layer.iter().map(|p| p.destination().y).collect();
        assert_eq!(destinations, vec![305.0, 1005.0]);
    }

    #[test]
    fn test_destroy_detaches() {
        let mut emitter = emitter(Setup::new(surface()));
        emitter.advance(Duration::from_millis(1000));
        let surface = emitter.destroy();
        assert_eq!(surface.marker, None);
        assert_eq!(surface.mounted_layers, 0);
        assert_eq!(surface.overflow, Overflow::Visible);
    }

    #[test]
    fn test_destroy_after_pause_clears_frozen() {
        let mut emitter = emitter(Setup::new(surface()));
        emitter.advance_to(1000);
        emitter.pause();
        assert_eq!(emitter.particle_count(), 5);
        let surface = emitter.destroy();
        assert_eq!(surface.mounted_layers, 0);
    }

    #[test]
    fn test_force_disable_after_pause_clears_frozen() {
        let mut emitter = emitter(Setup::new(surface()));
        emitter.advance_to(1000);
        emitter.pause();
        assert_eq!(emitter.particle_count(), 5);

        emitter.disable(true);
        assert_eq!(emitter.particle_count(), 0);
        assert!(emitter.expiry.is_empty());
        assert!(!emitter.is_paused());
        assert_timer_invariant(&emitter);

        emitter.advance_to(100_000);
        assert_eq!(emitter.particle_count(), 0);
    }

    /// Surface whose state stays observable after the emitter drops it.
    #[derive(Debug, Clone, Default)]
    struct SharedSurface(Rc<RefCell<MemorySurface>>);

    impl Surface for SharedSurface {
        fn size(&self) -> Size {
            self.0.borrow().size()
        }

        fn overflow(&self) -> Overflow {
            self.0.borrow().overflow()
        }

        fn set_overflow(&mut self, overflow: Overflow) {
            self.0.borrow_mut().set_overflow(overflow);
        }

        fn kind_marker(&self) -> Option<ParticleKind> {
            self.0.borrow().kind_marker()
        }

        fn set_kind_marker(&mut self, kind: Option<ParticleKind>) {
            self.0.borrow_mut().set_kind_marker(kind);
        }

        fn mount_layer(&mut self) {
            self.0.borrow_mut().mount_layer();
        }

        fn unmount_layer(&mut self) {
            self.0.borrow_mut().unmount_layer();
        }
    }

    #[test]
    fn test_rejected_angle_leaves_surface_untouched() {
        let shared = SharedSurface::default();
        let err = add_particles(Setup::new(shared.clone()).angle(95.0).clip_overflow(true))
            .unwrap_err();
        assert_eq!(err, EmitterError::AngleNotSupported(95.0));

        let surface = shared.0.borrow();
        assert_eq!(surface.overflow, Overflow::Visible);
        assert_eq!(surface.marker, None);
        assert_eq!(surface.mounted_layers, 0);
    }

    #[test]
    fn test_infinite_size_rejected() {
        let err = add_particles(Setup::new(surface()).particle_size(f32::INFINITY)).unwrap_err();
        assert_eq!(err, EmitterError::InvalidSize(f32::INFINITY));

        let err = add_particles(Setup::new(surface()).particle_size(f32::NAN)).unwrap_err();
        assert!(matches!(err, EmitterError::InvalidSize(size) if size.is_nan()));
    }

    #[test]
    fn test_advance_to_end_of_time() {
        let mut emitter = emitter(Setup::new(surface()));
        emitter.advance_to(1000);
        emitter.advance(Duration::MAX);

        assert_eq!(emitter.now_ms(), u64::MAX);
        assert!(emitter.is_active());
        // Five before the jump, then one fall duration of ticks.
        assert_eq!(emitter.spawned_count(), 21);
        // Every deadline saturates to the last millisecond, so all have landed.
        assert_eq!(emitter.particle_count(), 0);
        assert!(emitter.expiry.is_empty());
        assert_timer_invariant(&emitter);
    }

    #[test]
    fn test_long_gap_keeps_recent_particles() {
        let mut emitter = emitter(Setup::new(surface()));
        emitter.advance_to(1_000_000);
        // One fall duration of spawns at 200 ms intervals.
        assert_eq!(emitter.particle_count(), 15);
        for particle in emitter.particles() {
            assert!(particle.position.y >= -5.0);
            assert!(particle.position.y <= 300.0);
        }
        assert_eq!(emitter.expiry.len(), emitter.particle_count());
    }

    #[test]
    fn test_pause_without_particles_reports_paused() {
        let mut emitter = emitter(Setup::new(surface()));
        assert!(!emitter.is_paused());
        emitter.pause();
        assert_eq!(emitter.particle_count(), 0);
        assert!(emitter.is_paused());

        emitter.enable().unwrap();
        assert!(!emitter.is_paused());
    }
}
