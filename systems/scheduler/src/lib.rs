#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Discrete-event scheduler that drives the Wirefield world.
//!
//! Two periodic triggers share one simulated clock: a fast admission trigger
//! that asks the [`Admission`] system for a new wire, and a fixed-rate
//! animation trigger that advances the head of the reveal queue. Both route
//! their commands through [`world::apply`], one at a time, so mutation is
//! strictly sequential. Rendering reads [`Scheduler::world`] and never
//! mutates it.

use std::time::Duration;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};
use wirefield_core::{Command, Epoch, Event, WorldDimensions};
use wirefield_system_admission::{Admission, AdmissionConfig, AdmissionOutcome};
use wirefield_system_generation::{GenerationConfig, WireGenerator};
use wirefield_world::{self as world, query, World};

/// Timing and tuning parameters for a scheduler.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SchedulerConfig {
    /// Period of the admission trigger in milliseconds.
    pub admission_interval_ms: u64,
    /// Period of the animation trigger in milliseconds.
    pub animation_interval_ms: u64,
    /// Wire shape tuning.
    pub generation: GenerationConfig,
    /// Admission failure budget.
    pub admission: AdmissionConfig,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            admission_interval_ms: 10,
            animation_interval_ms: 16,
            generation: GenerationConfig::default(),
            admission: AdmissionConfig::default(),
        }
    }
}

impl SchedulerConfig {
    /// Period of the admission trigger.
    #[must_use]
    pub fn admission_interval(&self) -> Duration {
        Duration::from_millis(self.admission_interval_ms)
    }

    /// Period of the animation trigger.
    #[must_use]
    pub fn animation_interval(&self) -> Duration {
        Duration::from_millis(self.animation_interval_ms)
    }

    /// Checks that both triggers have a positive period and that generation tuning is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.admission_interval_ms == 0 {
            return Err(ConfigError::ZeroInterval { trigger: "admission" });
        }
        if self.animation_interval_ms == 0 {
            return Err(ConfigError::ZeroInterval { trigger: "animation" });
        }
        self.generation.validate()?;
        Ok(())
    }
}

/// Reasons a scheduler configuration is rejected.
#[derive(Clone, Copy, Debug, PartialEq, Error)]
pub enum ConfigError {
    /// A trigger period of zero would never let time advance.
    #[error("{trigger} interval must be positive")]
    ZeroInterval {
        /// Name of the offending trigger.
        trigger: &'static str,
    },
    /// The generation tuning is out of range.
    #[error(transparent)]
    Generation(#[from] wirefield_system_generation::ConfigError),
}

/// Running counters describing the current world instance.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    /// Wires accepted into the reveal queue.
    pub admitted: u64,
    /// Candidates discarded because they intersected occupancy.
    pub rejected: u64,
    /// Wires fully revealed.
    pub drained: u64,
    /// Whether admission reached its terminal state.
    pub exhausted: bool,
    /// Lattice points currently holding a piece.
    pub pieces: usize,
}

#[derive(Clone, Copy, Debug)]
struct Triggers {
    epoch: Epoch,
    next_admission: Duration,
    next_animation: Duration,
}

impl Triggers {
    fn starting_at(now: Duration, epoch: Epoch) -> Self {
        Self {
            epoch,
            next_admission: now,
            next_animation: now,
        }
    }
}

/// Owns a world instance together with the systems and triggers that drive it.
#[derive(Debug)]
pub struct Scheduler {
    config: SchedulerConfig,
    generator: WireGenerator,
    world: World,
    admission: Admission,
    rng: ChaCha8Rng,
    clock: Duration,
    triggers: Triggers,
    dirty: bool,
    stats: SchedulerStats,
    events: Vec<Event>,
}

impl Scheduler {
    /// Creates a scheduler for a fresh world of the given size.
    ///
    /// The same `seed` and sequence of [`Scheduler::step`] calls always
    /// produce the same world.
    pub fn new(
        config: SchedulerConfig,
        dimensions: WorldDimensions,
        seed: u64,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let generator = WireGenerator::new(config.generation)?;
        let world = World::new(dimensions);
        let triggers = Triggers::starting_at(Duration::ZERO, query::epoch(&world));
        info!(
            columns = dimensions.columns(),
            rows = dimensions.rows(),
            seed,
            "wirefield scheduler started"
        );

        Ok(Self {
            admission: Admission::new(config.admission, generator.clone()),
            generator,
            config,
            world,
            rng: ChaCha8Rng::seed_from_u64(seed),
            clock: Duration::ZERO,
            triggers,
            dirty: true,
            stats: SchedulerStats::default(),
            events: Vec::new(),
        })
    }

    /// Read-only access to the world for rendering and inspection.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Current simulated time.
    #[must_use]
    pub fn clock(&self) -> Duration {
        self.clock
    }

    /// Counters for the current world instance.
    #[must_use]
    pub fn stats(&self) -> SchedulerStats {
        SchedulerStats {
            pieces: query::occupancy_view(&self.world).len(),
            ..self.stats
        }
    }

    /// Returns whether the world changed since the last call and clears the flag.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    /// Advances simulated time by `dt`, firing every trigger that comes due.
    ///
    /// Due triggers fire in time order; when both fall due at the same
    /// instant the admission trigger fires first. Each trigger fires at most
    /// once per call: one that would fall due again before `dt` ends is late,
    /// so it fires once at the end of the step and its missed periods are
    /// dropped. Each animation firing advances the reveal queue by at most
    /// one segment.
    pub fn step(&mut self, dt: Duration) {
        let target = self.clock.saturating_add(dt);
        self.triggers.next_admission =
            coalesce(self.triggers.next_admission, self.config.admission_interval(), target);
        self.triggers.next_animation =
            coalesce(self.triggers.next_animation, self.config.animation_interval(), target);

        if self.triggers.next_admission <= target
            && self.triggers.next_admission <= self.triggers.next_animation
        {
            self.clock = self.triggers.next_admission;
            self.triggers.next_admission = self.clock + self.config.admission_interval();
            let _ = self.fire_admission();
        }
        if self.triggers.next_animation <= target {
            self.clock = self.triggers.next_animation;
            self.triggers.next_animation = self.clock + self.config.animation_interval();
            self.fire_animation();
        }
        if self.triggers.next_admission <= target {
            self.clock = self.triggers.next_admission;
            self.triggers.next_admission = self.clock + self.config.admission_interval();
            let _ = self.fire_admission();
        }
        self.clock = target;
    }

    /// Runs a single admission attempt at the current clock.
    pub fn fire_admission(&mut self) -> AdmissionOutcome {
        let mut commands = Vec::new();
        let outcome = self.admission.handle(
            self.triggers.epoch,
            query::dimensions(&self.world),
            query::is_reveal_idle(&self.world),
            &query::occupancy_view(&self.world),
            &mut self.rng,
            &mut commands,
        );

        match outcome {
            AdmissionOutcome::Admitted { .. } => self.stats.admitted += 1,
            AdmissionOutcome::Rejected { .. } => self.stats.rejected += 1,
            AdmissionOutcome::Exhausted => {
                if !self.stats.exhausted {
                    self.stats.rejected += 1;
                }
                self.stats.exhausted = true;
            }
            AdmissionOutcome::Skipped => {}
        }

        for command in commands {
            self.dispatch(command);
        }
        outcome
    }

    /// Runs a single animation tick at the current clock.
    pub fn fire_animation(&mut self) {
        self.dispatch(Command::AdvanceReveal {
            epoch: self.triggers.epoch,
            now: self.clock,
        });
    }

    /// Discards the current world and restarts both triggers from scratch.
    pub fn reset(&mut self, dimensions: WorldDimensions) {
        self.dispatch(Command::ConfigureWorld { dimensions });
        let epoch = query::epoch(&self.world);
        self.admission = Admission::new(self.config.admission, self.generator.clone());
        self.triggers = Triggers::starting_at(self.clock, epoch);
        self.stats = SchedulerStats::default();
        self.dirty = true;
        info!(
            columns = dimensions.columns(),
            rows = dimensions.rows(),
            epoch = epoch.get(),
            "world reset"
        );
    }

    fn dispatch(&mut self, command: Command) {
        self.events.clear();
        world::apply(&mut self.world, command, &mut self.events);
        for event in &self.events {
            match event {
                Event::PieceWritten { .. } | Event::WorldConfigured { .. } => self.dirty = true,
                Event::WireDrained { .. } => self.stats.drained += 1,
                Event::StaleCommandIgnored { epoch } => {
                    debug!(epoch = epoch.get(), "ignored command for retired world");
                }
                Event::WireAdmitted { .. } | Event::SegmentCompleted { .. } => {}
            }
        }
    }
}

/// Moves a deadline that would fall due more than once before `target` onto `target`.
fn coalesce(deadline: Duration, interval: Duration, target: Duration) -> Duration {
    if deadline.saturating_add(interval) <= target {
        target
    } else {
        deadline
    }
}
