#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Admission system that turns generated candidates into queued wires.
//!
//! Candidates are only drawn while the reveal queue is idle. A candidate that
//! collides with existing occupancy is discarded; after a bounded run of
//! consecutive rejections the system stops drawing for the rest of its life.

use rand::Rng;
use serde::Deserialize;
use tracing::{debug, info};
use wirefield_core::{
    intersects, Command, Epoch, Occupancy, WorldDimensions, ADMISSION_FAILURE_BUDGET,
};
use wirefield_system_generation::WireGenerator;

/// Configuration parameters required to construct the admission system.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AdmissionConfig {
    /// Consecutive rejections tolerated before admission stops for good.
    pub failure_budget: u32,
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            failure_budget: ADMISSION_FAILURE_BUDGET,
        }
    }
}

/// Result of a single admission trigger.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AdmissionOutcome {
    /// The reveal queue was busy, so no candidate was drawn.
    Skipped,
    /// A candidate was accepted and an admit command emitted.
    Admitted {
        /// Number of nodes in the admitted wire.
        nodes: usize,
    },
    /// The candidate collided with existing occupancy.
    Rejected {
        /// Length of the current rejection streak.
        consecutive_failures: u32,
    },
    /// The failure budget is spent; no candidate will ever be drawn again.
    Exhausted,
}

/// Pure system deciding which generated wires enter the reveal queue.
#[derive(Debug)]
pub struct Admission {
    generator: WireGenerator,
    failure_budget: u32,
    consecutive_failures: u32,
    exhausted: bool,
}

impl Admission {
    /// Creates a new admission system drawing candidates from `generator`.
    #[must_use]
    pub fn new(config: AdmissionConfig, generator: WireGenerator) -> Self {
        Self {
            generator,
            failure_budget: config.failure_budget,
            consecutive_failures: 0,
            exhausted: false,
        }
    }

    /// Reports whether admission reached its terminal state.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Length of the current rejection streak.
    #[must_use]
    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// Runs one admission attempt against the current world view.
    pub fn handle<O, R>(
        &mut self,
        epoch: Epoch,
        dimensions: WorldDimensions,
        reveal_idle: bool,
        occupancy: &O,
        rng: &mut R,
        out: &mut Vec<Command>,
    ) -> AdmissionOutcome
    where
        O: Occupancy + ?Sized,
        R: Rng + ?Sized,
    {
        if self.exhausted {
            return AdmissionOutcome::Exhausted;
        }

        if !reveal_idle {
            return AdmissionOutcome::Skipped;
        }

        let candidate = self.generator.generate(dimensions, rng);
        if intersects(occupancy, &candidate) {
            self.consecutive_failures = self.consecutive_failures.saturating_add(1);
            if self.consecutive_failures >= self.failure_budget {
                self.exhausted = true;
                info!(
                    failures = self.consecutive_failures,
                    epoch = epoch.get(),
                    "wire admission exhausted; no further wires will be generated"
                );
                return AdmissionOutcome::Exhausted;
            }
            return AdmissionOutcome::Rejected {
                consecutive_failures: self.consecutive_failures,
            };
        }

        self.consecutive_failures = 0;
        let nodes = candidate.len();
        debug!(nodes, epoch = epoch.get(), "admitting wire");
        out.push(Command::AdmitWire {
            epoch,
            wire: candidate,
        });
        AdmissionOutcome::Admitted { nodes }
    }
}
