#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Randomised wire generation constrained to the three downward directions.

use rand::Rng;
use serde::Deserialize;
use thiserror::Error;
use wirefield_core::{Direction, LatticePoint, Wire, WireBuilder, WorldDimensions};

/// Fewest steps a wire may take beyond its first node.
pub const MIN_EXTENSION_STEPS: u32 = 3;

/// Most steps a wire may take beyond its first node.
pub const MAX_EXTENSION_STEPS: u32 = 14;

/// Tuning knobs controlling the shape of generated wires.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GenerationConfig {
    /// Steps every wire takes beyond its first node.
    pub min_extension: u32,
    /// Width of the uniform range of additional steps on top of `min_extension`.
    pub extension_range: u32,
    /// Chance that a step changes direction.
    pub turn_probability: f64,
    /// Fraction of the world height the squared start-row sample is scaled to.
    pub start_band: f64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            min_extension: 3,
            extension_range: 12,
            turn_probability: 0.35,
            start_band: 0.5,
        }
    }
}

impl GenerationConfig {
    /// Checks that every knob lies within its usable range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let (min, max) = self.extension_bounds();
        if min < MIN_EXTENSION_STEPS || max > MAX_EXTENSION_STEPS {
            return Err(ConfigError::ExtensionSteps { min, max });
        }
        if !(0.0..=1.0).contains(&self.turn_probability) {
            return Err(ConfigError::TurnProbability(self.turn_probability));
        }
        if !self.start_band.is_finite() || self.start_band < 0.0 {
            return Err(ConfigError::StartBand(self.start_band));
        }
        Ok(())
    }

    /// Smallest and largest number of extension steps this configuration can draw.
    fn extension_bounds(&self) -> (u32, u32) {
        let min = self.min_extension;
        (min, min.saturating_add(self.extension_range.saturating_sub(1)))
    }
}

/// Reasons a generation configuration is rejected.
#[derive(Clone, Copy, Debug, PartialEq, Error)]
pub enum ConfigError {
    /// Extension steps outside `MIN_EXTENSION_STEPS..=MAX_EXTENSION_STEPS`.
    #[error("extension steps must stay within 3..=14 (configured {min}..={max})")]
    ExtensionSteps {
        /// Fewest steps the configuration draws.
        min: u32,
        /// Most steps the configuration draws.
        max: u32,
    },
    /// Turn probability outside `0.0..=1.0`.
    #[error("turn probability must lie within 0..=1 (received {0})")]
    TurnProbability(f64),
    /// Start band negative or not finite.
    #[error("start band must be a finite, non-negative fraction (received {0})")]
    StartBand(f64),
}

/// Pure system producing candidate wires from an injected random source.
#[derive(Clone, Debug, Default)]
pub struct WireGenerator {
    config: GenerationConfig,
}

impl WireGenerator {
    /// Creates a generator after validating the configuration.
    pub fn new(config: GenerationConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Configuration the generator was built with.
    #[must_use]
    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    /// Produces a candidate wire for a world of the given size.
    ///
    /// The start column is uniform across the width while the start row is
    /// drawn as `floor(u² · rows · start_band)`, which packs starts near the
    /// top edge. Coordinates are never clamped, so a wire may leave the
    /// visible lattice.
    pub fn generate<R: Rng + ?Sized>(&self, dimensions: WorldDimensions, rng: &mut R) -> Wire {
        let column_sample: f64 = rng.gen();
        let row_sample: f64 = rng.gen();
        let x = (column_sample * f64::from(dimensions.columns())).floor() as i32;
        let y = (row_sample * row_sample * f64::from(dimensions.rows()) * self.config.start_band)
            .floor() as i32;

        let initial = Direction::ALL[rng.gen_range(0..Direction::ALL.len())];
        let mut builder = WireBuilder::start(LatticePoint::new(x, y), initial);

        for _ in 0..self.extension_steps(rng) {
            let direction = self.next_direction(builder.direction(), rng);
            let _ = builder.step(direction);
        }

        builder.build()
    }

    fn extension_steps<R: Rng + ?Sized>(&self, rng: &mut R) -> u32 {
        let sample: f64 = rng.gen();
        let extra = (sample * f64::from(self.config.extension_range)).floor() as u32;
        self.config.min_extension.saturating_add(extra)
    }

    /// Applies the asymmetric turn rule: straight runs may bend either way,
    /// diagonal runs can only straighten.
    fn next_direction<R: Rng + ?Sized>(&self, current: Direction, rng: &mut R) -> Direction {
        if !rng.gen_bool(self.config.turn_probability) {
            return current;
        }

        match current {
            Direction::Down => Direction::DIAGONALS[rng.gen_range(0..Direction::DIAGONALS.len())],
            Direction::DownLeft | Direction::DownRight => Direction::Down,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn rejects_out_of_range_probability() {
        let config = GenerationConfig {
            turn_probability: 1.5,
            ..GenerationConfig::default()
        };
        assert_eq!(
            WireGenerator::new(config).err(),
            Some(ConfigError::TurnProbability(1.5))
        );
    }

    #[test]
    fn rejects_oversized_extension() {
        let config = GenerationConfig {
            min_extension: 2_000_000,
            ..GenerationConfig::default()
        };
        assert_eq!(
            WireGenerator::new(config).err(),
            Some(ConfigError::ExtensionSteps {
                min: 2_000_000,
                max: 2_000_011,
            })
        );

        let config = GenerationConfig {
            extension_range: 13,
            ..GenerationConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::ExtensionSteps { min: 3, max: 15 })
        );
    }

    #[test]
    fn rejects_too_short_extension() {
        let config = GenerationConfig {
            min_extension: 0,
            extension_range: 1,
            ..GenerationConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::ExtensionSteps { min: 0, max: 0 })
        );
    }

    #[test]
    fn accepts_fixed_length_within_bounds() {
        let config = GenerationConfig {
            min_extension: 14,
            extension_range: 0,
            ..GenerationConfig::default()
        };
        let generator = WireGenerator::new(config).expect("valid config");
        let mut rng = ChaCha8Rng::seed_from_u64(2);

        let wire = generator.generate(WorldDimensions::new(20, 20), &mut rng);
        assert_eq!(wire.len(), 15);
    }

    #[test]
    fn rejects_negative_start_band() {
        let config = GenerationConfig {
            start_band: -0.1,
            ..GenerationConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::StartBand(value)) if value < 0.0
        ));
    }

    #[test]
    fn never_turning_keeps_initial_direction() {
        let generator = WireGenerator::new(GenerationConfig {
            turn_probability: 0.0,
            ..GenerationConfig::default()
        })
        .expect("valid config");
        let mut rng = ChaCha8Rng::seed_from_u64(7);

        for _ in 0..50 {
            let wire = generator.generate(WorldDimensions::new(40, 40), &mut rng);
            let first = wire.nodes()[0].direction;
            assert!(wire.iter().all(|node| node.direction == first));
        }
    }

    #[test]
    fn always_turning_alternates_between_straight_and_diagonal() {
        let generator = WireGenerator::new(GenerationConfig {
            turn_probability: 1.0,
            ..GenerationConfig::default()
        })
        .expect("valid config");
        let mut rng = ChaCha8Rng::seed_from_u64(11);

        for _ in 0..50 {
            let wire = generator.generate(WorldDimensions::new(40, 40), &mut rng);
            for pair in wire.nodes().windows(2) {
                assert_ne!(pair[0].direction.is_diagonal(), pair[1].direction.is_diagonal());
            }
        }
    }
}
