//! Optional TOML configuration merged with command-line overrides.

use std::{fs, path::Path};

use anyhow::{ensure, Context, Result};
use serde::Deserialize;
use wirefield_system_scheduler::SchedulerConfig;

/// Side length of one lattice cell in pixels when nothing else is configured.
pub(crate) const DEFAULT_CELL_SIZE: f32 = 12.0;

/// Contents of a configuration file. Every field is optional.
///
/// ```toml
/// seed = 42
/// cell_size = 16.0
///
/// [scheduler]
/// admission_interval_ms = 10
/// animation_interval_ms = 16
///
/// [scheduler.generation]
/// turn_probability = 0.5
///
/// [scheduler.admission]
/// failure_budget = 100
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct FileConfig {
    pub(crate) seed: Option<u64>,
    pub(crate) cell_size: Option<f32>,
    pub(crate) scheduler: SchedulerConfig,
}

impl FileConfig {
    pub(crate) fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("invalid config file {}", path.display()))
    }

    pub(crate) fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }
}

/// Fully resolved run settings.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Settings {
    pub(crate) seed: u64,
    pub(crate) cell_size: f32,
    pub(crate) scheduler: SchedulerConfig,
}

impl Settings {
    /// Applies command-line overrides on top of the file values.
    ///
    /// Without any seed a random one is drawn so that every launch differs.
    pub(crate) fn resolve(
        file: FileConfig,
        seed: Option<u64>,
        cell_size: Option<f32>,
    ) -> Result<Self> {
        let cell_size = cell_size.or(file.cell_size).unwrap_or(DEFAULT_CELL_SIZE);
        ensure!(
            cell_size.is_finite() && cell_size > 0.0,
            "cell size must be positive (received {cell_size})"
        );
        file.scheduler
            .validate()
            .context("invalid scheduler configuration")?;

        Ok(Self {
            seed: seed.or(file.seed).unwrap_or_else(rand::random),
            cell_size,
            scheduler: file.scheduler,
        })
    }
}
