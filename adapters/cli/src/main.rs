#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that boots the Wirefield animation.

mod config;

use std::{path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};
use wirefield_core::WorldDimensions;
use wirefield_rendering::{ascii, FrameInput, Palette, Presentation, RenderingBackend, Scene};
use wirefield_rendering_macroquad::MacroquadBackend;
use wirefield_system_scheduler::Scheduler;
use wirefield_world::query;

use crate::config::{FileConfig, Settings};

const DEFAULT_LOG_FILTER: &str = "wirefield=info";

#[derive(Parser, Debug)]
#[command(name = "wirefield")]
#[command(about = "Grows non-overlapping circuit wires across a lattice")]
struct Args {
    /// Seed for the wire generator; random when omitted.
    #[arg(long)]
    seed: Option<u64>,
    /// Side length of one lattice cell in pixels.
    #[arg(long)]
    cell_size: Option<f32>,
    /// Viewport width in pixels.
    #[arg(long, default_value_t = 960)]
    width: u32,
    /// Viewport height in pixels.
    #[arg(long, default_value_t = 720)]
    height: u32,
    /// Optional TOML file with tuning parameters.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Simulate without a window and print the final field as text.
    #[arg(long, default_value_t = false)]
    headless: bool,
    /// Simulated run time for headless mode, stepped one animation interval at a time.
    #[arg(long, default_value_t = 10_000)]
    duration_ms: u64,
    /// Synchronise presentation with the display refresh rate.
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    vsync: bool,
    /// Log frame timings once per second.
    #[arg(long, default_value_t = false)]
    show_fps: bool,
    /// Log filter directive; overrides `RUST_LOG`.
    #[arg(long)]
    log_level: Option<String>,
}

/// Entry point for the Wirefield command-line interface.
fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.log_level.as_deref())?;

    let file = match &args.config {
        Some(path) => FileConfig::load(path)?,
        None => FileConfig::default(),
    };
    let settings = Settings::resolve(file, args.seed, args.cell_size)?;
    info!(seed = settings.seed, cell_size = settings.cell_size, "settings resolved");

    if args.headless {
        run_headless(&settings, &args)
    } else {
        run_windowed(&settings, &args)
    }
}

fn init_tracing(level: Option<&str>) -> Result<()> {
    let filter = match level {
        Some(level) => EnvFilter::try_new(level)
            .with_context(|| format!("invalid log filter `{level}`"))?,
        None => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
    };

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .compact()
        .init();
    Ok(())
}

fn viewport_dimensions(args: &Args, settings: &Settings) -> WorldDimensions {
    WorldDimensions::from_viewport(args.width as f32, args.height as f32, settings.cell_size)
}

fn run_headless(settings: &Settings, args: &Args) -> Result<()> {
    let dimensions = viewport_dimensions(args, settings);
    let mut scheduler = Scheduler::new(settings.scheduler, dimensions, settings.seed)
        .context("failed to start scheduler")?;

    let frame = settings.scheduler.animation_interval();
    let mut remaining = Duration::from_millis(args.duration_ms);
    while !remaining.is_zero() {
        let dt = remaining.min(frame);
        scheduler.step(dt);
        remaining -= dt;
    }

    let stats = scheduler.stats();
    info!(
        admitted = stats.admitted,
        rejected = stats.rejected,
        drained = stats.drained,
        exhausted = stats.exhausted,
        pieces = stats.pieces,
        "headless run finished"
    );

    let pieces = query::occupancy_view(scheduler.world()).snapshot();
    print!("{}", ascii::rasterise(dimensions, pieces));
    Ok(())
}

fn run_windowed(settings: &Settings, args: &Args) -> Result<()> {
    let dimensions = viewport_dimensions(args, settings);
    let mut scheduler = Scheduler::new(settings.scheduler, dimensions, settings.seed)
        .context("failed to start scheduler")?;
    let scene = Scene::new(dimensions, settings.cell_size).context("failed to build scene")?;
    let presentation = Presentation::new("Wirefield", Palette::default(), scene);

    let backend = MacroquadBackend::new()
        .with_vsync(args.vsync)
        .with_show_fps(args.show_fps)
        .with_window_size(
            i32::try_from(args.width).context("window width too large")?,
            i32::try_from(args.height).context("window height too large")?,
        );

    let cell_size = settings.cell_size;
    backend.run(presentation, move |dt, input, scene| {
        advance_frame(&mut scheduler, cell_size, dt, input, scene);
    })
}

/// Runs one rendered frame worth of simulation and refreshes the scene when the world changed.
///
/// A reset request or a viewport that now covers a different lattice
/// discards the current world before time advances.
fn advance_frame(
    scheduler: &mut Scheduler,
    cell_size: f32,
    dt: Duration,
    input: FrameInput,
    scene: &mut Scene,
) {
    let dimensions =
        WorldDimensions::from_viewport(input.viewport.x, input.viewport.y, cell_size);
    if input.reset_requested || dimensions != query::dimensions(scheduler.world()) {
        scheduler.reset(dimensions);
    }

    scheduler.step(dt);

    if scheduler.take_dirty() {
        let world = scheduler.world();
        scene.populate(
            query::dimensions(world),
            query::occupancy_view(world).snapshot(),
        );
    }
}
