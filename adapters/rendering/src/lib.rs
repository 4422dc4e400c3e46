#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared rendering contracts for Wirefield adapters.
//!
//! Adapters never read the world directly. The simulation copies occupancy
//! entries into a [`Scene`], which translates lattice coordinates into world
//! units; backends only stroke the resulting segments and tip markers.

pub mod ascii;

use anyhow::Result as AnyResult;
use glam::Vec2;
use std::{error::Error, fmt, time::Duration};
use wirefield_core::{LatticePoint, WirePiece, WorldDimensions};

/// RGBA color used when presenting frames.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    /// Red channel intensity in the range 0.0..=1.0.
    pub red: f32,
    /// Green channel intensity in the range 0.0..=1.0.
    pub green: f32,
    /// Blue channel intensity in the range 0.0..=1.0.
    pub blue: f32,
    /// Alpha channel intensity in the range 0.0..=1.0.
    pub alpha: f32,
}

impl Color {
    /// Creates an opaque color from byte RGB values.
    #[must_use]
    pub const fn from_rgb_u8(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red: red as f32 / 255.0,
            green: green as f32 / 255.0,
            blue: blue as f32 / 255.0,
            alpha: 1.0,
        }
    }
}

/// Colors and stroke metrics applied to every frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Palette {
    /// Solid color used to clear each frame.
    pub background: Color,
    /// Color of wire strokes.
    pub stroke: Color,
    /// Color of tip markers.
    pub tip: Color,
    /// Stroke thickness as a fraction of the cell size.
    pub stroke_width: f32,
    /// Tip marker radius as a fraction of the cell size.
    pub tip_radius: f32,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            background: Color::from_rgb_u8(0x0b, 0x10, 0x14),
            stroke: Color::from_rgb_u8(0x2c, 0x5f, 0x4f),
            tip: Color::from_rgb_u8(0x6f, 0xd3, 0xa8),
            stroke_width: 0.12,
            tip_radius: 0.18,
        }
    }
}

/// Input snapshot gathered by adapters before updating the scene.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct FrameInput {
    /// Whether the adapter detected a reset request on this frame.
    pub reset_requested: bool,
    /// Size of the drawable viewport in pixels.
    pub viewport: Vec2,
}

/// Stroke describing one occupied lattice point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SegmentPresentation {
    /// Segment origin expressed in world units.
    pub origin: Vec2,
    /// Interpolated end of the segment expressed in world units.
    pub tip: Vec2,
    /// Whether a marker is drawn at the origin.
    pub begin_marker: bool,
    /// Whether a marker is drawn at the interpolated end.
    pub end_marker: bool,
}

impl SegmentPresentation {
    /// Projects a piece anchored at `point` onto a grid of `cell_size` world units.
    ///
    /// Segments run between cell centres; the end point is interpolated by
    /// the piece's `lerp` along its direction.
    #[must_use]
    pub fn from_piece(point: LatticePoint, piece: WirePiece, cell_size: f32) -> Self {
        let origin = (Vec2::new(point.x() as f32, point.y() as f32) + Vec2::splat(0.5)) * cell_size;
        let (dx, dy) = piece.direction.offset();
        let tip = origin + Vec2::new(dx as f32, dy as f32) * piece.lerp * cell_size;
        Self {
            origin,
            tip,
            begin_marker: piece.tip.has_begin(),
            end_marker: piece.tip.has_end(),
        }
    }
}

/// Scene description holding every stroke visible in a frame.
#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
    /// Lattice size the scene covers.
    pub dimensions: WorldDimensions,
    /// Side length of one lattice cell in world units.
    pub cell_size: f32,
    /// Strokes in draw order.
    pub segments: Vec<SegmentPresentation>,
}

impl Scene {
    /// Creates an empty scene.
    pub fn new(dimensions: WorldDimensions, cell_size: f32) -> Result<Self, RenderingError> {
        if !cell_size.is_finite() || cell_size <= 0.0 {
            return Err(RenderingError::InvalidCellSize { cell_size });
        }

        Ok(Self {
            dimensions,
            cell_size,
            segments: Vec::new(),
        })
    }

    /// Replaces the strokes with projections of the provided pieces.
    pub fn populate<I>(&mut self, dimensions: WorldDimensions, pieces: I)
    where
        I: IntoIterator<Item = (LatticePoint, WirePiece)>,
    {
        self.dimensions = dimensions;
        self.segments.clear();
        let cell_size = self.cell_size;
        self.segments.extend(
            pieces
                .into_iter()
                .map(|(point, piece)| SegmentPresentation::from_piece(point, piece, cell_size)),
        );
    }

    /// Total width of the scene in world units.
    #[must_use]
    pub fn width(&self) -> f32 {
        self.dimensions.columns() as f32 * self.cell_size
    }

    /// Total height of the scene in world units.
    #[must_use]
    pub fn height(&self) -> f32 {
        self.dimensions.rows() as f32 * self.cell_size
    }
}

/// Presentation descriptor consumed by rendering backends.
#[derive(Clone, Debug, PartialEq)]
pub struct Presentation {
    /// Title used by the created window.
    pub window_title: String,
    /// Colors and stroke metrics.
    pub palette: Palette,
    /// Scene content that should be displayed.
    pub scene: Scene,
}

impl Presentation {
    /// Constructs a new presentation descriptor.
    #[must_use]
    pub fn new<T>(window_title: T, palette: Palette, scene: Scene) -> Self
    where
        T: Into<String>,
    {
        Self {
            window_title: window_title.into(),
            palette,
            scene,
        }
    }
}

/// Rendering backend capable of presenting Wirefield scenes.
pub trait RenderingBackend {
    /// Runs the rendering backend until it is requested to exit.
    ///
    /// The provided `update_scene` closure receives the frame delta and the
    /// per-frame input captured by the adapter, and refreshes the scene
    /// before it is drawn. Backends must treat the scene as read-only.
    fn run<F>(self, presentation: Presentation, update_scene: F) -> AnyResult<()>
    where
        F: FnMut(Duration, FrameInput, &mut Scene) + 'static;
}

/// Errors that can occur when constructing rendering descriptors.
#[derive(Debug, PartialEq)]
pub enum RenderingError {
    /// Cell size must be positive and finite.
    InvalidCellSize {
        /// Provided cell size that failed validation.
        cell_size: f32,
    },
}

impl fmt::Display for RenderingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidCellSize { cell_size } => {
                write!(f, "cell size must be positive (received {cell_size})")
            }
        }
    }
}

impl Error for RenderingError {}
