#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Wirefield engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters and systems submit
//! [`Command`] values describing desired mutations, the world executes those
//! commands via its `apply` entry point, and then broadcasts [`Event`] values
//! describing what changed. Systems read immutable views through the
//! [`Occupancy`] trait and respond exclusively with new command batches.

mod intersection;

use std::{fmt, num::ParseIntError, str::FromStr, time::Duration};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use intersection::{intersects, node_intersects, Occupancy};

/// Rate at which a single segment grows, expressed in segments per thousand time units.
pub const WIRE_LERP_SPEED: u64 = 10;

/// Simulated time required for one segment to grow from its origin to its successor.
pub const SEGMENT_DURATION: Duration = Duration::from_millis(1_000 / WIRE_LERP_SPEED);

/// Number of consecutive rejected candidates after which admission stops for a world.
pub const ADMISSION_FAILURE_BUDGET: u32 = 200;

const KEY_DELIMITER: char = ',';

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Discards every wire and piece, then adopts the provided dimensions.
    ///
    /// Processing this command retires the current epoch; any command still
    /// carrying the previous epoch is ignored afterwards.
    ConfigureWorld {
        /// Grid size the world should adopt.
        dimensions: WorldDimensions,
    },
    /// Appends an accepted wire to the tail of the reveal queue.
    AdmitWire {
        /// Epoch the admission decision was made against.
        epoch: Epoch,
        /// Wire that passed the intersection test.
        wire: Wire,
    },
    /// Advances the head of the reveal queue by at most one segment.
    AdvanceReveal {
        /// Epoch the animation trigger was scheduled against.
        epoch: Epoch,
        /// Monotonic time observed by the animation trigger.
        now: Duration,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Announces that the world was rebuilt under a fresh epoch.
    WorldConfigured {
        /// Epoch that became active.
        epoch: Epoch,
        /// Grid size adopted by the world.
        dimensions: WorldDimensions,
    },
    /// Confirms that a wire entered the reveal queue.
    WireAdmitted {
        /// Epoch the wire belongs to.
        epoch: Epoch,
        /// Number of nodes carried by the wire.
        nodes: usize,
    },
    /// Reports that a piece was inserted or overwritten in the occupancy store.
    PieceWritten {
        /// Lattice point the piece is anchored at.
        point: LatticePoint,
        /// State written for the point.
        piece: WirePiece,
    },
    /// Reports that the head wire finished growing one of its segments.
    SegmentCompleted {
        /// Lattice point of the completed segment's origin.
        point: LatticePoint,
        /// Cursor of the head wire after the segment completed.
        cursor: usize,
    },
    /// Reports that the head wire was fully revealed and left the queue.
    WireDrained {
        /// Epoch the wire belonged to.
        epoch: Epoch,
    },
    /// Reports that a command carrying a retired epoch was discarded.
    StaleCommandIgnored {
        /// Epoch carried by the discarded command.
        epoch: Epoch,
    },
}

/// Monotonic generation counter distinguishing successive world instances.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Epoch(u64);

impl Epoch {
    /// Creates a new epoch with the provided numeric value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the epoch.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }

    /// Returns the epoch that follows this one.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

/// Size of the visible lattice measured in whole cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorldDimensions {
    columns: u32,
    rows: u32,
}

impl WorldDimensions {
    /// Creates a new dimension descriptor.
    #[must_use]
    pub const fn new(columns: u32, rows: u32) -> Self {
        Self { columns, rows }
    }

    /// Derives the lattice size covering a viewport measured in pixels.
    ///
    /// Partial cells along either edge are dropped. A non-positive or
    /// non-finite cell size yields an empty lattice.
    #[must_use]
    pub fn from_viewport(width: f32, height: f32, cell_size: f32) -> Self {
        if !cell_size.is_finite() || cell_size <= 0.0 {
            return Self::new(0, 0);
        }

        let columns = (width.max(0.0) / cell_size).floor() as u32;
        let rows = (height.max(0.0) / cell_size).floor() as u32;
        Self::new(columns, rows)
    }

    /// Number of lattice columns.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of lattice rows.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Reports whether the point lies within the visible lattice.
    #[must_use]
    pub fn contains(&self, point: LatticePoint) -> bool {
        u32::try_from(point.x()).map_or(false, |x| x < self.columns)
            && u32::try_from(point.y()).map_or(false, |y| y < self.rows)
    }
}

/// Integer lattice coordinate that a segment may originate from.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct LatticePoint {
    x: i32,
    y: i32,
}

impl LatticePoint {
    /// Creates a new lattice point.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Horizontal coordinate, growing to the right.
    #[must_use]
    pub const fn x(&self) -> i32 {
        self.x
    }

    /// Vertical coordinate, growing downward.
    #[must_use]
    pub const fn y(&self) -> i32 {
        self.y
    }

    /// Returns the point displaced by the provided offsets.
    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x.wrapping_add(dx), self.y.wrapping_add(dy))
    }
}

impl fmt::Display for LatticePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{KEY_DELIMITER}{}", self.x, self.y)
    }
}

impl FromStr for LatticePoint {
    type Err = ParsePointError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (x, y) = value
            .split_once(KEY_DELIMITER)
            .ok_or_else(|| ParsePointError::MissingDelimiter(value.to_owned()))?;
        let x = x.trim().parse().map_err(ParsePointError::InvalidCoordinate)?;
        let y = y.trim().parse().map_err(ParsePointError::InvalidCoordinate)?;
        Ok(Self::new(x, y))
    }
}

/// Reasons a textual lattice key may fail to parse.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ParsePointError {
    /// The key did not contain the `x,y` delimiter.
    #[error("lattice key `{0}` is missing the `,` delimiter")]
    MissingDelimiter(String),
    /// One of the coordinates was not a valid integer.
    #[error("lattice key contains an invalid coordinate")]
    InvalidCoordinate(#[source] ParseIntError),
}

/// Packed occupancy key combining both lattice coordinates in one integer.
///
/// The horizontal coordinate lives in the upper 32 bits and the vertical
/// coordinate in the lower 32 bits, both in two's complement, so every
/// `i32` pair maps to exactly one key and back.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LatticeKey(u64);

impl LatticeKey {
    /// Encodes a pair of world coordinates, truncating each toward zero.
    ///
    /// Values beyond the `i32` range saturate and `NaN` maps to zero.
    #[must_use]
    pub fn encode(x: f64, y: f64) -> Self {
        Self::from_point(LatticePoint::new(x as i32, y as i32))
    }

    /// Encodes an integer lattice point.
    #[must_use]
    pub const fn from_point(point: LatticePoint) -> Self {
        let high = (point.x as u32 as u64) << 32;
        let low = point.y as u32 as u64;
        Self(high | low)
    }

    /// Decodes the key back into its lattice point.
    #[must_use]
    pub const fn decode(self) -> LatticePoint {
        LatticePoint::new((self.0 >> 32) as u32 as i32, self.0 as u32 as i32)
    }
}

impl From<LatticePoint> for LatticeKey {
    fn from(point: LatticePoint) -> Self {
        Self::from_point(point)
    }
}

/// Travel direction of a segment leaving a lattice point.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Direction {
    /// Straight down: `(x, y + 1)`.
    Down,
    /// Down and to the left: `(x - 1, y + 1)`.
    DownLeft,
    /// Down and to the right: `(x + 1, y + 1)`.
    DownRight,
}

impl Direction {
    /// Every direction a segment may travel.
    pub const ALL: [Direction; 3] = [Direction::Down, Direction::DownLeft, Direction::DownRight];

    /// The two diagonal directions.
    pub const DIAGONALS: [Direction; 2] = [Direction::DownLeft, Direction::DownRight];

    /// Lattice displacement applied by one step in this direction.
    #[must_use]
    pub const fn offset(self) -> (i32, i32) {
        match self {
            Self::Down => (0, 1),
            Self::DownLeft => (-1, 1),
            Self::DownRight => (1, 1),
        }
    }

    /// Computes the lattice point reached by stepping once from `point`.
    #[must_use]
    pub const fn successor(self, point: LatticePoint) -> LatticePoint {
        let (dx, dy) = self.offset();
        point.offset(dx, dy)
    }

    /// Reports whether the direction has a lateral component.
    #[must_use]
    pub const fn is_diagonal(self) -> bool {
        !matches!(self, Self::Down)
    }

    /// Canonical lowercase name of the direction.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Down => "down",
            Self::DownLeft => "down-left",
            Self::DownRight => "down-right",
        }
    }

    /// Resolves the direction that carries `from` to `to` in a single step.
    #[must_use]
    pub fn between(from: LatticePoint, to: LatticePoint) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|direction| direction.successor(from) == to)
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Direction {
    type Err = InvalidDirection;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|direction| direction.name() == value)
            .ok_or_else(|| InvalidDirection(value.to_owned()))
    }
}

impl TryFrom<u8> for Direction {
    type Error = InvalidDirection;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::ALL
            .get(usize::from(value))
            .copied()
            .ok_or_else(|| InvalidDirection(value.to_string()))
    }
}

/// A value outside the three legal directions reached direction decoding.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("invalid wire direction `{0}`; expected down, down-left or down-right")]
pub struct InvalidDirection(pub String);

/// Lattice point paired with the direction of the segment leaving it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WireNode {
    /// Origin of the segment.
    pub point: LatticePoint,
    /// Direction the segment travels from its origin.
    pub direction: Direction,
}

impl WireNode {
    /// Creates a new wire node.
    #[must_use]
    pub const fn new(point: LatticePoint, direction: Direction) -> Self {
        Self { point, direction }
    }

    /// Lattice point the node's segment ends at.
    #[must_use]
    pub const fn endpoint(&self) -> LatticePoint {
        self.direction.successor(self.point)
    }
}

/// Immutable polyline made of contiguous wire nodes.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Wire {
    nodes: Vec<WireNode>,
}

impl Wire {
    /// Creates a wire after checking that every node starts where the previous one ended.
    pub fn new(nodes: Vec<WireNode>) -> Result<Self, WireError> {
        if nodes.is_empty() {
            return Err(WireError::Empty);
        }

        for (index, pair) in nodes.windows(2).enumerate() {
            let (previous, next) = (pair[0], pair[1]);
            if previous.endpoint() != next.point {
                return Err(WireError::Disjoint { index: index + 1 });
            }
        }

        Ok(Self { nodes })
    }

    /// Nodes composing the wire in travel order.
    #[must_use]
    pub fn nodes(&self) -> &[WireNode] {
        &self.nodes
    }

    /// Number of nodes in the wire.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always `false`; wires hold at least one node.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Node at the provided cursor, if any.
    #[must_use]
    pub fn get(&self, cursor: usize) -> Option<&WireNode> {
        self.nodes.get(cursor)
    }

    /// Iterator over the wire's nodes.
    pub fn iter(&self) -> impl Iterator<Item = &WireNode> {
        self.nodes.iter()
    }
}

/// Incrementally traces a wire one step at a time.
///
/// Every step starts where the previous segment ends, so the finished wire is
/// contiguous by construction.
#[derive(Clone, Debug)]
pub struct WireBuilder {
    nodes: Vec<WireNode>,
}

impl WireBuilder {
    /// Starts a wire at `point` whose first segment travels in `direction`.
    #[must_use]
    pub fn start(point: LatticePoint, direction: Direction) -> Self {
        Self {
            nodes: vec![WireNode::new(point, direction)],
        }
    }

    /// Direction of the most recently appended node.
    #[must_use]
    pub fn direction(&self) -> Direction {
        self.last().direction
    }

    /// Lattice point the next node will be placed at.
    #[must_use]
    pub fn cursor(&self) -> LatticePoint {
        self.last().endpoint()
    }

    /// Appends a node at the end of the current segment travelling in `direction`.
    pub fn step(&mut self, direction: Direction) -> &mut Self {
        let point = self.cursor();
        self.nodes.push(WireNode::new(point, direction));
        self
    }

    /// Number of nodes traced so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always `false`; a builder starts with one node.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Finishes the wire.
    #[must_use]
    pub fn build(self) -> Wire {
        Wire { nodes: self.nodes }
    }

    fn last(&self) -> &WireNode {
        let index = self.nodes.len() - 1;
        &self.nodes[index]
    }
}

/// Reasons a node sequence cannot form a wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum WireError {
    /// No nodes were supplied.
    #[error("a wire requires at least one node")]
    Empty,
    /// A node does not start where its predecessor's segment ends.
    #[error("wire node {index} does not continue from its predecessor")]
    Disjoint {
        /// Index of the offending node.
        index: usize,
    },
}

/// Which circular tip markers a rendered segment carries.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TipPosition {
    /// No marker.
    #[default]
    None,
    /// Marker at the segment origin.
    Begin,
    /// Marker at the segment's interpolated end.
    End,
    /// Markers at both ends.
    BeginEnd,
}

impl TipPosition {
    /// Reports whether a marker sits at the segment origin.
    #[must_use]
    pub const fn has_begin(self) -> bool {
        matches!(self, Self::Begin | Self::BeginEnd)
    }

    /// Reports whether a marker sits at the interpolated end.
    #[must_use]
    pub const fn has_end(self) -> bool {
        matches!(self, Self::End | Self::BeginEnd)
    }
}

/// Rendering-relevant state of the segment anchored at one lattice point.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WirePiece {
    /// Direction the segment travels.
    pub direction: Direction,
    /// Fraction of the segment grown so far, within `0.0..=1.0`.
    pub lerp: f32,
    /// Tip markers drawn for the segment.
    pub tip: TipPosition,
}

impl WirePiece {
    /// Creates a new piece, clamping `lerp` into the unit interval.
    #[must_use]
    pub fn new(direction: Direction, lerp: f32, tip: TipPosition) -> Self {
        let lerp = if lerp.is_nan() {
            0.0
        } else {
            lerp.clamp(0.0, 1.0)
        };
        Self {
            direction,
            lerp,
            tip,
        }
    }

    /// Reports whether the segment reached its successor.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.lerp >= 1.0
    }
}
