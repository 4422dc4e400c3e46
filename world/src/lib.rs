#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Wirefield.

mod occupancy;
mod reveal;

use wirefield_core::{Command, Epoch, Event, WorldDimensions};

use crate::{occupancy::OccupancyStore, reveal::RevealQueue};

/// Represents the authoritative Wirefield world state.
#[derive(Debug)]
pub struct World {
    epoch: Epoch,
    dimensions: WorldDimensions,
    occupancy: OccupancyStore,
    reveal: RevealQueue,
}

impl World {
    /// Creates an empty world covering the provided lattice.
    #[must_use]
    pub fn new(dimensions: WorldDimensions) -> Self {
        Self {
            epoch: Epoch::default(),
            dimensions,
            occupancy: OccupancyStore::default(),
            reveal: RevealQueue::default(),
        }
    }

    fn accepts(&self, epoch: Epoch, out_events: &mut Vec<Event>) -> bool {
        if epoch == self.epoch {
            return true;
        }
        out_events.push(Event::StaleCommandIgnored { epoch });
        false
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::ConfigureWorld { dimensions } => {
            world.epoch = world.epoch.next();
            world.dimensions = dimensions;
            world.occupancy = OccupancyStore::default();
            world.reveal = RevealQueue::default();
            out_events.push(Event::WorldConfigured {
                epoch: world.epoch,
                dimensions,
            });
        }
        Command::AdmitWire { epoch, wire } => {
            if !world.accepts(epoch, out_events) {
                return;
            }
            let nodes = wire.len();
            world.reveal.push(wire);
            out_events.push(Event::WireAdmitted { epoch, nodes });
        }
        Command::AdvanceReveal { epoch, now } => {
            if !world.accepts(epoch, out_events) {
                return;
            }
            world
                .reveal
                .advance(now, epoch, &mut world.occupancy, out_events);
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use super::{OccupancyStore, World};
    use wirefield_core::{Epoch, LatticePoint, Occupancy, WirePiece, WorldDimensions};

    /// Epoch of the currently active world instance.
    #[must_use]
    pub fn epoch(world: &World) -> Epoch {
        world.epoch
    }

    /// Grid size the world was configured with.
    #[must_use]
    pub fn dimensions(world: &World) -> WorldDimensions {
        world.dimensions
    }

    /// Reports whether no wire is waiting for or undergoing reveal.
    #[must_use]
    pub fn is_reveal_idle(world: &World) -> bool {
        world.reveal.is_empty()
    }

    /// Number of wires held by the reveal queue, including the head.
    #[must_use]
    pub fn queued_wires(world: &World) -> usize {
        world.reveal.len()
    }

    /// Cursor of the wire currently being revealed, if any.
    #[must_use]
    pub fn head_cursor(world: &World) -> Option<usize> {
        world.reveal.head_cursor()
    }

    /// Exposes a read-only view of the occupancy store.
    #[must_use]
    pub fn occupancy_view(world: &World) -> OccupancyView<'_> {
        OccupancyView {
            store: &world.occupancy,
        }
    }

    /// Read-only view into the occupancy store.
    #[derive(Clone, Copy, Debug)]
    pub struct OccupancyView<'a> {
        store: &'a OccupancyStore,
    }

    impl<'a> OccupancyView<'a> {
        /// Returns the piece anchored at the point, if any.
        #[must_use]
        pub fn piece(&self, point: LatticePoint) -> Option<WirePiece> {
            self.store.get(point).copied()
        }

        /// Number of occupied lattice points.
        #[must_use]
        pub fn len(&self) -> usize {
            self.store.len()
        }

        /// Reports whether no piece has been written yet.
        #[must_use]
        pub fn is_empty(&self) -> bool {
            self.store.len() == 0
        }

        /// Iterates over every piece in unspecified order.
        pub fn iter(&self) -> impl Iterator<Item = (LatticePoint, WirePiece)> + 'a {
            let store = self.store;
            store.iter().map(|(point, piece)| (point, *piece))
        }

        /// Captures every piece ordered by row, then column.
        #[must_use]
        pub fn snapshot(&self) -> Vec<(LatticePoint, WirePiece)> {
            let mut pieces: Vec<_> = self.iter().collect();
            pieces.sort_by_key(|(point, _)| (point.y(), point.x()));
            pieces
        }
    }

    impl Occupancy for OccupancyView<'_> {
        fn is_occupied(&self, point: LatticePoint) -> bool {
            self.store.is_occupied(point)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use wirefield_core::{Direction, LatticePoint, Wire, WireNode, SEGMENT_DURATION};

    fn wire_at(x: i32) -> Wire {
        Wire::new(vec![
            WireNode::new(LatticePoint::new(x, 0), Direction::Down),
            WireNode::new(LatticePoint::new(x, 1), Direction::DownRight),
        ])
        .expect("valid wire")
    }

    #[test]
    fn configure_world_bumps_epoch_and_discards_state() {
        let mut world = World::new(WorldDimensions::new(10, 10));
        let mut events = Vec::new();
        let epoch = query::epoch(&world);

        apply(
            &mut world,
            Command::AdmitWire {
                epoch,
                wire: wire_at(2),
            },
            &mut events,
        );
        apply(
            &mut world,
            Command::AdvanceReveal {
                epoch,
                now: Duration::ZERO,
            },
            &mut events,
        );
        assert_eq!(query::occupancy_view(&world).len(), 1);

        events.clear();
        let dimensions = WorldDimensions::new(30, 12);
        apply(&mut world, Command::ConfigureWorld { dimensions }, &mut events);

        assert_eq!(query::epoch(&world), epoch.next());
        assert_eq!(query::dimensions(&world), dimensions);
        assert!(query::occupancy_view(&world).is_empty());
        assert!(query::is_reveal_idle(&world));
        assert_eq!(
            events,
            vec![Event::WorldConfigured {
                epoch: epoch.next(),
                dimensions
            }]
        );
    }

    #[test]
    fn stale_commands_do_not_mutate_retired_world() {
        let mut world = World::new(WorldDimensions::new(10, 10));
        let mut events = Vec::new();
        let retired = query::epoch(&world);
        apply(
            &mut world,
            Command::ConfigureWorld {
                dimensions: WorldDimensions::new(10, 10),
            },
            &mut events,
        );
        events.clear();

        apply(
            &mut world,
            Command::AdmitWire {
                epoch: retired,
                wire: wire_at(0),
            },
            &mut events,
        );
        apply(
            &mut world,
            Command::AdvanceReveal {
                epoch: retired,
                now: SEGMENT_DURATION,
            },
            &mut events,
        );

        assert!(query::is_reveal_idle(&world));
        assert!(query::occupancy_view(&world).is_empty());
        assert_eq!(
            events,
            vec![
                Event::StaleCommandIgnored { epoch: retired },
                Event::StaleCommandIgnored { epoch: retired },
            ]
        );
    }

    #[test]
    fn snapshot_orders_pieces_by_row_then_column() {
        let mut world = World::new(WorldDimensions::new(10, 10));
        let mut events = Vec::new();
        let epoch = query::epoch(&world);
        for x in [7, 3] {
            apply(
                &mut world,
                Command::AdmitWire {
                    epoch,
                    wire: wire_at(x),
                },
                &mut events,
            );
        }

        let mut now = Duration::ZERO;
        while !query::is_reveal_idle(&world) {
            apply(&mut world, Command::AdvanceReveal { epoch, now }, &mut events);
            now += SEGMENT_DURATION;
        }

        let points: Vec<_> = query::occupancy_view(&world)
            .snapshot()
            .into_iter()
            .map(|(point, _)| point)
            .collect();
        assert_eq!(
            points,
            vec![
                LatticePoint::new(3, 0),
                LatticePoint::new(7, 0),
                LatticePoint::new(3, 1),
                LatticePoint::new(7, 1),
            ]
        );
    }
}
