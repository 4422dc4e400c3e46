//! Constant-time-per-node collision checks between candidate wires and occupied cells.

use std::{
    collections::{HashMap, HashSet},
    hash::BuildHasher,
};

use crate::{Direction, LatticePoint, Wire, WireNode};

/// Read access to the set of lattice points already claimed by wire pieces.
pub trait Occupancy {
    /// Reports whether a piece is anchored at the point.
    fn is_occupied(&self, point: LatticePoint) -> bool;
}

impl<T: Occupancy + ?Sized> Occupancy for &T {
    fn is_occupied(&self, point: LatticePoint) -> bool {
        (**self).is_occupied(point)
    }
}

impl<S: BuildHasher> Occupancy for HashSet<LatticePoint, S> {
    fn is_occupied(&self, point: LatticePoint) -> bool {
        self.contains(&point)
    }
}

impl<V, S: BuildHasher> Occupancy for HashMap<LatticePoint, V, S> {
    fn is_occupied(&self, point: LatticePoint) -> bool {
        self.contains_key(&point)
    }
}

/// Reports whether the node's segment collides with an occupied cell.
///
/// A segment conflicts with its own origin and with the one neighbour whose
/// segment could share or cross the same grid edge.
#[must_use]
pub fn node_intersects<O: Occupancy + ?Sized>(occupancy: &O, node: &WireNode) -> bool {
    let point = node.point;
    if occupancy.is_occupied(point) {
        return true;
    }

    let neighbour = match node.direction {
        Direction::Down => point.offset(0, 1),
        Direction::DownLeft => point.offset(-1, 0),
        Direction::DownRight => point.offset(1, 0),
    };
    occupancy.is_occupied(neighbour)
}

/// Reports whether any node of the wire collides with occupied cells.
///
/// Performs at most two lookups per node and stops at the first hit.
#[must_use]
pub fn intersects<O: Occupancy + ?Sized>(occupancy: &O, wire: &Wire) -> bool {
    wire.iter().any(|node| node_intersects(occupancy, node))
}

#[cfg(test)]
mod tests {
    use std::{cell::Cell, collections::HashSet};

    use super::{intersects, node_intersects, Occupancy};
    use crate::{Direction, LatticePoint, Wire, WireNode};

    struct CountingOccupancy {
        cells: HashSet<LatticePoint>,
        lookups: Cell<usize>,
    }

    impl Occupancy for CountingOccupancy {
        fn is_occupied(&self, point: LatticePoint) -> bool {
            self.lookups.set(self.lookups.get() + 1);
            self.cells.contains(&point)
        }
    }

    fn single(point: LatticePoint, direction: Direction) -> Wire {
        Wire::new(vec![WireNode::new(point, direction)]).expect("single node wire")
    }

    #[test]
    fn rejects_wire_starting_on_occupied_cell() {
        let occupied: HashSet<_> = [LatticePoint::new(0, 0)].into_iter().collect();
        assert!(intersects(
            &occupied,
            &single(LatticePoint::new(0, 0), Direction::Down)
        ));
    }

    #[test]
    fn accepts_wire_without_shared_neighbours() {
        let occupied: HashSet<_> = [LatticePoint::new(0, 0)].into_iter().collect();
        assert!(!intersects(
            &occupied,
            &single(LatticePoint::new(1, 1), Direction::Down)
        ));
    }

    #[test]
    fn neighbour_check_follows_direction() {
        let occupied: HashSet<_> = [LatticePoint::new(5, 5)].into_iter().collect();

        let below = WireNode::new(LatticePoint::new(5, 4), Direction::Down);
        let right_of = WireNode::new(LatticePoint::new(6, 5), Direction::DownLeft);
        let left_of = WireNode::new(LatticePoint::new(4, 5), Direction::DownRight);
        assert!(node_intersects(&occupied, &below));
        assert!(node_intersects(&occupied, &right_of));
        assert!(node_intersects(&occupied, &left_of));

        let unrelated = WireNode::new(LatticePoint::new(4, 5), Direction::DownLeft);
        assert!(!node_intersects(&occupied, &unrelated));
    }

    #[test]
    fn lookup_count_is_independent_of_store_size() {
        let wire = Wire::new(vec![
            WireNode::new(LatticePoint::new(-100, -100), Direction::Down),
            WireNode::new(LatticePoint::new(-100, -99), Direction::DownRight),
            WireNode::new(LatticePoint::new(-99, -98), Direction::Down),
        ])
        .expect("valid wire");

        let mut observed = Vec::new();
        for size in [0, 100, 10_000] {
            let cells = (0..size)
                .map(|index| LatticePoint::new(index % 100, index / 100))
                .collect();
            let occupancy = CountingOccupancy {
                cells,
                lookups: Cell::new(0),
            };
            assert!(!intersects(&occupancy, &wire));
            observed.push(occupancy.lookups.get());
        }

        assert_eq!(observed, vec![6, 6, 6]);
    }

    #[test]
    fn stops_at_first_hit() {
        let occupancy = CountingOccupancy {
            cells: [LatticePoint::new(0, 0)].into_iter().collect(),
            lookups: Cell::new(0),
        };
        let wire = Wire::new(vec![
            WireNode::new(LatticePoint::new(0, 0), Direction::Down),
            WireNode::new(LatticePoint::new(0, 1), Direction::Down),
        ])
        .expect("valid wire");

        assert!(intersects(&occupancy, &wire));
        assert_eq!(occupancy.lookups.get(), 1);
    }
}
