//! Sparse occupancy store keyed by packed lattice coordinates.

use std::collections::HashMap;

use wirefield_core::{LatticeKey, LatticePoint, Occupancy, WirePiece};

/// Authoritative map from lattice point to the piece anchored there.
///
/// Pieces are inserted or overwritten but never removed for the lifetime of
/// the store.
#[derive(Clone, Debug, Default)]
pub(crate) struct OccupancyStore {
    pieces: HashMap<LatticeKey, WirePiece>,
}

impl OccupancyStore {
    pub(crate) fn is_occupied(&self, point: LatticePoint) -> bool {
        self.pieces.contains_key(&LatticeKey::from_point(point))
    }

    pub(crate) fn get(&self, point: LatticePoint) -> Option<&WirePiece> {
        self.pieces.get(&LatticeKey::from_point(point))
    }

    pub(crate) fn set(&mut self, point: LatticePoint, piece: WirePiece) {
        let _ = self.pieces.insert(LatticeKey::from_point(point), piece);
    }

    pub(crate) fn len(&self) -> usize {
        self.pieces.len()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (LatticePoint, &WirePiece)> {
        self.pieces.iter().map(|(key, piece)| (key.decode(), piece))
    }
}

impl Occupancy for OccupancyStore {
    fn is_occupied(&self, point: LatticePoint) -> bool {
        OccupancyStore::is_occupied(self, point)
    }
}

#[cfg(test)]
mod tests {
    use super::OccupancyStore;
    use wirefield_core::{Direction, LatticePoint, TipPosition, WirePiece};

    #[test]
    fn set_overwrites_existing_piece() {
        let mut store = OccupancyStore::default();
        let point = LatticePoint::new(-3, 8);

        store.set(point, WirePiece::new(Direction::Down, 0.25, TipPosition::End));
        store.set(point, WirePiece::new(Direction::Down, 1.0, TipPosition::Begin));

        assert_eq!(store.len(), 1);
        let piece = store.get(point).expect("piece stored");
        assert!(piece.is_complete());
        assert_eq!(piece.tip, TipPosition::Begin);
    }

    #[test]
    fn iteration_decodes_points() {
        let mut store = OccupancyStore::default();
        let point = LatticePoint::new(i32::MIN, -1);
        store.set(point, WirePiece::new(Direction::DownLeft, 1.0, TipPosition::None));

        let points: Vec<_> = store.iter().map(|(point, _)| point).collect();
        assert_eq!(points, vec![point]);
        assert!(store.is_occupied(point));
        assert!(!store.is_occupied(LatticePoint::new(0, 0)));
    }
}
