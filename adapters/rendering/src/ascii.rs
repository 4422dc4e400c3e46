//! Text rasteriser used by terminal and headless adapters.

use wirefield_core::{Direction, LatticePoint, WirePiece, WorldDimensions};

const EMPTY: char = ' ';
const MARKER: char = 'o';
const GROWING: char = '.';

/// Draws one character per lattice cell, row by row.
///
/// Completed segments use `|`, `/` and `\` for their direction, growing
/// segments show `.`, and cells carrying a begin marker show `o`. Pieces
/// outside the visible lattice are skipped.
#[must_use]
pub fn rasterise<I>(dimensions: WorldDimensions, pieces: I) -> String
where
    I: IntoIterator<Item = (LatticePoint, WirePiece)>,
{
    let columns = dimensions.columns() as usize;
    let rows = dimensions.rows() as usize;
    let mut cells = vec![EMPTY; columns * rows];

    for (point, piece) in pieces {
        if !dimensions.contains(point) {
            continue;
        }
        let index = point.y() as usize * columns + point.x() as usize;
        cells[index] = glyph(piece);
    }

    let mut picture = String::with_capacity((columns + 1) * rows);
    for row in cells.chunks(columns.max(1)).take(rows) {
        picture.extend(row.iter());
        picture.push('\n');
    }
    picture
}

fn glyph(piece: WirePiece) -> char {
    if piece.tip.has_begin() {
        return MARKER;
    }
    if !piece.is_complete() {
        return GROWING;
    }
    match piece.direction {
        Direction::Down => '|',
        Direction::DownLeft => '/',
        Direction::DownRight => '\\',
    }
}
