//! The local flip state machine.
//!
//! A move reverses the four arrows around one face of the lattice. It is
//! addressed by a base vertex and a [`Direction`]:
//!
//! ```text
//!   Up at (r, c)                      Down at (r, c)
//!
//!   upper ------- upper_right         left ------- base
//!   (r-1, c)      (r-1, c+1)          (r, c-1)     (r, c)
//!     |               |                 |             |
//!   base -------- right               down_left --- down
//!   (r, c)        (r, c+1)            (r+1, c-1)   (r+1, c)
//! ```
//!
//! Legality depends on two diagonal corners only: once the base and the
//! opposite corner agree that the face is circulating, the other two corners
//! are forced. Each corner then changes through its own two-entry
//! substitution table. An Up at `(r, c)` and a Down at `(r - 1, c + 1)` act
//! on the same face and undo each other.

use crate::lattice::Lattice;
use crate::vertex::VertexType;
use crate::vertex::VertexType::{A1, A2, B1, B2, C1, C2};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Direction and plaquette
// ---------------------------------------------------------------------------

/// Orientation of a local move relative to its base vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    pub const BOTH: [Direction; 2] = [Direction::Up, Direction::Down];
}

/// The four positions touched by a move, in table order.
///
/// Up: `[base, right, upper_right, upper]`.
/// Down: `[down_left, down, base, left]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Plaquette {
    pub direction: Direction,
    pub row: usize,
    pub col: usize,
    pub cells: [(usize, usize); 4],
}

impl Plaquette {
    /// The plaquette for a move at `(row, col)`, or `None` if any of its
    /// corners would fall outside a `width x height` lattice.
    pub fn at(width: usize, height: usize, row: usize, col: usize, direction: Direction) -> Option<Self> {
        if row >= height || col >= width {
            return None;
        }
        let cells = match direction {
            Direction::Up => {
                if row == 0 || col + 1 >= width {
                    return None;
                }
                [
                    (row, col),
                    (row, col + 1),
                    (row - 1, col + 1),
                    (row - 1, col),
                ]
            }
            Direction::Down => {
                if row + 1 >= height || col == 0 {
                    return None;
                }
                [
                    (row + 1, col - 1),
                    (row + 1, col),
                    (row, col),
                    (row, col - 1),
                ]
            }
        };
        Some(Self {
            direction,
            row,
            col,
            cells,
        })
    }

    /// Read the four current types from a lattice.
    pub fn read(&self, lattice: &Lattice) -> [VertexType; 4] {
        self.cells.map(|(r, c)| lattice.get(r, c))
    }
}

// ---------------------------------------------------------------------------
// Substitution tables
// ---------------------------------------------------------------------------

type Substitution = [Option<VertexType>; 6];

const fn substitution(first: (VertexType, VertexType), second: (VertexType, VertexType)) -> Substitution {
    let mut table = [None; 6];
    table[first.0 as usize] = Some(first.1);
    table[second.0 as usize] = Some(second.1);
    table
}

/// Up: base, right, upper_right, upper.
const UP_TABLE: [Substitution; 4] = [
    substitution((A1, C1), (C2, A2)),
    substitution((B2, C2), (C1, B1)),
    substitution((A2, C1), (C2, A1)),
    substitution((B1, C2), (C1, B2)),
];

/// Down: down_left, down, base, left.
const DOWN_TABLE: [Substitution; 4] = [
    substitution((A2, C2), (C1, A1)),
    substitution((B1, C1), (C2, B2)),
    substitution((A1, C2), (C1, A2)),
    substitution((B2, C1), (C2, B1)),
];

fn table(direction: Direction) -> &'static [Substitution; 4] {
    match direction {
        Direction::Up => &UP_TABLE,
        Direction::Down => &DOWN_TABLE,
    }
}

// ---------------------------------------------------------------------------
// Validity predicate
// ---------------------------------------------------------------------------

/// Joint predicate over the base and its diagonal partner.
///
/// Up needs base in {a1, c2} and upper-right in {a2, c2}. Down needs base in
/// {a1, c1} and down-left in {a2, c1}.
#[inline]
pub fn is_legal(direction: Direction, base: VertexType, diagonal: VertexType) -> bool {
    match direction {
        Direction::Up => matches!(base, A1 | C2) && matches!(diagonal, A2 | C2),
        Direction::Down => matches!(base, A1 | C1) && matches!(diagonal, A2 | C1),
    }
}

/// Whether a move in `direction` is legal at `(row, col)`.
#[inline]
pub fn can_flip(lattice: &Lattice, row: usize, col: usize, direction: Direction) -> bool {
    let (w, h) = (lattice.width(), lattice.height());
    match direction {
        Direction::Up => {
            row > 0
                && row < h
                && col + 1 < w
                && is_legal(direction, lattice.get(row, col), lattice.get(row - 1, col + 1))
        }
        Direction::Down => {
            col > 0
                && col < w
                && row + 1 < h
                && is_legal(direction, lattice.get(row, col), lattice.get(row + 1, col - 1))
        }
    }
}

// ---------------------------------------------------------------------------
// Transformation
// ---------------------------------------------------------------------------

/// The four replacement types for a plaquette, or `None` if the move is not
/// legal for `before` (given in table order).
pub fn transform(direction: Direction, before: [VertexType; 4]) -> Option<[VertexType; 4]> {
    let (base, diagonal) = match direction {
        Direction::Up => (before[0], before[2]),
        Direction::Down => (before[2], before[0]),
    };
    if !is_legal(direction, base, diagonal) {
        return None;
    }
    let table = table(direction);
    let mut after = before;
    for (slot, substitution) in after.iter_mut().zip(table.iter()) {
        if let Some(next) = substitution[slot.index()] {
            *slot = next;
        }
    }
    Some(after)
}

/// An applied move: where it happened and what it changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlipRecord {
    pub plaquette: Plaquette,
    pub before: [VertexType; 4],
    pub after: [VertexType; 4],
}

/// Compute the move at `(row, col)` without writing it.
pub fn propose(lattice: &Lattice, row: usize, col: usize, direction: Direction) -> Option<FlipRecord> {
    let plaquette = Plaquette::at(lattice.width(), lattice.height(), row, col, direction)?;
    let before = plaquette.read(lattice);
    let after = transform(direction, before)?;
    Some(FlipRecord {
        plaquette,
        before,
        after,
    })
}

/// Write a proposed move into the lattice.
pub fn commit(lattice: &mut Lattice, record: &FlipRecord) {
    for (&(r, c), &v) in record.plaquette.cells.iter().zip(record.after.iter()) {
        lattice.set(r, c, v);
    }
    debug_assert!(
        record
            .plaquette
            .cells
            .iter()
            .all(|&(r, c)| locally_consistent(lattice, r, c)),
        "flip at ({}, {}) {:?} broke edge consistency",
        record.plaquette.row,
        record.plaquette.col,
        record.plaquette.direction,
    );
}

/// Validate, transform and write a move. Returns `None` (lattice untouched)
/// if the move is not legal.
pub fn apply(lattice: &mut Lattice, row: usize, col: usize, direction: Direction) -> Option<FlipRecord> {
    let record = propose(lattice, row, col, direction)?;
    commit(lattice, &record);
    Some(record)
}

/// Whether `(row, col)` agrees with its four neighbours on shared edges.
pub fn locally_consistent(lattice: &Lattice, row: usize, col: usize) -> bool {
    let here = lattice.get(row, col).configuration();
    let (w, h) = (lattice.width(), lattice.height());
    if col > 0 && lattice.get(row, col - 1).configuration().right == here.left {
        return false;
    }
    if col + 1 < w && lattice.get(row, col + 1).configuration().left == here.right {
        return false;
    }
    if row > 0 && lattice.get(row - 1, col).configuration().bottom == here.top {
        return false;
    }
    if row + 1 < h && lattice.get(row + 1, col).configuration().top == here.bottom {
        return false;
    }
    true
}
