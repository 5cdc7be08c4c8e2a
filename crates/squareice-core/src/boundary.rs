//! Domain-wall boundary conditions and their extremal fillings.
//!
//! Under DWBC every horizontal boundary arrow points into the lattice and
//! every vertical boundary arrow points out of it. Moves only ever reverse
//! interior edges, so the boundary is fixed for the lifetime of a chain.

use crate::lattice::{Lattice, LatticeError};
use crate::vertex::VertexType;
use serde::{Deserialize, Serialize};

/// Initial configuration for a square lattice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Boundary {
    /// c1 on the main diagonal, a2 above it, a1 below it. Maximal height:
    /// only Up moves on the sub-diagonal are legal.
    #[default]
    DwbcHigh,
    /// c1 on the anti-diagonal, b2 above it, b1 below it. Minimal height:
    /// only Down moves on the anti-diagonal are legal.
    DwbcLow,
}

impl Boundary {
    /// The vertex type at `(row, col)` of an `n x n` lattice.
    pub fn vertex_at(self, n: usize, row: usize, col: usize) -> VertexType {
        match self {
            Boundary::DwbcHigh => match row.cmp(&col) {
                std::cmp::Ordering::Equal => VertexType::C1,
                std::cmp::Ordering::Less => VertexType::A2,
                std::cmp::Ordering::Greater => VertexType::A1,
            },
            Boundary::DwbcLow => match (row + col).cmp(&(n - 1)) {
                std::cmp::Ordering::Equal => VertexType::C1,
                std::cmp::Ordering::Less => VertexType::B2,
                std::cmp::Ordering::Greater => VertexType::B1,
            },
        }
    }

    /// Build the `size x size` lattice for this boundary.
    pub fn build(self, size: usize) -> Result<Lattice, LatticeError> {
        let count = size.checked_mul(size).ok_or(LatticeError::SizeMismatch {
            expected: usize::MAX,
            actual: 0,
        })?;
        let cells = (0..count)
            .map(|i| self.vertex_at(size, i / size.max(1), i % size.max(1)))
            .collect();
        Lattice::new(size, size, cells)
    }
}
