//! The lattice container: one vertex type per cell, row-major.
//!
//! A lattice is only ever constructed through validating constructors, so
//! every `Lattice` value satisfies the ice rule at every cell and is edge
//! consistent: each interior edge is inward at exactly one of its two ends.

use crate::vertex::{EdgeConfig, EdgeFlow, VertexType};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors raised while constructing or validating a lattice.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LatticeError {
    #[error("lattice must have at least one row and one column")]
    Empty,
    #[error("expected {expected} cells, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },
    #[error("cell ({row}, {col}) does not have exactly two inward edges")]
    IceRule { row: usize, col: usize },
    #[error("edge between ({row}, {col}) and {neighbor:?} is inconsistent")]
    EdgeConflict {
        row: usize,
        col: usize,
        neighbor: (usize, usize),
    },
}

// ---------------------------------------------------------------------------
// Arrows (derived edge view)
// ---------------------------------------------------------------------------

/// Direction of an arrow on a horizontal edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HArrow {
    Left,
    Right,
}

/// Direction of an arrow on a vertical edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VArrow {
    Up,
    Down,
}

/// Explicit arrow directions for every edge, including the boundary.
///
/// `horizontal` holds `height` rows of `width + 1` arrows: entry `(r, k)` is
/// the edge to the left of vertex `(r, k)`, and `k == width` is the right
/// boundary. `vertical` holds `height + 1` rows of `width` arrows: entry
/// `(k, c)` is the edge above vertex `(k, c)`, and `k == height` is the
/// bottom boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeView {
    pub width: usize,
    pub height: usize,
    pub horizontal: Vec<HArrow>,
    pub vertical: Vec<VArrow>,
}

impl EdgeView {
    /// The edge to the left of `(row, k)`; `k == width` is the right boundary.
    pub fn horizontal(&self, row: usize, k: usize) -> HArrow {
        self.horizontal[row * (self.width + 1) + k]
    }

    /// The edge above `(k, col)`; `k == height` is the bottom boundary.
    pub fn vertical(&self, k: usize, col: usize) -> VArrow {
        self.vertical[k * self.width + col]
    }
}

// ---------------------------------------------------------------------------
// Lattice
// ---------------------------------------------------------------------------

/// Plain-data form of a lattice, exchanged with renderers and workers.
///
/// Carries no invariant; convert with `Lattice::try_from` to validate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LatticeSnapshot {
    pub width: usize,
    pub height: usize,
    pub cells: Vec<VertexType>,
}

/// An ice-rule lattice of `width * height` vertices.
///
/// Deserialization goes through [`LatticeSnapshot`] and re-validates.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "LatticeSnapshot", into = "LatticeSnapshot")]
pub struct Lattice {
    width: usize,
    height: usize,
    cells: Vec<VertexType>,
}

impl Lattice {
    /// Build a lattice from row-major cells and validate edge consistency.
    pub fn new(width: usize, height: usize, cells: Vec<VertexType>) -> Result<Self, LatticeError> {
        if width == 0 || height == 0 {
            return Err(LatticeError::Empty);
        }
        let expected = cell_count(width, height, cells.len())?;
        if cells.len() != expected {
            return Err(LatticeError::SizeMismatch {
                expected,
                actual: cells.len(),
            });
        }
        let lattice = Self {
            width,
            height,
            cells,
        };
        lattice.validate()?;
        Ok(lattice)
    }

    /// Build a lattice from raw per-cell edge flows.
    ///
    /// Fails on the first cell that does not map to a vertex type, then on
    /// the first inconsistent edge.
    pub fn from_configurations(
        width: usize,
        height: usize,
        configs: &[EdgeConfig],
    ) -> Result<Self, LatticeError> {
        if width == 0 || height == 0 {
            return Err(LatticeError::Empty);
        }
        let expected = cell_count(width, height, configs.len())?;
        if configs.len() != expected {
            return Err(LatticeError::SizeMismatch {
                expected,
                actual: configs.len(),
            });
        }
        let cells = configs
            .iter()
            .enumerate()
            .map(|(i, &c)| {
                VertexType::from_configuration(c).ok_or(LatticeError::IceRule {
                    row: i / width,
                    col: i % width,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(width, height, cells)
    }

    /// Check that every adjacent pair agrees on its shared edge.
    pub fn validate(&self) -> Result<(), LatticeError> {
        for row in 0..self.height {
            for col in 0..self.width {
                let here = self.get(row, col).configuration();
                if col + 1 < self.width {
                    let right = self.get(row, col + 1).configuration();
                    if here.right == right.left {
                        return Err(LatticeError::EdgeConflict {
                            row,
                            col,
                            neighbor: (row, col + 1),
                        });
                    }
                }
                if row + 1 < self.height {
                    let below = self.get(row + 1, col).configuration();
                    if here.bottom == below.top {
                        return Err(LatticeError::EdgeConflict {
                            row,
                            col,
                            neighbor: (row + 1, col),
                        });
                    }
                }
            }
        }
        Ok(())
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Row-major index of `(row, col)`.
    #[inline]
    pub fn index(&self, row: usize, col: usize) -> usize {
        row * self.width + col
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> VertexType {
        self.cells[self.index(row, col)]
    }

    /// Overwrite a single cell. Only the flip state machine writes cells, and
    /// always four at a time.
    #[inline]
    pub(crate) fn set(&mut self, row: usize, col: usize, vertex: VertexType) {
        let idx = self.index(row, col);
        self.cells[idx] = vertex;
    }

    pub fn cells(&self) -> &[VertexType] {
        &self.cells
    }

    /// Number of cells of each type, indexed by `VertexType::index`.
    pub fn type_counts(&self) -> [u64; 6] {
        let mut counts = [0u64; 6];
        for &v in &self.cells {
            counts[v.index()] += 1;
        }
        counts
    }

    /// Derive explicit arrow directions for every edge.
    pub fn edges(&self) -> EdgeView {
        let (w, h) = (self.width, self.height);
        let mut horizontal = Vec::with_capacity(h * (w + 1));
        for row in 0..h {
            for k in 0..=w {
                let arrow = if k < w {
                    match self.get(row, k).configuration().left {
                        EdgeFlow::In => HArrow::Right,
                        EdgeFlow::Out => HArrow::Left,
                    }
                } else {
                    match self.get(row, w - 1).configuration().right {
                        EdgeFlow::In => HArrow::Left,
                        EdgeFlow::Out => HArrow::Right,
                    }
                };
                horizontal.push(arrow);
            }
        }

        let mut vertical = Vec::with_capacity((h + 1) * w);
        for k in 0..=h {
            for col in 0..w {
                let arrow = if k < h {
                    match self.get(k, col).configuration().top {
                        EdgeFlow::In => VArrow::Down,
                        EdgeFlow::Out => VArrow::Up,
                    }
                } else {
                    match self.get(h - 1, col).configuration().bottom {
                        EdgeFlow::In => VArrow::Up,
                        EdgeFlow::Out => VArrow::Down,
                    }
                };
                vertical.push(arrow);
            }
        }

        EdgeView {
            width: w,
            height: h,
            horizontal,
            vertical,
        }
    }
}

/// `width * height`, or a size mismatch when the product overflows.
fn cell_count(width: usize, height: usize, actual: usize) -> Result<usize, LatticeError> {
    width.checked_mul(height).ok_or(LatticeError::SizeMismatch {
        expected: usize::MAX,
        actual,
    })
}

impl TryFrom<LatticeSnapshot> for Lattice {
    type Error = LatticeError;

    fn try_from(snapshot: LatticeSnapshot) -> Result<Self, Self::Error> {
        Lattice::new(snapshot.width, snapshot.height, snapshot.cells)
    }
}

impl From<Lattice> for LatticeSnapshot {
    fn from(lattice: Lattice) -> Self {
        Self {
            width: lattice.width,
            height: lattice.height,
            cells: lattice.cells,
        }
    }
}

impl From<&Lattice> for LatticeSnapshot {
    fn from(lattice: &Lattice) -> Self {
        Self {
            width: lattice.width,
            height: lattice.height,
            cells: lattice.cells.clone(),
        }
    }
}
