//! Height function and volume.
//!
//! Heights live on faces. The face at the upper-left corner of vertex
//! `(r, c)` has height `h(r, c)`, accumulated from the origin: moving right
//! along the top row adds one for every edge above that points down, moving
//! down a column adds one for every edge on the left that points left.
//! Height differences across an edge are independent of the path taken
//! because every vertex obeys the ice rule.
//!
//! Under domain-wall boundaries `0 <= h(r, c) <= min(r, c)`. The high filling
//! attains the upper bound everywhere and the low filling the lower bound.

use crate::lattice::{HArrow, Lattice, VArrow};
use serde::{Deserialize, Serialize};

/// Face heights of a lattice, one per vertex position, row-major.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeightField {
    pub width: usize,
    pub height: usize,
    pub values: Vec<u32>,
}

impl HeightField {
    pub fn get(&self, row: usize, col: usize) -> u32 {
        self.values[row * self.width + col]
    }

    /// Sum of all heights.
    pub fn volume(&self) -> u64 {
        self.values.iter().map(|&h| h as u64).sum()
    }

    /// Volume divided by the number of positions.
    pub fn average(&self) -> f64 {
        if self.values.is_empty() {
            0.0
        } else {
            self.volume() as f64 / self.values.len() as f64
        }
    }
}

/// Compute the height field in one O(N²) pass over the edge view.
pub fn height_field(lattice: &Lattice) -> HeightField {
    let (width, height) = (lattice.width(), lattice.height());
    let edges = lattice.edges();
    let mut values = vec![0u32; width * height];

    for col in 1..width {
        let step = u32::from(edges.vertical(0, col - 1) == VArrow::Down);
        values[col] = values[col - 1] + step;
    }
    for row in 1..height {
        for col in 0..width {
            let step = u32::from(edges.horizontal(row - 1, col) == HArrow::Left);
            values[row * width + col] = values[(row - 1) * width + col] + step;
        }
    }

    HeightField {
        width,
        height,
        values,
    }
}

pub fn volume(lattice: &Lattice) -> u64 {
    height_field(lattice).volume()
}

pub fn average_height(lattice: &Lattice) -> f64 {
    height_field(lattice).average()
}

/// Inclusive volume range reachable on an `n x n` domain-wall lattice:
/// `[Σ max(0, r + c - n), Σ min(r, c)]`.
pub fn volume_bounds(n: usize) -> (u64, u64) {
    let mut low = 0u64;
    let mut high = 0u64;
    for r in 0..n {
        for c in 0..n {
            low += (r + c).saturating_sub(n) as u64;
            high += r.min(c) as u64;
        }
    }
    (low, high)
}
