//! Aggregate statistics reported by the driver.

use crate::sim::MoveCounters;
use crate::vertex::VertexType;
use crate::weights::Weights;
use serde::{Deserialize, Serialize};

/// Number of cells of each vertex type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeCounts {
    pub a1: u64,
    pub a2: u64,
    pub b1: u64,
    pub b2: u64,
    pub c1: u64,
    pub c2: u64,
}

impl TypeCounts {
    pub fn from_array(counts: [u64; 6]) -> Self {
        let [a1, a2, b1, b2, c1, c2] = counts;
        Self {
            a1,
            a2,
            b1,
            b2,
            c1,
            c2,
        }
    }

    pub fn as_array(&self) -> [u64; 6] {
        [self.a1, self.a2, self.b1, self.b2, self.c1, self.c2]
    }

    pub fn get(&self, vertex: VertexType) -> u64 {
        self.as_array()[vertex.index()]
    }

    pub fn total(&self) -> u64 {
        self.as_array().iter().sum()
    }
}

/// `-Σ count(v) · ln w(v)`.
///
/// `None` when a type with a non-positive weight is present: the state has
/// zero weight and no finite energy.
pub fn energy(counts: &[u64; 6], weights: &Weights) -> Option<f64> {
    let mut total = 0.0;
    for vertex in VertexType::ALL {
        let count = counts[vertex.index()];
        if count == 0 {
            continue;
        }
        let w = weights.get(vertex);
        if w <= 0.0 {
            return None;
        }
        total -= count as f64 * w.ln();
    }
    Some(total)
}

/// Snapshot of a simulation's statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationStats {
    pub counters: MoveCounters,
    pub acceptance_rate: f64,
    pub type_counts: TypeCounts,
    /// `None` while a forbidden type is present.
    pub energy: Option<f64>,
    pub volume: u64,
    pub average_height: f64,
    /// Size of the candidate set.
    pub candidates: usize,
    pub biflip_candidates: usize,
}
