//! Shared test helpers for integration tests and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]` so these helpers
//! are available in unit tests, integration tests, and benchmarks (via the
//! `test-utils` feature).

use crate::boundary::Boundary;
use crate::candidates::CandidateSet;
use crate::config::SimConfig;
use crate::engine::Simulation;
use crate::flip::locally_consistent;
use crate::lattice::Lattice;
use crate::weights::WeightTable;

// ===========================================================================
// Simulation constructors
// ===========================================================================

pub fn config(size: usize, seed: u64) -> SimConfig {
    SimConfig::new(size, Boundary::DwbcHigh).with_seed(seed)
}

/// DWBC-high simulation with unit weights.
pub fn seeded_sim(size: usize, seed: u64) -> Simulation {
    Simulation::new(config(size, seed)).expect("valid test config")
}

pub fn batched_sim(size: usize, seed: u64, batch_size: usize) -> Simulation {
    Simulation::new(config(size, seed).with_batch_size(batch_size)).expect("valid test config")
}

pub fn weighted_sim(size: usize, seed: u64, weights: WeightTable) -> Simulation {
    Simulation::new(config(size, seed).with_weights(weights)).expect("valid test config")
}

// ===========================================================================
// Invariant checks
// ===========================================================================

/// Every cell agrees with its neighbours and the full validator passes.
pub fn assert_ice_rule(lattice: &Lattice) {
    for row in 0..lattice.height() {
        for col in 0..lattice.width() {
            assert!(
                locally_consistent(lattice, row, col),
                "cell ({row}, {col}) is inconsistent"
            );
        }
    }
    lattice.validate().expect("lattice validates");
}

/// The domain-wall boundary arrows are unchanged.
pub fn assert_domain_wall(lattice: &Lattice) {
    use crate::lattice::{HArrow, VArrow};
    let edges = lattice.edges();
    let (w, h) = (lattice.width(), lattice.height());
    for r in 0..h {
        assert_eq!(edges.horizontal(r, 0), HArrow::Right);
        assert_eq!(edges.horizontal(r, w), HArrow::Left);
    }
    for c in 0..w {
        assert_eq!(edges.vertical(0, c), VArrow::Up);
        assert_eq!(edges.vertical(h, c), VArrow::Down);
    }
}

/// The incrementally maintained candidate set equals a fresh rebuild.
pub fn assert_candidates_fresh(sim: &Simulation) {
    let rebuilt = CandidateSet::build(sim.lattice());
    assert_eq!(sim.candidates().sorted_entries(), rebuilt.sorted_entries());
}
