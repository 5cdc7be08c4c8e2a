//! State comparison and determinism checking.
//!
//! Compares two lattices or two simulations to locate divergences, and runs
//! two instances side by side to confirm a configuration reproduces the
//! same trajectory.

use crate::config::SimConfig;
use crate::engine::{SimError, Simulation};
use crate::lattice::Lattice;
use crate::rng::SimRng;
use crate::serialize::DeserializeError;
use crate::vertex::VertexType;

// ---------------------------------------------------------------------------
// Lattice diff
// ---------------------------------------------------------------------------

/// A cell whose type differs between two lattices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellDiff {
    pub row: usize,
    pub col: usize,
    pub a: VertexType,
    pub b: VertexType,
}

/// Cell-level differences between two lattices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LatticeDiff {
    pub is_identical: bool,
    pub dimensions_match: bool,
    /// Empty when the dimensions differ.
    pub cell_diffs: Vec<CellDiff>,
}

pub fn diff_lattices(a: &Lattice, b: &Lattice) -> LatticeDiff {
    let dimensions_match = a.width() == b.width() && a.height() == b.height();
    if !dimensions_match {
        return LatticeDiff {
            is_identical: false,
            dimensions_match,
            cell_diffs: Vec::new(),
        };
    }

    let width = a.width();
    let cell_diffs: Vec<CellDiff> = a
        .cells()
        .iter()
        .zip(b.cells())
        .enumerate()
        .filter(|(_, (x, y))| x != y)
        .map(|(i, (&x, &y))| CellDiff {
            row: i / width,
            col: i % width,
            a: x,
            b: y,
        })
        .collect();

    LatticeDiff {
        is_identical: cell_diffs.is_empty(),
        dimensions_match,
        cell_diffs,
    }
}

// ---------------------------------------------------------------------------
// Quick compare
// ---------------------------------------------------------------------------

/// Per-part match results for two simulations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationDiff {
    pub lattice_matches: bool,
    pub candidates_match: bool,
    pub rng_matches: bool,
    pub counters_match: bool,
}

impl SimulationDiff {
    pub fn is_identical(&self) -> bool {
        self.lattice_matches && self.candidates_match && self.rng_matches && self.counters_match
    }
}

/// Compare two simulations part by part. Candidate order matters because it
/// decides future picks.
pub fn compare(a: &Simulation, b: &Simulation) -> SimulationDiff {
    SimulationDiff {
        lattice_matches: a.lattice() == b.lattice(),
        candidates_match: a.candidates().entries() == b.candidates().entries(),
        rng_matches: a.rng() == b.rng(),
        counters_match: a.counters() == b.counters(),
    }
}

// ---------------------------------------------------------------------------
// Determinism validation
// ---------------------------------------------------------------------------

/// Result of a determinism validation run.
#[derive(Debug)]
pub struct DeterminismResult {
    pub is_deterministic: bool,
    /// Step at which divergence was first detected (if any).
    pub divergence_step: Option<u64>,
    /// `(step, hash_a, hash_b)` after every step.
    pub hash_log: Vec<(u64, u64, u64)>,
}

/// Build two simulations from `config` and step them in lockstep.
///
/// An unseeded config is resolved to one clock seed shared by both runs.
pub fn validate_determinism(config: &SimConfig, steps: u64) -> Result<DeterminismResult, SimError> {
    let mut config = config.clone();
    config.seed = Some(config.seed.unwrap_or_else(SimRng::clock_seed));
    let a = Simulation::new(config.clone())?;
    let b = Simulation::new(config)?;
    Ok(lockstep(a, b, steps))
}

/// Restore two simulations from one snapshot and step them in lockstep.
pub fn validate_snapshot_determinism(data: &[u8], steps: u64) -> Result<DeterminismResult, DeserializeError> {
    let a = Simulation::deserialize(data)?;
    let b = Simulation::deserialize(data)?;
    Ok(lockstep(a, b, steps))
}

fn lockstep(mut a: Simulation, mut b: Simulation, steps: u64) -> DeterminismResult {
    let mut hash_log = Vec::with_capacity(steps as usize);
    let mut divergence_step = None;

    for step in 1..=steps {
        a.step();
        b.step();
        let hash_a = a.state_hash();
        let hash_b = b.state_hash();
        hash_log.push((step, hash_a, hash_b));
        if hash_a != hash_b && divergence_step.is_none() {
            divergence_step = Some(step);
        }
    }

    DeterminismResult {
        is_deterministic: divergence_step.is_none(),
        divergence_step,
        hash_log,
    }
}
