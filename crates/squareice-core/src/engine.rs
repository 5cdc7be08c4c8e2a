//! The simulation driver: owns one lattice, one candidate set, one RNG
//! stream and the current weights, and advances the chain.
//!
//! # Step
//!
//! Each `step()` runs one proposal cycle:
//! 1. **Pick** -- one uniform draw selects a candidate (none if frozen)
//! 2. **Decide** -- one uniform draw accepts or rejects (Metropolis or heat-bath)
//! 3. **Commit** -- write the four cells and update per-type counts
//! 4. **Refresh** -- re-evaluate the candidate positions around the plaquette

use crate::acceptance::{self, decide};
use crate::candidates::CandidateSet;
use crate::config::{ConfigError, SimConfig};
use crate::flip::{Direction, FlipRecord, commit};
use crate::lattice::{Lattice, LatticeError, LatticeSnapshot};
use crate::observables::height_field;
use crate::rng::SimRng;
use crate::sim::{MoveCounters, RunReport, StateHash, StepKind, StepOutcome, StopFlag};
use crate::stats::{SimulationStats, TypeCounts, energy};
use crate::weights::{WeightTable, Weights};
use tracing::{debug, info, warn};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors returned by [`Simulation`] operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SimError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("invalid lattice: {0}")]
    Lattice(#[from] LatticeError),
    #[error("size mismatch: expected {expected:?}, got {actual:?}")]
    SizeMismatch {
        expected: (usize, usize),
        actual: (usize, usize),
    },
}

// ---------------------------------------------------------------------------
// Simulation
// ---------------------------------------------------------------------------

/// A single Monte Carlo chain.
#[derive(Debug, Clone)]
pub struct Simulation {
    config: SimConfig,
    /// The seed actually used, after resolving `config.seed`.
    seed: u64,
    weights: Weights,
    lattice: Lattice,
    candidates: CandidateSet,
    rng: SimRng,
    counters: MoveCounters,
    type_counts: [u64; 6],
}

impl Simulation {
    /// Validate `config`, build the boundary lattice and its candidate set.
    pub fn new(config: SimConfig) -> Result<Self, SimError> {
        config.validate()?;
        let weights = Weights::new(config.weights)?;
        if config.weights.has_negative() {
            warn!(weights = ?config.weights, "negative weights act as zero");
        }
        let seed = config.seed.unwrap_or_else(SimRng::clock_seed);
        let lattice = config.boundary.build(config.size)?;
        let candidates = CandidateSet::build(&lattice);
        let type_counts = lattice.type_counts();

        info!(
            size = config.size,
            boundary = ?config.boundary,
            seed,
            candidates = candidates.len(),
            "simulation created"
        );

        Ok(Self {
            config,
            seed,
            weights,
            lattice,
            candidates,
            rng: SimRng::new(seed),
            counters: MoveCounters::default(),
            type_counts,
        })
    }

    /// Reassemble a simulation from previously captured parts.
    ///
    /// The candidate set must already match `lattice`.
    pub(crate) fn from_parts(
        config: SimConfig,
        seed: u64,
        lattice: Lattice,
        candidates: CandidateSet,
        rng: SimRng,
        counters: MoveCounters,
    ) -> Result<Self, SimError> {
        config.validate()?;
        let expected = (config.size, config.size);
        let actual = (lattice.width(), lattice.height());
        if actual != expected {
            return Err(SimError::SizeMismatch { expected, actual });
        }
        let weights = Weights::new(config.weights)?;
        let type_counts = lattice.type_counts();
        Ok(Self {
            config,
            seed,
            weights,
            lattice,
            candidates,
            rng,
            counters,
            type_counts,
        })
    }

    // -----------------------------------------------------------------------
    // Stepping
    // -----------------------------------------------------------------------

    /// Perform one proposal cycle.
    pub fn step(&mut self) -> StepOutcome {
        let kind = self.step_once();
        StepOutcome {
            kind,
            counters: self.counters,
        }
    }

    /// Perform `steps` proposal cycles in batches of `batch_size`.
    ///
    /// Same trajectory as calling `step()` `steps` times. Stops early once
    /// the chain is frozen.
    pub fn run(&mut self, steps: u64) -> RunReport {
        self.run_batches(steps, None)
    }

    /// Like [`run`](Self::run), but checks `stop` before every batch.
    pub fn run_until(&mut self, steps: u64, stop: &StopFlag) -> RunReport {
        self.run_batches(steps, Some(stop))
    }

    fn run_batches(&mut self, steps: u64, stop: Option<&StopFlag>) -> RunReport {
        let batch = self.config.batch_size as u64;
        let mut report = RunReport::default();
        let mut remaining = steps;

        'batches: while remaining > 0 {
            if stop.is_some_and(StopFlag::is_stopped) {
                report.cancelled = true;
                debug!(
                    completed = report.steps_run,
                    requested = steps,
                    "run cancelled"
                );
                break;
            }
            let this_batch = remaining.min(batch);
            for _ in 0..this_batch {
                match self.step_once() {
                    StepKind::Frozen => break 'batches,
                    StepKind::Accepted(_) => {
                        report.steps_run += 1;
                        report.accepted += 1;
                    }
                    StepKind::Rejected => report.steps_run += 1,
                }
            }
            remaining -= this_batch;
        }

        report.frozen = self.candidates.is_empty();
        if report.frozen {
            debug!(steps = self.counters.steps, "chain frozen, no legal move");
        }
        report
    }

    fn step_once(&mut self) -> StepKind {
        let Some(entry) = self.candidates.pick_uniform(&mut self.rng) else {
            return StepKind::Frozen;
        };
        self.counters.record_attempt(entry.is_biflip());

        let decision = decide(&entry, &self.lattice, &self.weights, &mut self.rng);
        match decision.accepted {
            Some(record) => {
                let direction = record.plaquette.direction;
                self.apply_record(&record);
                self.counters.record_accept(direction);
                StepKind::Accepted(direction)
            }
            None => StepKind::Rejected,
        }
    }

    fn apply_record(&mut self, record: &FlipRecord) {
        commit(&mut self.lattice, record);
        for (&out, &into) in record.before.iter().zip(record.after.iter()) {
            self.type_counts[out.index()] -= 1;
            self.type_counts[into.index()] += 1;
        }
        self.candidates.refresh_after(&self.lattice, &record.plaquette);
        debug_assert_eq!(self.type_counts, self.lattice.type_counts());
    }

    // -----------------------------------------------------------------------
    // State changes
    // -----------------------------------------------------------------------

    /// Restore the configured boundary state, clear all counters and reseed
    /// the RNG with the resolved seed.
    pub fn reset(&mut self) -> Result<(), SimError> {
        let lattice = self.config.boundary.build(self.config.size)?;
        self.install(lattice);
        self.rng = SimRng::new(self.seed);
        self.counters = MoveCounters::default();
        info!(seed = self.seed, "simulation reset");
        Ok(())
    }

    /// Install an externally supplied lattice of the same dimensions.
    ///
    /// Counters and the RNG stream are kept. On error nothing changes.
    pub fn set_state(&mut self, lattice: Lattice) -> Result<(), SimError> {
        self.check_dimensions(lattice.width(), lattice.height())?;
        self.install(lattice);
        debug!(candidates = self.candidates.len(), "state replaced");
        Ok(())
    }

    /// Install a raw snapshot: checks dimensions, then validates the cells.
    pub fn set_state_raw(&mut self, snapshot: LatticeSnapshot) -> Result<(), SimError> {
        self.check_dimensions(snapshot.width, snapshot.height)?;
        let lattice = Lattice::try_from(snapshot)?;
        self.set_state(lattice)
    }

    /// Replace the weight table. Takes effect from the next step.
    pub fn set_weights(&mut self, table: WeightTable) -> Result<(), SimError> {
        let weights = Weights::new(table)?;
        if table.has_negative() {
            warn!(weights = ?table, "negative weights act as zero");
        }
        self.weights = weights;
        self.config.weights = table;
        debug!(rho = weights.rho(), "weights updated");
        Ok(())
    }

    fn check_dimensions(&self, width: usize, height: usize) -> Result<(), SimError> {
        let expected = (self.lattice.width(), self.lattice.height());
        if (width, height) != expected {
            return Err(SimError::SizeMismatch {
                expected,
                actual: (width, height),
            });
        }
        Ok(())
    }

    fn install(&mut self, lattice: Lattice) {
        self.candidates = CandidateSet::build(&lattice);
        self.type_counts = lattice.type_counts();
        self.lattice = lattice;
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Aggregate statistics, including an O(N²) height pass.
    pub fn stats(&self) -> SimulationStats {
        let field = height_field(&self.lattice);
        SimulationStats {
            counters: self.counters,
            acceptance_rate: self.counters.acceptance_rate(),
            type_counts: TypeCounts::from_array(self.type_counts),
            energy: energy(&self.type_counts, &self.weights),
            volume: field.volume(),
            average_height: field.average(),
            candidates: self.candidates.len(),
            biflip_candidates: self.candidates.biflip_count(),
        }
    }

    /// Metropolis probability of a single move on the current lattice.
    pub fn acceptance_probability(&self, row: usize, col: usize, direction: Direction) -> Option<f64> {
        acceptance::acceptance_probability(&self.lattice, &self.weights, row, col, direction)
    }

    pub fn lattice(&self) -> &Lattice {
        &self.lattice
    }

    /// Plain-data copy of the lattice for renderers and workers.
    pub fn snapshot(&self) -> LatticeSnapshot {
        LatticeSnapshot::from(&self.lattice)
    }

    pub fn candidates(&self) -> &CandidateSet {
        &self.candidates
    }

    pub fn counters(&self) -> MoveCounters {
        self.counters
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn weights(&self) -> &Weights {
        &self.weights
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn rng(&self) -> &SimRng {
        &self.rng
    }

    pub fn is_frozen(&self) -> bool {
        self.candidates.is_empty()
    }

    /// FNV-1a over dimensions, cells, RNG state and counters.
    pub fn state_hash(&self) -> u64 {
        let mut hash = StateHash::new();
        hash.write_u64(self.lattice.width() as u64);
        hash.write_u64(self.lattice.height() as u64);
        for &cell in self.lattice.cells() {
            hash.write_u8(cell as u8);
        }
        hash.write_u64(self.rng.state());
        let c = &self.counters;
        for v in [c.steps, c.attempted, c.accepted, c.up_accepted, c.down_accepted, c.biflip_sites] {
            hash.write_u64(v);
        }
        hash.finish()
    }
}
