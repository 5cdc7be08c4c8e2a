//! Step results, move counters and the state hash.

use crate::flip::Direction;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

// ---------------------------------------------------------------------------
// Move counters
// ---------------------------------------------------------------------------

/// Cumulative counters of a chain. Cleared by `reset`, kept by `set_state`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveCounters {
    /// Steps that reached a candidate (frozen steps are not counted).
    pub steps: u64,
    /// Proposals evaluated; equal to `steps`.
    pub attempted: u64,
    pub accepted: u64,
    pub up_accepted: u64,
    pub down_accepted: u64,
    /// Proposals made at a site with both orientations available.
    pub biflip_sites: u64,
}

impl MoveCounters {
    /// Fraction of attempted proposals that were accepted, 0 when none were.
    pub fn acceptance_rate(&self) -> f64 {
        if self.attempted == 0 {
            0.0
        } else {
            self.accepted as f64 / self.attempted as f64
        }
    }

    pub(crate) fn record_attempt(&mut self, biflip: bool) {
        self.steps += 1;
        self.attempted += 1;
        if biflip {
            self.biflip_sites += 1;
        }
    }

    pub(crate) fn record_accept(&mut self, direction: Direction) {
        self.accepted += 1;
        match direction {
            Direction::Up => self.up_accepted += 1,
            Direction::Down => self.down_accepted += 1,
        }
    }
}

// ---------------------------------------------------------------------------
// Step and run results
// ---------------------------------------------------------------------------

/// What one step did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepKind {
    Accepted(Direction),
    Rejected,
    /// No legal move exists anywhere. Nothing was drawn or counted.
    Frozen,
}

/// Result of `Simulation::step`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepOutcome {
    pub kind: StepKind,
    /// Counters after the step.
    pub counters: MoveCounters,
}

impl StepOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self.kind, StepKind::Accepted(_))
    }
}

/// Result of `Simulation::run` and `Simulation::run_until`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    /// Steps that reached a candidate.
    pub steps_run: u64,
    pub accepted: u64,
    /// The stop flag was observed before all steps ran.
    pub cancelled: bool,
    /// The chain has no legal move left.
    pub frozen: bool,
}

// ---------------------------------------------------------------------------
// Cooperative cancellation
// ---------------------------------------------------------------------------

/// A shared stop flag checked between batches.
///
/// Clones share the flag, so a caller can keep one handle and pass another
/// to the thread running the chain.
#[derive(Debug, Clone, Default)]
pub struct StopFlag(Arc<AtomicBool>);

impl StopFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn clear(&self) {
        self.0.store(false, Ordering::Relaxed);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

// ---------------------------------------------------------------------------
// State hash
// ---------------------------------------------------------------------------

/// A deterministic hash of simulation state for divergence detection.
///
/// FNV-1a (64-bit). Not cryptographic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateHash(pub u64);

impl StateHash {
    const FNV_OFFSET: u64 = 0xcbf29ce484222325;
    const FNV_PRIME: u64 = 0x100000001b3;

    pub fn new() -> Self {
        Self(Self::FNV_OFFSET)
    }

    pub fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.0 ^= b as u64;
            self.0 = self.0.wrapping_mul(Self::FNV_PRIME);
        }
    }

    pub fn write_u64(&mut self, v: u64) {
        self.write(&v.to_le_bytes());
    }

    pub fn write_u8(&mut self, v: u8) {
        self.write(&[v]);
    }

    pub fn finish(self) -> u64 {
        self.0
    }
}

impl Default for StateHash {
    fn default() -> Self {
        Self::new()
    }
}
