//! Binary snapshots of a simulation.
//!
//! Snapshots are `bitcode`-encoded with a versioned header. They capture the
//! configuration, resolved seed, lattice, candidate order, RNG state and
//! counters, so a restored simulation continues the exact same trajectory.

use crate::candidates::{CandidateSet, FlippableEntry};
use crate::config::SimConfig;
use crate::engine::{SimError, Simulation};
use crate::lattice::LatticeSnapshot;
use crate::rng::SimRng;
use crate::sim::MoveCounters;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Magic number identifying a simulation snapshot ("QICE").
pub const SNAPSHOT_MAGIC: u32 = 0x5149_4345;

/// Current format version. Increment when breaking the wire format.
pub const FORMAT_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur during serialization.
#[derive(Debug, thiserror::Error)]
pub enum SerializeError {
    #[error("bitcode encoding failed: {0}")]
    Encode(String),
}

/// Errors that can occur during deserialization.
#[derive(Debug, thiserror::Error)]
pub enum DeserializeError {
    #[error("invalid magic number: expected 0x{:08X}, got 0x{:08X}", SNAPSHOT_MAGIC, .0)]
    InvalidMagic(u32),
    #[error("unsupported format version: expected {}, got {}", FORMAT_VERSION, .0)]
    UnsupportedVersion(u32),
    #[error("snapshot from future version {0} (this build supports up to {FORMAT_VERSION})")]
    FutureVersion(u32),
    #[error("bitcode decoding failed: {0}")]
    Decode(String),
    #[error("snapshot state is invalid: {0}")]
    State(#[from] SimError),
    #[error("candidate list does not match the lattice")]
    Candidates,
}

// ---------------------------------------------------------------------------
// Snapshot header
// ---------------------------------------------------------------------------

/// Header prepended to every snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotHeader {
    pub magic: u32,
    pub version: u32,
    /// Steps taken when the snapshot was captured.
    pub steps: u64,
}

impl SnapshotHeader {
    pub fn new(steps: u64) -> Self {
        Self {
            magic: SNAPSHOT_MAGIC,
            version: FORMAT_VERSION,
            steps,
        }
    }

    pub fn validate(&self) -> Result<(), DeserializeError> {
        if self.magic != SNAPSHOT_MAGIC {
            return Err(DeserializeError::InvalidMagic(self.magic));
        }
        if self.version > FORMAT_VERSION {
            return Err(DeserializeError::FutureVersion(self.version));
        }
        if self.version < FORMAT_VERSION {
            return Err(DeserializeError::UnsupportedVersion(self.version));
        }
        Ok(())
    }
}

/// Decode only far enough to return the header.
pub fn read_snapshot_header(data: &[u8]) -> Result<SnapshotHeader, DeserializeError> {
    let snapshot: SimSnapshot =
        bitcode::deserialize(data).map_err(|e| DeserializeError::Decode(e.to_string()))?;
    Ok(snapshot.header)
}

// ---------------------------------------------------------------------------
// Serializable simulation state
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
struct SimSnapshot {
    header: SnapshotHeader,
    config: SimConfig,
    seed: u64,
    lattice: LatticeSnapshot,
    candidates: Vec<FlippableEntry>,
    rng_state: u64,
    counters: MoveCounters,
}

impl Simulation {
    /// Encode the full simulation state.
    pub fn serialize(&self) -> Result<Vec<u8>, SerializeError> {
        let snapshot = SimSnapshot {
            header: SnapshotHeader::new(self.counters().steps),
            config: self.config().clone(),
            seed: self.seed(),
            lattice: self.snapshot(),
            candidates: self.candidates().entries().to_vec(),
            rng_state: self.rng().state(),
            counters: self.counters(),
        };
        bitcode::serialize(&snapshot).map_err(|e| SerializeError::Encode(e.to_string()))
    }

    /// Decode a snapshot produced by [`serialize`](Self::serialize).
    ///
    /// The lattice is re-validated and the candidate list must describe it
    /// exactly.
    pub fn deserialize(data: &[u8]) -> Result<Self, DeserializeError> {
        let snapshot: SimSnapshot =
            bitcode::deserialize(data).map_err(|e| DeserializeError::Decode(e.to_string()))?;
        snapshot.header.validate()?;

        let lattice = crate::lattice::Lattice::try_from(snapshot.lattice).map_err(SimError::from)?;
        let candidates =
            CandidateSet::from_entries(&lattice, snapshot.candidates).ok_or(DeserializeError::Candidates)?;
        let sim = Simulation::from_parts(
            snapshot.config,
            snapshot.seed,
            lattice,
            candidates,
            SimRng::from_state(snapshot.rng_state),
            snapshot.counters,
        )?;
        Ok(sim)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;

    #[test]
    fn header_rejects_wrong_magic() {
        let mut header = SnapshotHeader::new(0);
        header.magic = 0xDEAD_BEEF;
        assert!(matches!(
            header.validate(),
            Err(DeserializeError::InvalidMagic(0xDEAD_BEEF))
        ));
    }

    #[test]
    fn header_rejects_other_versions() {
        let mut header = SnapshotHeader::new(0);
        header.version = FORMAT_VERSION + 1;
        assert!(matches!(header.validate(), Err(DeserializeError::FutureVersion(_))));
        header.version = 0;
        assert!(matches!(header.validate(), Err(DeserializeError::UnsupportedVersion(0))));
    }

    #[test]
    fn restored_simulation_continues_trajectory() {
        let mut sim = seeded_sim(6, 21);
        sim.run(400);
        let bytes = sim.serialize().unwrap();
        let mut restored = Simulation::deserialize(&bytes).unwrap();
        assert_eq!(restored.state_hash(), sim.state_hash());

        sim.run(400);
        restored.run(400);
        assert_eq!(restored.lattice(), sim.lattice());
        assert_eq!(restored.state_hash(), sim.state_hash());
    }

    #[test]
    fn header_reports_steps() {
        let mut sim = seeded_sim(4, 3);
        sim.run(25);
        let header = read_snapshot_header(&sim.serialize().unwrap()).unwrap();
        assert_eq!(header.steps, 25);
        assert_eq!(header.magic, SNAPSHOT_MAGIC);
    }

    #[test]
    fn config_size_must_match_lattice() {
        let sim = seeded_sim(4, 9);
        let mut config = sim.config().clone();
        config.size = 5;
        let snapshot = SimSnapshot {
            header: SnapshotHeader::new(0),
            config,
            seed: sim.seed(),
            lattice: sim.snapshot(),
            candidates: sim.candidates().entries().to_vec(),
            rng_state: sim.rng().state(),
            counters: sim.counters(),
        };
        let bytes = bitcode::serialize(&snapshot).unwrap();
        assert!(matches!(
            Simulation::deserialize(&bytes),
            Err(DeserializeError::State(SimError::SizeMismatch {
                expected: (5, 5),
                actual: (4, 4),
            }))
        ));
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(matches!(
            Simulation::deserialize(&[1, 2, 3]),
            Err(DeserializeError::Decode(_))
        ));
    }
}
