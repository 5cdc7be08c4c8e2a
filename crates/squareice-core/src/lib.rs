//! Square Ice Core -- a Monte Carlo engine for the six-vertex model.
//!
//! The lattice holds one of six vertex types per cell. Every type has exactly
//! two inward and two outward arrows (the ice rule), and neighbouring cells
//! agree on the arrow they share. The chain moves by reversing the four
//! arrows around one face, which rewrites a 2×2 plaquette of vertex types in
//! a single step.
//!
//! # Proposal Cycle
//!
//! Each call to [`engine::Simulation::step`] runs:
//!
//! 1. **Pick** -- draw a position uniformly from the candidate set.
//! 2. **Decide** -- Metropolis when one orientation is legal, heat-bath when
//!    both are.
//! 3. **Commit** -- write the four new vertex types.
//! 4. **Refresh** -- re-evaluate at most 12 positions around the plaquette.
//!
//! # Key Types
//!
//! - [`engine::Simulation`] -- owns the lattice, candidates, RNG and weights.
//! - [`lattice::Lattice`] -- validated row-major grid of [`vertex::VertexType`].
//! - [`flip`] -- the Up/Down plaquette transformation tables.
//! - [`candidates::CandidateSet`] -- positions with a legal move, O(1) updates.
//! - [`acceptance`] -- weight ratios, Metropolis and heat-bath probabilities.
//! - [`observables`] -- height function and volume.
//! - [`serialize`] -- versioned binary snapshots via bitcode.
//! - [`protocol::Host`] -- request/response front end for worker embeddings.

pub mod acceptance;
pub mod boundary;
pub mod candidates;
pub mod config;
pub mod dual;
pub mod engine;
pub mod flip;
pub mod lattice;
pub mod observables;
pub mod protocol;
pub mod rng;
pub mod serialize;
pub mod sim;
pub mod stats;
pub mod validation;
pub mod vertex;
pub mod weights;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
