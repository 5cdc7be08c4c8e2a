//! Simulation configuration.
//!
//! A plain serde record so it can cross a worker boundary or be loaded from
//! a data file. Validated once when a simulation is built.

use crate::boundary::Boundary;
use crate::vertex::VertexType;
use crate::weights::WeightTable;
use serde::{Deserialize, Serialize};

/// Errors in a [`SimConfig`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("lattice size must be at least 1")]
    ZeroSize,
    #[error("batch size must be at least 1")]
    ZeroBatch,
    #[error("weight for {vertex} is not finite: {value}")]
    NonFiniteWeight { vertex: VertexType, value: f64 },
    #[error("weight for {vertex} is outside the usable range: {value}")]
    WeightOutOfRange { vertex: VertexType, value: f64 },
}

/// Everything needed to build a [`Simulation`](crate::engine::Simulation).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Side length N of the square lattice.
    pub size: usize,
    pub boundary: Boundary,
    pub weights: WeightTable,
    /// `None` seeds from the system clock.
    pub seed: Option<u64>,
    /// Steps between cancellation checks in `run_until`.
    pub batch_size: usize,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            size: 16,
            boundary: Boundary::default(),
            weights: WeightTable::default(),
            seed: None,
            batch_size: 1024,
        }
    }
}

impl SimConfig {
    pub fn new(size: usize, boundary: Boundary) -> Self {
        Self {
            size,
            boundary,
            ..Self::default()
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_weights(mut self, weights: WeightTable) -> Self {
        self.weights = weights;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.size == 0 {
            return Err(ConfigError::ZeroSize);
        }
        if self.batch_size == 0 {
            return Err(ConfigError::ZeroBatch);
        }
        self.weights.validate()
    }
}
