//! Two independent chains advanced side by side.
//!
//! The usual pairing starts one chain from the high filling and one from the
//! low filling with the same weights, and watches the volume gap close as
//! both approach equilibrium. The chains share nothing, so with the
//! `parallel` feature each round runs them on two rayon workers.

use crate::boundary::Boundary;
use crate::config::SimConfig;
use crate::engine::{SimError, Simulation};
use crate::observables::volume;
use crate::sim::RunReport;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Results of advancing both chains by the same number of steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DualReport {
    pub a: RunReport,
    pub b: RunReport,
    pub volume_a: u64,
    pub volume_b: u64,
}

impl DualReport {
    pub fn volume_gap(&self) -> u64 {
        self.volume_a.abs_diff(self.volume_b)
    }
}

/// Advance `a` and `b` by `steps` each.
pub fn run_dual(a: &mut Simulation, b: &mut Simulation, steps: u64) -> DualReport {
    let (report_a, report_b) = join(|| a.run(steps), || b.run(steps));
    DualReport {
        a: report_a,
        b: report_b,
        volume_a: volume(a.lattice()),
        volume_b: volume(b.lattice()),
    }
}

#[cfg(feature = "parallel")]
fn join<A, B>(a: impl FnOnce() -> A + Send, b: impl FnOnce() -> B + Send) -> (A, B)
where
    A: Send,
    B: Send,
{
    rayon::join(a, b)
}

#[cfg(not(feature = "parallel"))]
fn join<A, B>(a: impl FnOnce() -> A, b: impl FnOnce() -> B) -> (A, B) {
    (a(), b())
}

/// Outcome of [`converge`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Convergence {
    /// Volume gap after each round.
    pub gaps: Vec<u64>,
    /// Round (1-based) at which the two volumes first met.
    pub met_at: Option<usize>,
}

/// Run a high and a low chain built from `config` for up to `max_rounds`
/// rounds of `steps_per_round`, stopping once their volumes coincide.
///
/// The low chain uses the resolved seed plus one so the two streams differ.
pub fn converge(config: &SimConfig, steps_per_round: u64, max_rounds: usize) -> Result<Convergence, SimError> {
    let mut high = Simulation::new(SimConfig {
        boundary: Boundary::DwbcHigh,
        ..config.clone()
    })?;
    let mut low = Simulation::new(SimConfig {
        boundary: Boundary::DwbcLow,
        seed: Some(high.seed().wrapping_add(1)),
        ..config.clone()
    })?;

    let mut gaps = Vec::with_capacity(max_rounds);
    let mut met_at = None;
    for round in 1..=max_rounds {
        let report = run_dual(&mut high, &mut low, steps_per_round);
        gaps.push(report.volume_gap());
        if report.volume_gap() == 0 {
            met_at = Some(round);
            break;
        }
    }
    debug!(rounds = gaps.len(), ?met_at, "dual run finished");
    Ok(Convergence { gaps, met_at })
}
