//! Message-passing front end for running a simulation on another execution
//! context.
//!
//! Every request and response is plain serde data, so the same types work
//! over a channel, a worker `postMessage` bridge or a socket. [`Host`] maps
//! each request to exactly one response and owns no threads.

use crate::config::SimConfig;
use crate::engine::Simulation;
use crate::lattice::LatticeSnapshot;
use crate::sim::{RunReport, StepOutcome};
use crate::stats::SimulationStats;
use crate::weights::WeightTable;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A command sent to the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum Request {
    /// Build (or rebuild) the simulation.
    Configure(SimConfig),
    Step,
    Run { steps: u64 },
    Reset,
    SetState(LatticeSnapshot),
    SetWeights(WeightTable),
    GetStats,
    GetState,
}

/// The host's answer to one [`Request`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum Response {
    /// Configuration, reset or state/weight change succeeded.
    Ready,
    Stepped(StepOutcome),
    Ran(RunReport),
    Stats(SimulationStats),
    State(LatticeSnapshot),
    Error(String),
}

/// Owns at most one simulation and answers requests against it.
#[derive(Debug, Default)]
pub struct Host {
    sim: Option<Simulation>,
}

impl Host {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn simulation(&self) -> Option<&Simulation> {
        self.sim.as_ref()
    }

    pub fn handle(&mut self, request: Request) -> Response {
        let Some(sim) = self.sim.as_mut() else {
            return self.handle_unconfigured(request);
        };
        dispatch(sim, request)
    }

    fn handle_unconfigured(&mut self, request: Request) -> Response {
        match request {
            Request::Configure(config) => match Simulation::new(config) {
                Ok(sim) => {
                    self.sim = Some(sim);
                    Response::Ready
                }
                Err(e) => Response::Error(e.to_string()),
            },
            request => {
                debug!(?request, "request before configure");
                Response::Error("simulation is not configured".to_string())
            }
        }
    }
}

fn dispatch(sim: &mut Simulation, request: Request) -> Response {
    match request {
        Request::Configure(config) => match Simulation::new(config) {
            Ok(rebuilt) => {
                *sim = rebuilt;
                Response::Ready
            }
            Err(e) => Response::Error(e.to_string()),
        },
        Request::Step => Response::Stepped(sim.step()),
        Request::Run { steps } => Response::Ran(sim.run(steps)),
        Request::Reset => ready_or_error(sim.reset()),
        Request::SetState(snapshot) => ready_or_error(sim.set_state_raw(snapshot)),
        Request::SetWeights(table) => ready_or_error(sim.set_weights(table)),
        Request::GetStats => Response::Stats(sim.stats()),
        Request::GetState => Response::State(sim.snapshot()),
    }
}

fn ready_or_error<E: std::fmt::Display>(result: Result<(), E>) -> Response {
    match result {
        Ok(()) => Response::Ready,
        Err(e) => Response::Error(e.to_string()),
    }
}
