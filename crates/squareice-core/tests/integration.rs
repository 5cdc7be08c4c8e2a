//! End-to-end scenarios for the square ice engine.

use squareice_core::acceptance::acceptance_probability;
use squareice_core::boundary::Boundary;
use squareice_core::candidates::CandidateSet;
use squareice_core::config::SimConfig;
use squareice_core::engine::{SimError, Simulation};
use squareice_core::flip::{Direction, propose};
use squareice_core::observables::{height_field, volume, volume_bounds};
use squareice_core::protocol::{Host, Request, Response};
use squareice_core::sim::{StepKind, StopFlag};
use squareice_core::test_utils::*;
use squareice_core::validation::diff_lattices;
use squareice_core::vertex::VertexType;
use squareice_core::weights::{WeightTable, Weights};

// ===========================================================================
// 4x4 DWBC-high, unit weights, seed 42
// ===========================================================================

#[test]
fn first_accepted_move_follows_the_tables() {
    let mut sim = seeded_sim(4, 42);
    let initial = sim.lattice().clone();
    let initial_candidates = sim.candidates().clone();

    let mut outcome = sim.step();
    while !outcome.is_accepted() {
        outcome = sim.step();
    }
    assert_eq!(outcome.counters.accepted, 1);
    assert_eq!(outcome.kind, StepKind::Accepted(Direction::Up));

    // Exactly one plaquette changed, and it matches a proposal from the
    // original candidate set.
    let diff = diff_lattices(&initial, sim.lattice());
    assert_eq!(diff.cell_diffs.len(), 4);
    let matching = initial_candidates
        .iter()
        .filter_map(|e| propose(&initial, e.row, e.col, Direction::Up))
        .filter(|record| {
            record
                .plaquette
                .cells
                .iter()
                .zip(record.after)
                .all(|(&(r, c), v)| sim.lattice().get(r, c) == v)
        })
        .count();
    assert_eq!(matching, 1);

    assert_ice_rule(sim.lattice());
    assert_domain_wall(sim.lattice());
    assert_candidates_fresh(&sim);
    assert_ne!(sim.candidates().sorted_entries(), initial_candidates.sorted_entries());
}

#[test]
fn volume_stays_in_bounds_after_ten_thousand_steps() {
    let mut sim = seeded_sim(4, 42);
    let report = sim.run(10_000);
    assert_eq!(report.steps_run, 10_000);
    assert!(!report.frozen);

    let v = volume(sim.lattice());
    assert!(v <= 16, "volume {v} exceeds N^2");
    let (low, high) = volume_bounds(4);
    assert!((low..=high).contains(&v));

    let field = height_field(sim.lattice());
    for r in 0..4 {
        for c in 0..4 {
            assert!(field.get(r, c) as usize <= r.min(c));
        }
    }
    assert_ice_rule(sim.lattice());
    assert_domain_wall(sim.lattice());
    assert_candidates_fresh(&sim);
}

// ===========================================================================
// Zero weight
// ===========================================================================

fn without_c2() -> WeightTable {
    let mut table = WeightTable::default();
    table.c2 = 0.0;
    table
}

#[test]
fn zero_c2_weight_blocks_every_move_creating_c2() {
    let mut sim = seeded_sim(6, 7);
    sim.run(3_000);
    let lattice = sim.lattice();
    let uniform = Weights::new(WeightTable::default()).unwrap();
    let zero_c2 = Weights::new(without_c2()).unwrap();

    let mut creating = 0;
    let mut untouched = 0;
    for entry in CandidateSet::build(lattice).iter() {
        for direction in Direction::BOTH {
            let Some(record) = propose(lattice, entry.row, entry.col, direction) else {
                continue;
            };
            let p = acceptance_probability(lattice, &zero_c2, entry.row, entry.col, direction).unwrap();
            let p_uniform = acceptance_probability(lattice, &uniform, entry.row, entry.col, direction).unwrap();
            if record.after.contains(&VertexType::C2) {
                assert_eq!(p, 0.0);
                creating += 1;
            } else if !record.before.contains(&VertexType::C2) {
                assert_eq!(p, p_uniform);
                untouched += 1;
            }
        }
    }
    assert!(creating + untouched > 0);
}

#[test]
fn zero_c2_weight_chain_never_creates_c2() {
    let mut sim = weighted_sim(6, 3, without_c2());
    assert_eq!(sim.stats().type_counts.c2, 0);
    for _ in 0..20 {
        sim.run(250);
        assert_eq!(sim.stats().type_counts.c2, 0);
    }
    assert!(sim.counters().accepted > 0);
    assert_ice_rule(sim.lattice());
}

#[test]
fn all_zero_weights_reject_everything() {
    let mut sim = weighted_sim(5, 1, WeightTable::uniform(0.0));
    let report = sim.run(500);
    assert_eq!(report.steps_run, 500);
    assert_eq!(report.accepted, 0);
    assert_eq!(sim.lattice(), &Boundary::DwbcHigh.build(5).unwrap());
}

#[test]
fn negative_weight_is_accepted_and_blocks() {
    let mut table = WeightTable::default();
    table.b1 = -1.0;
    let mut sim = weighted_sim(4, 9, table);
    sim.run(2_000);
    assert_eq!(sim.stats().type_counts.b1, 0);
    assert_ice_rule(sim.lattice());
}

// ===========================================================================
// Driver contract
// ===========================================================================

#[test]
fn set_state_with_wrong_size_fails_and_keeps_state() {
    let mut sim = seeded_sim(4, 1);
    sim.run(100);
    let before = sim.lattice().clone();
    let counters = sim.counters();

    let err = sim.set_state(Boundary::DwbcHigh.build(6).unwrap()).unwrap_err();
    assert!(matches!(err, SimError::SizeMismatch { .. }));
    assert_eq!(sim.lattice(), &before);
    assert_eq!(sim.counters(), counters);
    assert_candidates_fresh(&sim);
}

#[test]
fn single_vertex_lattice_is_frozen() {
    let mut sim = seeded_sim(1, 1);
    assert!(sim.is_frozen());
    assert_eq!(sim.step().kind, StepKind::Frozen);
    let report = sim.run(1_000);
    assert!(report.frozen);
    assert_eq!(report.steps_run, 0);
    assert_eq!(sim.stats().counters.attempted, 0);
}

#[test]
fn low_boundary_chain_moves_down_first() {
    let mut sim = Simulation::new(SimConfig::new(5, Boundary::DwbcLow).with_seed(4)).unwrap();
    let outcome = sim.step();
    assert_eq!(outcome.kind, StepKind::Accepted(Direction::Down));
    assert_eq!(volume(sim.lattice()), volume_bounds(5).0 + 1);
}

#[test]
fn reset_reproduces_the_same_run() {
    let mut sim = seeded_sim(6, 99);
    sim.run(1_000);
    let first = sim.lattice().clone();
    sim.reset().unwrap();
    assert_eq!(sim.counters().steps, 0);
    sim.run(1_000);
    assert_eq!(sim.lattice(), &first);
}

#[test]
fn cancelled_run_resumes_cleanly() {
    let mut sim = batched_sim(6, 5, 100);
    let stop = StopFlag::new();
    let partial = sim.run_until(1_000, &stop);
    assert!(!partial.cancelled);
    assert_eq!(partial.steps_run, 1_000);

    stop.stop();
    let cancelled = sim.run_until(1_000, &stop);
    assert!(cancelled.cancelled);
    assert_eq!(sim.counters().steps, 1_000);
}

#[test]
fn snapshot_restores_and_continues() {
    let mut sim = weighted_sim(6, 12, WeightTable::symmetric(1.0, 1.5, 0.75));
    sim.run(1_500);
    let bytes = sim.serialize().unwrap();
    let mut restored = Simulation::deserialize(&bytes).unwrap();
    assert_eq!(restored.seed(), 12);
    sim.run(1_500);
    restored.run(1_500);
    assert_eq!(restored.state_hash(), sim.state_hash());
    assert_eq!(restored.stats(), sim.stats());
}

// ===========================================================================
// Host
// ===========================================================================

#[test]
fn host_round_trip_over_json() {
    let mut host = Host::new();
    let requests = [
        Request::Configure(config(4, 42)),
        Request::Run { steps: 200 },
        Request::SetWeights(WeightTable::symmetric(1.0, 1.0, 2.0)),
        Request::Step,
        Request::GetStats,
        Request::Reset,
        Request::GetState,
    ];
    let mut responses = Vec::new();
    for request in requests {
        let wire = serde_json::to_string(&request).unwrap();
        let decoded: Request = serde_json::from_str(&wire).unwrap();
        let response = host.handle(decoded);
        let wire = serde_json::to_string(&response).unwrap();
        responses.push(serde_json::from_str::<Response>(&wire).unwrap());
    }

    assert_eq!(responses[0], Response::Ready);
    assert!(matches!(responses[1], Response::Ran(r) if r.steps_run == 200));
    assert_eq!(responses[2], Response::Ready);
    assert!(matches!(responses[3], Response::Stepped(_)));
    assert!(matches!(&responses[4], Response::Stats(s) if s.counters.steps == 201));
    assert_eq!(responses[5], Response::Ready);
    let Response::State(state) = &responses[6] else {
        panic!("expected State");
    };
    assert_eq!(state.cells, Boundary::DwbcHigh.build(4).unwrap().cells());
}

#[test]
fn stats_with_forbidden_type_survive_json() {
    let mut weights = WeightTable::default();
    weights.c1 = 0.0;
    let mut host = Host::new();
    host.handle(Request::Configure(config(4, 5).with_weights(weights)));
    host.handle(Request::Run { steps: 50 });

    let response = host.handle(Request::GetStats);
    let Response::Stats(stats) = &response else {
        panic!("expected Stats");
    };
    // The high state has c1 on its diagonal.
    assert!(stats.type_counts.c1 > 0);
    assert_eq!(stats.energy, None);

    let wire = serde_json::to_string(&response).unwrap();
    let Response::Stats(decoded) = serde_json::from_str::<Response>(&wire).unwrap() else {
        panic!("expected Stats");
    };
    assert_eq!(decoded.energy, None);
    assert_eq!(decoded.counters, stats.counters);
    assert_eq!(decoded.type_counts, stats.type_counts);
    assert_eq!(decoded.volume, stats.volume);
}
