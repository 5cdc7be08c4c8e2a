//! The configs shipped in `configs/` load and run.

use std::path::{Path, PathBuf};

use squareice_core::boundary::Boundary;
use squareice_core::engine::Simulation;
use squareice_core::test_utils::assert_ice_rule;
use squareice_data::loader::load_config;

fn config_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("configs").join(name)
}

#[test]
fn every_shipped_config_runs() {
    for name in ["sim.ron", "ferroelectric.toml", "no_c2.json"] {
        let config = load_config(&config_path(name)).unwrap();
        let mut sim = Simulation::new(config).unwrap();
        let report = sim.run(5_000);
        assert_eq!(report.steps_run, 5_000, "{name}");
        assert_ice_rule(sim.lattice());
    }
}

#[test]
fn shipped_configs_decode_their_fields() {
    let ron = load_config(&config_path("sim.ron")).unwrap();
    assert_eq!((ron.size, ron.seed), (32, Some(42)));

    let toml = load_config(&config_path("ferroelectric.toml")).unwrap();
    assert_eq!(toml.boundary, Boundary::DwbcLow);
    assert_eq!(toml.weights.a1, 3.0);
    assert_eq!(toml.batch_size, 512);

    let json = load_config(&config_path("no_c2.json")).unwrap();
    assert_eq!(json.weights.c2, 0.0);
    assert_eq!(json.batch_size, 1024);
}
