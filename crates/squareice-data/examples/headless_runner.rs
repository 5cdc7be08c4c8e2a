//! Headless runner: loads every config, runs it, prints stats, verifies determinism.
//!
//! Run with: `cargo run --package squareice-data --example headless_runner [steps]`

use std::path::Path;

use squareice_core::engine::Simulation;
use squareice_core::validation::validate_determinism;
use squareice_data::loader::{detect_format, load_config};
use tracing::{Level, error, info};

const DEFAULT_STEPS: u64 = 200_000;
const CHECK_STEPS: u64 = 2_000;

fn main() {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let steps = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_STEPS);
    let configs_dir = Path::new(concat!(env!("CARGO_MANIFEST_DIR"), "/configs"));

    let mut paths: Vec<_> = std::fs::read_dir(configs_dir)
        .unwrap_or_else(|e| panic!("failed to read {}: {e}", configs_dir.display()))
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| detect_format(path).is_ok())
        .collect();
    paths.sort();

    for path in &paths {
        let name = path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
        let config = match load_config(path) {
            Ok(config) => config,
            Err(e) => {
                error!(file = %name, "{e}");
                std::process::exit(1);
            }
        };

        let mut sim = Simulation::new(config.clone()).unwrap_or_else(|e| {
            panic!("failed to build '{name}': {e}");
        });
        let report = sim.run(steps);
        let stats = sim.stats();

        println!("--- {name} ---");
        println!(
            "    {}x{} {:?}, seed {}",
            config.size,
            config.size,
            config.boundary,
            sim.seed()
        );
        println!(
            "    {} steps, {} accepted ({:.3}), frozen = {}",
            report.steps_run, report.accepted, stats.acceptance_rate, report.frozen
        );
        let energy = stats
            .energy
            .map_or_else(|| "forbidden".to_string(), |e| format!("{e:.3}"));
        println!(
            "    volume = {}, average height = {:.3}, energy = {energy}",
            stats.volume, stats.average_height
        );
        println!(
            "    candidates = {} ({} bi-directional), state hash = {:#018x}",
            stats.candidates,
            stats.biflip_candidates,
            sim.state_hash()
        );

        match validate_determinism(&config, CHECK_STEPS) {
            Ok(result) if result.is_deterministic => {
                println!("    Determinism: PASS ({CHECK_STEPS} steps)");
            }
            Ok(result) => {
                println!(
                    "    Determinism: FAIL at step {:?}",
                    result.divergence_step
                );
                std::process::exit(1);
            }
            Err(e) => {
                error!(file = %name, "{e}");
                std::process::exit(1);
            }
        }
        println!();
    }

    info!(configs = paths.len(), steps, "all configs passed");
}
