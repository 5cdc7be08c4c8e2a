//! Data-file loading for the square ice engine.
//!
//! Reads [`SimConfig`](squareice_core::config::SimConfig) and lattice states
//! from RON, TOML or JSON files, with the format picked from the extension.

pub mod loader;

pub use loader::{
    DataLoadError, Format, load_config, load_config_from_dir, load_lattice,
};
