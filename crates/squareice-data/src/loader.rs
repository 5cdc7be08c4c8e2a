//! Loading simulation configs and lattice states from data files.
//!
//! Provides format detection (RON/JSON/TOML), file discovery and
//! deserialization into the core's plain-data types. Everything loaded is
//! validated before it is returned.

use serde::de::DeserializeOwned;
use squareice_core::config::{ConfigError, SimConfig};
use squareice_core::lattice::{Lattice, LatticeError, LatticeSnapshot};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Base name of the config file looked up by [`load_config_from_dir`].
pub const CONFIG_BASE_NAME: &str = "sim";

// ===========================================================================
// Errors
// ===========================================================================

/// Errors that can occur during data loading.
#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    /// A required data file was not found in the given directory.
    #[error("required file '{file}' not found in {dir}")]
    MissingRequired { file: String, dir: PathBuf },

    /// The file has an extension we don't support.
    #[error("unsupported format for file: {file}")]
    UnsupportedFormat { file: PathBuf },

    /// Two files with the same base name but different formats exist.
    #[error("conflicting formats: {a} and {b}")]
    ConflictingFormats { a: PathBuf, b: PathBuf },

    /// A deserialization error occurred.
    #[error("parse error in {file}: {detail}")]
    Parse { file: PathBuf, detail: String },

    /// The config parsed but is not usable.
    #[error("invalid config in {file}: {source}")]
    Config { file: PathBuf, source: ConfigError },

    /// The lattice parsed but violates the ice rule.
    #[error("invalid lattice in {file}: {source}")]
    Lattice { file: PathBuf, source: LatticeError },

    /// An I/O error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ===========================================================================
// Format detection
// ===========================================================================

/// Supported data file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Ron,
    Toml,
    Json,
}

/// Detect the format of a file based on its extension.
pub fn detect_format(path: &Path) -> Result<Format, DataLoadError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("ron") => Ok(Format::Ron),
        Some("toml") => Ok(Format::Toml),
        Some("json") => Ok(Format::Json),
        _ => Err(DataLoadError::UnsupportedFormat {
            file: path.to_path_buf(),
        }),
    }
}

// ===========================================================================
// File discovery
// ===========================================================================

/// Scan a directory for `{base_name}.ron`, `.toml` or `.json`.
///
/// Returns `Ok(None)` if no file is found, or `Err(ConflictingFormats)` if
/// more than one format exists for the same base name.
pub fn find_data_file(dir: &Path, base_name: &str) -> Result<Option<PathBuf>, DataLoadError> {
    let mut found: Option<PathBuf> = None;

    for ext in ["ron", "toml", "json"] {
        let candidate = dir.join(format!("{base_name}.{ext}"));
        if candidate.exists() {
            if let Some(existing) = found {
                return Err(DataLoadError::ConflictingFormats {
                    a: existing,
                    b: candidate,
                });
            }
            found = Some(candidate);
        }
    }

    Ok(found)
}

/// Like [`find_data_file`], but returns an error if no file is found.
pub fn require_data_file(dir: &Path, base_name: &str) -> Result<PathBuf, DataLoadError> {
    find_data_file(dir, base_name)?.ok_or_else(|| DataLoadError::MissingRequired {
        file: base_name.to_string(),
        dir: dir.to_path_buf(),
    })
}

// ===========================================================================
// Deserialization
// ===========================================================================

/// Read a file and deserialize it according to its format.
pub fn deserialize_file<T: DeserializeOwned>(path: &Path) -> Result<T, DataLoadError> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;
    deserialize_str(&content, format).map_err(|detail| DataLoadError::Parse {
        file: path.to_path_buf(),
        detail,
    })
}

/// Deserialize in-memory text in the given format.
pub fn deserialize_str<T: DeserializeOwned>(content: &str, format: Format) -> Result<T, String> {
    match format {
        Format::Ron => ron::from_str(content).map_err(|e| e.to_string()),
        Format::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
        Format::Toml => toml::from_str(content).map_err(|e| e.to_string()),
    }
}

// ===========================================================================
// Typed loaders
// ===========================================================================

/// Load and validate a [`SimConfig`]. Missing fields take their defaults.
pub fn load_config(path: &Path) -> Result<SimConfig, DataLoadError> {
    let config: SimConfig = deserialize_file(path)?;
    config.validate().map_err(|source| DataLoadError::Config {
        file: path.to_path_buf(),
        source,
    })?;
    debug!(
        file = %path.display(),
        size = config.size,
        boundary = ?config.boundary,
        seed = ?config.seed,
        "config loaded"
    );
    Ok(config)
}

/// Load `sim.{ron,toml,json}` from `dir`.
pub fn load_config_from_dir(dir: &Path) -> Result<SimConfig, DataLoadError> {
    let path = require_data_file(dir, CONFIG_BASE_NAME)?;
    load_config(&path)
}

/// Load a lattice state and check the ice rule.
pub fn load_lattice(path: &Path) -> Result<Lattice, DataLoadError> {
    let snapshot: LatticeSnapshot = deserialize_file(path)?;
    let lattice = Lattice::try_from(snapshot).map_err(|source| DataLoadError::Lattice {
        file: path.to_path_buf(),
        source,
    })?;
    debug!(
        file = %path.display(),
        width = lattice.width(),
        height = lattice.height(),
        "lattice loaded"
    );
    Ok(lattice)
}

// ===========================================================================
// Tests
// ===========================================================================
