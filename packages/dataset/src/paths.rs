//! Default locations of the input table, model, and static assets.
//!
//! Relative to the working directory, so a deployed binary reads the
//! `data/`, `model/`, and `static/` next to where it is started. Each can
//! be overridden through the server's environment variables.

use std::path::{Path, PathBuf};

/// Directory holding the location table.
pub const DATA_DIR: &str = "data";
/// Directory holding the exported model.
pub const MODEL_DIR: &str = "model";
/// Directory served under `/static`.
pub const STATIC_DIR: &str = "static";

/// Returns the default location table path (`data/train_master.csv`).
#[must_use]
pub fn default_csv_path() -> PathBuf {
    Path::new(DATA_DIR).join("train_master.csv")
}

/// Returns the default exported model path (`model/hotspot_model.json`).
#[must_use]
pub fn default_model_path() -> PathBuf {
    Path::new(MODEL_DIR).join("hotspot_model.json")
}

/// Returns the default static directory.
#[must_use]
pub fn static_dir() -> PathBuf {
    PathBuf::from(STATIC_DIR)
}

/// Returns the directory rendered maps are written to, under `static_dir`.
#[must_use]
pub fn maps_dir(static_dir: &Path) -> PathBuf {
    static_dir.join("maps")
}
