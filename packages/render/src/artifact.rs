//! Content-addressed map files under the static directory.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use hotspot_map_dataset::paths;
use sha2::{Digest, Sha256};

use crate::{MapView, RenderError, page};

/// File name of the map shown before any month is selected.
pub const DEFAULT_MAP_FILE: &str = "default_map.html";

/// Hex characters of the content hash kept in artifact file names.
const HASH_PREFIX_LEN: usize = 16;

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// A rendered map written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapArtifact {
    /// Path relative to the static directory, with `/` separators
    /// (e.g. `maps/june-3f1c….html`).
    pub relative_path: String,
    /// Absolute or caller-relative filesystem path.
    pub path: PathBuf,
}

fn io_error(path: &Path, source: std::io::Error) -> RenderError {
    RenderError::Io {
        path: path.display().to_string(),
        source,
    }
}

/// Writes `contents` to `path` through a temporary file and a rename, so
/// readers never see a partial page.
fn write_atomic(path: &Path, contents: &str) -> Result<(), RenderError> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let temp = path.with_file_name(format!(
        ".{file_name}.{}.{}.tmp",
        std::process::id(),
        TEMP_COUNTER.fetch_add(1, Ordering::Relaxed)
    ));
    std::fs::write(&temp, contents).map_err(|e| io_error(&temp, e))?;
    std::fs::rename(&temp, path).map_err(|e| {
        let _ = std::fs::remove_file(&temp);
        io_error(path, e)
    })
}

fn month_slug(month: &str) -> String {
    month
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect()
}

/// Content-addressed file name for a month's page.
#[must_use]
pub fn artifact_file_name(month: &str, html: &str) -> String {
    let digest = hex::encode(Sha256::digest(html.as_bytes()));
    format!("{}-{}.html", month_slug(month), &digest[..HASH_PREFIX_LEN])
}

/// Returns `true` if `file_name` is a page of `slug` with any content hash.
fn is_month_artifact(file_name: &str, slug: &str) -> bool {
    file_name
        .strip_prefix(slug)
        .and_then(|rest| rest.strip_prefix('-'))
        .and_then(|rest| rest.strip_suffix(".html"))
        .is_some_and(|hash| {
            hash.len() == HASH_PREFIX_LEN && hash.bytes().all(|b| b.is_ascii_hexdigit())
        })
}

/// Removes older pages of the same month, keeping `keep`.
///
/// Failures are logged and otherwise ignored; a stale page never blocks a
/// new one.
fn prune_stale(dir: &Path, month: &str, keep: &str) {
    let slug = month_slug(month);
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            log::warn!("Could not list {} for pruning: {e}", dir.display());
            return;
        }
    };
    for entry in entries.flatten() {
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if name == keep || !is_month_artifact(name, &slug) {
            continue;
        }
        match std::fs::remove_file(entry.path()) {
            Ok(()) => log::debug!("Removed stale map {name}"),
            Err(e) => log::warn!("Could not remove stale map {name}: {e}"),
        }
    }
}

/// Writes a rendered page for `month` under `<static_dir>/maps/`.
///
/// Creates the directory if needed. If a file with the same content
/// hash already exists it is reused; otherwise the new page replaces any
/// earlier page for the same month.
///
/// # Errors
///
/// Returns [`RenderError::Io`] if the directory or file cannot be written.
pub fn write_artifact(
    static_dir: &Path,
    month: &str,
    html: &str,
) -> Result<MapArtifact, RenderError> {
    let dir = paths::maps_dir(static_dir);
    std::fs::create_dir_all(&dir).map_err(|e| io_error(&dir, e))?;

    let file_name = artifact_file_name(month, html);
    let path = dir.join(&file_name);
    let artifact = MapArtifact {
        relative_path: format!("maps/{file_name}"),
        path,
    };

    if artifact.path.exists() {
        log::debug!("Reusing map {}", artifact.path.display());
        return Ok(artifact);
    }

    write_atomic(&artifact.path, html)?;
    log::info!("Wrote map {}", artifact.path.display());
    prune_stale(&dir, month, &file_name);
    Ok(artifact)
}

/// Writes the marker-less default map if it does not exist yet.
///
/// # Errors
///
/// Returns [`RenderError`] if the page cannot be rendered or written.
pub fn write_default_map(static_dir: &Path, view: &MapView) -> Result<MapArtifact, RenderError> {
    std::fs::create_dir_all(static_dir).map_err(|e| io_error(static_dir, e))?;
    let artifact = MapArtifact {
        relative_path: DEFAULT_MAP_FILE.to_string(),
        path: static_dir.join(DEFAULT_MAP_FILE),
    };
    if !artifact.path.exists() {
        let html = page::render_page(view, &[], "Hotspot map")?;
        write_atomic(&artifact.path, &html)?;
        log::info!("Wrote default map {}", artifact.path.display());
    }
    Ok(artifact)
}
