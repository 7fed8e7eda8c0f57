//! Retained-memory emulation: the state record lives in a JSON file that
//! survives process restarts.

use anyhow::{Context, Result};
use irrigation_forecast::RetainedState;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Load the retained record at `path`.
///
/// A missing file means first-ever boot.  An unreadable record (corrupt
/// JSON, bad cursor, ...) is logged and replaced by a fresh state so the
/// node keeps forecasting; the core re-initialises it on the next cycle.
pub fn load(path: &Path) -> Result<RetainedState> {
    if !path.exists() {
        tracing::info!(path = %path.display(), "no retained state; first boot");
        return Ok(RetainedState::default());
    }

    let bytes = std::fs::read(path)
        .with_context(|| format!("failed to read retained state: {}", path.display()))?;

    match serde_json::from_slice::<RetainedState>(&bytes) {
        Ok(state) => {
            tracing::debug!(
                samples = state.history.len(),
                cursor = state.history.cursor(),
                month = state.season.last_known_month(),
                "retained state loaded"
            );
            Ok(state)
        }
        Err(e) => {
            tracing::error!(
                path = %path.display(),
                "discarding bad retained state, history window restarts: {e}"
            );
            Ok(RetainedState::default())
        }
    }
}

/// Save `state` to `path`, replacing the old record atomically.
///
/// The temp file is flushed to disk before the rename and the directory
/// entry after it, so a power cut leaves either the old or the new record.
pub fn save(path: &Path, state: &RetainedState) -> Result<()> {
    let json = serde_json::to_vec_pretty(state).context("failed to encode retained state")?;

    let tmp = tmp_path(path);
    let mut file = File::create(&tmp)
        .with_context(|| format!("failed to create retained state: {}", tmp.display()))?;
    file.write_all(&json)
        .with_context(|| format!("failed to write retained state: {}", tmp.display()))?;
    file.sync_all()
        .with_context(|| format!("failed to sync retained state: {}", tmp.display()))?;
    drop(file);

    std::fs::rename(&tmp, path)
        .with_context(|| format!("failed to replace retained state: {}", path.display()))?;
    sync_parent_dir(path)?;
    Ok(())
}

#[cfg(unix)]
fn sync_parent_dir(path: &Path) -> Result<()> {
    let dir = match path.parent() {
        Some(d) if !d.as_os_str().is_empty() => d,
        _ => Path::new("."),
    };
    File::open(dir)
        .and_then(|d| d.sync_all())
        .with_context(|| format!("failed to sync directory: {}", dir.display()))
}

#[cfg(not(unix))]
fn sync_parent_dir(_path: &Path) -> Result<()> {
    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

// ===========================================================================
// Tests
// ===========================================================================
