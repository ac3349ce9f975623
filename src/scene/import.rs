//! Settings file import/export
//!
//! A settings file is a snapshot written as pretty JSON. Imports are strict:
//! anything that is not a complete version-1 snapshot is rejected without
//! touching the live scene.

use serde_json::Value;
use thiserror::Error;

use super::models::{SceneState, Snapshot, SNAPSHOT_VERSION};

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Settings file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Unsupported settings version {found:?} (expected 1)")]
    Version { found: Option<u64> },
    #[error("Settings file is missing the `{0}` list")]
    MissingList(&'static str),
}

/// Parse and validate a settings file
pub fn import_settings(bytes: &[u8]) -> Result<Snapshot, ImportError> {
    let value: Value = serde_json::from_slice(bytes)?;

    let version = value.get("version").and_then(Value::as_u64);
    if version != Some(u64::from(SNAPSHOT_VERSION)) {
        return Err(ImportError::Version { found: version });
    }

    for list in ["lights", "cameras"] {
        if !value.get(list).is_some_and(Value::is_array) {
            return Err(ImportError::MissingList(list));
        }
    }

    let mut snapshot: Snapshot = serde_json::from_value(value)?;
    if !snapshot.ibl_rotation.is_finite() {
        snapshot.ibl_rotation = 0.0;
    }

    // Files written by hand may carry any selection; repair it through the
    // same helper the editor uses.
    let mut scene = SceneState::default();
    scene.restore(&snapshot);
    scene.ensure_camera_selection();
    snapshot.cameras = scene.cameras;

    Ok(snapshot)
}

/// Serialize a snapshot as a settings file
pub fn export_settings(snapshot: &Snapshot) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec_pretty(snapshot)
}
