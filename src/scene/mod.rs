//! Editable scene model
//!
//! Lights and cameras, the snapshot stored in history, snapshot normalization
//! and the settings-file format.

mod import;
mod models;
mod ops;
mod snapshot;

pub use import::{export_settings, import_settings, ImportError};
pub use models::{
    Camera, LatLon, Light, LightAnimation, LightBase, LightKind, LightShape, SceneState, Snapshot,
    UiMode, SNAPSHOT_VERSION,
};
pub use snapshot::{fingerprint, normalize, normalize_value};
