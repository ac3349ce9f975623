//! Snapshot normalization and fingerprinting
//!
//! Persisted and imported snapshots arrive as untyped JSON. Normalization
//! keeps only the entries that match the current schema and coerces the
//! optional scalar fields, so callers never have to fail on stale data.

use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};

use super::models::{Snapshot, SNAPSHOT_VERSION};

/// Turn an untyped value into a snapshot, or `None` if it does not qualify.
///
/// A value qualifies when it is an object with `version == 1` and array-shaped
/// `lights` and `cameras`. A missing or non-numeric `iblRotation` becomes `0`.
pub fn normalize_value(value: &Value) -> Option<Snapshot> {
    let object = value.as_object()?;

    if object.get("version").and_then(Value::as_u64) != Some(u64::from(SNAPSHOT_VERSION)) {
        return None;
    }

    let lights = object.get("lights").filter(|v| v.is_array())?;
    let cameras = object.get("cameras").filter(|v| v.is_array())?;

    let ibl_rotation = object
        .get("iblRotation")
        .and_then(Value::as_f64)
        .filter(|r| r.is_finite())
        .unwrap_or(0.0);

    let lights = match serde_json::from_value(lights.clone()) {
        Ok(lights) => lights,
        Err(e) => {
            tracing::warn!(error = %e, "Dropping snapshot with undecodable lights");
            return None;
        }
    };

    let cameras = match serde_json::from_value(cameras.clone()) {
        Ok(cameras) => cameras,
        Err(e) => {
            tracing::warn!(error = %e, "Dropping snapshot with undecodable cameras");
            return None;
        }
    };

    Some(Snapshot {
        version: SNAPSHOT_VERSION,
        lights,
        cameras,
        ibl_rotation,
    })
}

/// Re-normalize an already typed snapshot (version pinned, rotation finite)
pub fn normalize(snapshot: &Snapshot) -> Snapshot {
    let mut copy = snapshot.clone();
    copy.version = SNAPSHOT_VERSION;
    if !copy.ibl_rotation.is_finite() {
        copy.ibl_rotation = 0.0;
    }
    copy
}

/// Stable content fingerprint of any serializable payload.
///
/// `serde_json` writes struct fields in declaration order and its default map
/// is ordered, so equal values always produce the same digest.
pub fn fingerprint<T: Serialize + ?Sized>(payload: &T) -> Result<String, serde_json::Error> {
    let bytes = serde_json::to_vec(payload)?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(format!("{:x}", hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_accepts_valid_entry() {
        let snapshot = normalize_value(&json!({
            "version": 1,
            "lights": [],
            "cameras": [],
            "iblRotation": 1.5
        }))
        .unwrap();
        assert_eq!(snapshot.ibl_rotation, 1.5);
    }

    #[test]
    fn test_normalize_coerces_rotation() {
        let missing = normalize_value(&json!({"version": 1, "lights": [], "cameras": []})).unwrap();
        assert_eq!(missing.ibl_rotation, 0.0);

        let text = normalize_value(&json!({
            "version": 1, "lights": [], "cameras": [], "iblRotation": "90deg"
        }))
        .unwrap();
        assert_eq!(text.ibl_rotation, 0.0);
    }

    #[test]
    fn test_normalize_rejects_wrong_version_or_shape() {
        assert!(normalize_value(&json!({"version": 2, "lights": [], "cameras": []})).is_none());
        assert!(normalize_value(&json!({"version": 1, "lights": {}, "cameras": []})).is_none());
        assert!(normalize_value(&json!({"version": 1, "lights": []})).is_none());
        assert!(normalize_value(&json!("snapshot")).is_none());
        assert!(normalize_value(&json!({"version": 1, "lights": [1], "cameras": []})).is_none());
    }

    #[test]
    fn test_fingerprint_is_stable_and_discriminating() {
        let a = Snapshot::default();
        let mut b = a.clone();
        assert_eq!(fingerprint(&a).unwrap(), fingerprint(&b).unwrap());

        b.ibl_rotation = 0.5;
        assert_ne!(fingerprint(&a).unwrap(), fingerprint(&b).unwrap());
    }

    #[test]
    fn test_normalize_typed_repairs_rotation() {
        let mut snapshot = Snapshot::default();
        snapshot.version = 7;
        snapshot.ibl_rotation = f64::NAN;
        let fixed = normalize(&snapshot);
        assert_eq!(fixed.version, SNAPSHOT_VERSION);
        assert_eq!(fixed.ibl_rotation, 0.0);
    }
}
