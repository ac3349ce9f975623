//! Scene data model
//!
//! Lights, cameras and the versioned snapshot stored in history. All types
//! round-trip through the camelCase JSON shape used by settings files, the
//! durable store and shared URLs.

use serde::{Deserialize, Serialize};

/// Schema version written into every snapshot
pub const SNAPSHOT_VERSION: u32 = 1;

/// Outline of the emitting surface of a light
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LightShape {
    #[default]
    Rect,
    Circle,
    Ring,
}

/// Spherical placement of a light around the scene origin (radians)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

/// Optional oscillation applied to a light's intensity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LightAnimation {
    pub speed: f64,
    pub amplitude: f64,
    #[serde(default)]
    pub phase: f64,
}

/// Fields shared by every light variant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LightBase {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub shape: LightShape,
    pub intensity: f64,
    #[serde(default = "default_opacity")]
    pub opacity: f64,
    #[serde(default = "default_scale")]
    pub scale: [f64; 2],
    #[serde(default)]
    pub rotation: f64,
    #[serde(default)]
    pub latlon: LatLon,
    #[serde(default)]
    pub target: [f64; 3],
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default)]
    pub solo: bool,
    #[serde(default)]
    pub selected: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub animation: Option<LightAnimation>,
    /// Live-edit cache key, bumped on every mutation. Not part of the shared state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ts: Option<u64>,
}

fn default_opacity() -> f64 {
    1.0
}

fn default_scale() -> [f64; 2] {
    [1.0, 1.0]
}

fn default_true() -> bool {
    true
}

/// Variant-specific light parameters, tagged by `type`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LightKind {
    /// Image-backed light; `map` is the texture path
    Texture { color: String, map: String },
    /// Procedural diffusion scrim
    #[serde(rename_all = "camelCase")]
    Scrim { color: String, light_shape: f64 },
    /// Procedural umbrella reflector
    #[serde(rename_all = "camelCase")]
    Umbrella { color: String, light_shape: f64 },
    /// Vertical two-colour gradient filling the sky
    #[serde(rename_all = "camelCase")]
    Sky {
        top_color: String,
        bottom_color: String,
    },
}

impl LightKind {
    pub fn label(&self) -> &'static str {
        match self {
            LightKind::Texture { .. } => "texture",
            LightKind::Scrim { .. } => "scrim",
            LightKind::Umbrella { .. } => "umbrella",
            LightKind::Sky { .. } => "sky",
        }
    }

    /// Default parameters for a freshly added light of the given label
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "texture" => Some(LightKind::Texture {
                color: "#ffffff".into(),
                map: String::new(),
            }),
            "scrim" => Some(LightKind::Scrim {
                color: "#ffffff".into(),
                light_shape: 0.5,
            }),
            "umbrella" => Some(LightKind::Umbrella {
                color: "#ffffff".into(),
                light_shape: 0.5,
            }),
            "sky" => Some(LightKind::Sky {
                top_color: "#8fb8ff".into(),
                bottom_color: "#1b1f2a".into(),
            }),
            _ => None,
        }
    }
}

/// A light: shared base record plus its variant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Light {
    #[serde(flatten)]
    pub base: LightBase,
    #[serde(flatten)]
    pub kind: LightKind,
}

impl Light {
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: LightKind) -> Self {
        Self {
            base: LightBase {
                id: id.into(),
                name: name.into(),
                shape: LightShape::default(),
                intensity: 1.0,
                opacity: default_opacity(),
                scale: default_scale(),
                rotation: 0.0,
                latlon: LatLon::default(),
                target: [0.0; 3],
                visible: true,
                solo: false,
                selected: false,
                animation: None,
                ts: None,
            },
            kind,
        }
    }

    /// Copy without the live-edit timestamp
    pub fn without_timestamp(&self) -> Self {
        let mut light = self.clone();
        light.base.ts = None;
        light
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub selected: bool,
    pub position: [f64; 3],
    #[serde(default)]
    pub rotation: [f64; 3],
}

impl Camera {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            selected: false,
            position: [0.0, 0.0, 5.0],
            rotation: [0.0; 3],
        }
    }
}

/// Immutable, versioned copy of the editable scene
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub version: u32,
    pub lights: Vec<Light>,
    pub cameras: Vec<Camera>,
    #[serde(default)]
    pub ibl_rotation: f64,
}

impl Snapshot {
    /// Deep copy of the live state
    pub fn capture(scene: &SceneState) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            lights: scene.lights.clone(),
            cameras: scene.cameras.clone(),
            ibl_rotation: scene.ibl_rotation,
        }
    }

    /// Equality that ignores light timestamps, which only key render caches
    pub fn same_scene(&self, other: &Snapshot) -> bool {
        self.version == other.version
            && self.ibl_rotation == other.ibl_rotation
            && self.cameras == other.cameras
            && self.lights.len() == other.lights.len()
            && self
                .lights
                .iter()
                .zip(&other.lights)
                .all(|(a, b)| a.without_timestamp() == b.without_timestamp())
    }
}

impl Default for Snapshot {
    fn default() -> Self {
        Self::capture(&SceneState::default())
    }
}

/// Live, editable scene state
#[derive(Debug, Clone, PartialEq)]
pub struct SceneState {
    pub lights: Vec<Light>,
    pub cameras: Vec<Camera>,
    pub ibl_rotation: f64,
}

impl SceneState {
    /// Overwrite this state with an independent copy of `snapshot`
    pub fn restore(&mut self, snapshot: &Snapshot) {
        self.lights = snapshot.lights.clone();
        self.cameras = snapshot.cameras.clone();
        self.ibl_rotation = snapshot.ibl_rotation;
    }
}

impl Default for SceneState {
    /// One key light in front of a single selected camera
    fn default() -> Self {
        let mut key = Light::new(
            "key",
            "Key Light",
            LightKind::Scrim {
                color: "#ffffff".into(),
                light_shape: 0.5,
            },
        );
        key.base.latlon = LatLon { lat: 0.35, lon: 0.0 };
        key.base.selected = true;

        let mut camera = Camera::new("camera-1", "Camera 1");
        camera.selected = true;

        Self {
            lights: vec![key],
            cameras: vec![camera],
            ibl_rotation: 0.0,
        }
    }
}

/// Opaque UI mode object carried by the shared URL only
pub type UiMode = serde_json::Map<String, serde_json::Value>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_light_json_shape() {
        let light = Light::new(
            "l1",
            "Fill",
            LightKind::Sky {
                top_color: "#fff".into(),
                bottom_color: "#000".into(),
            },
        );
        let value = serde_json::to_value(&light).unwrap();
        assert_eq!(value["type"], "sky");
        assert_eq!(value["topColor"], "#fff");
        assert_eq!(value["id"], "l1");
        assert!(value.get("ts").is_none());
    }

    #[test]
    fn test_light_defaults_fill_missing_fields() {
        let light: Light = serde_json::from_value(json!({
            "id": "a",
            "name": "A",
            "intensity": 2.0,
            "type": "scrim",
            "color": "#ff0000",
            "lightShape": 0.25
        }))
        .unwrap();
        assert!(light.base.visible);
        assert_eq!(light.base.opacity, 1.0);
        assert_eq!(
            light.kind,
            LightKind::Scrim {
                color: "#ff0000".into(),
                light_shape: 0.25
            }
        );
    }

    #[test]
    fn test_capture_is_independent() {
        let mut scene = SceneState::default();
        let snapshot = Snapshot::capture(&scene);
        scene.lights[0].base.name = "changed".into();
        assert_eq!(snapshot.lights[0].base.name, "Key Light");
    }

    #[test]
    fn test_snapshot_uses_camel_case() {
        let value = serde_json::to_value(Snapshot::default()).unwrap();
        assert_eq!(value["version"], 1);
        assert!(value.get("iblRotation").is_some());
    }

    #[test]
    fn test_kind_labels_round_trip() {
        for label in ["texture", "scrim", "umbrella", "sky"] {
            assert_eq!(LightKind::from_label(label).unwrap().label(), label);
        }
        assert!(LightKind::from_label("laser").is_none());
    }

    #[test]
    fn test_same_scene_ignores_light_timestamps() {
        let a = Snapshot::default();
        let mut b = a.clone();
        b.lights[0].base.ts = Some(1_700_000_000_000);
        assert_ne!(a, b);
        assert!(a.same_scene(&b));

        b.lights[0].base.intensity = 3.0;
        assert!(!a.same_scene(&b));
    }
}
