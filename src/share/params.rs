//! Shared-link query parameters
//!
//! A scene is shared through three independent parameters: the UI mode, the
//! light list and the camera list. Each one decodes on its own, so a damaged
//! parameter only loses that part of the state.

use serde::Serialize;
use url::form_urlencoded;

use super::codec::{decode_token, encode_token};
use crate::scene::{Camera, Light, SceneState, UiMode};

pub const MODE_PARAM: &str = "mode";
pub const LIGHTS_PARAM: &str = "lights";
pub const CAMERAS_PARAM: &str = "cameras";

/// State carried by a shared link
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ShareState {
    pub mode: Option<UiMode>,
    pub lights: Option<Vec<Light>>,
    pub cameras: Option<Vec<Camera>>,
}

impl ShareState {
    /// Capture the shareable parts of the editor, dropping light timestamps
    pub fn capture(mode: &UiMode, scene: &SceneState) -> Self {
        Self {
            mode: Some(mode.clone()),
            lights: Some(scene.lights.iter().map(Light::without_timestamp).collect()),
            cameras: Some(scene.cameras.clone()),
        }
    }

    /// Parse the three parameters out of a query string (leading `?` allowed).
    ///
    /// Values are form-decoded first, so percent-encoded legacy JSON reads
    /// the same as it would through a browser's `URLSearchParams`.
    pub fn from_query(query: &str) -> Self {
        let mut state = Self::default();
        for (key, value) in parse_query(query) {
            match &*key {
                MODE_PARAM => state.mode = decode_token(&value),
                LIGHTS_PARAM => state.lights = decode_token(&value),
                CAMERAS_PARAM => state.cameras = decode_token(&value),
                _ => {}
            }
        }
        state
    }

    /// Rewrite `existing` with this state's parameters, keeping any others
    pub fn merge_into_query(&self, existing: &str) -> Result<String, serde_json::Error> {
        let mut query = form_urlencoded::Serializer::new(String::new());
        for (key, value) in parse_query(existing) {
            if ![MODE_PARAM, LIGHTS_PARAM, CAMERAS_PARAM].contains(&&*key) {
                query.append_pair(&key, &value);
            }
        }

        if let Some(mode) = &self.mode {
            query.append_pair(MODE_PARAM, &encode_token(mode)?);
        }
        if let Some(lights) = &self.lights {
            query.append_pair(LIGHTS_PARAM, &encode_token(lights)?);
        }
        if let Some(cameras) = &self.cameras {
            query.append_pair(CAMERAS_PARAM, &encode_token(cameras)?);
        }

        Ok(query.finish())
    }

    pub fn to_query(&self) -> Result<String, serde_json::Error> {
        self.merge_into_query("")
    }

    pub fn is_empty(&self) -> bool {
        self.mode.is_none() && self.lights.is_none() && self.cameras.is_none()
    }
}

fn parse_query(query: &str) -> form_urlencoded::Parse<'_> {
    form_urlencoded::parse(query.trim_start_matches('?').as_bytes())
}
