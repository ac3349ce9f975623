//! Mutation helpers for the live scene
//!
//! The stored shape accepts any combination of flags; these helpers keep the
//! conventions the editor relies on: exactly one selected camera whenever any
//! exist, at most one soloed light, and a fresh `ts` on every edited light.

use std::f64::consts::TAU;

use chrono::Utc;
use uuid::Uuid;

use super::models::{Camera, Light, LightKind, SceneState};

/// Bump the light's cache key, keeping it strictly increasing
fn touch(light: &mut Light) {
    let now = Utc::now().timestamp_millis().max(0) as u64;
    let next = match light.base.ts {
        Some(previous) if previous >= now => previous + 1,
        _ => now,
    };
    light.base.ts = Some(next);
}

/// Lowest "<prefix> N" not already used
fn next_name<'a>(prefix: &str, existing: impl Iterator<Item = &'a str>) -> String {
    let taken: Vec<&str> = existing.collect();
    (1..)
        .map(|n| format!("{} {}", prefix, n))
        .find(|candidate| !taken.contains(&candidate.as_str()))
        .unwrap_or_else(|| prefix.to_string())
}

impl SceneState {
    pub fn light(&self, id: &str) -> Option<&Light> {
        self.lights.iter().find(|l| l.base.id == id)
    }

    pub fn selected_camera(&self) -> Option<&Camera> {
        self.cameras.iter().find(|c| c.selected)
    }

    /// Add a light and make it the only selected one. Returns its id.
    pub fn add_light(&mut self, kind: LightKind) -> String {
        let id = Uuid::new_v4().to_string();
        let name = next_name("Light", self.lights.iter().map(|l| l.base.name.as_str()));
        let mut light = Light::new(id.clone(), name, kind);
        touch(&mut light);

        for other in &mut self.lights {
            other.base.selected = false;
        }
        light.base.selected = true;
        self.lights.push(light);
        id
    }

    pub fn remove_light(&mut self, id: &str) -> bool {
        let before = self.lights.len();
        self.lights.retain(|l| l.base.id != id);
        self.lights.len() != before
    }

    /// Copy a light under a new id, inserted right after the original
    pub fn duplicate_light(&mut self, id: &str) -> Option<String> {
        let position = self.lights.iter().position(|l| l.base.id == id)?;
        let mut copy = self.lights[position].clone();
        copy.base.id = Uuid::new_v4().to_string();
        copy.base.name = format!("{} copy", copy.base.name);
        copy.base.solo = false;
        copy.base.selected = false;
        touch(&mut copy);

        let new_id = copy.base.id.clone();
        self.lights.insert(position + 1, copy);
        Some(new_id)
    }

    /// Apply `edit` to one light and bump its timestamp
    pub fn update_light(&mut self, id: &str, edit: impl FnOnce(&mut Light)) -> bool {
        match self.lights.iter_mut().find(|l| l.base.id == id) {
            Some(light) => {
                edit(light);
                touch(light);
                true
            }
            None => false,
        }
    }

    /// Exclusive selection; `None` clears it
    pub fn select_light(&mut self, id: Option<&str>) {
        for light in &mut self.lights {
            light.base.selected = Some(light.base.id.as_str()) == id;
        }
    }

    pub fn toggle_visibility(&mut self, id: &str) -> bool {
        self.update_light(id, |light| light.base.visible = !light.base.visible)
    }

    /// Solo is exclusive: enabling it on one light clears it everywhere else
    pub fn set_solo(&mut self, id: &str, solo: bool) -> bool {
        if self.light(id).is_none() {
            return false;
        }
        for light in &mut self.lights {
            if light.base.id == id {
                light.base.solo = solo;
                touch(light);
            } else if solo && light.base.solo {
                light.base.solo = false;
                touch(light);
            }
        }
        true
    }

    /// Store the environment rotation wrapped into `[0, 2π)`
    pub fn set_ibl_rotation(&mut self, radians: f64) {
        self.ibl_rotation = if radians.is_finite() {
            radians.rem_euclid(TAU)
        } else {
            0.0
        };
    }

    /// Lights a renderer should draw: visible ones, or only the soloed one
    pub fn effective_lights(&self) -> Vec<&Light> {
        if let Some(solo) = self.lights.iter().find(|l| l.base.solo) {
            return vec![solo];
        }
        self.lights.iter().filter(|l| l.base.visible).collect()
    }

    /// Add a camera and select it. Returns its id.
    pub fn add_camera(&mut self) -> String {
        let id = Uuid::new_v4().to_string();
        let name = next_name("Camera", self.cameras.iter().map(|c| c.name.as_str()));
        self.cameras.push(Camera::new(id.clone(), name));
        self.select_camera(&id);
        id
    }

    /// Remove a camera; if it was selected, the first remaining one takes over
    pub fn remove_camera(&mut self, id: &str) -> bool {
        let before = self.cameras.len();
        self.cameras.retain(|c| c.id != id);
        let removed = self.cameras.len() != before;
        if removed {
            self.ensure_camera_selection();
        }
        removed
    }

    pub fn select_camera(&mut self, id: &str) -> bool {
        if !self.cameras.iter().any(|c| c.id == id) {
            return false;
        }
        for camera in &mut self.cameras {
            camera.selected = camera.id == id;
        }
        true
    }

    /// Repair zero or multiple selected cameras, keeping the first selected one
    pub fn ensure_camera_selection(&mut self) {
        let keep = self
            .cameras
            .iter()
            .position(|c| c.selected)
            .unwrap_or(0);
        for (i, camera) in self.cameras.iter_mut().enumerate() {
            camera.selected = i == keep;
        }
    }
}
