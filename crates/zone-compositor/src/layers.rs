// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Layer definitions and the layer registry.
//!
//! The registry never talks to a backend. Every mutation marks the layer
//! dirty, and the compositor drains the dirty set once per render pass.

use std::collections::BTreeSet;

use log::{debug, warn};
use serde::Serialize;
use thiserror::Error;

/// Sentinel-2 satellite imagery base layer.
pub const SATELLITE: &str = "satellite";
/// OpenStreetMap base layer.
pub const OSM: &str = "osm";
/// AI change-detection overlay holding the analysis zones.
pub const AI_ANALYSIS: &str = "ai-analysis";
/// Ecosystem classification overlay.
pub const ECOSYSTEM: &str = "ecosystem";
/// Carbon density overlay.
pub const CARBON_DENSITY: &str = "carbon-density";
/// Project boundary outline overlay.
pub const PROJECT_BOUNDARY: &str = "project-boundary";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("unknown layer: {0}")]
    UnknownLayer(String),
}

/// Base layers are mutually exclusive within a group; overlays are independent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LayerKind {
    Base,
    Overlay,
}

/// A toggleable visual stratum.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Layer {
    pub id: String,
    pub name: String,
    pub kind: LayerKind,
    pub group: String,
    pub enabled: bool,
    pub opacity: f64,
    /// Display color token, either a palette name or a `#rrggbb` value.
    pub color_token: String,
}

impl Layer {
    #[must_use]
    pub fn base(id: &str, name: &str, group: &str, color_token: &str) -> Self {
        Self::new(id, name, LayerKind::Base, group, color_token)
    }

    #[must_use]
    pub fn overlay(id: &str, name: &str, group: &str, color_token: &str) -> Self {
        Self::new(id, name, LayerKind::Overlay, group, color_token)
    }

    fn new(id: &str, name: &str, kind: LayerKind, group: &str, color_token: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            kind,
            group: group.to_string(),
            enabled: false,
            opacity: 1.0,
            color_token: color_token.to_string(),
        }
    }

    #[must_use]
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    #[must_use]
    pub fn with_opacity(mut self, opacity: f64) -> Self {
        self.opacity = clamp_opacity(opacity).unwrap_or(self.opacity);
        self
    }

    #[must_use]
    pub fn is_base(&self) -> bool {
        self.kind == LayerKind::Base
    }
}

fn clamp_opacity(value: f64) -> Option<f64> {
    if value.is_nan() {
        None
    } else {
        Some(value.clamp(0.0, 1.0))
    }
}

/// Registry of every layer known to the compositor.
///
/// Layers are registered once at construction and are never removed.
/// Iteration follows registration order.
#[derive(Debug, Clone, Default)]
pub struct LayerRegistry {
    layers: Vec<Layer>,
    dirty: BTreeSet<usize>,
}

impl LayerRegistry {
    /// Build a registry from layer definitions.
    ///
    /// Duplicate ids are dropped. If more than one base layer of a group is
    /// enabled, only the first keeps its enabled flag. All layers start dirty
    /// so the first render pass sends the full set.
    #[must_use]
    pub fn new(definitions: Vec<Layer>) -> Self {
        let mut layers: Vec<Layer> = Vec::with_capacity(definitions.len());

        for mut layer in definitions {
            if layers.iter().any(|l| l.id == layer.id) {
                warn!("Ignoring duplicate layer definition '{}'", layer.id);
                continue;
            }
            layer.opacity = clamp_opacity(layer.opacity).unwrap_or(1.0);
            if layer.is_base()
                && layer.enabled
                && layers
                    .iter()
                    .any(|l| l.is_base() && l.enabled && l.group == layer.group)
            {
                warn!(
                    "Base layer '{}' disabled: group '{}' already has an enabled layer",
                    layer.id, layer.group
                );
                layer.enabled = false;
            }
            layers.push(layer);
        }

        let dirty = (0..layers.len()).collect();
        Self { layers, dirty }
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Layer> {
        self.layers.iter().find(|l| l.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Layer> {
        self.layers.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Whether the layer exists and is enabled.
    #[must_use]
    pub fn is_enabled(&self, id: &str) -> bool {
        self.get(id).is_some_and(|l| l.enabled)
    }

    /// The enabled base layer of `group`, if any.
    #[must_use]
    pub fn active_base(&self, group: &str) -> Option<&Layer> {
        self.layers
            .iter()
            .find(|l| l.is_base() && l.enabled && l.group == group)
    }

    /// Enable or disable a layer.
    ///
    /// Enabling a base layer disables every other base layer in its group.
    /// Returns `true` if anything changed.
    pub fn set_enabled(&mut self, id: &str, enabled: bool) -> Result<bool, RegistryError> {
        let index = self.index_of(id)?;
        let mut changed = false;

        if enabled && self.layers[index].is_base() {
            let group = self.layers[index].group.clone();
            for (i, layer) in self.layers.iter_mut().enumerate() {
                if i != index && layer.is_base() && layer.group == group && layer.enabled {
                    debug!("Base layer '{}' disabled by '{}'", layer.id, id);
                    layer.enabled = false;
                    self.dirty.insert(i);
                    changed = true;
                }
            }
        }

        let layer = &mut self.layers[index];
        if layer.enabled != enabled {
            layer.enabled = enabled;
            self.dirty.insert(index);
            changed = true;
        }

        Ok(changed)
    }

    /// Set a layer's opacity, clamped into `[0, 1]`.
    ///
    /// Disabled layers keep the value, so a disable/enable round trip restores
    /// it unchanged. `NaN` is ignored. Returns the stored opacity.
    pub fn set_opacity(&mut self, id: &str, value: f64) -> Result<f64, RegistryError> {
        let index = self.index_of(id)?;
        let layer = &mut self.layers[index];

        if let Some(opacity) = clamp_opacity(value) {
            if (layer.opacity - opacity).abs() > f64::EPSILON {
                layer.opacity = opacity;
                self.dirty.insert(index);
            }
        }

        Ok(layer.opacity)
    }

    /// Select a base layer, disabling its siblings.
    pub fn switch_base_layer(&mut self, id: &str) -> Result<bool, RegistryError> {
        self.set_enabled(id, true)
    }

    #[must_use]
    pub fn has_dirty(&self) -> bool {
        !self.dirty.is_empty()
    }

    /// Drain the dirty set, returning snapshots in registration order.
    pub fn take_dirty(&mut self) -> Vec<Layer> {
        std::mem::take(&mut self.dirty)
            .into_iter()
            .filter_map(|i| self.layers.get(i).cloned())
            .collect()
    }

    fn index_of(&self, id: &str) -> Result<usize, RegistryError> {
        self.layers
            .iter()
            .position(|l| l.id == id)
            .ok_or_else(|| RegistryError::UnknownLayer(id.to_string()))
    }
}
