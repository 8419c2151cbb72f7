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

//! Classified analysis zones and their styling.
//!
//! Zones are validated on registration and immutable afterwards. The store
//! also owns the overlay visibility switch, which applies to every zone at
//! once.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use log::{info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geo::{open_ring, GeoPoint};
use crate::layers::AI_ANALYSIS;

/// Fill opacity for zones without detected change, regardless of the overlay opacity.
pub const STABLE_FILL_OPACITY: f64 = 0.3;
/// Outline width for zone polygons.
pub const ZONE_LINE_WIDTH: f64 = 2.0;
/// Dash pattern (on, off) for zones with detected change.
pub const CHANGED_DASH: [f64; 2] = [1.0, 1.0];
/// Dash pattern (on, off) for stable zones.
pub const STABLE_DASH: [f64; 2] = [4.0, 2.0];

/// Reasons a zone is refused at registration.
#[derive(Debug, Error, PartialEq)]
pub enum ZoneError {
    #[error("zone '{id}' has {count} distinct vertices, at least 3 are required")]
    TooFewVertices { id: String, count: usize },

    #[error("zone '{id}' has confidence {value} outside [0, 1]")]
    ConfidenceOutOfRange { id: String, value: f64 },

    #[error("zone '{id}' has negative carbon density {value}")]
    NegativeCarbonDensity { id: String, value: f64 },

    #[error("zone '{id}' has a non-finite coordinate")]
    NonFiniteCoordinate { id: String },

    #[error("zone '{0}' is already registered")]
    DuplicateId(String),
}

/// AI classification of a zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    Healthy,
    Restored,
    Concern,
    Degraded,
    Deforestation,
    #[default]
    Unknown,
}

impl Classification {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Healthy => "healthy",
            Self::Restored => "restored",
            Self::Concern => "concern",
            Self::Degraded => "degraded",
            Self::Deforestation => "deforestation",
            Self::Unknown => "unknown",
        }
    }

    /// Parse a classification label; unrecognised labels map to `Unknown`.
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "healthy" => Self::Healthy,
            "restored" => Self::Restored,
            "concern" => Self::Concern,
            "degraded" => Self::Degraded,
            "deforestation" => Self::Deforestation,
            _ => Self::Unknown,
        }
    }

    /// Counted as a healthy area in the analysis summary.
    #[must_use]
    pub fn is_healthy(self) -> bool {
        matches!(self, Self::Healthy | Self::Restored)
    }

    /// Counted as a concern area in the analysis summary.
    #[must_use]
    pub fn is_concern(self) -> bool {
        matches!(self, Self::Concern | Self::Degraded)
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An sRGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    /// Build from a packed `0xRRGGBB` value.
    #[must_use]
    pub const fn from_hex(hex: u32) -> Self {
        Self {
            r: ((hex >> 16) & 0xff) as u8,
            g: ((hex >> 8) & 0xff) as u8,
            b: (hex & 0xff) as u8,
        }
    }

    /// Parse a `#rrggbb` string.
    #[must_use]
    pub fn parse(token: &str) -> Option<Self> {
        let digits = token.strip_prefix('#')?;
        if digits.len() != 6 {
            return None;
        }
        u32::from_str_radix(digits, 16).ok().map(Self::from_hex)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Fixed classification color table.
#[must_use]
pub fn color_for(classification: Classification) -> Rgb {
    match classification {
        Classification::Healthy => Rgb::from_hex(0x22_c5_5e),
        Classification::Restored => Rgb::from_hex(0x3b_82_f6),
        Classification::Concern => Rgb::from_hex(0xef_44_44),
        Classification::Degraded => Rgb::from_hex(0xf9_73_16),
        Classification::Deforestation => Rgb::from_hex(0xdc_26_26),
        Classification::Unknown => Rgb::from_hex(0x6b_72_80),
    }
}

/// Fill opacity of a zone: the overlay opacity when change was detected,
/// otherwise the fixed dimmed value.
#[must_use]
pub fn fill_opacity_for(zone: &Zone, overlay_opacity: f64) -> f64 {
    if zone.change_detected {
        overlay_opacity
    } else {
        STABLE_FILL_OPACITY
    }
}

/// A classified polygonal region.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Zone {
    pub id: String,
    pub classification: Classification,
    /// Open ring of `(lat, lng)` vertices; the closing edge is implicit.
    pub polygon: Vec<GeoPoint>,
    /// Model confidence in `[0, 1]`.
    pub confidence: f64,
    /// Carbon density in tCO₂e/ha.
    pub carbon_density: f64,
    pub change_detected: bool,
    pub description: String,
    /// Layer that gates this zone's visibility.
    pub layer: String,
}

impl Zone {
    #[must_use]
    pub fn new(id: &str, classification: Classification, polygon: Vec<GeoPoint>) -> Self {
        Self {
            id: id.to_string(),
            classification,
            polygon,
            confidence: 0.0,
            carbon_density: 0.0,
            change_detected: false,
            description: String::new(),
            layer: AI_ANALYSIS.to_string(),
        }
    }

    #[must_use]
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }

    #[must_use]
    pub fn with_carbon_density(mut self, carbon_density: f64) -> Self {
        self.carbon_density = carbon_density;
        self
    }

    #[must_use]
    pub fn with_change_detected(mut self, change_detected: bool) -> Self {
        self.change_detected = change_detected;
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    #[must_use]
    pub fn on_layer(mut self, layer: &str) -> Self {
        self.layer = layer.to_string();
        self
    }

    fn validate(&mut self) -> Result<(), ZoneError> {
        if self.polygon.iter().any(|p| !p.is_finite()) {
            return Err(ZoneError::NonFiniteCoordinate {
                id: self.id.clone(),
            });
        }
        open_ring(&mut self.polygon);
        if self.polygon.len() < 3 {
            return Err(ZoneError::TooFewVertices {
                id: self.id.clone(),
                count: self.polygon.len(),
            });
        }
        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(ZoneError::ConfidenceOutOfRange {
                id: self.id.clone(),
                value: self.confidence,
            });
        }
        if self.carbon_density.is_nan() || self.carbon_density < 0.0 {
            return Err(ZoneError::NegativeCarbonDensity {
                id: self.id.clone(),
                value: self.carbon_density,
            });
        }
        Ok(())
    }
}

/// Resolved drawing parameters for one zone.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ZoneStyle {
    pub visible: bool,
    pub fill_color: Rgb,
    pub fill_opacity: f64,
    pub line_color: Rgb,
    pub line_width: f64,
    pub dash: [f64; 2],
}

impl ZoneStyle {
    /// Style of `zone` given the overlay state.
    #[must_use]
    pub fn resolve(zone: &Zone, visible: bool, overlay_opacity: f64) -> Self {
        let color = color_for(zone.classification);
        Self {
            visible,
            fill_color: color,
            fill_opacity: fill_opacity_for(zone, overlay_opacity),
            line_color: color,
            line_width: ZONE_LINE_WIDTH,
            dash: if zone.change_detected {
                CHANGED_DASH
            } else {
                STABLE_DASH
            },
        }
    }
}

/// Zone storage keyed by id, iterated in registration order.
#[derive(Debug, Clone)]
pub struct ZoneStore {
    zones: Vec<Zone>,
    index: HashMap<String, usize>,
    overlay_visible: bool,
    dirty: BTreeSet<usize>,
}

impl Default for ZoneStore {
    fn default() -> Self {
        Self {
            zones: Vec::new(),
            index: HashMap::new(),
            overlay_visible: true,
            dirty: BTreeSet::new(),
        }
    }
}

impl ZoneStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and store a zone.
    pub fn register_zone(&mut self, mut zone: Zone) -> Result<(), ZoneError> {
        zone.validate()?;
        if self.index.contains_key(&zone.id) {
            return Err(ZoneError::DuplicateId(zone.id));
        }
        let position = self.zones.len();
        self.index.insert(zone.id.clone(), position);
        self.zones.push(zone);
        self.dirty.insert(position);
        Ok(())
    }

    /// Register every zone, logging and skipping the invalid ones.
    ///
    /// Returns the number of zones stored.
    pub fn register_all(&mut self, zones: impl IntoIterator<Item = Zone>) -> usize {
        let mut stored = 0;
        let mut rejected = 0;
        for zone in zones {
            match self.register_zone(zone) {
                Ok(()) => stored += 1,
                Err(e) => {
                    rejected += 1;
                    warn!("Rejected zone: {e}");
                }
            }
        }
        if rejected > 0 {
            info!("Registered {stored} zones, rejected {rejected}");
        }
        stored
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Zone> {
        self.index.get(id).and_then(|&i| self.zones.get(i))
    }

    /// Zone at a registration position.
    #[must_use]
    pub fn by_position(&self, position: usize) -> Option<&Zone> {
        self.zones.get(position)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Zone> {
        self.zones.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.zones.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    #[must_use]
    pub fn overlay_visible(&self) -> bool {
        self.overlay_visible
    }

    /// Show or hide every zone in one step.
    ///
    /// All zones are marked dirty together so the next render pass carries
    /// the whole set in a single diff. Returns `true` if the flag changed.
    pub fn set_overlay_visible(&mut self, visible: bool) -> bool {
        if self.overlay_visible == visible {
            return false;
        }
        self.overlay_visible = visible;
        self.mark_all_dirty();
        true
    }

    /// Mark every zone gated by `layer` dirty.
    pub fn mark_layer_dirty(&mut self, layer: &str) {
        for (i, zone) in self.zones.iter().enumerate() {
            if zone.layer == layer {
                self.dirty.insert(i);
            }
        }
    }

    pub fn mark_all_dirty(&mut self) {
        self.dirty = (0..self.zones.len()).collect();
    }

    /// Drain dirty zone positions in registration order.
    pub fn take_dirty(&mut self) -> Vec<usize> {
        std::mem::take(&mut self.dirty).into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> Vec<GeoPoint> {
        vec![
            GeoPoint::new(-10.89, -69.54),
            GeoPoint::new(-10.895, -69.52),
            GeoPoint::new(-10.905, -69.525),
        ]
    }

    #[test]
    fn test_color_table() {
        assert_eq!(color_for(Classification::Healthy).to_string(), "#22c55e");
        assert_eq!(color_for(Classification::Restored).to_string(), "#3b82f6");
        assert_eq!(color_for(Classification::Concern).to_string(), "#ef4444");
        assert_eq!(color_for(Classification::Degraded).to_string(), "#f97316");
        assert_eq!(
            color_for(Classification::Deforestation).to_string(),
            "#dc2626"
        );
        assert_eq!(color_for(Classification::Unknown).to_string(), "#6b7280");
    }

    #[test]
    fn test_rgb_parse() {
        assert_eq!(Rgb::parse("#00ff88"), Some(Rgb { r: 0, g: 255, b: 136 }));
        assert_eq!(Rgb::parse("00ff88"), None);
        assert_eq!(Rgb::parse("#zzzzzz"), None);
    }

    #[test]
    fn test_stable_zones_are_dimmed() {
        let changed = Zone::new("a", Classification::Healthy, triangle()).with_change_detected(true);
        let stable = Zone::new("b", Classification::Healthy, triangle());
        assert_eq!(fill_opacity_for(&changed, 0.9), 0.9);
        assert_eq!(fill_opacity_for(&stable, 0.9), STABLE_FILL_OPACITY);
        assert_eq!(fill_opacity_for(&stable, 0.1), STABLE_FILL_OPACITY);
    }

    #[test]
    fn test_style_dash_follows_change_flag() {
        let changed = Zone::new("a", Classification::Concern, triangle()).with_change_detected(true);
        let stable = Zone::new("b", Classification::Concern, triangle());
        assert_eq!(ZoneStyle::resolve(&changed, true, 0.7).dash, CHANGED_DASH);
        assert_eq!(ZoneStyle::resolve(&stable, true, 0.7).dash, STABLE_DASH);
    }

    #[test]
    fn test_register_valid_zone() {
        let mut store = ZoneStore::new();
        let zone = Zone::new("area-1", Classification::Healthy, triangle()).with_confidence(0.94);
        store.register_zone(zone).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("area-1").unwrap().confidence, 0.94);
    }

    #[test]
    fn test_closing_vertex_is_stripped() {
        let mut ring = triangle();
        ring.push(ring[0]);
        let mut store = ZoneStore::new();
        store
            .register_zone(Zone::new("closed", Classification::Healthy, ring))
            .unwrap();
        assert_eq!(store.get("closed").unwrap().polygon.len(), 3);
    }

    #[test]
    fn test_rejects_too_few_vertices() {
        let mut store = ZoneStore::new();
        let mut ring = triangle();
        ring.truncate(2);
        let err = store
            .register_zone(Zone::new("thin", Classification::Healthy, ring))
            .unwrap_err();
        assert!(matches!(err, ZoneError::TooFewVertices { count: 2, .. }));
        assert!(store.is_empty());
    }

    #[test]
    fn test_closed_two_point_ring_is_rejected() {
        let mut store = ZoneStore::new();
        let ring = vec![
            GeoPoint::new(0.0, 0.0),
            GeoPoint::new(1.0, 1.0),
            GeoPoint::new(0.0, 0.0),
        ];
        assert!(store
            .register_zone(Zone::new("loop", Classification::Unknown, ring))
            .is_err());
    }

    #[test]
    fn test_rejects_out_of_range_values() {
        let mut store = ZoneStore::new();
        let bad_confidence =
            Zone::new("c", Classification::Healthy, triangle()).with_confidence(1.2);
        let bad_density =
            Zone::new("d", Classification::Healthy, triangle()).with_carbon_density(-1.0);
        assert!(matches!(
            store.register_zone(bad_confidence),
            Err(ZoneError::ConfidenceOutOfRange { .. })
        ));
        assert!(matches!(
            store.register_zone(bad_density),
            Err(ZoneError::NegativeCarbonDensity { .. })
        ));
    }

    #[test]
    fn test_register_all_skips_invalid_zones() {
        let mut store = ZoneStore::new();
        let stored = store.register_all(vec![
            Zone::new("ok-1", Classification::Healthy, triangle()),
            Zone::new("bad", Classification::Healthy, triangle()).with_confidence(2.0),
            Zone::new("ok-2", Classification::Restored, triangle()),
            Zone::new("ok-1", Classification::Concern, triangle()),
        ]);
        assert_eq!(stored, 2);
        let ids: Vec<&str> = store.iter().map(|z| z.id.as_str()).collect();
        assert_eq!(ids, vec!["ok-1", "ok-2"]);
    }

    #[test]
    fn test_overlay_toggle_marks_all_zones_together() {
        let mut store = ZoneStore::new();
        store.register_all(vec![
            Zone::new("a", Classification::Healthy, triangle()),
            Zone::new("b", Classification::Concern, triangle()),
        ]);
        store.take_dirty();

        assert!(store.set_overlay_visible(false));
        assert_eq!(store.take_dirty(), vec![0, 1]);
        assert!(!store.set_overlay_visible(false));
        assert!(store.take_dirty().is_empty());
    }

    #[test]
    fn test_classification_labels() {
        assert_eq!(Classification::from_label("Healthy"), Classification::Healthy);
        assert_eq!(Classification::from_label("mystery"), Classification::Unknown);
        assert!(Classification::Restored.is_healthy());
        assert!(Classification::Degraded.is_concern());
        assert!(!Classification::Deforestation.is_concern());
    }
}
