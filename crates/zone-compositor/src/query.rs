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

//! Point queries against registered zones.

use log::debug;
use serde::Serialize;

use crate::geo::{polygon_contains, GeoPoint};
use crate::layers::LayerRegistry;
use crate::zones::{Classification, Zone, ZoneStore};

/// Zone details handed to the UI when a zone is clicked.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ZonePayload {
    pub zone_id: String,
    pub classification: Classification,
    pub confidence: f64,
    pub description: String,
    pub carbon_density: f64,
    pub change_detected: bool,
}

impl ZonePayload {
    #[must_use]
    pub fn from_zone(zone: &Zone) -> Self {
        Self {
            zone_id: zone.id.clone(),
            classification: zone.classification,
            confidence: zone.confidence,
            description: zone.description.clone(),
            carbon_density: zone.carbon_density,
            change_detected: zone.change_detected,
        }
    }

    /// e.g. `HEALTHY Zone`
    #[must_use]
    pub fn title(&self) -> String {
        format!("{} Zone", self.classification.as_str().to_uppercase())
    }

    /// e.g. `94% Confidence`
    #[must_use]
    pub fn confidence_label(&self) -> String {
        format!("{:.0}% Confidence", (self.confidence * 100.0).round())
    }

    /// e.g. `85 tCO₂e/ha`
    #[must_use]
    pub fn carbon_label(&self) -> String {
        format!("{} tCO₂e/ha", self.carbon_density)
    }

    #[must_use]
    pub fn change_label(&self) -> &'static str {
        if self.change_detected {
            "Detected"
        } else {
            "Stable"
        }
    }
}

/// A zone found under a query point.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Hit {
    pub zone: ZonePayload,
    pub query_point: GeoPoint,
}

/// Outcome of a point query. `None` means nothing was hit, which callers
/// treat as "do nothing".
pub type HitResult = Option<Hit>;

/// Options for [`FeatureQueryEngine::query`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryOptions {
    /// Only consider zones that are currently visible.
    pub enabled_zones_only: bool,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            enabled_zones_only: true,
        }
    }
}

/// Point-in-polygon hit testing over a [`ZoneStore`].
///
/// Zones are tested in registration order and the first containing zone
/// wins, so overlaps resolve to the earliest-registered zone.
#[derive(Debug, Clone, Copy)]
pub struct FeatureQueryEngine<'a> {
    zones: &'a ZoneStore,
    layers: &'a LayerRegistry,
}

impl<'a> FeatureQueryEngine<'a> {
    #[must_use]
    pub fn new(zones: &'a ZoneStore, layers: &'a LayerRegistry) -> Self {
        Self { zones, layers }
    }

    /// Whether `zone` is currently drawn.
    #[must_use]
    pub fn is_visible(&self, zone: &Zone) -> bool {
        self.zones.overlay_visible() && self.layers.is_enabled(&zone.layer)
    }

    #[must_use]
    pub fn query(&self, point: GeoPoint, options: QueryOptions) -> HitResult {
        if !point.is_finite() {
            return None;
        }

        let hit = self
            .zones
            .iter()
            .filter(|zone| !options.enabled_zones_only || self.is_visible(zone))
            .find(|zone| polygon_contains(&zone.polygon, point))
            .map(|zone| Hit {
                zone: ZonePayload::from_zone(zone),
                query_point: point,
            });

        match &hit {
            Some(h) => debug!(
                "Query ({:.5}, {:.5}) hit zone {}",
                point.lat, point.lng, h.zone.zone_id
            ),
            None => debug!("Query ({:.5}, {:.5}) hit nothing", point.lat, point.lng),
        }
        hit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults::default_layers;
    use crate::layers::AI_ANALYSIS;

    fn area_one() -> Zone {
        Zone::new(
            "area-1",
            Classification::Healthy,
            vec![
                GeoPoint::new(-10.89, -69.54),
                GeoPoint::new(-10.895, -69.52),
                GeoPoint::new(-10.905, -69.525),
            ],
        )
        .with_confidence(0.94)
        .with_carbon_density(85.0)
        .with_change_detected(true)
    }

    fn fixture() -> (ZoneStore, LayerRegistry) {
        let mut zones = ZoneStore::new();
        zones.register_zone(area_one()).unwrap();
        (zones, LayerRegistry::new(default_layers()))
    }

    #[test]
    fn test_query_inside_returns_zone() {
        let (zones, layers) = fixture();
        let engine = FeatureQueryEngine::new(&zones, &layers);
        let hit = engine
            .query(GeoPoint::new(-10.895, -69.525), QueryOptions::default())
            .expect("point lies inside area-1");
        assert_eq!(hit.zone.zone_id, "area-1");
        assert_eq!(hit.zone.classification, Classification::Healthy);
        assert_eq!(hit.query_point, GeoPoint::new(-10.895, -69.525));
    }

    #[test]
    fn test_query_outside_is_empty() {
        let (zones, layers) = fixture();
        let engine = FeatureQueryEngine::new(&zones, &layers);
        assert!(engine
            .query(GeoPoint::new(0.0, 0.0), QueryOptions::default())
            .is_none());
    }

    #[test]
    fn test_reversed_winding_gives_same_hit() {
        let mut reversed = area_one();
        reversed.id = "area-1-ccw".to_string();
        reversed.polygon.reverse();

        let layers = LayerRegistry::new(default_layers());
        let mut forward_store = ZoneStore::new();
        forward_store.register_zone(area_one()).unwrap();
        let mut reversed_store = ZoneStore::new();
        reversed_store.register_zone(reversed).unwrap();

        let forward = FeatureQueryEngine::new(&forward_store, &layers);
        let backward = FeatureQueryEngine::new(&reversed_store, &layers);
        for point in [
            GeoPoint::new(-10.895, -69.525),
            GeoPoint::new(-10.9, -69.53),
            GeoPoint::new(-10.891, -69.538),
            GeoPoint::new(0.0, 0.0),
        ] {
            assert_eq!(
                forward.query(point, QueryOptions::default()).is_some(),
                backward.query(point, QueryOptions::default()).is_some(),
            );
        }
    }

    #[test]
    fn test_overlap_resolves_to_first_registered() {
        let mut zones = ZoneStore::new();
        let mut second = area_one();
        second.id = "area-1-copy".to_string();
        second.classification = Classification::Concern;
        zones.register_zone(area_one()).unwrap();
        zones.register_zone(second).unwrap();
        let layers = LayerRegistry::new(default_layers());

        let hit = FeatureQueryEngine::new(&zones, &layers)
            .query(GeoPoint::new(-10.895, -69.525), QueryOptions::default())
            .unwrap();
        assert_eq!(hit.zone.zone_id, "area-1");
    }

    #[test]
    fn test_hidden_zones_only_found_when_requested() {
        let (mut zones, mut layers) = fixture();
        let point = GeoPoint::new(-10.895, -69.525);

        zones.set_overlay_visible(false);
        let engine = FeatureQueryEngine::new(&zones, &layers);
        assert!(engine.query(point, QueryOptions::default()).is_none());
        let all = QueryOptions {
            enabled_zones_only: false,
        };
        assert!(engine.query(point, all).is_some());

        zones.set_overlay_visible(true);
        layers.set_enabled(AI_ANALYSIS, false).unwrap();
        let engine = FeatureQueryEngine::new(&zones, &layers);
        assert!(engine.query(point, QueryOptions::default()).is_none());
    }

    #[test]
    fn test_payload_labels() {
        let payload = ZonePayload::from_zone(&area_one());
        assert_eq!(payload.title(), "HEALTHY Zone");
        assert_eq!(payload.confidence_label(), "94% Confidence");
        assert_eq!(payload.carbon_label(), "85 tCO₂e/ha");
        assert_eq!(payload.change_label(), "Detected");
    }

    #[test]
    fn test_payload_serializes_camel_case() {
        let payload = ZonePayload::from_zone(&area_one());
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["zoneId"], "area-1");
        assert_eq!(json["classification"], "healthy");
        assert_eq!(json["changeDetected"], true);
    }
}
