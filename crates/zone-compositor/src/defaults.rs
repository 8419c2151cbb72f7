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

//! Built-in project data used when no inputs are supplied.

use crate::boundary::{BoundaryPolygon, ProjectBoundary};
use crate::geo::GeoPoint;
use crate::layers::{
    Layer, AI_ANALYSIS, CARBON_DENSITY, ECOSYSTEM, OSM, PROJECT_BOUNDARY, SATELLITE,
};
use crate::playback::TimeSeriesFrame;
use crate::zones::{Classification, Zone};

pub const DEFAULT_PROJECT_ID: &str = "BCR-001";
pub const DEFAULT_CENTER: GeoPoint = GeoPoint::new(-10.9, -69.53);
pub const BASEMAP_GROUP: &str = "basemap";

#[must_use]
pub fn default_layers() -> Vec<Layer> {
    vec![
        Layer::base(SATELLITE, "Sentinel-2 Satellite", BASEMAP_GROUP, "blue-600").enabled(true),
        Layer::base(OSM, "OpenStreetMap", BASEMAP_GROUP, "gray-600"),
        Layer::overlay(AI_ANALYSIS, "AI Change Detection", "analysis", "red-600")
            .enabled(true)
            .with_opacity(0.7),
        Layer::overlay(ECOSYSTEM, "Ecosystem Classification", "ecosystem", "green-600")
            .with_opacity(0.8),
        Layer::overlay(CARBON_DENSITY, "Carbon Density Map", "carbon", "purple-600")
            .with_opacity(0.6),
        Layer::overlay(PROJECT_BOUNDARY, "Project Boundary", "boundary", "#00ff88")
            .enabled(true)
            .with_opacity(0.15),
    ]
}

fn ring(points: &[(f64, f64)]) -> Vec<GeoPoint> {
    points.iter().copied().map(GeoPoint::from).collect()
}

#[must_use]
pub fn default_zones() -> Vec<Zone> {
    vec![
        Zone::new(
            "area-1",
            Classification::Healthy,
            ring(&[(-10.89, -69.54), (-10.895, -69.52), (-10.905, -69.525)]),
        )
        .with_confidence(0.94)
        .with_carbon_density(85.0)
        .with_change_detected(true)
        .with_description("Thriving mangrove restoration - 92% canopy coverage increase since 2020"),
        Zone::new(
            "area-2",
            Classification::Concern,
            ring(&[(-10.91, -69.56), (-10.912, -69.558), (-10.915, -69.561)]),
        )
        .with_confidence(0.87)
        .with_carbon_density(45.0)
        .with_change_detected(true)
        .with_description("Potential illegal logging detected - requires field verification"),
        Zone::new(
            "area-3",
            Classification::Restored,
            ring(&[(-10.885, -69.53), (-10.89, -69.528), (-10.888, -69.535)]),
        )
        .with_confidence(0.91)
        .with_carbon_density(68.0)
        .with_change_detected(true)
        .with_description("Successful seagrass restoration - 78% coverage improvement"),
    ]
}

#[must_use]
pub fn default_boundary() -> ProjectBoundary {
    ProjectBoundary::new(vec![BoundaryPolygon::new(
        "Blue Carbon Project Area",
        ring(&[
            (-10.88, -69.55),
            (-10.90, -69.51),
            (-10.92, -69.53),
            (-10.91, -69.56),
        ]),
    )])
}

#[must_use]
pub fn default_frames() -> Vec<TimeSeriesFrame> {
    [
        (2020, 1, "Project Baseline"),
        (2021, 6, "Initial Planting Phase"),
        (2022, 12, "Growth Assessment"),
        (2024, 6, "Maturation Phase"),
        (2025, 9, "Current Status"),
    ]
    .into_iter()
    .filter_map(|(year, month, description)| {
        TimeSeriesFrame::from_year_month(year, month, description)
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zones::ZoneStore;

    #[test]
    fn test_default_zones_all_register() {
        let mut store = ZoneStore::new();
        assert_eq!(store.register_all(default_zones()), 3);
    }

    #[test]
    fn test_default_frames() {
        let labels: Vec<String> = default_frames().iter().map(TimeSeriesFrame::label).collect();
        assert_eq!(
            labels,
            vec!["2020-01", "2021-06", "2022-12", "2024-06", "2025-09"]
        );
    }

    #[test]
    fn test_default_boundary_is_one_polygon() {
        let boundary = default_boundary();
        assert_eq!(boundary.polygons().len(), 1);
        assert_eq!(boundary.polygons()[0].ring.len(), 4);
    }

    #[test]
    fn test_default_layers_have_one_base_enabled() {
        let enabled_bases = default_layers()
            .iter()
            .filter(|l| l.is_base() && l.enabled)
            .count();
        assert_eq!(enabled_bases, 1);
    }
}
