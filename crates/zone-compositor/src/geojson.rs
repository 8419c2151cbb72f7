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

//! Boundary and analysis inputs as GeoJSON feature collections.
//!
//! Positions are `[lng, lat]` per RFC 7946. Only the outer ring of each
//! polygon is used. Zones parsed here are not validated yet; invalid ones
//! are dropped when they are registered.

use log::{debug, warn};
use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::boundary::{BoundaryPolygon, ProjectBoundary};
use crate::geo::GeoPoint;
use crate::zones::{Classification, Zone};

const DEFAULT_BOUNDARY_NAME: &str = "Project Boundary";

#[derive(Debug, Error)]
pub enum GeoJsonError {
    #[error("malformed GeoJSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("expected a FeatureCollection, found '{0}'")]
    NotFeatureCollection(String),

    #[error("feature {feature}: unsupported geometry, only Polygon and MultiPolygon are accepted")]
    UnsupportedGeometry { feature: usize },

    #[error("feature {feature}: position needs at least two coordinates")]
    InvalidPosition { feature: usize },
}

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    geometry: Option<Geometry>,
    #[serde(default)]
    properties: Option<Map<String, Value>>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum Geometry {
    Polygon { coordinates: Vec<Vec<Vec<f64>>> },
    MultiPolygon { coordinates: Vec<Vec<Vec<Vec<f64>>>> },
    #[serde(other)]
    Other,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct AnalysisProperties {
    id: Option<Value>,
    #[serde(rename = "type")]
    classification: Option<String>,
    confidence: Option<f64>,
    carbon_density: Option<f64>,
    change_detected: Option<bool>,
    description: Option<String>,
}

fn parse_collection(json: &str) -> Result<FeatureCollection, GeoJsonError> {
    let collection: FeatureCollection = serde_json::from_str(json)?;
    if collection.kind != "FeatureCollection" {
        return Err(GeoJsonError::NotFeatureCollection(collection.kind));
    }
    Ok(collection)
}

/// Outer rings of a feature's geometry as `(lat, lng)` vertices.
fn outer_rings(feature: usize, geometry: &Geometry) -> Result<Vec<Vec<GeoPoint>>, GeoJsonError> {
    let polygons: Vec<&Vec<Vec<Vec<f64>>>> = match geometry {
        Geometry::Polygon { coordinates } => vec![coordinates],
        Geometry::MultiPolygon { coordinates } => coordinates.iter().collect(),
        Geometry::Other => return Err(GeoJsonError::UnsupportedGeometry { feature }),
    };

    polygons
        .into_iter()
        .filter_map(|rings| rings.first())
        .map(|ring| {
            ring.iter()
                .map(|position| match position.as_slice() {
                    [lng, lat, ..] => Ok(GeoPoint::new(*lat, *lng)),
                    _ => Err(GeoJsonError::InvalidPosition { feature }),
                })
                .collect::<Result<Vec<_>, _>>()
        })
        .collect()
}

fn id_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Parse an analysis layer into unvalidated zones.
///
/// A MultiPolygon feature yields one zone per polygon, suffixed `-2`, `-3`
/// and so on after the first.
pub fn parse_analysis(json: &str) -> Result<Vec<Zone>, GeoJsonError> {
    let collection = parse_collection(json)?;
    let mut zones = Vec::new();

    for (index, feature) in collection.features.into_iter().enumerate() {
        let Some(geometry) = feature.geometry else {
            debug!("Skipping analysis feature {index} without geometry");
            continue;
        };
        let props: AnalysisProperties =
            match serde_json::from_value(Value::Object(feature.properties.unwrap_or_default())) {
                Ok(props) => props,
                Err(e) => {
                    warn!("Skipping analysis feature {index}: invalid properties: {e}");
                    continue;
                }
            };
        let base_id = id_text(props.id.as_ref()).unwrap_or_else(|| format!("zone-{}", index + 1));
        let classification = props
            .classification
            .as_deref()
            .map_or(Classification::Unknown, Classification::from_label);

        for (n, ring) in outer_rings(index, &geometry)?.into_iter().enumerate() {
            let id = if n == 0 {
                base_id.clone()
            } else {
                format!("{base_id}-{}", n + 1)
            };
            zones.push(
                Zone::new(&id, classification, ring)
                    .with_confidence(props.confidence.unwrap_or(0.0))
                    .with_carbon_density(props.carbon_density.unwrap_or(0.0))
                    .with_change_detected(props.change_detected.unwrap_or(false))
                    .with_description(props.description.as_deref().unwrap_or_default()),
            );
        }
    }

    debug!("Parsed {} analysis zones", zones.len());
    Ok(zones)
}

/// Parse a project boundary. Each polygon keeps its feature's properties.
pub fn parse_boundary(json: &str) -> Result<ProjectBoundary, GeoJsonError> {
    let collection = parse_collection(json)?;
    let mut polygons = Vec::new();

    for (index, feature) in collection.features.into_iter().enumerate() {
        let Some(geometry) = feature.geometry else {
            continue;
        };
        let properties = feature.properties.unwrap_or_default();
        let name = properties
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_BOUNDARY_NAME)
            .to_string();

        for ring in outer_rings(index, &geometry)? {
            polygons.push(BoundaryPolygon {
                name: name.clone(),
                ring,
                properties: properties.clone(),
            });
        }
    }

    Ok(ProjectBoundary::new(polygons))
}
