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

//! Project boundary outline.

use log::warn;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::geo::{open_ring, GeoPoint};
use crate::layers::Layer;
use crate::zones::Rgb;

pub const BOUNDARY_COLOR: Rgb = Rgb::from_hex(0x00_ff_88);
pub const BOUNDARY_LINE_WIDTH: f64 = 4.0;
pub const BOUNDARY_DASH: [f64; 2] = [2.0, 2.0];

/// One polygon of the project boundary with its source properties.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoundaryPolygon {
    pub name: String,
    /// Open ring of vertices.
    pub ring: Vec<GeoPoint>,
    pub properties: Map<String, Value>,
}

impl BoundaryPolygon {
    #[must_use]
    pub fn new(name: &str, ring: Vec<GeoPoint>) -> Self {
        let mut properties = Map::new();
        properties.insert("name".to_string(), Value::String(name.to_string()));
        Self {
            name: name.to_string(),
            ring,
            properties,
        }
    }
}

/// The polygons outlining a project area. Drawn only, never hit-tested.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProjectBoundary {
    polygons: Vec<BoundaryPolygon>,
}

impl ProjectBoundary {
    /// Build from polygons, dropping any ring that is not a polygon.
    #[must_use]
    pub fn new(polygons: Vec<BoundaryPolygon>) -> Self {
        let polygons = polygons
            .into_iter()
            .filter_map(|mut polygon| {
                open_ring(&mut polygon.ring);
                if polygon.ring.len() < 3 || polygon.ring.iter().any(|p| !p.is_finite()) {
                    warn!("Dropping boundary polygon '{}': invalid ring", polygon.name);
                    None
                } else {
                    Some(polygon)
                }
            })
            .collect();
        Self { polygons }
    }

    #[must_use]
    pub fn polygons(&self) -> &[BoundaryPolygon] {
        &self.polygons
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.polygons.is_empty()
    }
}

/// Drawing parameters for the boundary, derived from its layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundaryStyle {
    pub visible: bool,
    pub fill_color: Rgb,
    pub fill_opacity: f64,
    pub line_color: Rgb,
    pub line_width: f64,
    pub dash: [f64; 2],
}

impl BoundaryStyle {
    /// Style for the boundary layer. A missing layer hides the boundary.
    #[must_use]
    pub fn from_layer(layer: Option<&Layer>) -> Self {
        Self {
            visible: layer.is_some_and(|l| l.enabled),
            fill_color: BOUNDARY_COLOR,
            fill_opacity: layer.map_or(0.0, |l| l.opacity),
            line_color: BOUNDARY_COLOR,
            line_width: BOUNDARY_LINE_WIDTH,
            dash: BOUNDARY_DASH,
        }
    }
}
