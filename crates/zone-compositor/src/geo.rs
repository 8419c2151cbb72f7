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

//! Geographic primitives shared by every layer of the compositor.

use serde::{Deserialize, Serialize};

/// Maximum latitude reachable by panning (Web Mercator limit, rounded).
pub const MAX_PAN_LATITUDE: f64 = 85.0;

/// A WGS84 coordinate in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Latitude in degrees (north positive).
    pub lat: f64,
    /// Longitude in degrees (east positive).
    pub lng: f64,
}

impl GeoPoint {
    #[must_use]
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Both components are finite numbers.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lng.is_finite()
    }

    /// Linear interpolation towards `other` at `t` in `[0, 1]`.
    #[must_use]
    pub fn lerp(self, other: Self, t: f64) -> Self {
        Self {
            lat: lerp(self.lat, other.lat, t),
            lng: lerp(self.lng, other.lng, t),
        }
    }
}

impl From<(f64, f64)> for GeoPoint {
    fn from((lat, lng): (f64, f64)) -> Self {
        Self::new(lat, lng)
    }
}

#[must_use]
pub fn lerp(from: f64, to: f64, t: f64) -> f64 {
    from + (to - from) * t
}

/// Wrap a bearing in degrees into `(-180, 180]`.
#[must_use]
pub fn normalize_bearing(degrees: f64) -> f64 {
    let wrapped = degrees % 360.0;
    if wrapped > 180.0 {
        wrapped - 360.0
    } else if wrapped <= -180.0 {
        wrapped + 360.0
    } else {
        wrapped
    }
}

/// Interpolate between two bearings along the shorter arc, normalised.
#[must_use]
pub fn lerp_bearing(from: f64, to: f64, t: f64) -> f64 {
    let delta = normalize_bearing(to - from);
    normalize_bearing(from + delta * t)
}

/// Drop an explicit closing vertex (last == first) so rings are stored open.
pub fn open_ring(vertices: &mut Vec<GeoPoint>) {
    if vertices.len() >= 2 && vertices.first() == vertices.last() {
        vertices.pop();
    }
}

/// Even-odd ray casting test of `point` against an implicitly closed ring.
///
/// Longitude is treated as the x axis and latitude as the y axis. The
/// crossing count does not depend on winding, so clockwise and
/// counter-clockwise rings give identical answers.
#[must_use]
pub fn polygon_contains(ring: &[GeoPoint], point: GeoPoint) -> bool {
    if ring.len() < 3 {
        return false;
    }

    let mut inside = false;
    let mut j = ring.len() - 1;
    for i in 0..ring.len() {
        // Each edge is evaluated from its lower endpoint so a reversed ring
        // computes the exact same crossing for points on or near the edge.
        let (low, high) = edge_endpoints(ring[i], ring[j]);
        if (low.lat > point.lat) != (high.lat > point.lat) {
            let intersect_x =
                (high.lng - low.lng) * (point.lat - low.lat) / (high.lat - low.lat) + low.lng;
            if point.lng < intersect_x {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Order an edge's endpoints by latitude, then longitude.
fn edge_endpoints(a: GeoPoint, b: GeoPoint) -> (GeoPoint, GeoPoint) {
    if (a.lat, a.lng) <= (b.lat, b.lng) {
        (a, b)
    } else {
        (b, a)
    }
}
