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

//! Web Mercator projection between geographic and screen coordinates.

use egui::{Pos2, Vec2};
use zone_compositor::{GeoPoint, ViewState};

/// Pixel size of one map tile
pub const TILE_SIZE: f64 = 256.0;

pub struct WebMercator;

impl WebMercator {
    /// Convert latitude to Web Mercator Y in tile units at `zoom`
    pub fn lat_to_y(lat: f64, zoom: f64) -> f64 {
        let lat_rad = lat.to_radians();
        let n = zoom.exp2();
        let y = (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / std::f64::consts::PI) / 2.0;
        y * n
    }

    /// Convert longitude to Web Mercator X in tile units at `zoom`
    pub fn lon_to_x(lon: f64, zoom: f64) -> f64 {
        let n = zoom.exp2();
        ((lon + 180.0) / 360.0) * n
    }

    /// Convert tile units back to latitude
    pub fn y_to_lat(y: f64, zoom: f64) -> f64 {
        let n = zoom.exp2();
        let lat_rad = (std::f64::consts::PI * (1.0 - 2.0 * y / n)).sinh().atan();
        lat_rad.to_degrees()
    }

    /// Convert tile units back to longitude
    pub fn x_to_lon(x: f64, zoom: f64) -> f64 {
        let n = zoom.exp2();
        x / n * 360.0 - 180.0
    }
}

/// Screen mapping for one frame.
///
/// The map is rotated by the bearing around the screen center, and pitch is
/// shown as vertical foreshortening by `cos(pitch)`.
#[derive(Debug, Clone, Copy)]
pub struct Projection {
    origin: Pos2,
    center_x: f64,
    center_y: f64,
    zoom: f64,
    bearing_rad: f64,
    tilt_scale: f64,
}

impl Projection {
    pub fn new(view: &ViewState, origin: Pos2) -> Self {
        Self {
            origin,
            center_x: WebMercator::lon_to_x(view.center.lng, view.zoom),
            center_y: WebMercator::lat_to_y(view.center.lat, view.zoom),
            zoom: view.zoom,
            bearing_rad: view.bearing.to_radians(),
            tilt_scale: view.pitch.to_radians().cos().max(0.1),
        }
    }

    pub fn to_screen(&self, point: GeoPoint) -> Pos2 {
        let dx = (WebMercator::lon_to_x(point.lng, self.zoom) - self.center_x) * TILE_SIZE;
        let dy = (WebMercator::lat_to_y(point.lat, self.zoom) - self.center_y) * TILE_SIZE;

        let (sin, cos) = (-self.bearing_rad).sin_cos();
        let rx = dx * cos - dy * sin;
        let ry = (dx * sin + dy * cos) * self.tilt_scale;

        #[allow(clippy::cast_possible_truncation, reason = "screen coordinates fit in f32")]
        let offset = Vec2::new(rx as f32, ry as f32);
        self.origin + offset
    }

    pub fn to_geo(&self, pos: Pos2) -> GeoPoint {
        let offset = pos - self.origin;
        let rx = f64::from(offset.x);
        let ry = f64::from(offset.y) / self.tilt_scale;

        let (sin, cos) = self.bearing_rad.sin_cos();
        let dx = rx * cos - ry * sin;
        let dy = rx * sin + ry * cos;

        GeoPoint::new(
            WebMercator::y_to_lat(self.center_y + dy / TILE_SIZE, self.zoom),
            WebMercator::x_to_lon(self.center_x + dx / TILE_SIZE, self.zoom),
        )
    }
}
