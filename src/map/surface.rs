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

//! egui rendering backend.
//!
//! [`EguiBackend`] keeps the scene it was sent in a [`MapSurface`] shared with
//! the app, which paints it every frame and forwards clicks to the pick
//! callback.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use earcutr::earcut;
use egui::{Color32, Mesh, Painter, Pos2, Rect, Shape, Stroke};
use log::{debug, info, warn};
use zone_compositor::layers::{AI_ANALYSIS, PROJECT_BOUNDARY};
use zone_compositor::{
    BackendError, BackendHandle, BoundaryPolygon, BoundaryStyle, GeoPoint, Layer, PickCallback,
    RenderBackend, Rgb, ViewState, ZoneStyle, ZoneUpdate,
};

use super::projection::Projection;

/// A zone as last sent by the compositor.
#[derive(Debug, Clone)]
struct ZoneShape {
    id: String,
    ring: Vec<GeoPoint>,
    style: ZoneStyle,
}

#[derive(Default)]
struct Scene {
    size: egui::Vec2,
    bound: bool,
    released: bool,
    view: Option<ViewState>,
    layers: Vec<Layer>,
    zones: Vec<ZoneShape>,
    boundary: Vec<BoundaryPolygon>,
    boundary_style: Option<BoundaryStyle>,
    pick: Option<PickCallback>,
}

/// Drawing surface shared between the backend and the app.
#[derive(Clone)]
pub struct MapSurface {
    scene: Rc<RefCell<Scene>>,
}

impl fmt::Debug for MapSurface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scene = self.scene.borrow();
        f.debug_struct("MapSurface")
            .field("size", &scene.size)
            .field("bound", &scene.bound)
            .field("zones", &scene.zones.len())
            .finish_non_exhaustive()
    }
}

impl MapSurface {
    pub fn new(width: f32, height: f32) -> Self {
        let scene = Scene {
            size: egui::vec2(width, height),
            ..Scene::default()
        };
        Self {
            scene: Rc::new(RefCell::new(scene)),
        }
    }

    /// Track the size the map panel actually got.
    pub fn resize(&self, size: egui::Vec2) {
        self.scene.borrow_mut().size = size;
    }

    /// Projection of the last view state received, centered in `rect`.
    pub fn projection(&self, rect: Rect) -> Option<Projection> {
        self.scene
            .borrow()
            .view
            .map(|view| Projection::new(&view, rect.center()))
    }

    /// Forward a click to the compositor. Returns `false` once released.
    pub fn dispatch_click(&self, point: GeoPoint) -> bool {
        let callback = self.scene.borrow_mut().pick.take();
        let Some(mut callback) = callback else {
            return false;
        };
        callback(point);
        let mut scene = self.scene.borrow_mut();
        if !scene.released {
            scene.pick = Some(callback);
        }
        true
    }

    /// Paint the current scene into `rect`.
    pub fn paint(&self, painter: &Painter, rect: Rect) {
        let scene = self.scene.borrow();
        let Some(view) = scene.view else {
            painter.rect_filled(rect, 0.0, Color32::from_gray(30));
            return;
        };
        let projection = Projection::new(&view, rect.center());

        paint_base(painter, rect, &projection, &scene.layers);

        // Thematic overlays without geometry of their own tint the project area
        for layer in scene.layers.iter().filter(|l| {
            !l.is_base() && l.enabled && l.id != AI_ANALYSIS && l.id != PROJECT_BOUNDARY
        }) {
            let color = with_opacity(token_color(&layer.color_token), layer.opacity);
            for polygon in &scene.boundary {
                let points = screen_ring(&projection, &polygon.ring);
                fill_ring(painter, &points, color);
            }
        }

        if let Some(style) = scene.boundary_style.filter(|s| s.visible) {
            for polygon in &scene.boundary {
                let points = screen_ring(&projection, &polygon.ring);
                fill_ring(painter, &points, with_opacity(rgb(style.fill_color), style.fill_opacity));
                paint_dashed_ring(painter, &points, rgb(style.line_color), style.line_width, style.dash);
            }
        }

        for zone in scene.zones.iter().filter(|z| z.style.visible) {
            let points = screen_ring(&projection, &zone.ring);
            fill_ring(
                painter,
                &points,
                with_opacity(rgb(zone.style.fill_color), zone.style.fill_opacity),
            );
            paint_dashed_ring(
                painter,
                &points,
                rgb(zone.style.line_color),
                zone.style.line_width,
                zone.style.dash,
            );
        }
    }
}

/// Triangle indices covering a simple ring, concave or not.
fn triangulate(points: &[Pos2]) -> Vec<usize> {
    if points.len() < 3 {
        return Vec::new();
    }
    let coords: Vec<f32> = points.iter().flat_map(|p| [p.x, p.y]).collect();
    match earcut(&coords, &[], 2) {
        Ok(indices) => indices,
        Err(e) => {
            debug!("Cannot triangulate ring of {} points: {e:?}", points.len());
            Vec::new()
        }
    }
}

fn fill_ring(painter: &Painter, points: &[Pos2], color: Color32) {
    let indices = triangulate(points);
    if indices.is_empty() {
        return;
    }
    let mut mesh = Mesh::default();
    for point in points {
        mesh.colored_vertex(*point, color);
    }
    for triangle in indices.chunks_exact(3) {
        #[allow(clippy::cast_possible_truncation, reason = "rings are far below u32::MAX vertices")]
        mesh.add_triangle(triangle[0] as u32, triangle[1] as u32, triangle[2] as u32);
    }
    painter.add(Shape::mesh(mesh));
}

fn screen_ring(projection: &Projection, ring: &[GeoPoint]) -> Vec<Pos2> {
    ring.iter().map(|p| projection.to_screen(*p)).collect()
}

#[allow(clippy::cast_possible_truncation, reason = "style widths are small")]
fn paint_dashed_ring(painter: &Painter, points: &[Pos2], color: Color32, width: f64, dash: [f64; 2]) {
    let mut closed = points.to_vec();
    if let Some(first) = points.first() {
        closed.push(*first);
    }
    let width = width as f32;
    painter.extend(Shape::dashed_line(
        &closed,
        Stroke::new(width, color),
        dash[0] as f32 * width,
        dash[1] as f32 * width,
    ));
}

fn paint_base(painter: &Painter, rect: Rect, projection: &Projection, layers: &[Layer]) {
    let base = layers.iter().find(|l| l.is_base() && l.enabled);
    let (background, grid) = match base.map(|l| l.id.as_str()) {
        Some("satellite") => (Color32::from_rgb(28, 52, 40), Color32::from_rgb(44, 74, 58)),
        Some("osm") => (Color32::from_rgb(229, 227, 223), Color32::from_rgb(205, 203, 198)),
        _ => (Color32::from_gray(40), Color32::from_gray(55)),
    };
    painter.rect_filled(rect, 0.0, background);

    // Graticule every 0.01 degrees so pan, zoom and rotation stay visible
    let center = projection.to_geo(rect.center());
    let corner = projection.to_geo(rect.left_top());
    let span = (corner.lat - center.lat)
        .abs()
        .max((corner.lng - center.lng).abs())
        * 2.0;
    let step = 0.01;
    let lines = (span / step).ceil().min(200.0);
    let stroke = Stroke::new(1.0, grid);

    let mut i = -lines;
    while i <= lines {
        let lat = (center.lat / step).round() * step + i * step;
        let lng = (center.lng / step).round() * step + i * step;
        painter.line_segment(
            [
                projection.to_screen(GeoPoint::new(lat, center.lng - span)),
                projection.to_screen(GeoPoint::new(lat, center.lng + span)),
            ],
            stroke,
        );
        painter.line_segment(
            [
                projection.to_screen(GeoPoint::new(center.lat - span, lng)),
                projection.to_screen(GeoPoint::new(center.lat + span, lng)),
            ],
            stroke,
        );
        i += 1.0;
    }
}

pub fn rgb(color: Rgb) -> Color32 {
    Color32::from_rgb(color.r, color.g, color.b)
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "opacity is clamped to [0, 1]"
)]
pub fn with_opacity(color: Color32, opacity: f64) -> Color32 {
    let alpha = (opacity.clamp(0.0, 1.0) * 255.0).round() as u8;
    Color32::from_rgba_unmultiplied(color.r(), color.g(), color.b(), alpha)
}

/// Color of a layer's display token.
pub fn token_color(token: &str) -> Color32 {
    match token {
        "blue-600" => Color32::from_rgb(37, 99, 235),
        "gray-600" => Color32::from_rgb(75, 85, 99),
        "red-600" => Color32::from_rgb(220, 38, 38),
        "green-600" => Color32::from_rgb(22, 163, 74),
        "purple-600" => Color32::from_rgb(147, 51, 234),
        other => Rgb::parse(other).map_or(Color32::GRAY, rgb),
    }
}

/// [`RenderBackend`] drawing through egui.
#[derive(Debug, Default)]
pub struct EguiBackend {
    surface: Option<MapSurface>,
    handle: Option<BackendHandle>,
}

impl EguiBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scene of the bound handle, or `None` for a stale handle.
    fn scene(&self, handle: BackendHandle) -> Option<std::cell::RefMut<'_, Scene>> {
        if self.handle != Some(handle) {
            warn!("Ignoring call on unknown backend handle {}", handle.id());
            return None;
        }
        let scene = self.surface.as_ref()?.scene.borrow_mut();
        if scene.released {
            warn!("Ignoring call on released backend handle {}", handle.id());
            return None;
        }
        Some(scene)
    }
}

impl RenderBackend for EguiBackend {
    type Surface = MapSurface;

    fn init(
        &mut self,
        surface: MapSurface,
        initial: &ViewState,
    ) -> Result<BackendHandle, BackendError> {
        {
            let mut scene = surface.scene.borrow_mut();
            if scene.bound {
                return Err(BackendError::SurfaceInUse);
            }
            let size = scene.size;
            if !(size.x.is_finite() && size.y.is_finite() && size.x > 0.0 && size.y > 0.0) {
                return Err(BackendError::InvalidSurface(format!(
                    "map panel size {}x{}",
                    size.x, size.y
                )));
            }
            scene.bound = true;
            scene.view = Some(*initial);
        }

        let handle = BackendHandle::new(1);
        self.surface = Some(surface);
        self.handle = Some(handle);
        info!("egui map surface bound");
        Ok(handle)
    }

    fn apply_view_state(&mut self, handle: BackendHandle, view: &ViewState) {
        if let Some(mut scene) = self.scene(handle) {
            scene.view = Some(*view);
        }
    }

    fn apply_layer_diff(&mut self, handle: BackendHandle, layers: &[Layer]) {
        let Some(mut scene) = self.scene(handle) else {
            return;
        };
        for layer in layers {
            match scene.layers.iter_mut().find(|l| l.id == layer.id) {
                Some(existing) => *existing = layer.clone(),
                None => scene.layers.push(layer.clone()),
            }
        }
        debug!("egui scene: {} layers updated", layers.len());
    }

    fn apply_zone_diff(&mut self, handle: BackendHandle, zones: &[ZoneUpdate<'_>]) {
        let Some(mut scene) = self.scene(handle) else {
            return;
        };
        for update in zones {
            match scene.zones.iter_mut().find(|z| z.id == update.zone.id) {
                Some(existing) => existing.style = update.style,
                None => scene.zones.push(ZoneShape {
                    id: update.zone.id.clone(),
                    ring: update.zone.polygon.clone(),
                    style: update.style,
                }),
            }
        }
        debug!("egui scene: {} zones updated", zones.len());
    }

    fn apply_boundary(
        &mut self,
        handle: BackendHandle,
        polygons: &[BoundaryPolygon],
        style: &BoundaryStyle,
    ) {
        if let Some(mut scene) = self.scene(handle) {
            scene.boundary = polygons.to_vec();
            scene.boundary_style = Some(*style);
        }
    }

    fn on_pick(&mut self, handle: BackendHandle, callback: PickCallback) {
        if let Some(mut scene) = self.scene(handle) {
            scene.pick = Some(callback);
        }
    }

    fn teardown(&mut self, handle: BackendHandle) {
        if let Some(mut scene) = self.scene(handle) {
            scene.released = true;
            scene.pick = None;
            info!("egui map surface released");
        }
        self.handle = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zone_compositor::{Compositor, CompositorConfig};

    #[test]
    fn test_surface_cannot_be_bound_twice() {
        let surface = MapSurface::new(800.0, 600.0);
        let view = ViewState::flat(GeoPoint::new(0.0, 0.0), 10.0);
        let mut first = EguiBackend::new();
        first.init(surface.clone(), &view).unwrap();
        let mut second = EguiBackend::new();
        assert_eq!(second.init(surface, &view), Err(BackendError::SurfaceInUse));
    }

    #[test]
    fn test_zero_sized_surface_is_rejected() {
        let view = ViewState::flat(GeoPoint::new(0.0, 0.0), 10.0);
        let mut backend = EguiBackend::new();
        assert!(matches!(
            backend.init(MapSurface::new(0.0, 600.0), &view),
            Err(BackendError::InvalidSurface(_))
        ));
    }

    #[test]
    fn test_compositor_fills_scene_and_receives_clicks() {
        let surface = MapSurface::new(800.0, 600.0);
        let mut compositor =
            Compositor::new(CompositorConfig::default(), EguiBackend::new(), surface.clone())
                .unwrap();
        {
            let scene = surface.scene.borrow();
            assert_eq!(scene.layers.len(), 6);
            assert_eq!(scene.zones.len(), 3);
            assert_eq!(scene.boundary.len(), 1);
        }

        assert!(surface.dispatch_click(GeoPoint::new(-10.895, -69.525)));
        compositor.process_picks();
        assert_eq!(compositor.selection().unwrap().zone.zone_id, "area-1");

        compositor.teardown();
        assert!(!surface.dispatch_click(GeoPoint::new(-10.895, -69.525)));
    }

    fn triangle_area(a: Pos2, b: Pos2, c: Pos2) -> f32 {
        ((b - a).x * (c - a).y - (b - a).y * (c - a).x).abs() / 2.0
    }

    fn triangle_contains(a: Pos2, b: Pos2, c: Pos2, p: Pos2) -> bool {
        let whole = triangle_area(a, b, c);
        let parts = triangle_area(p, b, c) + triangle_area(a, p, c) + triangle_area(a, b, p);
        (whole - parts).abs() < 1e-4
    }

    #[test]
    fn test_concave_ring_fill_leaves_notch_empty() {
        // U shape: 3x3 square with a 2x1 notch cut from the right side
        let ring = [
            Pos2::new(0.0, 0.0),
            Pos2::new(3.0, 0.0),
            Pos2::new(3.0, 3.0),
            Pos2::new(2.0, 3.0),
            Pos2::new(2.0, 1.0),
            Pos2::new(1.0, 1.0),
            Pos2::new(1.0, 3.0),
            Pos2::new(0.0, 3.0),
        ];
        let indices = triangulate(&ring);
        assert_eq!(indices.len(), (ring.len() - 2) * 3);

        let triangles: Vec<[Pos2; 3]> = indices
            .chunks_exact(3)
            .map(|t| [ring[t[0]], ring[t[1]], ring[t[2]]])
            .collect();
        let area: f32 = triangles.iter().map(|[a, b, c]| triangle_area(*a, *b, *c)).sum();
        assert!((area - 7.0).abs() < 1e-4, "area {area}");

        let notch = Pos2::new(1.5, 2.0);
        assert!(!triangles.iter().any(|[a, b, c]| triangle_contains(*a, *b, *c, notch)));
        let inside = Pos2::new(1.5, 0.5);
        assert!(triangles.iter().any(|[a, b, c]| triangle_contains(*a, *b, *c, inside)));
    }

    #[test]
    fn test_degenerate_ring_has_no_triangles() {
        assert!(triangulate(&[Pos2::new(0.0, 0.0), Pos2::new(1.0, 1.0)]).is_empty());
    }

    #[test]
    fn test_token_colors() {
        assert_eq!(token_color("red-600"), Color32::from_rgb(220, 38, 38));
        assert_eq!(token_color("#00ff88"), Color32::from_rgb(0, 255, 136));
        assert_eq!(token_color("mystery"), Color32::GRAY);
    }
}
