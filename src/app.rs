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

//! Interactive map window.

use std::time::Instant;

use log::{debug, info, warn};
use zone_compositor::{Compositor, CompositorConfig, CompositorError};

use crate::map::{EguiBackend, MapSurface};
use crate::ui::{controls, overlays};

/// Scroll distance in points for one zoom level.
const SCROLL_PER_ZOOM_LEVEL: f32 = 200.0;

pub struct RestorationApp {
    compositor: Compositor<EguiBackend>,
    surface: MapSurface,
    last_selection: Option<String>,
}

impl std::fmt::Debug for RestorationApp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestorationApp")
            .field("project_id", &self.compositor.project_id())
            .field("surface", &self.surface)
            .finish_non_exhaustive()
    }
}

impl RestorationApp {
    #[allow(clippy::cast_possible_truncation, reason = "window sizes fit in f32")]
    pub fn new(config: CompositorConfig) -> Result<Self, CompositorError> {
        let surface = MapSurface::new(config.container.width as f32, config.container.height as f32);
        let compositor = Compositor::new(config, EguiBackend::new(), surface.clone())?;
        info!("Map ready for project {}", compositor.project_id());

        Ok(Self {
            compositor,
            surface,
            last_selection: None,
        })
    }

    fn draw_map(&mut self, ui: &mut egui::Ui, now: Instant) -> egui::Rect {
        let (response, painter) =
            ui.allocate_painter(ui.available_size(), egui::Sense::click_and_drag());
        let rect = response.rect;
        self.surface.resize(rect.size());

        if let Some(projection) = self.surface.projection(rect) {
            if response.dragged() {
                let target = projection.to_geo(rect.center() - response.drag_delta());
                self.compositor.set_center(target.lat, target.lng);
            }

            if response.hovered() {
                let (scroll, pinch) = ui.input(|i| (i.smooth_scroll_delta.y, i.zoom_delta()));
                let mut change = f64::from(scroll / SCROLL_PER_ZOOM_LEVEL);
                if (pinch - 1.0).abs() > 0.001 {
                    change += f64::from(pinch.log2());
                }
                if change.abs() > f64::EPSILON {
                    let zoom = self.compositor.view_state().zoom;
                    self.compositor.set_zoom(zoom + change);
                }
            }

            if response.clicked() {
                if let Some(pos) = response.interact_pointer_pos() {
                    let point = projection.to_geo(pos);
                    debug!("Map click at {:.5}, {:.5}", point.lat, point.lng);
                    self.surface.dispatch_click(point);
                }
            }
        }

        self.compositor.process_picks();
        self.compositor.advance(now);
        let stats = self.compositor.render_pass();
        if !stats.is_empty() {
            debug!("Render pass {}: {:?}", self.compositor.render_passes(), stats);
        }

        self.surface.paint(&painter, rect);
        rect
    }

    fn log_selection_change(&mut self) {
        let current = self.compositor.selection().map(|hit| hit.zone.zone_id.clone());
        if current != self.last_selection {
            match &current {
                Some(id) => info!("Selected zone {id}"),
                None => info!("Selection cleared"),
            }
            self.last_selection = current;
        }
    }
}

impl eframe::App for RestorationApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = Instant::now();

        for action in controls::render(ctx, &self.compositor) {
            if let Err(e) = action.apply(&mut self.compositor, now) {
                warn!("{action:?} failed: {e}");
            }
        }

        let mut map_rect = egui::Rect::NOTHING;
        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| {
                map_rect = self.draw_map(ui, now);
            });

        overlays::render_badges(ctx, self.compositor.status());
        overlays::render_summary(ctx, &self.compositor.summary());

        let popup = self.compositor.selection().cloned().zip(self.surface.projection(map_rect));
        if let Some((hit, projection)) = popup {
            if overlays::render_zone_popup(ctx, &hit, projection.to_screen(hit.query_point)) {
                self.compositor.clear_selection();
            }
        }
        self.log_selection_change();

        // Transitions need every frame, otherwise wake up for the next playback tick
        if self.compositor.is_animating() {
            ctx.request_repaint();
        } else if let Some(deadline) = self.compositor.next_deadline() {
            ctx.request_repaint_after(deadline.saturating_duration_since(Instant::now()));
        }
    }
}
