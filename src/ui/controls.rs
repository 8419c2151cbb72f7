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

//! Floating control panel: view mode, layers, playback and camera buttons.
//!
//! The panel only reads compositor state and returns [`ControlAction`]s; the
//! app applies them with the current time.

use std::time::Instant;

use zone_compositor::layers::AI_ANALYSIS;
use zone_compositor::{Compositor, CompositorError, PlaybackPhase, RenderBackend};

use crate::map::surface::token_color;

/// A user request from the control panel.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlAction {
    Toggle3d,
    ResetView,
    ZoomIn,
    ZoomOut,
    SetOverlayVisible(bool),
    SetOverlayOpacity(f64),
    SetLayerEnabled(String, bool),
    SwitchBase(String),
    TogglePlayback,
    ResetPlayback,
}

impl ControlAction {
    /// Apply to `compositor`. Layer errors are returned, camera and playback
    /// actions cannot fail.
    pub fn apply<B: RenderBackend>(
        &self,
        compositor: &mut Compositor<B>,
        now: Instant,
    ) -> Result<(), CompositorError> {
        match self {
            Self::Toggle3d => compositor.toggle_3d(now),
            Self::ResetView => compositor.reset_view(now),
            Self::ZoomIn => {
                compositor.zoom_in();
            }
            Self::ZoomOut => {
                compositor.zoom_out();
            }
            Self::SetOverlayVisible(visible) => {
                compositor.set_overlay_visible(*visible)?;
            }
            Self::SetOverlayOpacity(opacity) => {
                compositor.set_overlay_opacity(*opacity)?;
            }
            Self::SetLayerEnabled(id, enabled) => {
                compositor.set_layer_enabled(id, *enabled)?;
            }
            Self::SwitchBase(id) => {
                compositor.switch_base_layer(id)?;
            }
            Self::TogglePlayback => compositor.toggle_playback(now),
            Self::ResetPlayback => {
                compositor.reset_playback();
            }
        }
        Ok(())
    }
}

fn panel_frame(ctx: &egui::Context) -> egui::Frame {
    egui::Frame::window(&ctx.style())
        .fill(egui::Color32::from_rgba_unmultiplied(25, 30, 35, 230))
        .stroke(egui::Stroke::new(1.0, egui::Color32::from_rgb(60, 80, 100)))
        .corner_radius(6.0)
}

fn heading(ui: &mut egui::Ui, text: &str) {
    ui.label(
        egui::RichText::new(text)
            .color(egui::Color32::from_rgb(100, 180, 220))
            .size(12.0)
            .strong(),
    );
}

/// Render the control panel on the right edge of the window.
pub fn render<B: RenderBackend>(ctx: &egui::Context, compositor: &Compositor<B>) -> Vec<ControlAction> {
    let mut actions = Vec::new();

    egui::Window::new("Map Controls")
        .anchor(egui::Align2::RIGHT_TOP, egui::vec2(-10.0, 10.0))
        .fixed_size(egui::vec2(260.0, 0.0))
        .resizable(false)
        .collapsible(true)
        .frame(panel_frame(ctx))
        .show(ctx, |ui| {
            heading(ui, "◈ VIEW");
            ui.horizontal(|ui| {
                let mode = compositor.target_mode();
                if ui
                    .button(format!("{} → {}", mode.label(), mode.toggled().label()))
                    .clicked()
                {
                    actions.push(ControlAction::Toggle3d);
                }
                if ui.button("⟲ Reset").clicked() {
                    actions.push(ControlAction::ResetView);
                }
                if ui.button("➕").clicked() {
                    actions.push(ControlAction::ZoomIn);
                }
                if ui.button("➖").clicked() {
                    actions.push(ControlAction::ZoomOut);
                }
            });
            let view = compositor.view_state();
            ui.label(
                egui::RichText::new(format!(
                    "{:.4}°, {:.4}°  z{:.1}  pitch {:.0}°",
                    view.center.lat, view.center.lng, view.zoom, view.pitch
                ))
                .color(egui::Color32::from_rgb(150, 150, 150))
                .size(10.0),
            );

            ui.separator();
            heading(ui, "◈ BASE MAP");
            ui.horizontal(|ui| {
                for layer in compositor.layers().iter().filter(|l| l.is_base()) {
                    if ui.selectable_label(layer.enabled, &layer.name).clicked() && !layer.enabled {
                        actions.push(ControlAction::SwitchBase(layer.id.clone()));
                    }
                }
            });

            ui.separator();
            heading(ui, "◈ OVERLAYS");
            for layer in compositor.layers().iter().filter(|l| !l.is_base()) {
                ui.horizontal(|ui| {
                    let mut enabled = layer.enabled;
                    let text = egui::RichText::new(&layer.name).color(token_color(&layer.color_token));
                    if ui.checkbox(&mut enabled, text).changed() {
                        actions.push(if layer.id == AI_ANALYSIS {
                            ControlAction::SetOverlayVisible(enabled)
                        } else {
                            ControlAction::SetLayerEnabled(layer.id.clone(), enabled)
                        });
                    }
                });
                if layer.id == AI_ANALYSIS {
                    let mut opacity = layer.opacity;
                    let slider = egui::Slider::new(&mut opacity, 0.0..=1.0).text("opacity");
                    if ui.add_enabled(layer.enabled, slider).changed() {
                        actions.push(ControlAction::SetOverlayOpacity(opacity));
                    }
                }
            }

            ui.separator();
            heading(ui, "◈ TIME SERIES");
            let playback = compositor.playback();
            ui.horizontal(|ui| {
                let label = match playback.phase() {
                    PlaybackPhase::Playing => "⏸ Pause",
                    PlaybackPhase::Stopped => "▶ Play",
                };
                if ui
                    .add_enabled(playback.frame_count() > 0, egui::Button::new(label))
                    .clicked()
                {
                    actions.push(ControlAction::TogglePlayback);
                }
                if ui.button("⏮ Reset").clicked() {
                    actions.push(ControlAction::ResetPlayback);
                }
            });
            if let Some(frame) = playback.current_frame() {
                ui.label(
                    egui::RichText::new(format!(
                        "{}  ({}/{})",
                        frame.label(),
                        playback.current_index() + 1,
                        playback.frame_count()
                    ))
                    .color(egui::Color32::from_rgb(200, 220, 255))
                    .strong(),
                );
                ui.label(
                    egui::RichText::new(&frame.description)
                        .color(egui::Color32::from_rgb(180, 180, 180))
                        .size(11.0),
                );
            }
        });

    actions
}
