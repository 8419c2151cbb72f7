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

//! Read-only map overlays: status badges, analysis summary and the zone popup.

use zone_compositor::{color_for, AnalysisSummary, Hit, StatusBadges};

use crate::map::surface::rgb;

fn badge_color(label: &str) -> egui::Color32 {
    match label {
        "LIVE Satellite" => egui::Color32::from_rgb(220, 38, 38),
        "AI Analysis Active" => egui::Color32::from_rgb(22, 163, 74),
        _ => egui::Color32::from_rgb(37, 99, 235),
    }
}

/// Status badges in the top-left corner.
pub fn render_badges(ctx: &egui::Context, badges: StatusBadges) {
    let labels = badges.labels();
    if labels.is_empty() {
        return;
    }

    egui::Area::new(egui::Id::new("status_badges"))
        .anchor(egui::Align2::LEFT_TOP, egui::vec2(10.0, 10.0))
        .interactable(false)
        .show(ctx, |ui| {
            for label in labels {
                egui::Frame::new()
                    .fill(badge_color(label))
                    .corner_radius(10.0)
                    .inner_margin(egui::Margin::symmetric(8, 3))
                    .show(ui, |ui| {
                        ui.label(
                            egui::RichText::new(format!("● {label}"))
                                .color(egui::Color32::WHITE)
                                .size(11.0)
                                .strong(),
                        );
                    });
                ui.add_space(4.0);
            }
        });
}

/// Analysis summary card in the bottom-left corner.
pub fn render_summary(ctx: &egui::Context, summary: &AnalysisSummary) {
    egui::Window::new("analysis_summary")
        .title_bar(false)
        .anchor(egui::Align2::LEFT_BOTTOM, egui::vec2(10.0, -10.0))
        .fixed_size(egui::vec2(220.0, 0.0))
        .resizable(false)
        .frame(
            egui::Frame::window(&ctx.style())
                .fill(egui::Color32::from_rgba_unmultiplied(25, 30, 35, 230))
                .stroke(egui::Stroke::new(1.0, egui::Color32::from_rgb(60, 80, 100)))
                .corner_radius(6.0),
        )
        .show(ctx, |ui| {
            ui.label(
                egui::RichText::new(format!("◈ AI ANALYSIS · {}", summary.project_id))
                    .color(egui::Color32::from_rgb(100, 180, 220))
                    .size(12.0)
                    .strong(),
            );
            egui::Grid::new("summary_grid").num_columns(2).show(ui, |ui| {
                ui.label("Healthy Areas");
                ui.label(
                    egui::RichText::new(summary.healthy_areas.to_string())
                        .color(egui::Color32::from_rgb(22, 163, 74))
                        .strong(),
                );
                ui.end_row();
                ui.label("Areas of Concern");
                ui.label(
                    egui::RichText::new(summary.concern_areas.to_string())
                        .color(egui::Color32::from_rgb(234, 88, 12))
                        .strong(),
                );
                ui.end_row();
                ui.label("Confidence");
                ui.label(egui::RichText::new(summary.confidence_label()).strong());
                ui.end_row();
            });
        });
}

/// Popup for the selected zone next to `anchor`. Returns `true` when the
/// user closed it.
pub fn render_zone_popup(ctx: &egui::Context, hit: &Hit, anchor: egui::Pos2) -> bool {
    let mut closed = false;
    let zone = &hit.zone;
    let accent = rgb(color_for(zone.classification));

    egui::Window::new("zone_popup")
        .title_bar(false)
        .fixed_pos(anchor + egui::vec2(12.0, -12.0))
        .fixed_size(egui::vec2(240.0, 0.0))
        .resizable(false)
        .frame(
            egui::Frame::window(&ctx.style())
                .fill(egui::Color32::from_rgba_unmultiplied(25, 30, 35, 240))
                .stroke(egui::Stroke::new(2.0, accent))
                .corner_radius(6.0),
        )
        .show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(egui::RichText::new(zone.title()).color(accent).size(13.0).strong());
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.small_button("✕").clicked() {
                        closed = true;
                    }
                });
            });
            ui.label(
                egui::RichText::new(zone.confidence_label())
                    .color(egui::Color32::from_rgb(180, 180, 180))
                    .size(11.0),
            );
            ui.separator();
            ui.label(&zone.description);
            egui::Grid::new("zone_popup_grid").num_columns(2).show(ui, |ui| {
                ui.label("Carbon Density");
                ui.label(egui::RichText::new(zone.carbon_label()).strong());
                ui.end_row();
                ui.label("Change");
                let change_color = if zone.change_detected {
                    egui::Color32::from_rgb(234, 88, 12)
                } else {
                    egui::Color32::from_rgb(22, 163, 74)
                };
                ui.label(egui::RichText::new(zone.change_label()).color(change_color));
                ui.end_row();
                ui.label("Location");
                ui.label(
                    egui::RichText::new(format!(
                        "{:.4}°, {:.4}°",
                        hit.query_point.lat, hit.query_point.lng
                    ))
                    .color(egui::Color32::from_rgb(120, 120, 120)),
                );
                ui.end_row();
            });
        });

    closed
}
