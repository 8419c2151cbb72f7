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

//! The compositor: owns all map state and drives one render backend.
//!
//! Mutations only touch state and mark it dirty. [`Compositor::render_pass`]
//! compares the current state with what the backend last received and sends
//! the difference. A host loop looks like this:
//!
//! ```text
//! input events   -> compositor operations
//! process_picks  -> selection
//! advance(now)   -> camera transition and playback ticks
//! render_pass    -> backend deltas
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::mpsc::{self, Receiver};
use std::time::Instant;

use log::{debug, error, info};
use thiserror::Error;

use crate::backend::{BackendError, BackendHandle, RenderBackend, ZoneUpdate};
use crate::boundary::{BoundaryStyle, ProjectBoundary};
use crate::config::{CompositorConfig, ContainerSize};
use crate::defaults::{default_boundary, default_zones};
use crate::geo::GeoPoint;
use crate::geojson::GeoJsonError;
use crate::layers::{LayerRegistry, RegistryError, AI_ANALYSIS, PROJECT_BOUNDARY, SATELLITE};
use crate::playback::{PlaybackController, TimeSeriesFrame};
use crate::query::{FeatureQueryEngine, Hit, HitResult, QueryOptions};
use crate::summary::{AnalysisSummary, StatusBadges};
use crate::view::{ViewMode, ViewState, ViewportController};
use crate::zones::{ZoneStore, ZoneStyle};

#[derive(Debug, Error)]
pub enum CompositorError {
    #[error("render backend initialisation failed: {0}")]
    Backend(#[from] BackendError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    GeoJson(#[from] GeoJsonError),

    #[error("compositor has been torn down")]
    Disposed,
}

/// What one render pass sent to the backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub view: bool,
    pub layers: usize,
    pub zones: usize,
    pub boundary: bool,
}

impl RenderStats {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !self.view && self.layers == 0 && self.zones == 0 && !self.boundary
    }
}

pub struct Compositor<B: RenderBackend> {
    project_id: String,
    container: ContainerSize,
    backend: B,
    handle: BackendHandle,
    viewport: ViewportController,
    layers: LayerRegistry,
    zones: ZoneStore,
    boundary: ProjectBoundary,
    playback: PlaybackController,
    picks: Receiver<GeoPoint>,
    selection: Option<Hit>,

    // Last state the backend received
    rendered_view: Option<ViewState>,
    rendered_layers: HashMap<String, (bool, f64)>,
    rendered_zones: Vec<Option<ZoneStyle>>,
    rendered_boundary: Option<BoundaryStyle>,

    passes: u64,
    disposed: bool,
}

impl<B: RenderBackend> fmt::Debug for Compositor<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Compositor")
            .field("project_id", &self.project_id)
            .field("handle", &self.handle)
            .field("view", self.viewport.state())
            .field("layers", &self.layers.len())
            .field("zones", &self.zones.len())
            .field("playback", &self.playback.phase())
            .field("disposed", &self.disposed)
            .finish_non_exhaustive()
    }
}

impl<B: RenderBackend> Compositor<B> {
    /// Bind `backend` to `surface` and send the initial state.
    ///
    /// Backend failure is returned as is; nothing is retried.
    pub fn new(
        config: CompositorConfig,
        mut backend: B,
        surface: B::Surface,
    ) -> Result<Self, CompositorError> {
        let CompositorConfig {
            project_id,
            center,
            container,
            timing,
            layers,
            boundary,
            analysis,
            frames,
        } = config;

        if !container.is_valid() {
            let err = BackendError::InvalidSurface(format!(
                "container size {}x{}",
                container.width, container.height
            ));
            error!("Cannot create compositor for {project_id}: {err}");
            return Err(err.into());
        }

        let viewport = ViewportController::new(
            center,
            timing.initial_zoom,
            backend.zoom_bounds(),
            timing.transition,
            timing.zoom_step,
        );

        let handle = backend
            .init(surface, viewport.state())
            .inspect_err(|e| error!("Cannot create compositor for {project_id}: {e}"))?;
        info!("Render backend initialised (handle {})", handle.id());

        let (sender, picks) = mpsc::channel();
        backend.on_pick(
            handle,
            Box::new(move |point| {
                if sender.send(point).is_err() {
                    debug!("Pick dropped, compositor is gone");
                }
            }),
        );

        let layers = LayerRegistry::new(layers);
        let mut zones = ZoneStore::new();
        zones.register_all(analysis.unwrap_or_else(default_zones));
        zones.set_overlay_visible(layers.is_enabled(AI_ANALYSIS));
        let boundary = boundary.unwrap_or_else(default_boundary);

        info!(
            "Compositor ready for project {project_id}: {} layers, {} zones, {} boundary polygons, {} frames",
            layers.len(),
            zones.len(),
            boundary.polygons().len(),
            frames.len()
        );

        let rendered_zones = vec![None; zones.len()];
        let mut compositor = Self {
            project_id,
            container,
            rendered_view: Some(*viewport.state()),
            backend,
            handle,
            viewport,
            layers,
            zones,
            boundary,
            playback: PlaybackController::new(frames, timing.playback_interval),
            picks,
            selection: None,
            rendered_layers: HashMap::new(),
            rendered_zones,
            rendered_boundary: None,
            passes: 0,
            disposed: false,
        };
        compositor.render_pass();
        Ok(compositor)
    }

    // --- Frame loop ---

    /// Send everything that changed since the previous pass.
    pub fn render_pass(&mut self) -> RenderStats {
        let mut stats = RenderStats::default();
        if self.disposed {
            return stats;
        }

        let view = *self.viewport.state();
        if self.rendered_view != Some(view) {
            self.backend.apply_view_state(self.handle, &view);
            self.rendered_view = Some(view);
            stats.view = true;
        }

        let changed_layers: Vec<_> = self
            .layers
            .take_dirty()
            .into_iter()
            .filter(|layer| {
                let shown = (layer.enabled, layer.opacity);
                self.rendered_layers.insert(layer.id.clone(), shown) != Some(shown)
            })
            .collect();
        if !changed_layers.is_empty() {
            for layer in &changed_layers {
                self.zones.mark_layer_dirty(&layer.id);
            }
            self.backend.apply_layer_diff(self.handle, &changed_layers);
            stats.layers = changed_layers.len();
        }

        self.rendered_zones.resize(self.zones.len(), None);
        let mut updates = Vec::new();
        for position in self.zones.take_dirty() {
            let Some(zone) = self.zones.by_position(position) else {
                continue;
            };
            let layer = self.layers.get(&zone.layer);
            let visible = self.zones.overlay_visible() && layer.is_some_and(|l| l.enabled);
            let style = ZoneStyle::resolve(zone, visible, layer.map_or(0.0, |l| l.opacity));
            if let Some(slot) = self.rendered_zones.get_mut(position) {
                if *slot == Some(style) {
                    continue;
                }
                *slot = Some(style);
            }
            updates.push(ZoneUpdate { zone, style });
        }
        if !updates.is_empty() {
            // All zones of one pass go out together, so a visibility toggle
            // never shows a partial set.
            self.backend.apply_zone_diff(self.handle, &updates);
            stats.zones = updates.len();
        }

        let boundary_style = BoundaryStyle::from_layer(self.layers.get(PROJECT_BOUNDARY));
        if self.rendered_boundary != Some(boundary_style) {
            self.backend
                .apply_boundary(self.handle, self.boundary.polygons(), &boundary_style);
            self.rendered_boundary = Some(boundary_style);
            stats.boundary = true;
        }

        if !stats.is_empty() {
            self.passes += 1;
            debug!(
                "Render pass {}: view={} layers={} zones={} boundary={}",
                self.passes, stats.view, stats.layers, stats.zones, stats.boundary
            );
        }
        stats
    }

    /// Run timers due at `now`. Returns `true` if state changed.
    pub fn advance(&mut self, now: Instant) -> bool {
        if self.disposed {
            debug!("Timer tick ignored after teardown");
            return false;
        }
        let camera = self.viewport.advance(now);
        let ticks = self.playback.advance(now);
        camera || ticks > 0
    }

    /// Resolve clicks reported by the backend since the last call.
    ///
    /// A click on a zone replaces the selection. A click on empty map leaves
    /// it alone. Returns `true` if the selection changed.
    pub fn process_picks(&mut self) -> bool {
        let points: Vec<GeoPoint> = self.picks.try_iter().collect();
        if self.disposed {
            return false;
        }
        let mut changed = false;
        for point in points {
            if let Some(hit) = self.query(point) {
                info!(
                    "Selected zone {} ({})",
                    hit.zone.zone_id, hit.zone.classification
                );
                self.selection = Some(hit);
                changed = true;
            }
        }
        changed
    }

    /// Find the visible zone under `point`.
    #[must_use]
    pub fn query(&self, point: GeoPoint) -> HitResult {
        FeatureQueryEngine::new(&self.zones, &self.layers).query(point, QueryOptions::default())
    }

    /// When the host should wake up for the next playback tick.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        if self.disposed {
            None
        } else {
            self.playback.next_tick()
        }
    }

    /// A camera transition is running and wants frames.
    #[must_use]
    pub fn is_animating(&self) -> bool {
        !self.disposed && self.viewport.is_animating()
    }

    /// Release the backend. Later calls are ignored or return [`CompositorError::Disposed`].
    pub fn teardown(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        self.playback.cancel();
        self.viewport.cancel_transition();
        self.selection = None;
        self.backend.teardown(self.handle);
        while self.picks.try_recv().is_ok() {}
        info!("Compositor for project {} torn down", self.project_id);
    }

    // --- Camera ---

    pub fn set_center(&mut self, lat: f64, lng: f64) -> bool {
        self.is_live() && self.viewport.set_center(lat, lng)
    }

    pub fn pan_by(&mut self, d_lat: f64, d_lng: f64) -> bool {
        self.is_live() && self.viewport.pan_by(d_lat, d_lng)
    }

    pub fn set_zoom(&mut self, zoom: f64) -> bool {
        self.is_live() && self.viewport.set_zoom(zoom)
    }

    pub fn zoom_in(&mut self) -> bool {
        self.is_live() && self.viewport.zoom_in()
    }

    pub fn zoom_out(&mut self) -> bool {
        self.is_live() && self.viewport.zoom_out()
    }

    pub fn set_pitch(&mut self, pitch: f64) -> bool {
        self.is_live() && self.viewport.set_pitch(pitch)
    }

    pub fn set_bearing(&mut self, bearing: f64) -> bool {
        self.is_live() && self.viewport.set_bearing(bearing)
    }

    pub fn toggle_3d(&mut self, now: Instant) {
        if self.is_live() {
            self.viewport.toggle_3d(now);
        }
    }

    pub fn reset_view(&mut self, now: Instant) {
        if self.is_live() {
            self.viewport.reset_view(now);
        }
    }

    // --- Layers ---

    /// Enable or disable a layer. The AI analysis layer also switches the
    /// zone overlay, so the two never disagree.
    pub fn set_layer_enabled(&mut self, id: &str, enabled: bool) -> Result<bool, CompositorError> {
        self.ensure_live()?;
        if id == AI_ANALYSIS {
            return self.set_overlay_visible(enabled);
        }
        Ok(self.layers.set_enabled(id, enabled)?)
    }

    /// Set a layer's opacity, clamped. Returns the stored value.
    pub fn set_layer_opacity(&mut self, id: &str, opacity: f64) -> Result<f64, CompositorError> {
        self.ensure_live()?;
        Ok(self.layers.set_opacity(id, opacity)?)
    }

    pub fn switch_base_layer(&mut self, id: &str) -> Result<bool, CompositorError> {
        self.ensure_live()?;
        Ok(self.layers.switch_base_layer(id)?)
    }

    /// Show or hide every analysis zone at once.
    pub fn set_overlay_visible(&mut self, visible: bool) -> Result<bool, CompositorError> {
        self.ensure_live()?;
        let layer_changed = if self.layers.get(AI_ANALYSIS).is_some() {
            self.layers.set_enabled(AI_ANALYSIS, visible)?
        } else {
            false
        };
        let zones_changed = self.zones.set_overlay_visible(visible);
        if layer_changed || zones_changed {
            debug!("AI overlay {}", if visible { "shown" } else { "hidden" });
        }
        Ok(layer_changed || zones_changed)
    }

    pub fn set_overlay_opacity(&mut self, opacity: f64) -> Result<f64, CompositorError> {
        self.set_layer_opacity(AI_ANALYSIS, opacity)
    }

    // --- Playback ---

    pub fn play(&mut self, now: Instant) -> bool {
        self.is_live() && self.playback.play(now)
    }

    pub fn pause(&mut self) -> bool {
        self.is_live() && self.playback.pause()
    }

    pub fn toggle_playback(&mut self, now: Instant) {
        if self.is_live() {
            self.playback.toggle(now);
        }
    }

    pub fn reset_playback(&mut self) -> bool {
        self.is_live() && self.playback.reset()
    }

    // --- Read side ---

    #[must_use]
    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    #[must_use]
    pub fn container(&self) -> ContainerSize {
        self.container
    }

    #[must_use]
    pub fn view_state(&self) -> &ViewState {
        self.viewport.state()
    }

    /// Mode the camera shows or is transitioning to.
    #[must_use]
    pub fn target_mode(&self) -> ViewMode {
        self.viewport.target_mode()
    }

    #[must_use]
    pub fn layers(&self) -> &LayerRegistry {
        &self.layers
    }

    #[must_use]
    pub fn zones(&self) -> &ZoneStore {
        &self.zones
    }

    #[must_use]
    pub fn boundary(&self) -> &ProjectBoundary {
        &self.boundary
    }

    #[must_use]
    pub fn playback(&self) -> &PlaybackController {
        &self.playback
    }

    #[must_use]
    pub fn current_frame(&self) -> Option<&TimeSeriesFrame> {
        self.playback.current_frame()
    }

    #[must_use]
    pub fn selection(&self) -> Option<&Hit> {
        self.selection.as_ref()
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    #[must_use]
    pub fn summary(&self) -> AnalysisSummary {
        AnalysisSummary::from_zones(&self.project_id, &self.zones)
    }

    #[must_use]
    pub fn status(&self) -> StatusBadges {
        StatusBadges {
            live_satellite: self.layers.is_enabled(SATELLITE),
            ai_analysis_active: self.zones.overlay_visible()
                && self.layers.is_enabled(AI_ANALYSIS),
            view_3d: self.viewport.state().is_3d(),
        }
    }

    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Number of render passes that sent anything.
    #[must_use]
    pub fn render_passes(&self) -> u64 {
        self.passes
    }

    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    fn is_live(&self) -> bool {
        if self.disposed {
            debug!("Operation ignored after teardown");
        }
        !self.disposed
    }

    fn ensure_live(&self) -> Result<(), CompositorError> {
        if self.disposed {
            Err(CompositorError::Disposed)
        } else {
            Ok(())
        }
    }
}

impl<B: RenderBackend> Drop for Compositor<B> {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::backend::{BackendCall, RecordingBackend, RecordingProbe};
    use crate::layers::{ECOSYSTEM, OSM};
    use crate::view::{ZoomBounds, TILTED_PITCH};
    use crate::zones::{Classification, Zone};

    fn compositor() -> (Compositor<RecordingBackend>, RecordingProbe) {
        let (backend, probe) = RecordingBackend::new();
        let config = CompositorConfig::default();
        let surface = config.container;
        let compositor = Compositor::new(config, backend, surface).unwrap();
        (compositor, probe)
    }

    /// A compositor whose initial calls have already been cleared.
    fn settled() -> (Compositor<RecordingBackend>, RecordingProbe) {
        let (compositor, probe) = compositor();
        probe.clear();
        (compositor, probe)
    }

    #[test]
    fn test_backend_zoom_bounds_limit_camera() {
        let (backend, probe) = RecordingBackend::new();
        let backend = backend.with_bounds(ZoomBounds { min: 4.0, max: 10.0 });
        let config = CompositorConfig::default();
        let surface = config.container;
        let mut compositor = Compositor::new(config, backend, surface).unwrap();

        // Home zoom 13 is beyond what the backend shows
        assert_eq!(compositor.view_state().zoom, 10.0);
        assert!(matches!(probe.calls()[0], BackendCall::Init(view) if view.zoom == 10.0));
        assert!(!compositor.zoom_in());
        assert!(compositor.set_zoom(0.0));
        assert_eq!(compositor.view_state().zoom, 4.0);
    }

    #[test]
    fn test_construction_sends_full_state_once() {
        let (_compositor, probe) = compositor();
        let calls = probe.calls();
        assert!(matches!(calls[0], BackendCall::Init(_)));
        assert_eq!(calls[1], BackendCall::OnPick);
        assert!(matches!(&calls[2], BackendCall::LayerDiff(l) if l.len() == 6));
        assert!(matches!(&calls[3], BackendCall::ZoneDiff(z) if z.len() == 3));
        assert!(matches!(&calls[4], BackendCall::Boundary { polygons: 1, .. }));
        assert_eq!(calls.len(), 5);
    }

    #[test]
    fn test_invalid_container_fails_construction() {
        let (backend, probe) = RecordingBackend::new();
        let config = CompositorConfig::default().with_container(ContainerSize::new(0.0, 0.0));
        let surface = config.container;
        let result = Compositor::new(config, backend, surface);
        assert!(matches!(
            result,
            Err(CompositorError::Backend(BackendError::InvalidSurface(_)))
        ));
        assert_eq!(probe.call_count(), 0);
    }

    #[test]
    fn test_backend_init_failure_is_surfaced() {
        let (backend, _probe) = RecordingBackend::new();
        let config = CompositorConfig::default();
        let result = Compositor::new(config, backend, ContainerSize::new(-5.0, 10.0));
        assert!(matches!(result, Err(CompositorError::Backend(_))));
    }

    #[test]
    fn test_idle_pass_sends_nothing() {
        let (mut compositor, probe) = settled();
        assert!(compositor.render_pass().is_empty());
        assert_eq!(probe.call_count(), 0);
    }

    #[test]
    fn test_ai_opacity_is_clamped_and_restyles_zones() {
        let (mut compositor, probe) = settled();
        assert_eq!(compositor.set_overlay_opacity(1.5).unwrap(), 1.0);
        assert_eq!(compositor.layers().get(AI_ANALYSIS).unwrap().opacity, 1.0);

        let stats = compositor.render_pass();
        assert_eq!(stats.layers, 1);
        assert_eq!(stats.zones, 3);
        assert!(!stats.view);

        let calls = probe.calls();
        let BackendCall::ZoneDiff(zones) = &calls[1] else {
            panic!("expected a zone diff, got {:?}", calls[1]);
        };
        assert!(zones.iter().all(|(_, style)| style.fill_opacity == 1.0));
    }

    #[test]
    fn test_enabling_osm_disables_satellite() {
        let (mut compositor, probe) = settled();
        compositor.set_layer_enabled(OSM, true).unwrap();
        assert!(!compositor.layers().is_enabled(SATELLITE));
        assert!(!compositor.status().live_satellite);

        compositor.render_pass();
        let calls = probe.calls();
        assert_eq!(calls.len(), 1);
        let BackendCall::LayerDiff(layers) = &calls[0] else {
            panic!("expected a layer diff");
        };
        let ids: Vec<&str> = layers.iter().map(|(id, _, _)| id.as_str()).collect();
        assert_eq!(ids, vec![SATELLITE, OSM]);
    }

    #[test]
    fn test_reverted_change_sends_nothing() {
        let (mut compositor, probe) = settled();
        compositor.set_layer_opacity(ECOSYSTEM, 0.2).unwrap();
        compositor.set_layer_opacity(ECOSYSTEM, 0.8).unwrap();
        compositor.zoom_in();
        compositor.zoom_out();
        assert!(compositor.render_pass().is_empty());
        assert_eq!(probe.call_count(), 0);
    }

    #[test]
    fn test_overlay_toggle_hides_all_zones_in_one_diff() {
        let (mut compositor, probe) = settled();
        assert!(compositor.set_layer_enabled(AI_ANALYSIS, false).unwrap());
        assert!(!compositor.zones().overlay_visible());
        assert!(!compositor.status().ai_analysis_active);

        compositor.render_pass();
        let zone_diffs: Vec<_> = probe
            .calls()
            .into_iter()
            .filter_map(|c| match c {
                BackendCall::ZoneDiff(z) => Some(z),
                _ => None,
            })
            .collect();
        assert_eq!(zone_diffs.len(), 1);
        assert_eq!(zone_diffs[0].len(), 3);
        assert!(zone_diffs[0].iter().all(|(_, style)| !style.visible));

        assert!(compositor.set_overlay_visible(true).unwrap());
        assert!(compositor.layers().is_enabled(AI_ANALYSIS));
    }

    #[test]
    fn test_click_selects_zone() {
        let (mut compositor, probe) = settled();
        assert!(probe.click(GeoPoint::new(-10.895, -69.525)));
        assert!(compositor.process_picks());
        let hit = compositor.selection().unwrap();
        assert_eq!(hit.zone.zone_id, "area-1");

        probe.click(GeoPoint::new(0.0, 0.0));
        assert!(!compositor.process_picks());
        assert_eq!(compositor.selection().unwrap().zone.zone_id, "area-1");

        compositor.clear_selection();
        assert!(compositor.selection().is_none());
    }

    #[test]
    fn test_hidden_zones_are_not_clickable() {
        let (mut compositor, probe) = settled();
        compositor.set_overlay_visible(false).unwrap();
        probe.click(GeoPoint::new(-10.895, -69.525));
        assert!(!compositor.process_picks());
        assert!(compositor.selection().is_none());
    }

    #[test]
    fn test_playback_through_compositor() {
        let (mut compositor, _probe) = settled();
        let t0 = Instant::now();
        assert!(compositor.play(t0));
        assert_eq!(compositor.next_deadline(), Some(t0 + Duration::from_secs(2)));
        assert!(compositor.advance(t0 + Duration::from_secs(6)));
        let frame = compositor.current_frame().unwrap();
        assert_eq!(frame.label(), "2024-06");
        assert_eq!(frame.description, "Maturation Phase");

        compositor.pause();
        assert!(compositor.next_deadline().is_none());
        assert!(!compositor.advance(t0 + Duration::from_secs(60)));
        assert_eq!(compositor.playback().current_index(), 3);
    }

    #[test]
    fn test_toggle_3d_renders_intermediate_and_final_view() {
        let (mut compositor, probe) = settled();
        let t0 = Instant::now();
        compositor.toggle_3d(t0);
        assert!(compositor.is_animating());
        assert!(compositor.status().view_3d);

        compositor.advance(t0 + Duration::from_millis(500));
        assert!(compositor.render_pass().view);
        compositor.advance(t0 + Duration::from_millis(1000));
        compositor.render_pass();
        assert!(!compositor.is_animating());

        let calls = probe.calls();
        let BackendCall::ViewState(last) = calls.last().unwrap() else {
            panic!("expected a view update");
        };
        assert_eq!(last.pitch, TILTED_PITCH);
        assert_eq!(calls.len(), 2);
    }

    #[test]
    fn test_no_backend_calls_after_teardown() {
        let (mut compositor, probe) = settled();
        let t0 = Instant::now();
        compositor.play(t0);
        compositor.toggle_3d(t0);
        compositor.teardown();
        assert_eq!(probe.calls(), vec![BackendCall::Teardown]);

        assert!(!compositor.advance(t0 + Duration::from_secs(10)));
        assert!(!compositor.zoom_in());
        compositor.reset_view(t0);
        assert!(matches!(
            compositor.set_layer_opacity(AI_ANALYSIS, 0.2),
            Err(CompositorError::Disposed)
        ));
        assert!(compositor.render_pass().is_empty());
        assert!(!probe.click(GeoPoint::new(-10.895, -69.525)));
        assert!(!compositor.process_picks());
        compositor.teardown();

        assert_eq!(probe.calls(), vec![BackendCall::Teardown]);
        assert_eq!(probe.stale_calls(), 0);
        assert!(compositor.is_disposed());
    }

    #[test]
    fn test_drop_tears_down() {
        let (compositor, probe) = settled();
        drop(compositor);
        assert!(probe.is_torn_down());
        assert_eq!(probe.calls(), vec![BackendCall::Teardown]);
    }

    #[test]
    fn test_invalid_zones_are_dropped_from_config() {
        let (backend, _probe) = RecordingBackend::new();
        let triangle = vec![
            GeoPoint::new(0.0, 0.0),
            GeoPoint::new(0.0, 1.0),
            GeoPoint::new(1.0, 1.0),
        ];
        let config = CompositorConfig::default().with_analysis(vec![
            Zone::new("good", Classification::Degraded, triangle.clone()),
            Zone::new("thin", Classification::Healthy, triangle[..2].to_vec()),
            Zone::new("sure", Classification::Healthy, triangle).with_confidence(1.5),
        ]);
        let surface = config.container;
        let compositor = Compositor::new(config, backend, surface).unwrap();
        assert_eq!(compositor.zones().len(), 1);
        assert_eq!(compositor.summary().concern_areas, 1);
    }

    #[test]
    fn test_summary_and_badges() {
        let (compositor, _probe) = settled();
        let summary = compositor.summary();
        assert_eq!(summary.project_id, "BCR-001");
        assert_eq!(summary.healthy_areas, 2);
        assert_eq!(
            compositor.status().labels(),
            vec!["LIVE Satellite", "AI Analysis Active"]
        );
    }

    #[test]
    fn test_unknown_layer_is_reported() {
        let (mut compositor, _probe) = settled();
        assert!(matches!(
            compositor.set_layer_enabled("terrain", true),
            Err(CompositorError::Registry(RegistryError::UnknownLayer(_)))
        ));
    }
}
