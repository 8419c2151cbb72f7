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

//! Camera state and the viewport controller.
//!
//! [`ViewState`] is a plain value; [`ViewportController`] is the only thing
//! that mutates it. Animated transitions are driven by the host calling
//! [`ViewportController::advance`] with the current time, so the controller
//! never owns a timer of its own.

use std::time::{Duration, Instant};

use log::debug;
use serde::Serialize;

use crate::geo::{lerp, lerp_bearing, normalize_bearing, GeoPoint, MAX_PAN_LATITUDE};

/// Upper pitch limit in degrees.
pub const MAX_PITCH: f64 = 60.0;
/// Pitch used by the tilted 3D view.
pub const TILTED_PITCH: f64 = 60.0;
/// Bearing used by the tilted 3D view.
pub const TILTED_BEARING: f64 = -17.6;

/// Projection mode of the camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum ViewMode {
    /// Top-down, north-up.
    #[default]
    TwoD,
    /// Tilted and possibly rotated.
    ThreeD,
}

impl ViewMode {
    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            Self::TwoD => Self::ThreeD,
            Self::ThreeD => Self::TwoD,
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::TwoD => "2D",
            Self::ThreeD => "3D",
        }
    }
}

/// Zoom range supported by a rendering backend.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ZoomBounds {
    pub min: f64,
    pub max: f64,
}

impl Default for ZoomBounds {
    fn default() -> Self {
        Self { min: 0.0, max: 22.0 }
    }
}

impl ZoomBounds {
    #[must_use]
    pub fn clamp(&self, zoom: f64) -> f64 {
        zoom.clamp(self.min, self.max)
    }
}

/// Camera parameters.
///
/// Invariant: `mode == TwoD` implies `pitch == 0 && bearing == 0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ViewState {
    pub center: GeoPoint,
    pub zoom: f64,
    pub pitch: f64,
    pub bearing: f64,
    pub mode: ViewMode,
}

impl ViewState {
    /// A north-up 2D view.
    #[must_use]
    pub fn flat(center: GeoPoint, zoom: f64) -> Self {
        Self {
            center,
            zoom,
            pitch: 0.0,
            bearing: 0.0,
            mode: ViewMode::TwoD,
        }
    }

    #[must_use]
    pub fn is_3d(&self) -> bool {
        self.mode == ViewMode::ThreeD
    }
}

/// Pitch/bearing channel of a transition, with the mode it lands in.
#[derive(Debug, Clone, Copy)]
struct TiltChannel {
    pitch: (f64, f64),
    bearing: (f64, f64),
    target_mode: ViewMode,
}

/// An in-flight camera animation. Channels set to `None` are left alone.
#[derive(Debug, Clone, Copy)]
struct CameraTransition {
    started_at: Instant,
    duration: Duration,
    center: Option<(GeoPoint, GeoPoint)>,
    zoom: Option<(f64, f64)>,
    tilt: Option<TiltChannel>,
}

impl CameraTransition {
    fn progress(&self, now: Instant) -> f64 {
        if self.duration.is_zero() {
            return 1.0;
        }
        let elapsed = now.saturating_duration_since(self.started_at);
        (elapsed.as_secs_f64() / self.duration.as_secs_f64()).clamp(0.0, 1.0)
    }
}

/// Cubic ease-in-out used for camera transitions.
fn ease(t: f64) -> f64 {
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}

/// Owns the [`ViewState`] and applies camera operations to it.
///
/// At most one transition is active. Starting a new one first samples the
/// active transition at `now` and then replaces it, so elapsed progress is
/// kept and only the old target is discarded.
#[derive(Debug, Clone)]
pub struct ViewportController {
    state: ViewState,
    home_center: GeoPoint,
    home_zoom: f64,
    bounds: ZoomBounds,
    transition_duration: Duration,
    zoom_step: f64,
    transition: Option<CameraTransition>,
    target_mode: ViewMode,
}

impl ViewportController {
    #[must_use]
    pub fn new(
        home_center: GeoPoint,
        home_zoom: f64,
        bounds: ZoomBounds,
        transition_duration: Duration,
        zoom_step: f64,
    ) -> Self {
        let home_zoom = bounds.clamp(home_zoom);
        Self {
            state: ViewState::flat(home_center, home_zoom),
            home_center,
            home_zoom,
            bounds,
            transition_duration,
            zoom_step,
            transition: None,
            target_mode: ViewMode::TwoD,
        }
    }

    #[must_use]
    pub fn state(&self) -> &ViewState {
        &self.state
    }

    /// Mode the camera is in or heading towards.
    #[must_use]
    pub fn target_mode(&self) -> ViewMode {
        self.target_mode
    }

    #[must_use]
    pub fn bounds(&self) -> ZoomBounds {
        self.bounds
    }

    #[must_use]
    pub fn is_animating(&self) -> bool {
        self.transition.is_some()
    }

    /// Jump to a new center. Returns `true` if the view changed.
    pub fn set_center(&mut self, lat: f64, lng: f64) -> bool {
        let center = GeoPoint::new(lat.clamp(-MAX_PAN_LATITUDE, MAX_PAN_LATITUDE), lng);
        if !center.is_finite() {
            return false;
        }
        if let Some(transition) = self.transition.as_mut() {
            transition.center = None;
        }
        if self.state.center == center {
            return false;
        }
        self.state.center = center;
        true
    }

    /// Shift the center by a delta in degrees.
    pub fn pan_by(&mut self, d_lat: f64, d_lng: f64) -> bool {
        let center = self.state.center;
        self.set_center(center.lat + d_lat, center.lng + d_lng)
    }

    /// Jump to a zoom level, clamped into the backend bounds.
    pub fn set_zoom(&mut self, zoom: f64) -> bool {
        if zoom.is_nan() {
            return false;
        }
        if let Some(transition) = self.transition.as_mut() {
            transition.zoom = None;
        }
        let zoom = self.bounds.clamp(zoom);
        if (self.state.zoom - zoom).abs() < f64::EPSILON {
            return false;
        }
        self.state.zoom = zoom;
        true
    }

    pub fn zoom_in(&mut self) -> bool {
        self.set_zoom(self.state.zoom + self.zoom_step)
    }

    pub fn zoom_out(&mut self) -> bool {
        self.set_zoom(self.state.zoom - self.zoom_step)
    }

    /// Jump to a pitch in `[0, 60]`. A non-zero pitch puts the camera in 3D.
    pub fn set_pitch(&mut self, pitch: f64) -> bool {
        if pitch.is_nan() {
            return false;
        }
        self.drop_tilt_channel();
        let pitch = pitch.clamp(0.0, MAX_PITCH);
        if (self.state.pitch - pitch).abs() < f64::EPSILON {
            return false;
        }
        self.state.pitch = pitch;
        self.promote_to_3d_if_tilted();
        true
    }

    /// Jump to a bearing. A non-zero bearing puts the camera in 3D.
    pub fn set_bearing(&mut self, bearing: f64) -> bool {
        if !bearing.is_finite() {
            return false;
        }
        self.drop_tilt_channel();
        let bearing = normalize_bearing(bearing);
        if (self.state.bearing - bearing).abs() < f64::EPSILON {
            return false;
        }
        self.state.bearing = bearing;
        self.promote_to_3d_if_tilted();
        true
    }

    /// Animate between the flat view and the tilted 3D view.
    pub fn toggle_3d(&mut self, now: Instant) {
        self.advance(now);

        let target_mode = self.target_mode.toggled();
        let (pitch, bearing) = match target_mode {
            ViewMode::ThreeD => (TILTED_PITCH, TILTED_BEARING),
            ViewMode::TwoD => (0.0, 0.0),
        };
        debug!("Camera transition to {} view", target_mode.label());

        self.start(CameraTransition {
            started_at: now,
            duration: self.transition_duration,
            center: None,
            zoom: None,
            tilt: Some(TiltChannel {
                pitch: (self.state.pitch, pitch),
                bearing: (self.state.bearing, bearing),
                target_mode,
            }),
        });
    }

    /// Animate back to the initial center and zoom in 2D.
    pub fn reset_view(&mut self, now: Instant) {
        self.advance(now);
        debug!("Camera transition to home view");

        self.start(CameraTransition {
            started_at: now,
            duration: self.transition_duration,
            center: Some((self.state.center, self.home_center)),
            zoom: Some((self.state.zoom, self.home_zoom)),
            tilt: Some(TiltChannel {
                pitch: (self.state.pitch, 0.0),
                bearing: (self.state.bearing, 0.0),
                target_mode: ViewMode::TwoD,
            }),
        });
    }

    /// Drop any in-flight transition where it currently stands.
    pub fn cancel_transition(&mut self) {
        if self.transition.take().is_some() {
            debug!("Camera transition cancelled");
        }
    }

    /// Sample the active transition at `now`. Returns `true` if the view changed.
    pub fn advance(&mut self, now: Instant) -> bool {
        let Some(transition) = self.transition else {
            return false;
        };

        let before = self.state;
        let t = transition.progress(now);
        let done = t >= 1.0;
        let eased = ease(t);

        if let Some((from, to)) = transition.center {
            self.state.center = if done { to } else { from.lerp(to, eased) };
        }
        if let Some((from, to)) = transition.zoom {
            self.state.zoom = if done { to } else { lerp(from, to, eased) };
        }
        if let Some(tilt) = transition.tilt {
            if done {
                self.state.pitch = tilt.pitch.1;
                self.state.bearing = tilt.bearing.1;
                self.state.mode = tilt.target_mode;
            } else {
                self.state.pitch = lerp(tilt.pitch.0, tilt.pitch.1, eased);
                self.state.bearing = lerp_bearing(tilt.bearing.0, tilt.bearing.1, eased);
            }
        }

        if done {
            self.transition = None;
        }
        self.state != before
    }

    fn start(&mut self, transition: CameraTransition) {
        if let Some(tilt) = transition.tilt {
            self.target_mode = tilt.target_mode;
            // Entering 3D is immediate; leaving it waits until pitch and bearing land at zero.
            if tilt.target_mode == ViewMode::ThreeD {
                self.state.mode = ViewMode::ThreeD;
            }
        }
        self.transition = Some(transition);
        if transition.duration.is_zero() {
            self.advance(transition.started_at);
        }
    }

    fn drop_tilt_channel(&mut self) {
        if let Some(transition) = self.transition.as_mut() {
            if transition.tilt.take().is_some() {
                self.target_mode = self.state.mode;
            }
        }
    }

    fn promote_to_3d_if_tilted(&mut self) {
        if self.state.pitch != 0.0 || self.state.bearing != 0.0 {
            self.state.mode = ViewMode::ThreeD;
            self.target_mode = ViewMode::ThreeD;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECOND: Duration = Duration::from_millis(1000);

    fn controller() -> ViewportController {
        ViewportController::new(
            GeoPoint::new(-10.9, -69.53),
            13.0,
            ZoomBounds::default(),
            SECOND,
            1.0,
        )
    }

    fn assert_invariant(state: &ViewState) {
        if state.mode == ViewMode::TwoD {
            assert_eq!(state.pitch, 0.0);
            assert_eq!(state.bearing, 0.0);
        }
    }

    #[test]
    fn test_initial_state_is_flat() {
        let viewport = controller();
        let state = viewport.state();
        assert_eq!(state.mode, ViewMode::TwoD);
        assert_eq!(state.zoom, 13.0);
        assert_invariant(state);
    }

    #[test]
    fn test_set_zoom_clamps_and_detects_no_op() {
        let mut viewport = controller();
        assert!(viewport.set_zoom(40.0));
        assert_eq!(viewport.state().zoom, 22.0);
        assert!(!viewport.set_zoom(30.0));
        assert!(viewport.set_zoom(-3.0));
        assert_eq!(viewport.state().zoom, 0.0);
        assert!(!viewport.set_zoom(f64::NAN));
    }

    #[test]
    fn test_zoom_steps_are_clamped() {
        let mut viewport = controller();
        assert!(viewport.zoom_in());
        assert_eq!(viewport.state().zoom, 14.0);
        viewport.set_zoom(21.5);
        assert!(viewport.zoom_in());
        assert_eq!(viewport.state().zoom, 22.0);
        assert!(!viewport.zoom_in());
    }

    #[test]
    fn test_set_center_no_op_when_unchanged() {
        let mut viewport = controller();
        assert!(!viewport.set_center(-10.9, -69.53));
        assert!(viewport.set_center(1.0, 2.0));
        assert_eq!(viewport.state().center, GeoPoint::new(1.0, 2.0));
    }

    #[test]
    fn test_toggle_3d_animates_to_tilted_view() {
        let mut viewport = controller();
        let start = Instant::now();
        viewport.toggle_3d(start);

        assert_eq!(viewport.state().mode, ViewMode::ThreeD);
        assert!(viewport.is_animating());

        viewport.advance(start + SECOND / 2);
        let mid = *viewport.state();
        assert!(mid.pitch > 0.0 && mid.pitch < TILTED_PITCH);

        viewport.advance(start + SECOND);
        assert!(!viewport.is_animating());
        assert_eq!(viewport.state().pitch, TILTED_PITCH);
        assert_eq!(viewport.state().bearing, TILTED_BEARING);
    }

    #[test]
    fn test_toggle_3d_twice_restores_exactly() {
        let mut viewport = controller();
        let before = *viewport.state();
        let start = Instant::now();

        viewport.toggle_3d(start);
        viewport.advance(start + SECOND);
        viewport.toggle_3d(start + SECOND);
        viewport.advance(start + SECOND * 2);

        let after = viewport.state();
        assert_eq!(after.pitch, before.pitch);
        assert_eq!(after.bearing, before.bearing);
        assert_eq!(after.mode, ViewMode::TwoD);
    }

    #[test]
    fn test_toggle_mid_animation_restarts_from_current_value() {
        let mut viewport = controller();
        let start = Instant::now();

        viewport.toggle_3d(start);
        viewport.toggle_3d(start + SECOND / 2);
        let reversed_from = viewport.state().pitch;
        assert!(reversed_from > 0.0 && reversed_from < TILTED_PITCH);

        // Still 3D while pitch is non-zero on the way back.
        viewport.advance(start + SECOND);
        assert_eq!(viewport.state().mode, ViewMode::ThreeD);
        assert!(viewport.state().pitch <= reversed_from);
        assert_invariant(viewport.state());

        viewport.advance(start + SECOND / 2 + SECOND);
        assert_eq!(viewport.state().pitch, 0.0);
        assert_eq!(viewport.state().mode, ViewMode::TwoD);
        assert!(!viewport.is_animating());
    }

    #[test]
    fn test_reset_view_returns_home_in_2d() {
        let mut viewport = controller();
        let start = Instant::now();
        viewport.set_center(0.0, 0.0);
        viewport.set_zoom(5.0);
        viewport.toggle_3d(start);
        viewport.advance(start + SECOND);

        viewport.reset_view(start + SECOND);
        assert_eq!(viewport.target_mode(), ViewMode::TwoD);
        viewport.advance(start + SECOND * 2);

        let state = viewport.state();
        assert_eq!(state.center, GeoPoint::new(-10.9, -69.53));
        assert_eq!(state.zoom, 13.0);
        assert_eq!(state.mode, ViewMode::TwoD);
        assert_invariant(state);
    }

    #[test]
    fn test_set_zoom_during_reset_keeps_user_zoom() {
        let mut viewport = controller();
        let start = Instant::now();
        viewport.set_zoom(5.0);
        viewport.reset_view(start);
        viewport.set_zoom(8.0);
        viewport.advance(start + SECOND);
        assert_eq!(viewport.state().zoom, 8.0);
    }

    #[test]
    fn test_pitch_clamps_and_switches_mode() {
        let mut viewport = controller();
        assert!(viewport.set_pitch(75.0));
        assert_eq!(viewport.state().pitch, MAX_PITCH);
        assert_eq!(viewport.state().mode, ViewMode::ThreeD);
        assert!(!viewport.set_pitch(90.0));
    }

    #[test]
    fn test_bearing_transition_takes_short_arc() {
        let mut viewport = controller();
        let start = Instant::now();
        assert!(viewport.set_bearing(170.0));

        // Head back to 2D, then turn around right away towards the tilted view
        viewport.toggle_3d(start);
        let turn = start + Duration::from_millis(1);
        viewport.toggle_3d(turn);
        assert_eq!(viewport.target_mode(), ViewMode::ThreeD);

        for step in 1..=10 {
            viewport.advance(turn + SECOND * step / 10);
            let bearing = viewport.state().bearing;
            assert!(bearing > -180.0 && bearing <= 180.0);
            assert!(
                !(bearing > -17.0 && bearing < 169.0),
                "bearing {bearing} went the long way round"
            );
        }
        assert_eq!(viewport.state().bearing, TILTED_BEARING);
    }

    #[test]
    fn test_custom_zoom_bounds() {
        let bounds = ZoomBounds { min: 5.0, max: 15.0 };
        let mut viewport =
            ViewportController::new(GeoPoint::new(0.0, 0.0), 18.0, bounds, SECOND, 1.0);
        assert_eq!(viewport.bounds(), bounds);
        assert_eq!(viewport.state().zoom, 15.0);
        assert!(!viewport.zoom_in());
        assert!(viewport.set_zoom(1.0));
        assert_eq!(viewport.state().zoom, 5.0);
    }

    #[test]
    fn test_zero_duration_applies_immediately() {
        let mut viewport = ViewportController::new(
            GeoPoint::new(0.0, 0.0),
            13.0,
            ZoomBounds::default(),
            Duration::ZERO,
            1.0,
        );
        viewport.toggle_3d(Instant::now());
        assert!(!viewport.is_animating());
        assert_eq!(viewport.state().pitch, TILTED_PITCH);
    }
}
