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

//! Construction parameters for a [`Compositor`](crate::Compositor).
//!
//! Everything here is fixed for the lifetime of a compositor.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::boundary::ProjectBoundary;
use crate::defaults::{
    default_frames, default_layers, DEFAULT_CENTER, DEFAULT_PROJECT_ID,
};
use crate::geo::GeoPoint;
use crate::layers::Layer;
use crate::playback::TimeSeriesFrame;
use crate::zones::Zone;

/// Pixel size of the map container.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContainerSize {
    pub width: f64,
    pub height: f64,
}

impl ContainerSize {
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Both sides are finite and positive.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

impl Default for ContainerSize {
    fn default() -> Self {
        Self::new(1280.0, 600.0)
    }
}

/// Durations and steps of the animated behaviour.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimingConfig {
    /// Length of camera transitions (3D toggle, reset).
    pub transition: Duration,
    /// Interval between playback ticks.
    pub playback_interval: Duration,
    /// Zoom delta of one zoom-in/zoom-out step.
    pub zoom_step: f64,
    /// Zoom level of the home view.
    pub initial_zoom: f64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            transition: Duration::from_millis(1000),
            playback_interval: Duration::from_millis(2000),
            zoom_step: 1.0,
            initial_zoom: 13.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CompositorConfig {
    pub project_id: String,
    /// Home center of the camera.
    pub center: GeoPoint,
    pub container: ContainerSize,
    pub timing: TimingConfig,
    pub layers: Vec<Layer>,
    /// Boundary to draw; the built-in boundary when `None`.
    pub boundary: Option<ProjectBoundary>,
    /// Analysis zones; the built-in zones when `None`.
    pub analysis: Option<Vec<Zone>>,
    pub frames: Vec<TimeSeriesFrame>,
}

impl Default for CompositorConfig {
    fn default() -> Self {
        Self {
            project_id: DEFAULT_PROJECT_ID.to_string(),
            center: DEFAULT_CENTER,
            container: ContainerSize::default(),
            timing: TimingConfig::default(),
            layers: default_layers(),
            boundary: None,
            analysis: None,
            frames: default_frames(),
        }
    }
}

impl CompositorConfig {
    #[must_use]
    pub fn with_project_id(mut self, project_id: &str) -> Self {
        self.project_id = project_id.to_string();
        self
    }

    #[must_use]
    pub fn with_center(mut self, center: GeoPoint) -> Self {
        self.center = center;
        self
    }

    #[must_use]
    pub fn with_container(mut self, container: ContainerSize) -> Self {
        self.container = container;
        self
    }

    #[must_use]
    pub fn with_timing(mut self, timing: TimingConfig) -> Self {
        self.timing = timing;
        self
    }

    #[must_use]
    pub fn with_boundary(mut self, boundary: ProjectBoundary) -> Self {
        self.boundary = Some(boundary);
        self
    }

    #[must_use]
    pub fn with_analysis(mut self, zones: Vec<Zone>) -> Self {
        self.analysis = Some(zones);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_project() {
        let config = CompositorConfig::default();
        assert_eq!(config.project_id, "BCR-001");
        assert_eq!(config.center, GeoPoint::new(-10.9, -69.53));
        assert_eq!(config.timing.initial_zoom, 13.0);
        assert_eq!(config.timing.playback_interval, Duration::from_secs(2));
        assert_eq!(config.frames.len(), 5);
        assert!(config.analysis.is_none());
    }

    #[test]
    fn test_container_validity() {
        assert!(ContainerSize::new(800.0, 600.0).is_valid());
        assert!(!ContainerSize::new(0.0, 600.0).is_valid());
        assert!(!ContainerSize::new(800.0, -1.0).is_valid());
        assert!(!ContainerSize::new(f64::NAN, 600.0).is_valid());
        assert!(!ContainerSize::new(f64::INFINITY, 600.0).is_valid());
    }
}
