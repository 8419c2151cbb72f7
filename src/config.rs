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

//! Application configuration management.
//!
//! Settings are stored as TOML through `confy`. Only startup settings live
//! here; the camera, layer toggles and playback position are never written
//! back, every session starts from the project defaults.

use std::error::Error;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use log::info;
use serde::{Deserialize, Serialize};
use zone_compositor::defaults::{DEFAULT_CENTER, DEFAULT_PROJECT_ID};
use zone_compositor::layers::AI_ANALYSIS;
use zone_compositor::{
    parse_analysis, parse_boundary, CompositorConfig, ContainerSize, GeoPoint, TimingConfig,
};

const APP_NAME: &str = "restoration-map";
const CONFIG_NAME: &str = "config";

/// Application configuration stored in TOML format
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AppConfig {
    /// Configuration schema version
    #[serde(default = "default_config_version")]
    pub config_version: u32,

    /// Project shown on startup
    #[serde(default = "default_project_id")]
    pub project_id: String,

    /// Override of the project center latitude
    #[serde(default)]
    pub center_latitude: Option<f64>,

    /// Override of the project center longitude
    #[serde(default)]
    pub center_longitude: Option<f64>,

    /// Window width in pixels
    #[serde(default = "default_window_width")]
    pub window_width: f32,

    /// Window height in pixels
    #[serde(default = "default_window_height")]
    pub window_height: f32,

    /// GeoJSON FeatureCollection with the project boundary
    #[serde(default)]
    pub boundary_path: Option<PathBuf>,

    /// GeoJSON FeatureCollection with the AI analysis zones
    #[serde(default)]
    pub analysis_path: Option<PathBuf>,

    /// AI overlay opacity on startup (0.0 - 1.0)
    #[serde(default = "default_ai_opacity")]
    pub ai_opacity: f64,

    /// Camera transition length in milliseconds
    #[serde(default = "default_transition_ms")]
    pub transition_ms: u64,

    /// Time-series playback interval in milliseconds
    #[serde(default = "default_playback_interval_ms")]
    pub playback_interval_ms: u64,

    /// Zoom change of the zoom buttons
    #[serde(default = "default_zoom_step")]
    pub zoom_step: f64,

    /// Zoom level of the home view
    #[serde(default = "default_initial_zoom")]
    pub initial_zoom: f64,
}

// Default value functions for serde
fn default_config_version() -> u32 {
    1
}

fn default_project_id() -> String {
    DEFAULT_PROJECT_ID.to_string()
}

fn default_window_width() -> f32 {
    1400.0
}

fn default_window_height() -> f32 {
    800.0
}

fn default_ai_opacity() -> f64 {
    0.7
}

fn default_transition_ms() -> u64 {
    1000
}

fn default_playback_interval_ms() -> u64 {
    2000
}

fn default_zoom_step() -> f64 {
    1.0
}

fn default_initial_zoom() -> f64 {
    13.0
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            config_version: default_config_version(),
            project_id: default_project_id(),
            center_latitude: None,
            center_longitude: None,
            window_width: default_window_width(),
            window_height: default_window_height(),
            boundary_path: None,
            analysis_path: None,
            ai_opacity: default_ai_opacity(),
            transition_ms: default_transition_ms(),
            playback_interval_ms: default_playback_interval_ms(),
            zoom_step: default_zoom_step(),
            initial_zoom: default_initial_zoom(),
        }
    }
}

impl AppConfig {
    /// Load configuration from disk
    pub fn load() -> Result<Self, confy::ConfyError> {
        confy::load(APP_NAME, CONFIG_NAME)
    }

    /// Get the config file path for display to user
    pub fn get_config_path() -> Result<PathBuf, confy::ConfyError> {
        confy::get_configuration_file_path(APP_NAME, CONFIG_NAME)
    }

    /// Apply command line overrides.
    #[must_use]
    pub fn with_overrides(
        mut self,
        project_id: Option<String>,
        boundary: Option<PathBuf>,
        analysis: Option<PathBuf>,
    ) -> Self {
        if let Some(project_id) = project_id {
            self.project_id = project_id;
        }
        if boundary.is_some() {
            self.boundary_path = boundary;
        }
        if analysis.is_some() {
            self.analysis_path = analysis;
        }
        self
    }

    /// Project center, falling back to the built-in project when either
    /// coordinate is missing.
    #[must_use]
    pub fn center(&self) -> GeoPoint {
        match (self.center_latitude, self.center_longitude) {
            (Some(lat), Some(lng)) => GeoPoint::new(lat, lng),
            _ => DEFAULT_CENTER,
        }
    }

    #[must_use]
    pub fn timing(&self) -> TimingConfig {
        TimingConfig {
            transition: Duration::from_millis(self.transition_ms),
            playback_interval: Duration::from_millis(self.playback_interval_ms),
            zoom_step: self.zoom_step,
            initial_zoom: self.initial_zoom,
        }
    }

    /// Build the compositor configuration, reading any GeoJSON inputs.
    pub fn compositor_config(&self) -> Result<CompositorConfig, Box<dyn Error>> {
        let mut config = CompositorConfig::default()
            .with_project_id(&self.project_id)
            .with_center(self.center())
            .with_container(ContainerSize::new(
                f64::from(self.window_width),
                f64::from(self.window_height),
            ))
            .with_timing(self.timing());

        if let Some(layer) = config.layers.iter_mut().find(|l| l.id == AI_ANALYSIS) {
            layer.opacity = self.ai_opacity.clamp(0.0, 1.0);
        }

        if let Some(path) = &self.boundary_path {
            let boundary = parse_boundary(&fs::read_to_string(path)?)?;
            info!(
                "Loaded {} boundary polygons from {}",
                boundary.polygons().len(),
                path.display()
            );
            config = config.with_boundary(boundary);
        }
        if let Some(path) = &self.analysis_path {
            let zones = parse_analysis(&fs::read_to_string(path)?)?;
            info!("Loaded {} analysis features from {}", zones.len(), path.display());
            config = config.with_analysis(zones);
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_use_defaults() {
        let config: AppConfig = serde_json::from_str(r#"{"project_id": "BCR-042"}"#).unwrap();
        assert_eq!(config.project_id, "BCR-042");
        assert_eq!(config.playback_interval_ms, 2000);
        assert_eq!(config.initial_zoom, 13.0);
        assert_eq!(config.ai_opacity, 0.7);
        assert!(config.boundary_path.is_none());
    }

    #[test]
    fn test_center_needs_both_coordinates() {
        let mut config = AppConfig {
            center_latitude: Some(1.0),
            ..AppConfig::default()
        };
        assert_eq!(config.center(), DEFAULT_CENTER);
        config.center_longitude = Some(2.0);
        assert_eq!(config.center(), GeoPoint::new(1.0, 2.0));
    }

    #[test]
    fn test_overrides() {
        let config = AppConfig::default().with_overrides(
            Some("BCR-007".to_string()),
            None,
            Some(PathBuf::from("zones.geojson")),
        );
        assert_eq!(config.project_id, "BCR-007");
        assert!(config.boundary_path.is_none());
        assert_eq!(config.analysis_path, Some(PathBuf::from("zones.geojson")));
    }

    #[test]
    fn test_compositor_config_without_files() {
        let config = AppConfig::default().compositor_config().unwrap();
        assert_eq!(config.project_id, "BCR-001");
        assert_eq!(config.timing.transition, Duration::from_secs(1));
        assert!(config.container.is_valid());
        let ai = config.layers.iter().find(|l| l.id == AI_ANALYSIS).unwrap();
        assert_eq!(ai.opacity, 0.7);
    }

    #[test]
    fn test_ai_opacity_is_clamped() {
        let config = AppConfig {
            ai_opacity: 3.0,
            ..AppConfig::default()
        };
        let config = config.compositor_config().unwrap();
        let ai = config.layers.iter().find(|l| l.id == AI_ANALYSIS).unwrap();
        assert_eq!(ai.opacity, 1.0);
    }

    #[test]
    fn test_missing_geojson_file_is_an_error() {
        let config = AppConfig::default().with_overrides(
            None,
            Some(PathBuf::from("/nonexistent/boundary.geojson")),
            None,
        );
        assert!(config.compositor_config().is_err());
    }
}
