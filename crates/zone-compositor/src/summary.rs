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

//! Read-only digests of compositor state for the surrounding UI.

use serde::Serialize;

use crate::zones::ZoneStore;

/// Zone counts and confidence for the summary card.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisSummary {
    pub project_id: String,
    /// Healthy and restored zones.
    pub healthy_areas: usize,
    /// Concern and degraded zones.
    pub concern_areas: usize,
    /// Mean zone confidence, `None` without zones.
    pub mean_confidence: Option<f64>,
}

impl AnalysisSummary {
    #[must_use]
    pub fn from_zones(project_id: &str, zones: &ZoneStore) -> Self {
        let healthy_areas = zones
            .iter()
            .filter(|z| z.classification.is_healthy())
            .count();
        let concern_areas = zones
            .iter()
            .filter(|z| z.classification.is_concern())
            .count();

        #[allow(clippy::cast_precision_loss, reason = "zone counts are small")]
        let mean_confidence = (!zones.is_empty())
            .then(|| zones.iter().map(|z| z.confidence).sum::<f64>() / zones.len() as f64);

        Self {
            project_id: project_id.to_string(),
            healthy_areas,
            concern_areas,
            mean_confidence,
        }
    }

    /// Rounded percentage, e.g. `91%`.
    #[must_use]
    pub fn confidence_label(&self) -> String {
        match self.mean_confidence {
            Some(c) => format!("{:.0}%", (c * 100.0).round()),
            None => "n/a".to_string(),
        }
    }
}

/// Which status badges the map shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct StatusBadges {
    pub live_satellite: bool,
    pub ai_analysis_active: bool,
    pub view_3d: bool,
}

impl StatusBadges {
    /// Labels of the active badges, top to bottom.
    #[must_use]
    pub fn labels(&self) -> Vec<&'static str> {
        let mut labels = Vec::with_capacity(3);
        if self.live_satellite {
            labels.push("LIVE Satellite");
        }
        if self.ai_analysis_active {
            labels.push("AI Analysis Active");
        }
        if self.view_3d {
            labels.push("3D View");
        }
        labels
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults::default_zones;

    #[test]
    fn test_summary_of_default_zones() {
        let mut zones = ZoneStore::new();
        zones.register_all(default_zones());
        let summary = AnalysisSummary::from_zones("BCR-001", &zones);
        assert_eq!(summary.healthy_areas, 2);
        assert_eq!(summary.concern_areas, 1);
        assert_eq!(summary.confidence_label(), "91%");
    }

    #[test]
    fn test_empty_summary() {
        let summary = AnalysisSummary::from_zones("X", &ZoneStore::new());
        assert_eq!(summary.mean_confidence, None);
        assert_eq!(summary.confidence_label(), "n/a");
    }

    #[test]
    fn test_badge_labels() {
        let badges = StatusBadges {
            live_satellite: true,
            ai_analysis_active: false,
            view_3d: true,
        };
        assert_eq!(badges.labels(), vec!["LIVE Satellite", "3D View"]);
    }
}
