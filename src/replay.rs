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

//! Headless replay.
//!
//! Drives a compositor against the recording backend from a tokio interval,
//! playing a scripted sequence of user interactions and logging every backend
//! call. Useful for checking layer and camera behavior without a window.

use std::error::Error;
use std::time::{Duration, Instant};

use log::{info, warn};
use zone_compositor::{
    Compositor, CompositorConfig, CompositorError, GeoPoint, RecordingBackend, RecordingProbe,
};

use crate::ui::ControlAction;

/// Frame loop period of the replay.
pub const TICK: Duration = Duration::from_millis(100);

/// Center of the first default analysis zone.
const HEALTHY_ZONE_POINT: GeoPoint = GeoPoint::new(-10.895, -69.525);

/// One scripted interaction.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplayStep {
    Action(ControlAction),
    Click(GeoPoint),
}

/// Interactions keyed by their offset from the start of the replay.
pub fn default_script() -> Vec<(Duration, ReplayStep)> {
    let at = Duration::from_millis;
    vec![
        (at(500), ReplayStep::Action(ControlAction::TogglePlayback)),
        (at(1_000), ReplayStep::Click(HEALTHY_ZONE_POINT)),
        (at(2_000), ReplayStep::Action(ControlAction::Toggle3d)),
        (at(3_500), ReplayStep::Click(GeoPoint::new(0.0, 0.0))),
        (at(4_000), ReplayStep::Action(ControlAction::SetOverlayOpacity(0.9))),
        (at(5_000), ReplayStep::Action(ControlAction::SwitchBase("osm".to_string()))),
        (at(6_000), ReplayStep::Action(ControlAction::SetOverlayVisible(false))),
        (at(7_000), ReplayStep::Action(ControlAction::SetOverlayVisible(true))),
        (at(8_000), ReplayStep::Action(ControlAction::ResetView)),
        (at(9_000), ReplayStep::Action(ControlAction::SwitchBase("satellite".to_string()))),
        (at(10_000), ReplayStep::Action(ControlAction::TogglePlayback)),
        (at(11_000), ReplayStep::Action(ControlAction::ResetPlayback)),
    ]
}

pub fn apply_step(
    compositor: &mut Compositor<RecordingBackend>,
    probe: &RecordingProbe,
    step: &ReplayStep,
    now: Instant,
) -> Result<(), CompositorError> {
    match step {
        ReplayStep::Action(action) => action.apply(compositor, now),
        ReplayStep::Click(point) => {
            if !probe.click(*point) {
                warn!("Click at {point:?} dropped, no pick handler");
            }
            Ok(())
        }
    }
}

/// Outcome of a replay run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayReport {
    pub ticks: u64,
    pub render_passes: u64,
    pub backend_calls: usize,
    pub stale_calls: usize,
    pub final_selection: Option<String>,
}

/// Run `script` for `duration`, ticking every `tick`.
pub async fn run_replay(
    config: CompositorConfig,
    script: Vec<(Duration, ReplayStep)>,
    duration: Duration,
    tick: Duration,
) -> Result<ReplayReport, Box<dyn Error>> {
    let (backend, probe) = RecordingBackend::new();
    let surface = config.container;
    let mut compositor = Compositor::new(config, backend.with_logging(true), surface)?;
    info!(
        "Replaying {} steps over {:.1}s for project {}",
        script.len(),
        duration.as_secs_f64(),
        compositor.project_id()
    );

    let mut interval = tokio::time::interval(tick);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    let started = Instant::now();
    let mut pending = script.into_iter().peekable();
    let mut ticks = 0;
    let mut last_selection = None;

    loop {
        tokio::select! {
            instant = interval.tick() => {
                let now = instant.into_std();
                ticks += 1;

                while let Some((_, step)) =
                    pending.next_if(|(offset, _)| now.saturating_duration_since(started) >= *offset)
                {
                    info!("Step: {step:?}");
                    if let Err(e) = apply_step(&mut compositor, &probe, &step, now) {
                        warn!("Step {step:?} failed: {e}");
                    }
                }

                compositor.process_picks();
                compositor.advance(now);
                compositor.render_pass();

                let selection = compositor.selection().cloned();
                if selection != last_selection {
                    match &selection {
                        Some(hit) => info!("Selection: {}", serde_json::to_string(hit)?),
                        None => info!("Selection: none"),
                    }
                    last_selection = selection;
                }

                if now.saturating_duration_since(started) >= duration {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Replay interrupted");
                break;
            }
        }
    }

    let summary = compositor.summary();
    info!(
        "Summary {}: {} healthy, {} of concern, confidence {}",
        summary.project_id,
        summary.healthy_areas,
        summary.concern_areas,
        summary.confidence_label()
    );

    let render_passes = compositor.render_passes();
    let final_selection = compositor.selection().map(|hit| hit.zone.zone_id.clone());
    compositor.teardown();

    let report = ReplayReport {
        ticks,
        render_passes,
        backend_calls: probe.call_count(),
        stale_calls: probe.stale_calls(),
        final_selection,
    };
    info!("Replay finished: {report:?}");
    Ok(report)
}
