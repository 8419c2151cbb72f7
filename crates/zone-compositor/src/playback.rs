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

//! Time-series playback through project milestones.
//!
//! The controller owns no timer. The host calls [`PlaybackController::advance`]
//! with the current time and the controller fires whatever ticks are due.
//! A paused controller has no pending deadline, so nothing scheduled before
//! the pause can fire after it.

use std::time::{Duration, Instant};

use chrono::{Datelike, NaiveDate};
use log::{debug, info, warn};
use serde::Serialize;

/// Shortest tick interval accepted; zero would spin.
const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// A dated milestone in the project history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimeSeriesFrame {
    pub date: NaiveDate,
    pub description: String,
}

impl TimeSeriesFrame {
    #[must_use]
    pub fn new(date: NaiveDate, description: &str) -> Self {
        Self {
            date,
            description: description.to_string(),
        }
    }

    /// Frame dated the first day of a year and month. `None` for an invalid month.
    #[must_use]
    pub fn from_year_month(year: i32, month: u32, description: &str) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(|date| Self::new(date, description))
    }

    /// Year-month label, e.g. `2020-01`.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{:04}-{:02}", self.date.year(), self.date.month())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PlaybackPhase {
    Stopped,
    Playing,
}

/// Steps through a fixed frame sequence on a recurring interval.
#[derive(Debug, Clone)]
pub struct PlaybackController {
    frames: Vec<TimeSeriesFrame>,
    current_index: usize,
    phase: PlaybackPhase,
    interval: Duration,
    next_tick: Option<Instant>,
}

impl PlaybackController {
    #[must_use]
    pub fn new(frames: Vec<TimeSeriesFrame>, interval: Duration) -> Self {
        Self {
            frames,
            current_index: 0,
            phase: PlaybackPhase::Stopped,
            interval: interval.max(MIN_INTERVAL),
            next_tick: None,
        }
    }

    #[must_use]
    pub fn frames(&self) -> &[TimeSeriesFrame] {
        &self.frames
    }

    #[must_use]
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current_index
    }

    #[must_use]
    pub fn current_frame(&self) -> Option<&TimeSeriesFrame> {
        self.frames.get(self.current_index)
    }

    #[must_use]
    pub fn phase(&self) -> PlaybackPhase {
        self.phase
    }

    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.phase == PlaybackPhase::Playing
    }

    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Deadline of the next tick while playing.
    #[must_use]
    pub fn next_tick(&self) -> Option<Instant> {
        self.next_tick
    }

    /// Start playing. Calling it while already playing keeps the existing
    /// schedule. Returns `true` if the phase changed.
    pub fn play(&mut self, now: Instant) -> bool {
        if self.is_playing() {
            return false;
        }
        if self.frames.is_empty() {
            warn!("Playback requested with no time-series frames");
            return false;
        }
        self.phase = PlaybackPhase::Playing;
        self.next_tick = Some(now + self.interval);
        info!(
            "Playback started at frame {}/{}",
            self.current_index + 1,
            self.frames.len()
        );
        true
    }

    /// Stop playing and drop the pending tick. Returns `true` if the phase changed.
    pub fn pause(&mut self) -> bool {
        self.next_tick = None;
        if !self.is_playing() {
            return false;
        }
        self.phase = PlaybackPhase::Stopped;
        info!("Playback paused at frame {}", self.current_index + 1);
        true
    }

    /// Flip between playing and paused.
    pub fn toggle(&mut self, now: Instant) {
        if self.is_playing() {
            self.pause();
        } else {
            self.play(now);
        }
    }

    /// Return to the first frame without touching the phase or the schedule.
    /// Returns `true` if the index changed.
    pub fn reset(&mut self) -> bool {
        let changed = self.current_index != 0;
        self.current_index = 0;
        if changed {
            debug!("Playback reset to first frame");
        }
        changed
    }

    /// Fire every tick due at `now`. Returns the number of ticks fired.
    ///
    /// Ticks missed because the host was late are all applied, so the index
    /// after `n` ticks is always `n mod frame_count` from where it started.
    pub fn advance(&mut self, now: Instant) -> u64 {
        let Some(deadline) = self.next_tick else {
            return 0;
        };
        if now < deadline || self.frames.is_empty() {
            return 0;
        }

        let late = now.duration_since(deadline).as_nanos();
        let ticks = 1 + late / self.interval.as_nanos();
        let frame_count = self.frames.len() as u128;
        let step = usize::try_from(ticks % frame_count).unwrap_or(0);
        self.current_index = (self.current_index + step) % self.frames.len();

        let ticks = u64::try_from(ticks).unwrap_or(u64::MAX);
        let elapsed = self
            .interval
            .checked_mul(u32::try_from(ticks).unwrap_or(u32::MAX))
            .unwrap_or(Duration::MAX);
        self.next_tick = deadline.checked_add(elapsed).or(Some(now + self.interval));

        debug!(
            "Playback tick x{ticks}, now at frame {}/{}",
            self.current_index + 1,
            self.frames.len()
        );
        ticks
    }

    /// Cancel any pending tick and stop. Used on teardown.
    pub fn cancel(&mut self) {
        self.next_tick = None;
        self.phase = PlaybackPhase::Stopped;
    }
}
