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

//! The boundary between the compositor and whatever draws the map.
//!
//! A backend is initialised once with a surface, receives only the deltas
//! of each render pass, reports clicks through a pick callback and is torn
//! down exactly once. The compositor is the only caller.

mod recording;

pub use recording::{BackendCall, RecordingBackend, RecordingProbe};

use thiserror::Error;

use crate::boundary::{BoundaryPolygon, BoundaryStyle};
use crate::geo::GeoPoint;
use crate::layers::Layer;
use crate::view::{ViewState, ZoomBounds};
use crate::zones::{Zone, ZoneStyle};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BackendError {
    #[error("invalid rendering surface: {0}")]
    InvalidSurface(String),

    #[error("rendering surface is already bound to a backend")]
    SurfaceInUse,
}

/// Opaque token returned by [`RenderBackend::init`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BackendHandle(u64);

impl BackendHandle {
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn id(self) -> u64 {
        self.0
    }
}

/// Called by the backend with the geographic position of a click.
pub type PickCallback = Box<dyn FnMut(GeoPoint)>;

/// A zone whose resolved style changed since the last render pass.
#[derive(Debug, Clone, Copy)]
pub struct ZoneUpdate<'a> {
    pub zone: &'a Zone,
    pub style: ZoneStyle,
}

/// A rendering surface driven by the compositor.
///
/// Apply methods receive only what changed since the previous pass and must
/// tolerate being called with a value they already show.
pub trait RenderBackend {
    /// Whatever the backend draws into.
    type Surface;

    /// Bind to `surface` showing `initial`. Failure is not retried.
    fn init(
        &mut self,
        surface: Self::Surface,
        initial: &ViewState,
    ) -> Result<BackendHandle, BackendError>;

    /// Zoom range the backend can display.
    fn zoom_bounds(&self) -> ZoomBounds {
        ZoomBounds::default()
    }

    fn apply_view_state(&mut self, handle: BackendHandle, view: &ViewState);

    fn apply_layer_diff(&mut self, handle: BackendHandle, layers: &[Layer]);

    fn apply_zone_diff(&mut self, handle: BackendHandle, zones: &[ZoneUpdate<'_>]);

    fn apply_boundary(
        &mut self,
        handle: BackendHandle,
        polygons: &[BoundaryPolygon],
        style: &BoundaryStyle,
    );

    /// Register the click callback. Called once, right after `init`.
    fn on_pick(&mut self, handle: BackendHandle, callback: PickCallback);

    /// Release everything bound to `handle`. No call on `handle` follows.
    fn teardown(&mut self, handle: BackendHandle);
}
