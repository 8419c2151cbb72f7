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

//! A backend that draws nothing and records every call it receives.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use log::{debug, info, warn};

use super::{BackendError, BackendHandle, PickCallback, RenderBackend, ZoneUpdate};
use crate::boundary::{BoundaryPolygon, BoundaryStyle};
use crate::config::ContainerSize;
use crate::geo::GeoPoint;
use crate::layers::Layer;
use crate::view::{ViewState, ZoomBounds};
use crate::zones::ZoneStyle;

/// One recorded backend call.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    Init(ViewState),
    ViewState(ViewState),
    /// Ids and opacities of the changed layers.
    LayerDiff(Vec<(String, bool, f64)>),
    /// Ids and styles of the changed zones.
    ZoneDiff(Vec<(String, ZoneStyle)>),
    Boundary {
        polygons: usize,
        style: BoundaryStyle,
    },
    OnPick,
    Teardown,
}

#[derive(Default)]
struct Shared {
    calls: Vec<BackendCall>,
    pick: Option<PickCallback>,
    torn_down: bool,
    stale_calls: usize,
}

/// Read side of a [`RecordingBackend`], kept by tests and the replay host.
#[derive(Clone)]
pub struct RecordingProbe {
    shared: Rc<RefCell<Shared>>,
}

impl fmt::Debug for RecordingProbe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shared = self.shared.borrow();
        f.debug_struct("RecordingProbe")
            .field("calls", &shared.calls.len())
            .field("torn_down", &shared.torn_down)
            .finish_non_exhaustive()
    }
}

impl RecordingProbe {
    /// Every call recorded so far.
    #[must_use]
    pub fn calls(&self) -> Vec<BackendCall> {
        self.shared.borrow().calls.clone()
    }

    #[must_use]
    pub fn call_count(&self) -> usize {
        self.shared.borrow().calls.len()
    }

    /// Forget recorded calls, keeping the pick callback.
    pub fn clear(&self) {
        self.shared.borrow_mut().calls.clear();
    }

    #[must_use]
    pub fn is_torn_down(&self) -> bool {
        self.shared.borrow().torn_down
    }

    /// Calls that arrived after teardown or with a foreign handle.
    #[must_use]
    pub fn stale_calls(&self) -> usize {
        self.shared.borrow().stale_calls
    }

    /// Simulate a user click. Returns `false` if no callback is registered.
    pub fn click(&self, point: GeoPoint) -> bool {
        let callback = self.shared.borrow_mut().pick.take();
        let Some(mut callback) = callback else {
            return false;
        };
        callback(point);
        let mut shared = self.shared.borrow_mut();
        if !shared.torn_down {
            shared.pick = Some(callback);
        }
        true
    }
}

/// Headless [`RenderBackend`] that records calls instead of drawing.
pub struct RecordingBackend {
    shared: Rc<RefCell<Shared>>,
    handle: Option<BackendHandle>,
    bounds: ZoomBounds,
    log_calls: bool,
}

impl fmt::Debug for RecordingBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordingBackend")
            .field("handle", &self.handle)
            .field("bounds", &self.bounds)
            .finish_non_exhaustive()
    }
}

impl RecordingBackend {
    #[must_use]
    pub fn new() -> (Self, RecordingProbe) {
        let shared = Rc::new(RefCell::new(Shared::default()));
        let probe = RecordingProbe {
            shared: Rc::clone(&shared),
        };
        let backend = Self {
            shared,
            handle: None,
            bounds: ZoomBounds::default(),
            log_calls: false,
        };
        (backend, probe)
    }

    /// Report a custom zoom range.
    #[must_use]
    pub fn with_bounds(mut self, bounds: ZoomBounds) -> Self {
        self.bounds = bounds;
        self
    }

    /// Log every call at info level.
    #[must_use]
    pub fn with_logging(mut self, log_calls: bool) -> Self {
        self.log_calls = log_calls;
        self
    }

    fn record(&self, handle: BackendHandle, call: BackendCall) {
        let mut shared = self.shared.borrow_mut();
        if shared.torn_down || self.handle != Some(handle) {
            warn!("Backend call on released handle {}: {call:?}", handle.id());
            shared.stale_calls += 1;
            return;
        }
        if self.log_calls {
            info!("backend <- {}", describe(&call));
        } else {
            debug!("backend <- {}", describe(&call));
        }
        shared.calls.push(call);
    }
}

fn describe(call: &BackendCall) -> String {
    match call {
        BackendCall::Init(view) | BackendCall::ViewState(view) => format!(
            "view center=({:.4}, {:.4}) zoom={:.2} pitch={:.1} bearing={:.1} mode={}",
            view.center.lat,
            view.center.lng,
            view.zoom,
            view.pitch,
            view.bearing,
            view.mode.label()
        ),
        BackendCall::LayerDiff(layers) => {
            let parts: Vec<String> = layers
                .iter()
                .map(|(id, enabled, opacity)| {
                    format!("{id}[{}@{opacity:.2}]", if *enabled { "on" } else { "off" })
                })
                .collect();
            format!("layers {}", parts.join(", "))
        }
        BackendCall::ZoneDiff(zones) => {
            let parts: Vec<String> = zones
                .iter()
                .map(|(id, style)| {
                    format!(
                        "{id}[{} {}@{:.2}]",
                        if style.visible { "shown" } else { "hidden" },
                        style.fill_color,
                        style.fill_opacity
                    )
                })
                .collect();
            format!("zones {}", parts.join(", "))
        }
        BackendCall::Boundary { polygons, style } => format!(
            "boundary polygons={polygons} visible={} opacity={:.2}",
            style.visible, style.fill_opacity
        ),
        BackendCall::OnPick => "pick callback".to_string(),
        BackendCall::Teardown => "teardown".to_string(),
    }
}

impl RenderBackend for RecordingBackend {
    type Surface = ContainerSize;

    fn init(
        &mut self,
        surface: ContainerSize,
        initial: &ViewState,
    ) -> Result<BackendHandle, BackendError> {
        if self.handle.is_some() {
            return Err(BackendError::SurfaceInUse);
        }
        if !surface.is_valid() {
            return Err(BackendError::InvalidSurface(format!(
                "container size {}x{}",
                surface.width, surface.height
            )));
        }
        let handle = BackendHandle::new(1);
        self.handle = Some(handle);
        self.record(handle, BackendCall::Init(*initial));
        Ok(handle)
    }

    fn zoom_bounds(&self) -> ZoomBounds {
        self.bounds
    }

    fn apply_view_state(&mut self, handle: BackendHandle, view: &ViewState) {
        self.record(handle, BackendCall::ViewState(*view));
    }

    fn apply_layer_diff(&mut self, handle: BackendHandle, layers: &[Layer]) {
        let summary = layers
            .iter()
            .map(|l| (l.id.clone(), l.enabled, l.opacity))
            .collect();
        self.record(handle, BackendCall::LayerDiff(summary));
    }

    fn apply_zone_diff(&mut self, handle: BackendHandle, zones: &[ZoneUpdate<'_>]) {
        let summary = zones
            .iter()
            .map(|u| (u.zone.id.clone(), u.style))
            .collect();
        self.record(handle, BackendCall::ZoneDiff(summary));
    }

    fn apply_boundary(
        &mut self,
        handle: BackendHandle,
        polygons: &[BoundaryPolygon],
        style: &BoundaryStyle,
    ) {
        self.record(
            handle,
            BackendCall::Boundary {
                polygons: polygons.len(),
                style: *style,
            },
        );
    }

    fn on_pick(&mut self, handle: BackendHandle, callback: PickCallback) {
        self.record(handle, BackendCall::OnPick);
        let mut shared = self.shared.borrow_mut();
        if !shared.torn_down {
            shared.pick = Some(callback);
        }
    }

    fn teardown(&mut self, handle: BackendHandle) {
        self.record(handle, BackendCall::Teardown);
        let mut shared = self.shared.borrow_mut();
        shared.torn_down = true;
        shared.pick = None;
    }
}
