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

//! # zone-compositor
//!
//! Geospatial layer compositor for land-restoration verification maps.
//!
//! The compositor owns the camera, the layer stack, classified analysis
//! zones, a project boundary and a milestone playback, and drives a single
//! [`RenderBackend`] with the minimal set of changes each frame. It never
//! blocks and owns no timers: the host passes the current time to
//! [`Compositor::advance`].
//!
//! ## Example
//!
//! ```no_run
//! use std::time::Instant;
//! use zone_compositor::{Compositor, CompositorConfig, GeoPoint, RecordingBackend};
//!
//! let (backend, probe) = RecordingBackend::new();
//! let config = CompositorConfig::default();
//! let surface = config.container;
//! let mut compositor = Compositor::new(config, backend, surface)?;
//!
//! compositor.set_overlay_opacity(0.9)?;
//! compositor.play(Instant::now());
//! compositor.render_pass();
//!
//! probe.click(GeoPoint::new(-10.895, -69.525));
//! compositor.process_picks();
//! if let Some(hit) = compositor.selection() {
//!     println!("{}: {}", hit.zone.title(), hit.zone.confidence_label());
//! }
//! # Ok::<(), zone_compositor::CompositorError>(())
//! ```

pub mod backend;
pub mod boundary;
pub mod compositor;
pub mod config;
pub mod defaults;
pub mod geo;
pub mod geojson;
pub mod layers;
pub mod playback;
pub mod query;
pub mod summary;
pub mod view;
pub mod zones;

pub use backend::{
    BackendCall, BackendError, BackendHandle, PickCallback, RecordingBackend, RecordingProbe,
    RenderBackend, ZoneUpdate,
};
pub use boundary::{BoundaryPolygon, BoundaryStyle, ProjectBoundary};
pub use compositor::{Compositor, CompositorError, RenderStats};
pub use config::{CompositorConfig, ContainerSize, TimingConfig};
pub use geo::GeoPoint;
pub use geojson::{parse_analysis, parse_boundary, GeoJsonError};
pub use layers::{Layer, LayerKind, LayerRegistry, RegistryError};
pub use playback::{PlaybackController, PlaybackPhase, TimeSeriesFrame};
pub use query::{FeatureQueryEngine, Hit, HitResult, QueryOptions, ZonePayload};
pub use summary::{AnalysisSummary, StatusBadges};
pub use view::{ViewMode, ViewState, ViewportController, ZoomBounds};
pub use zones::{color_for, fill_opacity_for, Classification, Rgb, Zone, ZoneError, ZoneStore, ZoneStyle};
