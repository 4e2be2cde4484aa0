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

//! Flight state engine for a live map of airborne traffic.
//!
//! The engine keeps a set of flights for the visible map window. It prefers
//! live state vectors from an OpenSky-compatible REST feed and falls back to
//! a synthetic population whenever the feed fails or comes back empty:
//!
//! - **Geometry**: bearings, great-circle distance, interpolation and viewport
//!   rectangles ([`geo`])
//! - **Simulation**: route catalog and a time-driven population of flights
//!   that fly airport-to-airport legs and respawn on arrival ([`catalog`],
//!   [`simulator`])
//! - **Live feed**: async client and state-vector normalization ([`feed`])
//! - **Control**: viewport-triggered fetching with coalescing, polling and
//!   fallback ([`controller`]), plus per-frame pruning ([`pruner`])
//! - **Enrichment**: track history, trails and photo lookups ([`enrichment`],
//!   [`trail`])
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use flight_engine::{
//!     ControllerConfig, ControllerHandle, FlightSimulator, OpenSkyFeed, ViewportBounds,
//!     ViewportFetchController,
//! };
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let controller =
//!         ViewportFetchController::new(ControllerConfig::default(), FlightSimulator::with_defaults());
//!     let mut handle = ControllerHandle::spawn(controller, Arc::new(OpenSkyFeed::default()));
//!
//!     let bounds = ViewportBounds::new(35.0, -10.0, 60.0, 30.0);
//!     handle.viewport_settled(bounds).await;
//!
//!     while handle.changed().await {
//!         for point in handle.render_set(&bounds) {
//!             println!("{} at {:.3},{:.3}", point.id, point.latitude, point.longitude);
//!         }
//!     }
//! }
//! ```
//!
//! # Simulation Only
//!
//! ```
//! use chrono::{TimeDelta, Utc};
//! use flight_engine::FlightSimulator;
//!
//! let mut sim = FlightSimulator::seeded(42);
//! let now = Utc::now();
//! sim.ensure_population(100, now);
//! let flights = sim.tick(now + TimeDelta::hours(1));
//! assert_eq!(flights.len(), 100);
//! ```

pub mod catalog;
pub mod controller;
pub mod enrichment;
pub mod error;
pub mod feed;
pub mod flight;
pub mod geo;
pub mod pruner;
pub mod simulator;
pub mod trail;

pub use catalog::{Airport, Region, RouteCatalog};
pub use controller::{
    ControlEvent, ControllerConfig, ControllerHandle, ControllerSnapshot, FetchState,
    FetchTicket, ViewportFetchController,
};
pub use enrichment::{PhotoClient, TrackClient, TrackSample};
pub use error::{FetchError, RecordError, RouteError};
pub use feed::{DisabledFeed, FeedConfig, FeedSource, OpenSkyFeed};
pub use flight::{DataSource, FlightRecord, KnownFlights, RenderPoint, Route};
pub use geo::{Coordinate, ViewportBounds};
pub use pruner::ViewportPruner;
pub use simulator::{FlightSimulator, SimulatorConfig};
pub use trail::Trail;
