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

//! Render-set pruning.
//!
//! The renderer only needs flights near the visible window. The window is
//! padded on every side so markers slide in from off-screen during a pan
//! instead of popping into existence at the edge.

use crate::flight::{FlightRecord, KnownFlights, RenderPoint};
use crate::geo::ViewportBounds;

/// Share of the viewport span added on each side before testing containment.
pub const DEFAULT_PADDING: f64 = 0.1;

/// Flights inside `bounds` grown by `padding`, skipping non-finite positions.
#[must_use]
pub fn visible(flights: &[FlightRecord], bounds: &ViewportBounds, padding: f64) -> Vec<FlightRecord> {
    let padded = bounds.padded(padding);
    flights
        .iter()
        .filter(|f| f.has_valid_position() && padded.contains(f.position))
        .cloned()
        .collect()
}

/// Memoizing wrapper around [`visible`].
///
/// The cached result is reused while both the known-flights generation and
/// the bounds value are unchanged.
#[derive(Debug, Clone)]
pub struct ViewportPruner {
    padding: f64,
    cache: Option<Cached>,
}

#[derive(Debug, Clone)]
struct Cached {
    generation: u64,
    bounds: ViewportBounds,
    flights: Vec<FlightRecord>,
}

impl ViewportPruner {
    #[must_use]
    pub fn new(padding: f64) -> Self {
        Self {
            padding,
            cache: None,
        }
    }

    #[must_use]
    pub fn padding(&self) -> f64 {
        self.padding
    }

    pub fn visible(&mut self, known: &KnownFlights, bounds: &ViewportBounds) -> &[FlightRecord] {
        let stale = self
            .cache
            .as_ref()
            .map_or(true, |c| c.generation != known.generation || c.bounds != *bounds);

        if stale {
            self.cache = Some(Cached {
                generation: known.generation,
                bounds: *bounds,
                flights: visible(&known.flights, bounds, self.padding),
            });
        }

        match &self.cache {
            Some(cached) => &cached.flights,
            None => &[],
        }
    }

    /// Render payload for the current window with `selected` highlighted.
    pub fn render_set(
        &mut self,
        known: &KnownFlights,
        bounds: &ViewportBounds,
        selected: Option<&str>,
    ) -> Vec<RenderPoint> {
        self.visible(known, bounds)
            .iter()
            .map(|f| RenderPoint::from_record(f, selected))
            .collect()
    }

    /// Forget the cached result.
    pub fn invalidate(&mut self) {
        self.cache = None;
    }
}

impl Default for ViewportPruner {
    fn default() -> Self {
        Self::new(DEFAULT_PADDING)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Utc;

    use super::*;
    use crate::flight::DataSource;
    use crate::geo::Coordinate;

    fn flight(id: &str, latitude: f64, longitude: f64) -> FlightRecord {
        FlightRecord {
            id: id.to_string(),
            callsign: None,
            country: String::new(),
            position: Coordinate::new(latitude, longitude),
            heading_degrees: 45.0,
            altitude_m: 10_000.0,
            ground_speed_mps: 230.0,
            on_ground: false,
            route: None,
            photo_url: None,
            last_update: Utc::now(),
        }
    }

    fn known(generation: u64, flights: Vec<FlightRecord>) -> KnownFlights {
        KnownFlights {
            flights: Arc::new(flights),
            source: DataSource::Live,
            generation,
            updated_at: Some(Utc::now()),
        }
    }

    #[test]
    fn test_padded_viewport_membership() {
        let flights = vec![
            flight("center", 5.0, 5.0),
            flight("far", -5.0, -5.0),
            flight("margin", -0.5, -0.5),
            flight("nan", f64::NAN, 5.0),
            flight("inf", 5.0, f64::INFINITY),
        ];
        let bounds = ViewportBounds::new(0.0, 0.0, 10.0, 10.0);
        let ids: Vec<_> = visible(&flights, &bounds, DEFAULT_PADDING)
            .into_iter()
            .map(|f| f.id)
            .collect();
        assert_eq!(ids, ["center", "margin"]);
    }

    #[test]
    fn test_memoized_until_inputs_change() {
        let mut pruner = ViewportPruner::default();
        let bounds = ViewportBounds::new(0.0, 0.0, 10.0, 10.0);

        let first = known(1, vec![flight("a", 5.0, 5.0)]);
        assert_eq!(pruner.visible(&first, &bounds).len(), 1);

        // Same generation: cached result is reused even though data differs.
        let same_generation = known(1, vec![flight("a", 5.0, 5.0), flight("b", 6.0, 6.0)]);
        assert_eq!(pruner.visible(&same_generation, &bounds).len(), 1);

        let next = known(2, same_generation.flights.to_vec());
        assert_eq!(pruner.visible(&next, &bounds).len(), 2);

        let moved = ViewportBounds::new(5.5, 5.5, 7.0, 7.0);
        let ids: Vec<_> = pruner.visible(&next, &moved).iter().map(|f| f.id.clone()).collect();
        assert_eq!(ids, ["b"]);

        pruner.invalidate();
        assert_eq!(pruner.visible(&next, &bounds).len(), 2);
    }

    #[test]
    fn test_render_set_marks_selection() {
        let mut pruner = ViewportPruner::default();
        let data = known(1, vec![flight("a", 5.0, 5.0), flight("b", 6.0, 6.0)]);
        let points = pruner.render_set(&data, &ViewportBounds::new(0.0, 0.0, 10.0, 10.0), Some("b"));
        assert_eq!(points.len(), 2);
        assert!(!points[0].is_selected);
        assert!(points[1].is_selected);
        assert!(points.iter().all(|p| p.latitude.is_finite() && p.longitude.is_finite()));
    }
}
