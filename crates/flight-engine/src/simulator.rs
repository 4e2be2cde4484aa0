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

//! Simulated flight population.
//!
//! Flights are generated lazily the first time the live feed fails and then
//! live for the rest of the process. Each tick moves every flight to the
//! point its route schedule dictates for the given wall-clock time; flights
//! that have landed are respawned in place (same id, new leg starting from
//! the airport they just reached).
//!
//! Positions are a linear blend of origin and destination in degree space,
//! not a great-circle path. Headings are recomputed toward the destination
//! every tick, so they drift slightly along a leg the way a real track does.

use std::collections::BTreeMap;

use chrono::{DateTime, TimeDelta, Utc};
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::catalog::RouteCatalog;
use crate::error::RouteError;
use crate::flight::{FlightRecord, Route};
use crate::geo::{self, Coordinate, ViewportBounds};

const MS_PER_HOUR: f64 = 3_600_000.0;
const MIN_LEG_MS: i64 = 60_000;
const SPAWN_PROGRESS_MIN: f64 = 0.1;
const SPAWN_PROGRESS_MAX: f64 = 0.9;

/// Tunables for the simulated population.
#[derive(Debug, Clone)]
pub struct SimulatorConfig {
    /// Constant cruise speed used for every leg duration.
    pub cruise_speed_kmh: f64,
    /// Lower bound of the assigned cruise altitude.
    pub min_altitude_m: f64,
    /// Upper bound of the assigned cruise altitude.
    pub max_altitude_m: f64,
    /// Prefix for generated flight ids.
    pub id_prefix: String,
    /// Country label attached to simulated records.
    pub country: String,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            cruise_speed_kmh: 850.0,
            min_altitude_m: 5_000.0,
            max_altitude_m: 13_000.0,
            id_prefix: "sim".to_string(),
            country: "International".to_string(),
        }
    }
}

impl SimulatorConfig {
    #[must_use]
    pub fn cruise_speed_mps(&self) -> f64 {
        self.cruise_speed_kmh / 3.6
    }

    /// Scheduled block time for a leg of `distance_km`.
    #[allow(clippy::cast_possible_truncation, reason = "leg durations are a few days at most")]
    #[must_use]
    pub fn leg_duration(&self, distance_km: f64) -> TimeDelta {
        let ms = (distance_km / self.cruise_speed_kmh * MS_PER_HOUR).round() as i64;
        TimeDelta::milliseconds(ms.max(MIN_LEG_MS))
    }
}

/// Owner of the simulated population.
pub struct FlightSimulator<R = StdRng> {
    flights: BTreeMap<String, FlightRecord>,
    catalog: RouteCatalog,
    config: SimulatorConfig,
    rng: R,
}

impl<R> std::fmt::Debug for FlightSimulator<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlightSimulator")
            .field("flight_count", &self.flights.len())
            .field("airports", &self.catalog.airports().len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl FlightSimulator<StdRng> {
    /// Simulator over the built-in catalog with an entropy-seeded generator.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(
            RouteCatalog::default(),
            SimulatorConfig::default(),
            StdRng::from_entropy(),
        )
    }

    /// Simulator over the built-in catalog that replays identically for `seed`.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self::new(
            RouteCatalog::default(),
            SimulatorConfig::default(),
            StdRng::seed_from_u64(seed),
        )
    }
}

impl<R: Rng> FlightSimulator<R> {
    #[must_use]
    pub fn new(catalog: RouteCatalog, config: SimulatorConfig, rng: R) -> Self {
        Self {
            flights: BTreeMap::new(),
            catalog,
            config,
            rng,
        }
    }

    /// Generate `count` flights if the population is empty.
    ///
    /// Returns the number of flights created by this call.
    pub fn ensure_population(&mut self, count: usize, now: DateTime<Utc>) -> usize {
        if !self.flights.is_empty() {
            debug!(
                "Population already holds {} flights, not generating {}",
                self.flights.len(),
                count
            );
            return 0;
        }

        let Self {
            flights,
            catalog,
            config,
            rng,
        } = self;

        let mut routeless = 0;
        for i in 0..count {
            let id = format!("{}{:06x}", config.id_prefix, i);
            let record = spawn_flight(id.clone(), catalog, config, rng, now);
            if record.route.is_none() {
                routeless += 1;
            }
            flights.insert(id, record);
        }

        info!(
            "Generated {} simulated flights ({} without a resolvable route)",
            count, routeless
        );
        count
    }

    /// Advance every flight to `now` and return a snapshot of all of them.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Vec<FlightRecord> {
        self.advance(now);
        self.flights.values().cloned().collect()
    }

    /// Advance every flight to `now` and return copies of those inside `bounds`.
    pub fn tick_within(&mut self, now: DateTime<Utc>, bounds: &ViewportBounds) -> Vec<FlightRecord> {
        self.advance(now);
        self.flights
            .values()
            .filter(|f| f.has_valid_position() && bounds.contains(f.position))
            .cloned()
            .collect()
    }

    fn advance(&mut self, now: DateTime<Utc>) {
        let Self {
            flights,
            catalog,
            config,
            rng,
        } = self;

        let mut respawned = 0;
        for record in flights.values_mut() {
            match record.route.as_ref() {
                Some(route) if route.is_complete(now) => {
                    respawn(record, catalog, config, rng, now);
                    respawned += 1;
                }
                Some(route) => {
                    let position = route.position_at(now);
                    record.heading_degrees = geo::bearing(position, route.destination);
                    record.position = position;
                    record.last_update = now;
                }
                None => dead_reckon(record, now),
            }
        }

        if respawned > 0 {
            debug!("Respawned {} completed flights", respawned);
        }
    }

    #[must_use]
    pub fn flight(&self, id: &str) -> Option<&FlightRecord> {
        self.flights.get(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.flights.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.flights.is_empty()
    }

    #[must_use]
    pub fn catalog(&self) -> &RouteCatalog {
        &self.catalog
    }

    #[must_use]
    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }
}

fn spawn_flight<R: Rng>(
    id: String,
    catalog: &RouteCatalog,
    config: &SimulatorConfig,
    rng: &mut R,
    now: DateTime<Utc>,
) -> FlightRecord {
    let pick = catalog.pick_route(rng);
    let operator = &pick.operators[rng.gen_range(0..pick.operators.len())];
    let callsign = format!("{}{}", operator, rng.gen_range(100..=999));
    let altitude_m = rng.gen_range(config.min_altitude_m..=config.max_altitude_m);

    let mut record = FlightRecord {
        id,
        callsign: Some(callsign),
        country: config.country.clone(),
        position: Coordinate::new(0.0, 0.0),
        heading_degrees: 0.0,
        altitude_m,
        ground_speed_mps: config.cruise_speed_mps(),
        on_ground: false,
        route: None,
        photo_url: None,
        last_update: now,
    };

    match resolve(catalog, pick.origin_code, pick.destination_code) {
        Ok((origin, destination)) => {
            let progress = rng.gen_range(SPAWN_PROGRESS_MIN..=SPAWN_PROGRESS_MAX);
            let route = plan_leg(
                pick.origin_code,
                pick.destination_code,
                origin,
                destination,
                now,
                progress,
                config,
            );
            let position = geo::lerp(origin, destination, progress);
            record.heading_degrees = geo::bearing(position, destination);
            record.position = position;
            record.route = Some(route);
        }
        Err(e) => {
            warn!("{}: {}, placing at a random position", record.id, e);
            scatter(&mut record, rng);
        }
    }

    record
}

/// Start a new leg from the airport the flight just reached.
fn respawn<R: Rng>(
    record: &mut FlightRecord,
    catalog: &RouteCatalog,
    config: &SimulatorConfig,
    rng: &mut R,
    now: DateTime<Utc>,
) {
    let Some(previous) = record.route.take() else {
        return;
    };

    let origin = previous.destination;
    let destination_code = catalog.pick_destination(rng, &previous.destination_code);

    record.position = origin;
    record.last_update = now;

    match catalog.coordinate_of(destination_code) {
        Some(destination) => {
            record.heading_degrees = geo::bearing(origin, destination);
            record.route = Some(plan_leg(
                &previous.destination_code,
                destination_code,
                origin,
                destination,
                now,
                0.0,
                config,
            ));
        }
        // Destinations are drawn from the catalog's own airports, which always
        // resolve; a miss means the catalog index is inconsistent.
        None => {
            warn!(
                "{}: {}, continuing without a route",
                record.id,
                RouteError::UnknownCode(destination_code.to_string())
            );
            record.heading_degrees = rng.gen_range(0.0..360.0);
        }
    }
}

/// Build a leg that is `progress` of the way through its schedule at `now`.
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss, reason = "millisecond leg durations")]
fn plan_leg(
    origin_code: &str,
    destination_code: &str,
    origin: Coordinate,
    destination: Coordinate,
    now: DateTime<Utc>,
    progress: f64,
    config: &SimulatorConfig,
) -> Route {
    let duration = config.leg_duration(geo::distance_km(origin, destination));
    let elapsed_ms = (duration.num_milliseconds() as f64 * progress).round() as i64;
    let departure = now - TimeDelta::milliseconds(elapsed_ms);

    Route {
        origin_code: origin_code.to_string(),
        destination_code: destination_code.to_string(),
        origin,
        destination,
        departure,
        arrival: departure + duration,
    }
}

fn resolve(
    catalog: &RouteCatalog,
    origin_code: &str,
    destination_code: &str,
) -> Result<(Coordinate, Coordinate), RouteError> {
    let origin = catalog
        .coordinate_of(origin_code)
        .ok_or_else(|| RouteError::UnknownCode(origin_code.to_string()))?;
    let destination = catalog
        .coordinate_of(destination_code)
        .ok_or_else(|| RouteError::UnknownCode(destination_code.to_string()))?;
    Ok((origin, destination))
}

fn scatter<R: Rng>(record: &mut FlightRecord, rng: &mut R) {
    record.position = Coordinate::new(rng.gen_range(-60.0..=70.0), rng.gen_range(-180.0..=180.0));
    record.heading_degrees = rng.gen_range(0.0..360.0);
}

/// Move a route-less flight along its heading for the time since its last update.
#[allow(clippy::cast_precision_loss, reason = "tick gaps are seconds to hours")]
fn dead_reckon(record: &mut FlightRecord, now: DateTime<Utc>) {
    let elapsed_ms = (now - record.last_update).num_milliseconds();
    if elapsed_ms <= 0 {
        return;
    }
    let distance_km = record.ground_speed_mps * (elapsed_ms as f64 / 1000.0) / 1000.0;
    record.position = geo::destination(record.position, record.heading_degrees, distance_km);
    record.last_update = now;
}
