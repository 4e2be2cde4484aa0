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

//! Flight records shared by the live feed, the simulator and the renderer.

use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::geo::{self, Coordinate};

/// Planned leg of a simulated flight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub origin_code: String,
    pub destination_code: String,
    pub origin: Coordinate,
    pub destination: Coordinate,
    pub departure: DateTime<Utc>,
    pub arrival: DateTime<Utc>,
}

impl Route {
    #[must_use]
    pub fn duration(&self) -> TimeDelta {
        self.arrival - self.departure
    }

    /// Elapsed share of the leg at `now`, clamped to [0, 1].
    #[must_use]
    pub fn fraction_at(&self, now: DateTime<Utc>) -> f64 {
        let total = micros(self.duration());
        if total <= 0.0 {
            return 1.0;
        }
        (micros(now - self.departure) / total).clamp(0.0, 1.0)
    }

    /// Interpolated position at `now`.
    #[must_use]
    pub fn position_at(&self, now: DateTime<Utc>) -> Coordinate {
        geo::lerp(self.origin, self.destination, self.fraction_at(now))
    }

    /// The leg is over from the arrival instant onward.
    #[must_use]
    pub fn is_complete(&self, now: DateTime<Utc>) -> bool {
        now >= self.arrival
    }
}

#[allow(clippy::cast_precision_loss, reason = "route spans are far below 2^52 microseconds")]
fn micros(delta: TimeDelta) -> f64 {
    delta
        .num_microseconds()
        .map_or_else(|| delta.num_milliseconds() as f64 * 1000.0, |us| us as f64)
}

/// One tracked aircraft.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightRecord {
    pub id: String,
    pub callsign: Option<String>,
    pub country: String,
    pub position: Coordinate,
    pub heading_degrees: f64,
    pub altitude_m: f64,
    pub ground_speed_mps: f64,
    pub on_ground: bool,
    pub route: Option<Route>,
    pub photo_url: Option<String>,
    pub last_update: DateTime<Utc>,
}

impl FlightRecord {
    #[must_use]
    pub fn latitude(&self) -> f64 {
        self.position.latitude
    }

    #[must_use]
    pub fn longitude(&self) -> f64 {
        self.position.longitude
    }

    /// Callsign if present, otherwise the id.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.callsign.as_deref().unwrap_or(&self.id)
    }

    /// Position can be drawn and hit-tested.
    #[must_use]
    pub fn has_valid_position(&self) -> bool {
        self.position.is_finite()
    }
}

/// Where the current known-flights collection came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    /// Nothing has been fetched yet.
    #[default]
    Unknown,
    Live,
    Simulated,
}

impl std::fmt::Display for DataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unknown => write!(f, "unknown"),
            Self::Live => write!(f, "live"),
            Self::Simulated => write!(f, "simulated"),
        }
    }
}

/// The authoritative set of flights for the current viewport.
///
/// Each replacement bumps `generation`, which downstream caches use as the
/// identity of the collection.
#[derive(Debug, Clone, Default)]
pub struct KnownFlights {
    pub flights: Arc<Vec<FlightRecord>>,
    pub source: DataSource,
    pub generation: u64,
    pub updated_at: Option<DateTime<Utc>>,
}

impl KnownFlights {
    #[must_use]
    pub fn len(&self) -> usize {
        self.flights.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.flights.is_empty()
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&FlightRecord> {
        self.flights.iter().find(|f| f.id == id)
    }
}

/// Per-frame payload handed to the rendering layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderPoint {
    pub id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub heading_degrees: f64,
    pub is_selected: bool,
}

impl RenderPoint {
    #[must_use]
    pub fn from_record(record: &FlightRecord, selected: Option<&str>) -> Self {
        Self {
            id: record.id.clone(),
            latitude: record.position.latitude,
            longitude: record.position.longitude,
            heading_degrees: if record.heading_degrees.is_finite() {
                record.heading_degrees
            } else {
                0.0
            },
            is_selected: selected == Some(record.id.as_str()),
        }
    }
}
