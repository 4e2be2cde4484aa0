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

//! Live state-vector feed.
//!
//! Queries the OpenSky `states/all` endpoint, optionally restricted to a
//! bounding box, and normalizes the positional rows into [`FlightRecord`]s.
//! Anything short of at least one usable airborne aircraft is reported as a
//! [`FetchError`] so the caller can switch to the simulated population; the
//! endpoint answers rate-limited requests with an empty `states` list, which
//! is why an empty success counts as a failure.

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, warn};
use serde::Deserialize;
use serde_json::Value;

use crate::error::{FetchError, RecordError};
use crate::flight::FlightRecord;
use crate::geo::{Coordinate, ViewportBounds};

/// Default OpenSky REST base URL.
pub const DEFAULT_FEED_URL: &str = "https://opensky-network.org/api";

// State vector column indices
const COL_ICAO24: usize = 0;
const COL_CALLSIGN: usize = 1;
const COL_ORIGIN_COUNTRY: usize = 2;
const COL_TIME_POSITION: usize = 3;
const COL_LONGITUDE: usize = 5;
const COL_LATITUDE: usize = 6;
const COL_BARO_ALTITUDE: usize = 7;
const COL_ON_GROUND: usize = 8;
const COL_VELOCITY: usize = 9;
const COL_TRUE_TRACK: usize = 10;

/// Configuration for the live feed client.
#[derive(Debug, Clone)]
pub struct FeedConfig {
    /// REST base URL, without a trailing slash.
    pub base_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_FEED_URL.to_string(),
            timeout: Duration::from_secs(5),
        }
    }
}

/// Source of live flights for a viewport.
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Fetch airborne flights inside `bounds`, or everywhere when `None`.
    async fn fetch(&self, bounds: Option<ViewportBounds>) -> Result<Vec<FlightRecord>, FetchError>;

    /// Short label for log lines.
    fn name(&self) -> &str {
        "feed"
    }
}

/// Raw `states/all` response body.
#[derive(Debug, Clone, Deserialize)]
pub struct StatesResponse {
    #[serde(default)]
    pub time: Option<i64>,
    #[serde(default)]
    pub states: Option<Vec<Vec<Value>>>,
}

/// HTTP client for the OpenSky state-vector endpoint.
#[derive(Debug, Clone)]
pub struct OpenSkyFeed {
    client: reqwest::Client,
    config: FeedConfig,
}

impl OpenSkyFeed {
    #[must_use]
    pub fn new(config: FeedConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    /// Reuse an existing client (shared connection pool).
    #[must_use]
    pub fn with_client(client: reqwest::Client, config: FeedConfig) -> Self {
        Self { client, config }
    }

    #[must_use]
    pub fn config(&self) -> &FeedConfig {
        &self.config
    }

    fn states_url(&self) -> String {
        format!("{}/states/all", self.config.base_url.trim_end_matches('/'))
    }
}

impl Default for OpenSkyFeed {
    fn default() -> Self {
        Self::new(FeedConfig::default())
    }
}

#[async_trait]
impl FeedSource for OpenSkyFeed {
    async fn fetch(&self, bounds: Option<ViewportBounds>) -> Result<Vec<FlightRecord>, FetchError> {
        let mut request = self.client.get(self.states_url()).timeout(self.config.timeout);
        if let Some(bounds) = bounds {
            request = request.query(&bounds_query(&bounds));
        }

        let response = request
            .send()
            .await
            .map_err(|e| classify(e, self.config.timeout))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body: StatesResponse = response
            .json()
            .await
            .map_err(|e| FetchError::Decode(e.to_string()))?;

        let flights = normalize_states(&body, Utc::now());
        if flights.is_empty() {
            return Err(FetchError::Empty);
        }

        debug!("{} returned {} airborne flights", self.name(), flights.len());
        Ok(flights)
    }

    fn name(&self) -> &str {
        "opensky"
    }
}

/// Stand-in used when the live feed is switched off; always fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledFeed;

#[async_trait]
impl FeedSource for DisabledFeed {
    async fn fetch(&self, _bounds: Option<ViewportBounds>) -> Result<Vec<FlightRecord>, FetchError> {
        Err(FetchError::Disabled)
    }

    fn name(&self) -> &str {
        "disabled"
    }
}

fn classify(error: reqwest::Error, timeout: Duration) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX))
    } else {
        FetchError::Transport(error)
    }
}

/// `lamin/lomin/lamax/lomax` query pairs for a bounding box.
#[must_use]
pub fn bounds_query(bounds: &ViewportBounds) -> [(&'static str, f64); 4] {
    [
        ("lamin", bounds.south),
        ("lomin", bounds.west),
        ("lamax", bounds.north),
        ("lomax", bounds.east),
    ]
}

/// Convert every usable row of a response into a flight record.
///
/// Rows without a position, or reporting the aircraft on the ground, are
/// dropped individually. Repeated ids keep their first row.
#[must_use]
pub fn normalize_states(response: &StatesResponse, now: DateTime<Utc>) -> Vec<FlightRecord> {
    let Some(states) = response.states.as_ref() else {
        return Vec::new();
    };

    let mut seen = HashSet::with_capacity(states.len());
    let mut flights = Vec::with_capacity(states.len());
    let mut dropped = 0usize;

    for row in states {
        match state_to_record(row, now) {
            Ok(record) => {
                if seen.insert(record.id.clone()) {
                    flights.push(record);
                } else {
                    debug!("Duplicate state vector for {} ignored", record.id);
                }
            }
            Err(RecordError::OnGround(_)) => dropped += 1,
            Err(e) => {
                debug!("Dropping state vector: {}", e);
                dropped += 1;
            }
        }
    }

    if dropped > 0 && flights.is_empty() {
        warn!("All {} state vectors were unusable", dropped);
    } else if dropped > 0 {
        debug!("Kept {} state vectors, dropped {}", flights.len(), dropped);
    }

    flights
}

/// Map one positional state vector to a [`FlightRecord`].
pub fn state_to_record(row: &[Value], now: DateTime<Utc>) -> Result<FlightRecord, RecordError> {
    let id = row
        .get(COL_ICAO24)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(RecordError::MissingId)?
        .to_string();

    let latitude = number(row, COL_LATITUDE);
    let longitude = number(row, COL_LONGITUDE);
    let (Some(latitude), Some(longitude)) = (latitude, longitude) else {
        return Err(RecordError::MissingPosition(id));
    };
    // A literal 0.0 is how the feed's consumers have always spotted missing
    // fixes, so it is treated the same as null.
    if latitude == 0.0 || longitude == 0.0 || !latitude.is_finite() || !longitude.is_finite() {
        return Err(RecordError::MissingPosition(id));
    }

    if row.get(COL_ON_GROUND).and_then(Value::as_bool).unwrap_or(false) {
        return Err(RecordError::OnGround(id));
    }

    let callsign = row
        .get(COL_CALLSIGN)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string);

    let country = row
        .get(COL_ORIGIN_COUNTRY)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let last_update = row
        .get(COL_TIME_POSITION)
        .and_then(Value::as_i64)
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .unwrap_or(now);

    Ok(FlightRecord {
        id,
        callsign,
        country,
        position: Coordinate::new(latitude, longitude),
        heading_degrees: number(row, COL_TRUE_TRACK).map_or(0.0, |t| t.rem_euclid(360.0)),
        altitude_m: number(row, COL_BARO_ALTITUDE).map_or(0.0, |a| a.max(0.0)),
        ground_speed_mps: number(row, COL_VELOCITY).map_or(0.0, |v| v.max(0.0)),
        on_ground: false,
        route: None,
        photo_url: None,
        last_update,
    })
}

fn number(row: &[Value], index: usize) -> Option<f64> {
    row.get(index).and_then(Value::as_f64).filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"{
        "time": 1718000000,
        "states": [
            ["4ca7b5", "RYR4KD  ", "Ireland", 1717999990, 1717999995, -6.2701, 53.4213, 3124.2, false, 171.3, 92.5, 4.2, null, 3200.4, "2000", false, 0],
            ["a0f1bb", "        ", "United States", 1717999991, 1717999995, -73.7781, 40.6413, 10668.0, false, 240.1, 275.0, 0.0, null, 10700.0, null, false, 0],
            ["3c6444", "DLH9LA ", "Germany", null, 1717999995, null, null, null, false, null, null, null, null, null, null, false, 0],
            ["3c6555", "DLH1AB ", "Germany", 1717999992, 1717999995, 8.5622, 50.0379, null, true, 3.1, 90.0, null, null, null, null, false, 0],
            ["406a3c", "BAW123 ", "United Kingdom", 1717999993, 1717999995, 0, 51.47, 500.0, false, 80.0, 270.0, null, null, null, null, false, 0],
            ["", "NOID", "Nowhere", 1717999993, 1717999995, 1.0, 1.0, 500.0, false, 80.0, 270.0, null, null, null, null, false, 0],
            ["4ca7b5", "RYR4KD  ", "Ireland", 1717999990, 1717999995, -6.0, 53.0, 3124.2, false, 171.3, 92.5, 4.2, null, 3200.4, "2000", false, 0],
            ["e48df6", "TAM3342", "Brazil", 1717999994, 1717999995, -46.47, -23.43, -12.0, false, 70.0, -10.0]
        ]
    }"#;

    fn fixture() -> StatesResponse {
        serde_json::from_str(FIXTURE).unwrap()
    }

    #[test]
    fn test_normalize_keeps_airborne_positioned_rows() {
        let flights = normalize_states(&fixture(), Utc::now());
        let ids: Vec<_> = flights.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, ["4ca7b5", "a0f1bb", "e48df6"]);
    }

    #[test]
    fn test_column_mapping() {
        let flights = normalize_states(&fixture(), Utc::now());
        let ryr = &flights[0];
        assert_eq!(ryr.callsign.as_deref(), Some("RYR4KD"));
        assert_eq!(ryr.country, "Ireland");
        assert!((ryr.latitude() - 53.4213).abs() < 1e-9);
        assert!((ryr.longitude() + 6.2701).abs() < 1e-9);
        assert!((ryr.altitude_m - 3124.2).abs() < 1e-9);
        assert!((ryr.ground_speed_mps - 171.3).abs() < 1e-9);
        assert!((ryr.heading_degrees - 92.5).abs() < 1e-9);
        assert!(!ryr.on_ground);
        assert!(ryr.route.is_none());
        assert_eq!(ryr.last_update.timestamp(), 1_717_999_990);
    }

    #[test]
    fn test_blank_callsign_becomes_none() {
        let flights = normalize_states(&fixture(), Utc::now());
        assert!(flights[1].callsign.is_none());
        assert_eq!(flights[1].display_name(), "a0f1bb");
    }

    #[test]
    fn test_short_row_and_negative_values_are_clamped() {
        let flights = normalize_states(&fixture(), Utc::now());
        let tam = &flights[2];
        assert!(tam.altitude_m.abs() < f64::EPSILON);
        assert!((tam.heading_degrees - 350.0).abs() < 1e-9);
    }

    #[test]
    fn test_record_errors() {
        let response = fixture();
        let states = response.states.unwrap();
        let now = Utc::now();
        assert_eq!(
            state_to_record(&states[2], now),
            Err(RecordError::MissingPosition("3c6444".to_string()))
        );
        assert_eq!(
            state_to_record(&states[3], now),
            Err(RecordError::OnGround("3c6555".to_string()))
        );
        assert_eq!(
            state_to_record(&states[4], now),
            Err(RecordError::MissingPosition("406a3c".to_string()))
        );
        assert_eq!(state_to_record(&states[5], now), Err(RecordError::MissingId));
    }

    #[test]
    fn test_null_states_normalize_to_empty() {
        let response: StatesResponse = serde_json::from_str(r#"{"time": 1, "states": null}"#).unwrap();
        assert!(normalize_states(&response, Utc::now()).is_empty());
    }

    #[test]
    fn test_bounds_query_order() {
        let query = bounds_query(&ViewportBounds::new(35.0, -10.0, 70.0, 40.0));
        assert_eq!(
            query,
            [("lamin", 35.0), ("lomin", -10.0), ("lamax", 70.0), ("lomax", 40.0)]
        );
    }

    #[test]
    fn test_states_url_trims_slash() {
        let feed = OpenSkyFeed::new(FeedConfig {
            base_url: "http://example.test/api/".to_string(),
            ..Default::default()
        });
        assert_eq!(feed.states_url(), "http://example.test/api/states/all");
    }

    #[tokio::test]
    async fn test_disabled_feed_always_fails() {
        let result = DisabledFeed.fetch(None).await;
        assert!(matches!(result, Err(FetchError::Disabled)));
    }

    #[tokio::test]
    async fn test_unreachable_feed_reports_failure() {
        let feed = OpenSkyFeed::new(FeedConfig {
            base_url: "http://127.0.0.1:9/api".to_string(),
            timeout: Duration::from_millis(500),
        });
        let result = feed.fetch(Some(ViewportBounds::new(0.0, 0.0, 10.0, 10.0))).await;
        assert!(matches!(
            result,
            Err(FetchError::Transport(_) | FetchError::Timeout(_))
        ));
    }
}
