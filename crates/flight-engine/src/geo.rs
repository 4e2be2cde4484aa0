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

//! Geographic primitives.
//!
//! Great-circle bearing and distance, linear interpolation between two
//! coordinates, forward projection along a bearing, and the rectangular
//! viewport used for fetch queries and render pruning.

use serde::{Deserialize, Serialize};

/// Mean Earth radius in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// A latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Both components are finite numbers.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.latitude.is_finite() && self.longitude.is_finite()
    }
}

/// Forward azimuth from `from` to `to` in degrees, normalized to [0, 360).
#[must_use]
pub fn bearing(from: Coordinate, to: Coordinate) -> f64 {
    let lat1 = from.latitude.to_radians();
    let lat2 = to.latitude.to_radians();
    let delta_lon = (to.longitude - from.longitude).to_radians();

    let y = delta_lon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * delta_lon.cos();

    let degrees = y.atan2(x).to_degrees();
    if degrees < 0.0 {
        // -0.0 and tiny negatives round up to exactly 360.0 otherwise
        (degrees + 360.0) % 360.0
    } else {
        degrees
    }
}

/// Haversine great-circle distance in kilometres.
#[must_use]
pub fn distance_km(from: Coordinate, to: Coordinate) -> f64 {
    let lat1 = from.latitude.to_radians();
    let lat2 = to.latitude.to_radians();
    let delta_lat = (to.latitude - from.latitude).to_radians();
    let delta_lon = (to.longitude - from.longitude).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Linear blend between two coordinates in degree space.
///
/// This is not a great-circle slerp. Long routes drawn this way bow away
/// from the true shortest path, which is accepted for display purposes.
#[must_use]
pub fn lerp(from: Coordinate, to: Coordinate, fraction: f64) -> Coordinate {
    Coordinate {
        latitude: from.latitude + (to.latitude - from.latitude) * fraction,
        longitude: from.longitude + (to.longitude - from.longitude) * fraction,
    }
}

/// Point reached by travelling `distance_km` from `from` along `bearing_deg`.
///
/// Longitude is wrapped into [-180, 180].
#[must_use]
pub fn destination(from: Coordinate, bearing_deg: f64, distance_km: f64) -> Coordinate {
    let angular = distance_km / EARTH_RADIUS_KM;
    let theta = bearing_deg.to_radians();
    let lat1 = from.latitude.to_radians();
    let lon1 = from.longitude.to_radians();

    let lat2 = (lat1.sin() * angular.cos() + lat1.cos() * angular.sin() * theta.cos()).asin();
    let lon2 = lon1
        + (theta.sin() * angular.sin() * lat1.cos())
            .atan2(angular.cos() - lat1.sin() * lat2.sin());

    Coordinate {
        latitude: lat2.to_degrees(),
        longitude: wrap_longitude(lon2.to_degrees()),
    }
}

/// Wrap a longitude into [-180, 180].
#[must_use]
pub fn wrap_longitude(longitude: f64) -> f64 {
    if (-180.0..=180.0).contains(&longitude) {
        longitude
    } else {
        (longitude + 180.0).rem_euclid(360.0) - 180.0
    }
}

/// Rectangular geographic window, as reported by the map viewport.
///
/// Antimeridian wrap is not handled; containment is a plain rectangle test.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportBounds {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl ViewportBounds {
    #[must_use]
    pub const fn new(south: f64, west: f64, north: f64, east: f64) -> Self {
        Self {
            south,
            west,
            north,
            east,
        }
    }

    /// The whole globe.
    #[must_use]
    pub const fn world() -> Self {
        Self::new(-90.0, -180.0, 90.0, 180.0)
    }

    /// Inclusive rectangle containment.
    #[must_use]
    pub fn contains(&self, point: Coordinate) -> bool {
        self.south <= point.latitude
            && point.latitude <= self.north
            && self.west <= point.longitude
            && point.longitude <= self.east
    }

    /// Grow every edge outward by `fraction` of the corresponding span.
    #[must_use]
    pub fn padded(&self, fraction: f64) -> Self {
        let lat_pad = (self.north - self.south) * fraction;
        let lon_pad = (self.east - self.west) * fraction;
        Self {
            south: self.south - lat_pad,
            west: self.west - lon_pad,
            north: self.north + lat_pad,
            east: self.east + lon_pad,
        }
    }

    /// Shift the window by the given offsets in degrees.
    #[must_use]
    pub fn shifted(&self, d_lat: f64, d_lon: f64) -> Self {
        Self {
            south: self.south + d_lat,
            west: self.west + d_lon,
            north: self.north + d_lat,
            east: self.east + d_lon,
        }
    }

    #[must_use]
    pub fn center(&self) -> Coordinate {
        Coordinate::new(
            (self.south + self.north) / 2.0,
            (self.west + self.east) / 2.0,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LHR: Coordinate = Coordinate::new(51.47, -0.4543);
    const JFK: Coordinate = Coordinate::new(40.6413, -73.7781);

    #[test]
    fn test_bearing_cardinal_directions() {
        let origin = Coordinate::new(0.0, 0.0);
        assert!((bearing(origin, Coordinate::new(0.0, 90.0)) - 90.0).abs() < 1e-9);
        assert!(bearing(origin, Coordinate::new(90.0, 0.0)).abs() < 1e-9);
        assert!((bearing(origin, Coordinate::new(0.0, -90.0)) - 270.0).abs() < 1e-9);
        assert!((bearing(origin, Coordinate::new(-10.0, 0.0)) - 180.0).abs() < 1e-9);
    }

    #[test]
    fn test_bearing_lhr_to_jfk_is_westward() {
        let b = bearing(LHR, JFK);
        assert!(b > 260.0 && b < 290.0, "bearing was {b}");
    }

    #[test]
    fn test_bearing_always_in_range() {
        let points = [
            Coordinate::new(0.0, 0.0),
            Coordinate::new(0.0, -0.0),
            Coordinate::new(-33.9, 151.2),
            Coordinate::new(64.1, -21.9),
            LHR,
            JFK,
        ];
        for a in points {
            for b in points {
                let value = bearing(a, b);
                assert!((0.0..360.0).contains(&value), "{a:?} -> {b:?} gave {value}");
            }
        }
    }

    #[test]
    fn test_distance_to_self_is_zero() {
        assert!(distance_km(LHR, LHR).abs() < 1e-9);
    }

    #[test]
    fn test_distance_lhr_jfk() {
        let d = distance_km(LHR, JFK);
        assert!((5500.0..=5700.0).contains(&d), "distance was {d}");
    }

    #[test]
    fn test_lerp_quarter() {
        let p = lerp(Coordinate::new(0.0, 0.0), Coordinate::new(40.0, -80.0), 0.25);
        assert!((p.latitude - 10.0).abs() < 1e-12);
        assert!((p.longitude + 20.0).abs() < 1e-12);
    }

    #[test]
    fn test_destination_round_trip_distance() {
        let start = Coordinate::new(48.8566, 2.3522);
        let end = destination(start, 75.0, 500.0);
        assert!((distance_km(start, end) - 500.0).abs() < 1e-6);
        assert!((bearing(start, end) - 75.0).abs() < 0.01);
    }

    #[test]
    fn test_destination_wraps_longitude() {
        let end = destination(Coordinate::new(0.0, 179.5), 90.0, 200.0);
        assert!(end.longitude < -178.0);
    }

    #[test]
    fn test_padded_bounds() {
        let bounds = ViewportBounds::new(0.0, 0.0, 10.0, 10.0).padded(0.1);
        assert!(bounds.contains(Coordinate::new(5.0, 5.0)));
        assert!(bounds.contains(Coordinate::new(-0.5, -0.5)));
        assert!(!bounds.contains(Coordinate::new(-5.0, -5.0)));
        assert!((bounds.south + 1.0).abs() < 1e-12);
        assert!((bounds.east - 11.0).abs() < 1e-12);
    }

    #[test]
    fn test_contains_edges_inclusive() {
        let bounds = ViewportBounds::new(0.0, 0.0, 10.0, 10.0);
        assert!(bounds.contains(Coordinate::new(0.0, 10.0)));
        assert!(!bounds.contains(Coordinate::new(f64::NAN, 5.0)));
    }
}
