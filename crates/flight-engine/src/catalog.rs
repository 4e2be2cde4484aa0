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

//! Airport and route registry for the simulated population.
//!
//! The built-in catalog holds a few dozen major airports grouped into
//! regions. Each region carries the callsign prefixes of operators that fly
//! domestic legs there; international legs draw from the whole catalog and
//! a merged operator pool.

use std::collections::{HashMap, HashSet};

use log::warn;
use rand::Rng;

use crate::error::RouteError;
use crate::geo::Coordinate;

/// (code, display name, latitude, longitude)
const BUILTIN_AIRPORTS: &[(&str, &str, f64, f64)] = &[
    // North America
    ("JFK", "John F. Kennedy Intl, New York, USA", 40.6413, -73.7781),
    ("LAX", "Los Angeles Intl, USA", 33.9425, -118.4081),
    ("ORD", "Chicago O'Hare Intl, USA", 41.9742, -87.9073),
    ("ATL", "Hartsfield-Jackson Atlanta Intl, USA", 33.6407, -84.4277),
    ("DFW", "Dallas/Fort Worth Intl, USA", 32.8998, -97.0403),
    ("SFO", "San Francisco Intl, USA", 37.6213, -122.3790),
    ("SEA", "Seattle-Tacoma Intl, USA", 47.4502, -122.3088),
    ("MIA", "Miami Intl, USA", 25.7959, -80.2870),
    ("YYZ", "Toronto Pearson Intl, Canada", 43.6777, -79.6248),
    ("YVR", "Vancouver Intl, Canada", 49.1967, -123.1815),
    ("ANC", "Ted Stevens Anchorage Intl, USA", 61.1743, -149.9962),
    // Europe
    ("LHR", "London Heathrow, UK", 51.4700, -0.4543),
    ("CDG", "Charles de Gaulle, Paris, France", 49.0097, 2.5479),
    ("AMS", "Schiphol Airport, Amsterdam, NL", 52.3105, 4.7683),
    ("FRA", "Frankfurt Airport, Germany", 50.0379, 8.5622),
    ("MAD", "Adolfo Suarez Madrid-Barajas, Spain", 40.4983, -3.5676),
    ("FCO", "Leonardo da Vinci-Fiumicino, Rome, Italy", 41.8003, 12.2389),
    ("IST", "Istanbul Airport, Turkey", 41.2753, 28.7519),
    ("SVO", "Sheremetyevo Intl, Moscow, Russia", 55.9726, 37.4146),
    ("KEF", "Keflavik Intl, Iceland", 63.9850, -22.6056),
    // Middle East and South Asia
    ("DXB", "Dubai International, UAE", 25.2532, 55.3657),
    ("DOH", "Hamad Intl, Doha, Qatar", 25.2731, 51.6081),
    ("BOM", "Chhatrapati Shivaji Maharaj Intl, Mumbai, India", 19.0896, 72.8656),
    ("DEL", "Indira Gandhi Intl, Delhi, India", 28.5562, 77.1000),
    // East and Southeast Asia
    ("HND", "Haneda Airport, Tokyo, Japan", 35.5494, 139.7798),
    ("NRT", "Narita Intl, Tokyo, Japan", 35.7720, 140.3929),
    ("PEK", "Beijing Capital Intl, China", 40.0799, 116.6031),
    ("PVG", "Shanghai Pudong Intl, China", 31.1443, 121.8083),
    ("HKG", "Hong Kong Intl, Hong Kong", 22.3080, 113.9185),
    ("ICN", "Incheon Intl, Seoul, South Korea", 37.4602, 126.4407),
    ("SIN", "Changi Airport, Singapore", 1.3644, 103.9915),
    ("BKK", "Suvarnabhumi, Bangkok, Thailand", 13.6900, 100.7501),
    // Oceania
    ("SYD", "Sydney Kingsford Smith, Australia", -33.9399, 151.1753),
    ("MEL", "Melbourne Tullamarine, Australia", -37.6690, 144.8410),
    ("BNE", "Brisbane Airport, Australia", -27.3942, 153.1218),
    ("PER", "Perth Airport, Australia", -31.9385, 115.9672),
    ("AKL", "Auckland Airport, New Zealand", -37.0082, 174.7850),
    // Latin America
    ("GRU", "Sao Paulo-Guarulhos Intl, Brazil", -23.4356, -46.4731),
    ("GIG", "Rio de Janeiro-Galeao Intl, Brazil", -22.8100, -43.2506),
    ("EZE", "Ezeiza Intl, Buenos Aires, Argentina", -34.8222, -58.5358),
    ("SCL", "Arturo Merino Benitez Intl, Santiago, Chile", -33.3930, -70.7858),
    ("BOG", "El Dorado Intl, Bogota, Colombia", 4.7016, -74.1469),
    ("MEX", "Mexico City Intl, Mexico", 19.4361, -99.0719),
    // Africa
    ("JNB", "O.R. Tambo Intl, Johannesburg, South Africa", -26.1392, 28.2460),
    ("CPT", "Cape Town Intl, South Africa", -33.9715, 18.6021),
    ("CAI", "Cairo Intl, Egypt", 30.1219, 31.4056),
    ("NBO", "Jomo Kenyatta Intl, Nairobi, Kenya", -1.3192, 36.9278),
    ("ADD", "Addis Ababa Bole Intl, Ethiopia", 8.9779, 38.7993),
    ("LOS", "Murtala Muhammed Intl, Lagos, Nigeria", 6.5774, 3.3212),
];

/// (region name, airport codes, operator callsign prefixes)
const BUILTIN_REGIONS: &[(&str, &[&str], &[&str])] = &[
    (
        "North America",
        &["JFK", "LAX", "ORD", "ATL", "DFW", "SFO", "SEA", "MIA", "YYZ", "YVR", "ANC"],
        &["AAL", "DAL", "UAL", "SWA", "JBU", "ACA", "ASA"],
    ),
    (
        "Europe",
        &["LHR", "CDG", "AMS", "FRA", "MAD", "FCO", "IST", "SVO", "KEF"],
        &["BAW", "AFR", "KLM", "DLH", "IBE", "EZY", "RYR", "THY"],
    ),
    (
        "Middle East and South Asia",
        &["DXB", "DOH", "BOM", "DEL"],
        &["UAE", "QTR", "AIC", "IGO"],
    ),
    (
        "East Asia",
        &["HND", "NRT", "PEK", "PVG", "HKG", "ICN", "SIN", "BKK"],
        &["JAL", "ANA", "CCA", "CES", "CPA", "KAL", "SIA", "THA"],
    ),
    (
        "Oceania",
        &["SYD", "MEL", "BNE", "PER", "AKL"],
        &["QFA", "VOZ", "ANZ", "JST"],
    ),
    (
        "Latin America",
        &["GRU", "GIG", "EZE", "SCL", "BOG", "MEX"],
        &["TAM", "GLO", "ARG", "LAN", "AVA", "AMX"],
    ),
    (
        "Africa",
        &["JNB", "CPT", "CAI", "NBO", "ADD", "LOS"],
        &["SAA", "MSR", "KQA", "ETH", "RAM"],
    ),
];

/// A named location that flights can depart from and arrive at.
#[derive(Debug, Clone, PartialEq)]
pub struct Airport {
    pub code: String,
    pub name: String,
    pub coordinate: Coordinate,
}

impl Airport {
    pub fn new(code: impl Into<String>, name: impl Into<String>, coordinate: Coordinate) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            coordinate,
        }
    }
}

/// A domestic route grouping.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    pub name: String,
    pub airports: Vec<String>,
    pub operators: Vec<String>,
}

impl Region {
    pub fn new<S: Into<String>>(
        name: impl Into<String>,
        airports: impl IntoIterator<Item = S>,
        operators: impl IntoIterator<Item = S>,
    ) -> Self {
        Self {
            name: name.into(),
            airports: airports.into_iter().map(Into::into).collect(),
            operators: operators.into_iter().map(Into::into).collect(),
        }
    }
}

/// Result of [`RouteCatalog::pick_route`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoutePick<'a> {
    pub origin_code: &'a str,
    pub destination_code: &'a str,
    /// Callsign prefixes appropriate for this leg.
    pub operators: &'a [String],
    /// Both endpoints came from the same region.
    pub domestic: bool,
}

/// Registry of airports and regional route groupings.
#[derive(Debug, Clone)]
pub struct RouteCatalog {
    airports: Vec<Airport>,
    index: HashMap<String, usize>,
    regions: Vec<Region>,
    global_operators: Vec<String>,
}

impl RouteCatalog {
    /// Build a catalog from caller-supplied data.
    ///
    /// Duplicate airport codes keep their first entry, in the airport list and
    /// within each region. Regions with fewer than two distinct airports or no
    /// operators cannot produce a domestic leg and are
    /// skipped. Region codes are not required to resolve to an airport.
    pub fn new(airports: Vec<Airport>, regions: Vec<Region>) -> Result<Self, RouteError> {
        let mut index = HashMap::new();
        let mut unique = Vec::with_capacity(airports.len());
        for airport in airports {
            if index.contains_key(&airport.code) {
                warn!("Duplicate airport code {} ignored", airport.code);
                continue;
            }
            index.insert(airport.code.clone(), unique.len());
            unique.push(airport);
        }

        if unique.len() < 2 {
            return Err(RouteError::TooFewAirports(unique.len()));
        }

        let regions: Vec<Region> = regions
            .into_iter()
            .map(|mut region| {
                let mut seen = HashSet::new();
                region.airports.retain(|code| seen.insert(code.clone()));
                region
            })
            .filter(|region| {
                let usable = region.airports.len() >= 2 && !region.operators.is_empty();
                if !usable {
                    warn!("Region '{}' cannot produce domestic routes, skipping", region.name);
                }
                usable
            })
            .collect();

        let mut global_operators: Vec<String> = Vec::new();
        for region in &regions {
            for operator in &region.operators {
                if !global_operators.contains(operator) {
                    global_operators.push(operator.clone());
                }
            }
        }
        if global_operators.is_empty() {
            global_operators.push("FLT".to_string());
        }

        Ok(Self {
            airports: unique,
            index,
            regions,
            global_operators,
        })
    }

    /// Coordinate of an airport, if the code is known.
    #[must_use]
    pub fn coordinate_of(&self, code: &str) -> Option<Coordinate> {
        self.airport(code).map(|a| a.coordinate)
    }

    #[must_use]
    pub fn airport(&self, code: &str) -> Option<&Airport> {
        self.index.get(code).map(|&i| &self.airports[i])
    }

    /// Display name for a code, falling back to the code itself.
    #[must_use]
    pub fn name_of<'a>(&'a self, code: &'a str) -> &'a str {
        self.airport(code).map_or(code, |a| a.name.as_str())
    }

    #[must_use]
    pub fn airports(&self) -> &[Airport] {
        &self.airports
    }

    #[must_use]
    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    #[must_use]
    pub fn global_operators(&self) -> &[String] {
        &self.global_operators
    }

    /// Choose an origin/destination pair and the operator pool for it.
    ///
    /// Half of the picks are domestic (both ends in one region), the rest are
    /// international draws over the full catalog. Origin and destination
    /// always differ.
    pub fn pick_route<R: Rng + ?Sized>(&self, rng: &mut R) -> RoutePick<'_> {
        if !self.regions.is_empty() && rng.gen_bool(0.5) {
            let region = &self.regions[rng.gen_range(0..self.regions.len())];
            let origin = pick_code(&region.airports, rng);
            let destination = pick_code_excluding(&region.airports, origin, rng);
            return RoutePick {
                origin_code: origin,
                destination_code: destination,
                operators: &region.operators,
                domestic: true,
            };
        }

        let origin = self.airports[rng.gen_range(0..self.airports.len())]
            .code
            .as_str();
        let destination = self.pick_destination(rng, origin);
        RoutePick {
            origin_code: origin,
            destination_code: destination,
            operators: &self.global_operators,
            domestic: false,
        }
    }

    /// Draw a destination from the full catalog that differs from `exclude`.
    pub fn pick_destination<R: Rng + ?Sized>(&self, rng: &mut R, exclude: &str) -> &str {
        loop {
            let code = self.airports[rng.gen_range(0..self.airports.len())]
                .code
                .as_str();
            if code != exclude {
                return code;
            }
        }
    }
}

impl Default for RouteCatalog {
    fn default() -> Self {
        let airports = BUILTIN_AIRPORTS
            .iter()
            .map(|&(code, name, lat, lon)| Airport::new(code, name, Coordinate::new(lat, lon)))
            .collect();
        let regions = BUILTIN_REGIONS
            .iter()
            .map(|&(name, codes, operators)| {
                Region::new(name, codes.iter().copied(), operators.iter().copied())
            })
            .collect();

        match Self::new(airports, regions) {
            Ok(catalog) => catalog,
            Err(e) => unreachable!("built-in catalog is valid: {e}"),
        }
    }
}

fn pick_code<'a, R: Rng + ?Sized>(codes: &'a [String], rng: &mut R) -> &'a str {
    codes[rng.gen_range(0..codes.len())].as_str()
}

fn pick_code_excluding<'a, R: Rng + ?Sized>(
    codes: &'a [String],
    exclude: &str,
    rng: &mut R,
) -> &'a str {
    // Region codes are distinct and at least two, so this terminates.
    loop {
        let code = pick_code(codes, rng);
        if code != exclude {
            return code;
        }
    }
}
