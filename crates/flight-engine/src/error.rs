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

//! Error types.
//!
//! Nothing here is fatal to the process. Feed errors send the controller to
//! the simulated population, record errors drop a single state vector, and
//! route errors degrade one simulated flight to dead reckoning.

use thiserror::Error;

/// Reasons a live feed query produced no usable flights.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("request timed out after {0} ms")]
    Timeout(u64),

    #[error("feed returned HTTP {0}")]
    Status(u16),

    #[error("could not decode feed response: {0}")]
    Decode(String),

    #[error("feed returned no usable flights")]
    Empty,

    #[error("live feed disabled")]
    Disabled,
}

/// Reasons a single state vector was dropped during normalization.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("state vector has no icao24 identifier")]
    MissingId,

    #[error("state vector {0} has no usable position")]
    MissingPosition(String),

    #[error("state vector {0} is on the ground")]
    OnGround(String),
}

/// Route catalog failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    #[error("route code {0} has no known coordinate")]
    UnknownCode(String),

    #[error("catalog needs at least two airports, got {0}")]
    TooFewAirports(usize),
}
