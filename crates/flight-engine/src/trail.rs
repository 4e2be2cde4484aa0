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

//! Display trail for the selected flight.

use std::collections::VecDeque;

use crate::enrichment::TrackSample;
use crate::geo::Coordinate;

const POSITION_CHANGE_THRESHOLD_DEGREES: f64 = 0.001; // ~100 meters at mid-latitudes
const DEFAULT_MAX_POINTS: usize = 2_000;

/// Bounded polyline of past positions, oldest first.
#[derive(Debug, Clone, PartialEq)]
pub struct Trail {
    points: VecDeque<Coordinate>,
    max_points: usize,
}

impl Trail {
    #[must_use]
    pub fn new(max_points: usize) -> Self {
        Self {
            points: VecDeque::new(),
            max_points: max_points.max(1),
        }
    }

    /// Start from fetched history, or from the current position when there is none.
    #[must_use]
    pub fn seeded(history: &[TrackSample], current: Coordinate) -> Self {
        let mut trail = Self::default();
        if history.is_empty() {
            trail.push(current);
        } else {
            for sample in history {
                trail.push(Coordinate::new(sample.latitude, sample.longitude));
            }
        }
        trail
    }

    /// Append `position` if it moved far enough from the last point.
    ///
    /// Returns whether the point was added.
    pub fn push(&mut self, position: Coordinate) -> bool {
        if !position.is_finite() {
            return false;
        }

        if let Some(last) = self.points.back() {
            let moved = ((position.latitude - last.latitude).powi(2)
                + (position.longitude - last.longitude).powi(2))
            .sqrt();
            if moved <= POSITION_CHANGE_THRESHOLD_DEGREES {
                return false;
            }
        }

        self.points.push_back(position);
        while self.points.len() > self.max_points {
            self.points.pop_front();
        }
        true
    }

    pub fn points(&self) -> impl Iterator<Item = &Coordinate> {
        self.points.iter()
    }

    #[must_use]
    pub fn last(&self) -> Option<Coordinate> {
        self.points.back().copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }
}

impl Default for Trail {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_POINTS)
    }
}
