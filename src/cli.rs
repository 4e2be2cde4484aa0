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

//! Command-line interface.

use std::path::PathBuf;

use clap::Parser;
use flight_engine::ViewportBounds;

use crate::config::AppConfig;

#[derive(Parser, Debug)]
#[command(version, about = "Headless live flight map with simulated fallback", long_about = None)]
pub struct Cli {
    /// Config file to use instead of the platform default
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Never contact the live feed; always simulate
    #[arg(long, default_value_t = false)]
    pub offline: bool,

    /// Stop after this many seconds
    #[arg(long)]
    pub duration: Option<u64>,

    /// Simulated population size
    #[arg(long)]
    pub population: Option<usize>,

    /// Seed for a reproducible simulation
    #[arg(long)]
    pub seed: Option<u64>,

    /// Live feed base URL
    #[arg(long)]
    pub feed_url: Option<String>,

    /// Initial viewport as south,west,north,east
    #[arg(long, value_parser = parse_bounds, allow_hyphen_values = true)]
    pub bounds: Option<ViewportBounds>,

    /// Longitude step per pan in degrees
    #[arg(long, allow_hyphen_values = true)]
    pub pan_step: Option<f64>,

    /// Print the final render set as JSON on exit
    #[arg(long, default_value_t = false)]
    pub dump_json: bool,

    /// Write the effective configuration back to disk
    #[arg(long, default_value_t = false)]
    pub save_config: bool,

    #[arg(short, long, default_value_t = log::LevelFilter::Info)]
    pub logging_level: log::LevelFilter,
}

impl Cli {
    /// Overlay command-line values onto the loaded configuration.
    pub fn apply(&self, config: &mut AppConfig) {
        if self.offline {
            config.offline = true;
        }
        if let Some(population) = self.population {
            config.population = population;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        if let Some(url) = &self.feed_url {
            config.feed_url.clone_from(url);
        }
        if let Some(bounds) = self.bounds {
            config.viewport = bounds;
        }
        if let Some(step) = self.pan_step {
            config.pan_step_degrees = step;
        }
    }
}

fn parse_bounds(value: &str) -> Result<ViewportBounds, String> {
    let parts = value
        .split(',')
        .map(|p| p.trim().parse::<f64>().map_err(|e| format!("{p:?}: {e}")))
        .collect::<Result<Vec<_>, _>>()?;

    let [south, west, north, east] = parts[..] else {
        return Err(format!("expected 4 comma-separated values, got {}", parts.len()));
    };
    if !(south < north && west < east) {
        return Err("bounds must satisfy south < north and west < east".to_string());
    }
    if !(-90.0..=90.0).contains(&south) || !(-90.0..=90.0).contains(&north) {
        return Err("latitude out of range".to_string());
    }
    Ok(ViewportBounds::new(south, west, north, east))
}
