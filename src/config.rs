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

//! Application configuration management.
//!
//! Settings are persisted as TOML through `confy`. Missing keys fall back to
//! the serde default functions below, so older files keep loading as fields
//! are added.

use std::path::Path;
use std::time::Duration;

use flight_engine::{ControllerConfig, FeedConfig, ViewportBounds};
use serde::{Deserialize, Serialize};

const APP_NAME: &str = "skystream";
const CONFIG_NAME: &str = "config";

/// Application configuration stored in TOML format
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AppConfig {
    /// OpenSky-compatible REST base URL
    #[serde(default = "default_feed_url")]
    pub feed_url: String,

    /// Photo lookup base URL
    #[serde(default = "default_photo_url")]
    pub photo_url: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Background refresh period in seconds
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Simulated population used when the feed is unavailable
    #[serde(default = "default_population")]
    pub population: usize,

    /// Fixed seed for reproducible simulation runs
    #[serde(default)]
    pub seed: Option<u64>,

    /// Skip the live feed entirely
    #[serde(default)]
    pub offline: bool,

    /// Initial map window
    #[serde(default = "default_viewport")]
    pub viewport: ViewportBounds,

    /// Render pulls per second
    #[serde(default = "default_frame_rate")]
    pub frame_rate: u32,

    /// Longitude step applied on every pan, in degrees (0 disables panning)
    #[serde(default)]
    pub pan_step_degrees: f64,

    /// Seconds between pans
    #[serde(default = "default_pan_every_secs")]
    pub pan_every_secs: u64,

    /// Seconds between status log lines
    #[serde(default = "default_status_every_secs")]
    pub status_every_secs: u64,
}

// Default value functions for serde
fn default_feed_url() -> String {
    flight_engine::feed::DEFAULT_FEED_URL.to_string()
}

fn default_photo_url() -> String {
    flight_engine::enrichment::DEFAULT_PHOTO_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    5
}

fn default_poll_interval_secs() -> u64 {
    10
}

fn default_population() -> usize {
    4000
}

fn default_viewport() -> ViewportBounds {
    // Western Europe
    ViewportBounds::new(35.0, -10.0, 60.0, 30.0)
}

fn default_frame_rate() -> u32 {
    30
}

fn default_pan_every_secs() -> u64 {
    20
}

fn default_status_every_secs() -> u64 {
    5
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            feed_url: default_feed_url(),
            photo_url: default_photo_url(),
            timeout_secs: default_timeout_secs(),
            poll_interval_secs: default_poll_interval_secs(),
            population: default_population(),
            seed: None,
            offline: false,
            viewport: default_viewport(),
            frame_rate: default_frame_rate(),
            pan_step_degrees: 0.0,
            pan_every_secs: default_pan_every_secs(),
            status_every_secs: default_status_every_secs(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the platform config directory
    pub fn load() -> Result<Self, confy::ConfyError> {
        confy::load(APP_NAME, CONFIG_NAME)
    }

    /// Load configuration from an explicit file, creating it if missing
    pub fn load_path(path: &Path) -> Result<Self, confy::ConfyError> {
        confy::load_path(path)
    }

    /// Save configuration to `path`, or to the platform config directory
    pub fn save(&self, path: Option<&Path>) -> Result<(), confy::ConfyError> {
        match path {
            Some(path) => confy::store_path(path, self),
            None => confy::store(APP_NAME, CONFIG_NAME, self),
        }
    }

    /// Get the default config file path for display to user
    pub fn get_config_path() -> Result<std::path::PathBuf, confy::ConfyError> {
        confy::get_configuration_file_path(APP_NAME, CONFIG_NAME)
    }

    pub fn feed_config(&self) -> FeedConfig {
        FeedConfig {
            base_url: self.feed_url.clone(),
            timeout: Duration::from_secs(self.timeout_secs.max(1)),
        }
    }

    pub fn controller_config(&self) -> ControllerConfig {
        ControllerConfig {
            poll_interval: Duration::from_secs(self.poll_interval_secs.max(1)),
            default_population: self.population,
            ..ControllerConfig::default()
        }
    }

    /// Time between render pulls
    pub fn frame_period(&self) -> Duration {
        Duration::from_secs(1) / self.frame_rate.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_keys_use_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{"population": 12, "seed": 9}"#).unwrap();
        assert_eq!(config.population, 12);
        assert_eq!(config.seed, Some(9));
        assert_eq!(config.feed_url, default_feed_url());
        assert_eq!(config.viewport, default_viewport());
        assert_eq!(config.frame_rate, 30);
        assert!(!config.offline);
    }

    #[test]
    fn test_derived_component_configs() {
        let config = AppConfig {
            timeout_secs: 0,
            poll_interval_secs: 3,
            population: 250,
            frame_rate: 20,
            ..AppConfig::default()
        };
        assert_eq!(config.feed_config().timeout, Duration::from_secs(1));
        let controller = config.controller_config();
        assert_eq!(controller.poll_interval, Duration::from_secs(3));
        assert_eq!(controller.default_population, 250);
        assert_eq!(config.frame_period(), Duration::from_millis(50));
    }
}
