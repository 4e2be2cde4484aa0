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

//! Optional per-flight enrichment: track history and aircraft photos.
//!
//! Both lookups are best effort. They return an empty or `None` result on any
//! failure and never feed back into flight-state updates.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use log::{debug, warn};
use serde::Deserialize;
use serde_json::Value;

use crate::feed::FeedConfig;

/// Default planespotters.net photo endpoint.
pub const DEFAULT_PHOTO_URL: &str = "https://api.planespotters.net/pub/photos/hex";

const PHOTO_TIMEOUT: Duration = Duration::from_secs(5);

/// A historical position sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackSample {
    /// Unix seconds.
    pub time: i64,
    pub latitude: f64,
    pub longitude: f64,
    pub altitude_m: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
struct TrackResponse {
    #[serde(default)]
    path: Option<Vec<Vec<Value>>>,
}

/// Client for the `tracks/all` endpoint.
#[derive(Debug, Clone)]
pub struct TrackClient {
    client: reqwest::Client,
    config: FeedConfig,
}

impl TrackClient {
    #[must_use]
    pub fn new(config: FeedConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    /// Most recent track for `id`, oldest sample first. Empty on any failure.
    pub async fn history(&self, id: &str) -> Vec<TrackSample> {
        let url = format!("{}/tracks/all", self.config.base_url.trim_end_matches('/'));
        let result = self
            .client
            .get(url)
            .query(&[("icao24", id), ("time", "0")])
            .timeout(self.config.timeout)
            .send()
            .await;

        let response = match result {
            Ok(response) if response.status().is_success() => response,
            Ok(response) => {
                debug!("No track for {}: HTTP {}", id, response.status());
                return Vec::new();
            }
            Err(e) => {
                debug!("Track request for {} failed: {}", id, e);
                return Vec::new();
            }
        };

        match response.json::<TrackResponse>().await {
            Ok(body) => parse_path(&body),
            Err(e) => {
                warn!("Could not decode track for {}: {}", id, e);
                Vec::new()
            }
        }
    }
}

fn parse_path(body: &TrackResponse) -> Vec<TrackSample> {
    let Some(path) = body.path.as_ref() else {
        return Vec::new();
    };

    path.iter()
        .filter_map(|point| {
            let time = point.first()?.as_i64()?;
            let latitude = point.get(1)?.as_f64()?;
            let longitude = point.get(2)?.as_f64()?;
            (latitude.is_finite() && longitude.is_finite()).then(|| TrackSample {
                time,
                latitude,
                longitude,
                altitude_m: point.get(3).and_then(Value::as_f64),
            })
        })
        .collect()
}

#[derive(Debug, Clone, Deserialize)]
struct PhotoSize {
    src: String,
}

#[derive(Debug, Clone, Deserialize)]
struct Photo {
    thumbnail_large: PhotoSize,
}

#[derive(Debug, Clone, Deserialize)]
struct PhotoResponse {
    #[serde(default)]
    photos: Vec<Photo>,
}

#[derive(Debug)]
struct CacheEntry {
    url: Option<String>,
    timestamp: Instant,
}

/// Aircraft photo lookup with a TTL cache of hits and misses.
#[derive(Debug, Clone)]
pub struct PhotoClient {
    client: reqwest::Client,
    base_url: String,
    cache: Arc<Mutex<HashMap<String, CacheEntry>>>,
    cache_ttl: Duration,
}

impl PhotoClient {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            cache: Arc::new(Mutex::new(HashMap::new())),
            cache_ttl: Duration::from_secs(3600 * 24),
        }
    }

    /// Large thumbnail URL for the aircraft with hex id `id`, if one exists.
    pub async fn photo_url(&self, id: &str) -> Option<String> {
        let key = id.to_lowercase();
        if let Some(cached) = self.get_from_cache(&key) {
            return cached;
        }

        let url = format!("{}/{}", self.base_url.trim_end_matches('/'), key);
        let result = self.fetch(&url).await;
        if let Err(e) = &result {
            debug!("No photo for {}: {}", key, e);
        }
        let photo = result.ok().flatten();
        self.store_in_cache(&key, photo.clone());
        photo
    }

    async fn fetch(&self, url: &str) -> Result<Option<String>, reqwest::Error> {
        let response = self
            .client
            .get(url)
            .timeout(PHOTO_TIMEOUT)
            .send()
            .await?
            .error_for_status()?;
        let body: PhotoResponse = response.json().await?;
        Ok(body.photos.into_iter().next().map(|p| p.thumbnail_large.src))
    }

    fn get_from_cache(&self, key: &str) -> Option<Option<String>> {
        let cache = self.cache.lock().ok()?;
        cache
            .get(key)
            .filter(|entry| entry.timestamp.elapsed() < self.cache_ttl)
            .map(|entry| entry.url.clone())
    }

    fn store_in_cache(&self, key: &str, url: Option<String>) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.insert(
                key.to_string(),
                CacheEntry {
                    url,
                    timestamp: Instant::now(),
                },
            );
        }
    }

    /// Drop expired cache entries.
    pub fn cleanup_cache(&self) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.retain(|_, entry| entry.timestamp.elapsed() < self.cache_ttl);
        }
    }

    #[must_use]
    pub fn cached_len(&self) -> usize {
        self.cache.lock().map(|c| c.len()).unwrap_or(0)
    }
}

impl Default for PhotoClient {
    fn default() -> Self {
        Self::new(DEFAULT_PHOTO_URL)
    }
}
