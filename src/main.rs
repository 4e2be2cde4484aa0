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

//! Headless driver for the flight engine.
//!
//! Runs the fetch controller against the live feed (or a disabled feed when
//! offline), pulls a render set every frame and reports progress in the log.

mod cli;
mod config;
mod logging;

use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use flight_engine::{
    ControllerHandle, DisabledFeed, FeedSource, FlightSimulator, OpenSkyFeed, PhotoClient,
    RenderPoint, TrackClient, Trail, ViewportBounds, ViewportFetchController,
};
use log::{debug, info, warn};
use tokio::sync::mpsc;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::cli::Cli;
use crate::config::AppConfig;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    logging::setup_logging(cli.logging_level);

    let mut config = match &cli.config {
        Some(path) => AppConfig::load_path(path)?,
        None => AppConfig::load()?,
    };
    cli.apply(&mut config);

    if cli.save_config {
        config.save(cli.config.as_deref())?;
        match &cli.config {
            Some(path) => info!("Saved configuration to {}", path.display()),
            None => {
                if let Ok(path) = AppConfig::get_config_path() {
                    info!("Saved configuration to {}", path.display());
                }
            }
        }
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(run(&cli, &config))
}

/// Enrichment gathered for the selected flight off the frame loop.
#[derive(Debug)]
enum Enrichment {
    Photo(String, Option<String>),
    Trail(String, Trail),
}

async fn run(cli: &Cli, config: &AppConfig) -> Result<(), Box<dyn Error>> {
    let simulator = match config.seed {
        Some(seed) => FlightSimulator::seeded(seed),
        None => FlightSimulator::with_defaults(),
    };
    let controller = ViewportFetchController::new(config.controller_config(), simulator);

    let feed: Arc<dyn FeedSource> = if config.offline {
        info!("Offline mode, flights will be simulated");
        Arc::new(DisabledFeed)
    } else {
        Arc::new(OpenSkyFeed::new(config.feed_config()))
    };
    let lookups = (!config.offline).then(|| Lookups {
        tracks: TrackClient::new(config.feed_config()),
        photos: PhotoClient::new(config.photo_url.clone()),
    });

    let mut handle = ControllerHandle::spawn(controller, feed);
    let mut bounds = config.viewport;
    handle.viewport_settled(bounds).await;

    let shutdown = CancellationToken::new();
    spawn_signal_handler(shutdown.clone());
    if let Some(secs) = cli.duration {
        let token = shutdown.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(secs)).await;
            info!("Run duration of {}s reached", secs);
            token.cancel();
        });
    }

    let mut frame = interval(config.frame_period());
    frame.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut status = interval(Duration::from_secs(config.status_every_secs.max(1)));
    status.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let pan_enabled = config.pan_step_degrees != 0.0;
    let pan_period = Duration::from_secs(config.pan_every_secs.max(1));
    let mut pan = tokio::time::interval_at(tokio::time::Instant::now() + pan_period, pan_period);

    let (enrich_tx, mut enrich_rx) = mpsc::channel::<Enrichment>(8);
    let mut render_set: Vec<RenderPoint> = Vec::new();
    let mut trail: Option<Trail> = None;
    let mut frames: u64 = 0;

    loop {
        tokio::select! {
            () = shutdown.cancelled() => break,
            _ = frame.tick() => {
                render_set = handle.render_set(&bounds);
                frames += 1;

                if handle.selected_flight().is_none() {
                    if let Some(first) = render_set.first() {
                        trail = select_flight(&mut handle, first.id.clone(), lookups.as_ref(), &enrich_tx);
                    }
                }
                if let (Some(trail), Some(flight)) = (trail.as_mut(), handle.selected_flight()) {
                    trail.push(flight.position);
                }
            }
            _ = status.tick() => {
                let snapshot = handle.snapshot();
                info!(
                    "{:?} | source={} generation={} known={} visible={} frames={}",
                    snapshot.state,
                    snapshot.known.source,
                    snapshot.known.generation,
                    snapshot.known.len(),
                    render_set.len(),
                    frames
                );
                if let Some(flight) = handle.selected_flight() {
                    info!(
                        "Selected {} at {:.4},{:.4} heading {:.0} (trail {} points)",
                        flight.display_name(),
                        flight.latitude(),
                        flight.longitude(),
                        flight.heading_degrees,
                        trail.as_ref().map_or(0, Trail::len)
                    );
                }
                if let Some(lookups) = &lookups {
                    lookups.photos.cleanup_cache();
                }
            }
            _ = pan.tick(), if pan_enabled => {
                bounds = pan_bounds(bounds, config.pan_step_degrees);
                debug!("Panned viewport to {:?}", bounds);
                handle.viewport_settled(bounds).await;
            }
            Some(enrichment) = enrich_rx.recv() => match enrichment {
                Enrichment::Photo(id, Some(url)) => info!("Photo for {}: {}", id, url),
                Enrichment::Photo(id, None) => debug!("No photo for {}", id),
                Enrichment::Trail(id, seeded) => {
                    if handle.selected() == Some(id.as_str()) {
                        debug!("Trail for {} seeded with {} points", id, seeded.len());
                        trail = Some(seeded);
                    }
                }
            },
        }
    }

    handle.shutdown();

    if cli.dump_json {
        println!("{}", serde_json::to_string_pretty(&render_set)?);
    }
    info!("Stopped after {} frames", frames);
    Ok(())
}

#[derive(Debug, Clone)]
struct Lookups {
    tracks: TrackClient,
    photos: PhotoClient,
}

/// Select `id` and start its trail.
///
/// With network lookups enabled the trail is seeded from track history in
/// the background and the photo is resolved alongside it.
fn select_flight(
    handle: &mut ControllerHandle,
    id: String,
    lookups: Option<&Lookups>,
    enrich_tx: &mpsc::Sender<Enrichment>,
) -> Option<Trail> {
    handle.select(Some(id.clone()));
    let current = handle.selected_flight()?.position;

    let Some(Lookups { tracks, photos }) = lookups.cloned() else {
        return Some(Trail::seeded(&[], current));
    };

    let tx = enrich_tx.clone();
    tokio::spawn(async move {
        let history = tracks.history(&id).await;
        let _ = tx
            .send(Enrichment::Trail(id.clone(), Trail::seeded(&history, current)))
            .await;
        let photo = photos.photo_url(&id).await;
        let _ = tx.send(Enrichment::Photo(id, photo)).await;
    });
    None
}

/// Shift the window east by `step` degrees, wrapping at the antimeridian.
fn pan_bounds(bounds: ViewportBounds, step: f64) -> ViewportBounds {
    let shifted = bounds.shifted(0.0, step);
    if shifted.west >= 180.0 {
        shifted.shifted(0.0, -360.0)
    } else if shifted.east <= -180.0 {
        shifted.shifted(0.0, 360.0)
    } else {
        shifted
    }
}

fn spawn_signal_handler(token: CancellationToken) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Interrupted, shutting down");
                token.cancel();
            }
            Err(e) => warn!("Unable to listen for Ctrl-C: {}", e),
        }
    });
}
