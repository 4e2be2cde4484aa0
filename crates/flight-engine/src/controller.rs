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

//! Viewport-driven fetch controller.
//!
//! [`ViewportFetchController`] is a synchronous state machine: triggers hand
//! out [`FetchTicket`]s and [`ViewportFetchController::complete`] applies the
//! outcome. At most one ticket is outstanding at a time. Triggers that land
//! while a fetch is running are coalesced into a single follow-up fetch that
//! uses the latest bounds.
//!
//! [`ControllerHandle::spawn`] runs the machine on a background task, wiring
//! it to a [`FeedSource`], a poll timer and a control channel, and publishes
//! each new state through a `watch` channel.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::Rng;
use tokio::sync::{mpsc, watch};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::error::FetchError;
use crate::feed::FeedSource;
use crate::flight::{DataSource, FlightRecord, KnownFlights, RenderPoint};
use crate::geo::ViewportBounds;
use crate::pruner::{ViewportPruner, DEFAULT_PADDING};
use crate::simulator::FlightSimulator;

/// Shortest poll period the background task will run with.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Configuration for the fetch controller.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Period of the background refresh while bounds are known.
    pub poll_interval: Duration,
    /// Simulated population generated on the first failed fetch.
    pub default_population: usize,
    /// A fetch running longer than this is abandoned at the next trigger.
    pub stale_after: Duration,
    /// Viewport margin used when pruning the render set.
    pub padding: f64,
    /// Control channel buffer size.
    pub buffer_size: usize,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(10),
            default_population: 4000,
            stale_after: Duration::from_secs(15),
            padding: DEFAULT_PADDING,
            buffer_size: 64,
        }
    }
}

impl ControllerConfig {
    /// `poll_interval` clamped to [`MIN_POLL_INTERVAL`].
    #[must_use]
    pub fn effective_poll_interval(&self) -> Duration {
        self.poll_interval.max(MIN_POLL_INTERVAL)
    }
}

/// Fetch lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchState {
    /// No fetch has been triggered yet.
    #[default]
    Idle,
    /// A fetch is in flight.
    Loading,
    /// The last fetch finished, live or simulated.
    Ready,
}

/// Permission to run one fetch for `bounds`.
///
/// The result must be handed back through
/// [`ViewportFetchController::complete`] together with the ticket.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FetchTicket {
    pub seq: u64,
    pub bounds: ViewportBounds,
}

#[derive(Debug, Clone, Copy)]
struct InFlight {
    seq: u64,
    started: DateTime<Utc>,
}

/// Owns the known-flights collection and the fallback simulator.
#[derive(Debug)]
pub struct ViewportFetchController<R = StdRng> {
    config: ControllerConfig,
    simulator: FlightSimulator<R>,
    state: FetchState,
    bounds: Option<ViewportBounds>,
    next_seq: u64,
    in_flight: Option<InFlight>,
    pending: bool,
    known: KnownFlights,
}

impl<R: Rng> ViewportFetchController<R> {
    #[must_use]
    pub fn new(config: ControllerConfig, simulator: FlightSimulator<R>) -> Self {
        Self {
            config,
            simulator,
            state: FetchState::Idle,
            bounds: None,
            next_seq: 0,
            in_flight: None,
            pending: false,
            known: KnownFlights::default(),
        }
    }

    #[must_use]
    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    #[must_use]
    pub fn state(&self) -> FetchState {
        self.state
    }

    /// Latest settled bounds, if any.
    #[must_use]
    pub fn bounds(&self) -> Option<ViewportBounds> {
        self.bounds
    }

    #[must_use]
    pub fn known(&self) -> &KnownFlights {
        &self.known
    }

    #[must_use]
    pub fn simulator(&self) -> &FlightSimulator<R> {
        &self.simulator
    }

    /// Whether a trigger arrived during the current fetch.
    #[must_use]
    pub fn has_pending(&self) -> bool {
        self.pending
    }

    /// Record new bounds and request a fetch for them.
    pub fn on_viewport_settled(
        &mut self,
        bounds: ViewportBounds,
        now: DateTime<Utc>,
    ) -> Option<FetchTicket> {
        debug!("Viewport settled: {:?}", bounds);
        self.bounds = Some(bounds);
        self.trigger(now)
    }

    /// Timer trigger. Ignored until the first viewport has settled.
    pub fn on_poll_tick(&mut self, now: DateTime<Utc>) -> Option<FetchTicket> {
        if self.bounds.is_none() {
            return None;
        }
        self.trigger(now)
    }

    fn trigger(&mut self, now: DateTime<Utc>) -> Option<FetchTicket> {
        if let Some(in_flight) = self.in_flight {
            let stale_after = TimeDelta::from_std(self.config.stale_after)
                .unwrap_or_else(|_| TimeDelta::days(365));
            if now - in_flight.started < stale_after {
                self.pending = true;
                return None;
            }
            warn!(
                "Abandoning fetch #{} after {}s without a response",
                in_flight.seq,
                (now - in_flight.started).num_seconds()
            );
        }
        self.start(now)
    }

    fn start(&mut self, now: DateTime<Utc>) -> Option<FetchTicket> {
        let bounds = self.bounds?;
        self.next_seq += 1;
        self.in_flight = Some(InFlight {
            seq: self.next_seq,
            started: now,
        });
        self.pending = false;
        self.state = FetchState::Loading;
        Some(FetchTicket {
            seq: self.next_seq,
            bounds,
        })
    }

    /// Apply the outcome of a fetch.
    ///
    /// A result for anything other than the outstanding ticket is discarded.
    /// Returns the follow-up ticket when triggers were coalesced meanwhile.
    pub fn complete(
        &mut self,
        ticket: FetchTicket,
        result: Result<Vec<FlightRecord>, FetchError>,
        now: DateTime<Utc>,
    ) -> Option<FetchTicket> {
        match self.in_flight {
            Some(in_flight) if in_flight.seq == ticket.seq => {}
            _ => {
                debug!("Discarding result of superseded fetch #{}", ticket.seq);
                return None;
            }
        }
        self.in_flight = None;

        match result {
            Ok(flights) => {
                if self.known.source != DataSource::Live {
                    info!("Live feed available, showing {} flights", flights.len());
                }
                self.replace(flights, DataSource::Live, now);
            }
            Err(e) => {
                if self.known.source == DataSource::Simulated {
                    debug!("Live feed still unavailable: {}", e);
                } else {
                    warn!("Live feed unavailable, falling back to simulation: {}", e);
                }
                self.simulator
                    .ensure_population(self.config.default_population, now);
                let flights = self.simulator.tick_within(now, &ticket.bounds);
                self.replace(flights, DataSource::Simulated, now);
            }
        }
        self.state = FetchState::Ready;

        if self.pending {
            self.start(now)
        } else {
            None
        }
    }

    fn replace(&mut self, flights: Vec<FlightRecord>, source: DataSource, now: DateTime<Utc>) {
        self.known = KnownFlights {
            flights: Arc::new(flights),
            source,
            generation: self.known.generation + 1,
            updated_at: Some(now),
        };
    }

    /// Run `ticket` and any coalesced follow-ups against `feed` inline.
    pub async fn drive<F>(&mut self, feed: &F, ticket: FetchTicket)
    where
        F: FeedSource + ?Sized,
    {
        let mut next = Some(ticket);
        while let Some(ticket) = next {
            let result = feed.fetch(Some(ticket.bounds)).await;
            next = self.complete(ticket, result, Utc::now());
        }
    }

    fn snapshot(&self) -> ControllerSnapshot {
        ControllerSnapshot {
            state: self.state,
            known: self.known.clone(),
        }
    }
}

/// State published to observers after every transition.
#[derive(Debug, Clone, Default)]
pub struct ControllerSnapshot {
    pub state: FetchState,
    pub known: KnownFlights,
}

/// Commands accepted by the background task.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlEvent {
    /// The map finished moving or zooming.
    ViewportSettled(ViewportBounds),
    /// Refresh now, as if the poll timer fired.
    Refresh,
}

type FetchOutcome = (FetchTicket, Result<Vec<FlightRecord>, FetchError>);

/// Handle to a controller running on a background task.
///
/// Also the pull side of the render contract: call
/// [`ControllerHandle::render_set`] once per frame.
pub struct ControllerHandle {
    events_tx: mpsc::Sender<ControlEvent>,
    snapshot_rx: watch::Receiver<ControllerSnapshot>,
    cancel_token: CancellationToken,
    pruner: ViewportPruner,
    selected: Option<String>,
}

impl std::fmt::Debug for ControllerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControllerHandle")
            .field("selected", &self.selected)
            .field("cancel_token", &self.cancel_token)
            .finish_non_exhaustive()
    }
}

impl ControllerHandle {
    /// Move `controller` onto a background task fed by `feed`.
    #[must_use]
    pub fn spawn<F, R>(controller: ViewportFetchController<R>, feed: Arc<F>) -> Self
    where
        F: FeedSource + ?Sized + 'static,
        R: Rng + Send + 'static,
    {
        let config = controller.config().clone();
        let (events_tx, events_rx) = mpsc::channel(config.buffer_size);
        let (snapshot_tx, snapshot_rx) = watch::channel(controller.snapshot());
        let cancel_token = CancellationToken::new();

        let task_cancel = cancel_token.clone();
        tokio::spawn(async move {
            run(controller, feed, events_rx, snapshot_tx, task_cancel).await;
        });

        Self {
            events_tx,
            snapshot_rx,
            cancel_token,
            pruner: ViewportPruner::new(config.padding),
            selected: None,
        }
    }

    /// Report settled viewport bounds.
    pub async fn viewport_settled(&self, bounds: ViewportBounds) {
        let _ = self
            .events_tx
            .send(ControlEvent::ViewportSettled(bounds))
            .await;
    }

    /// Ask for an immediate refresh of the current bounds.
    pub async fn refresh(&self) {
        let _ = self.events_tx.send(ControlEvent::Refresh).await;
    }

    /// Latest published state.
    #[must_use]
    pub fn snapshot(&self) -> ControllerSnapshot {
        self.snapshot_rx.borrow().clone()
    }

    /// Wait for the next published state.
    ///
    /// Returns `false` once the background task has stopped.
    pub async fn changed(&mut self) -> bool {
        self.snapshot_rx.changed().await.is_ok()
    }

    /// Flights to draw for `bounds` this frame.
    pub fn render_set(&mut self, bounds: &ViewportBounds) -> Vec<RenderPoint> {
        let known = self.snapshot_rx.borrow().known.clone();
        self.pruner
            .render_set(&known, bounds, self.selected.as_deref())
    }

    /// Select a flight by id, or clear the selection with `None`.
    pub fn select(&mut self, id: Option<String>) {
        self.selected = id;
    }

    #[must_use]
    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// Latest record for the selected id. Ids survive respawn, so this
    /// follows a simulated flight across legs.
    #[must_use]
    pub fn selected_flight(&self) -> Option<FlightRecord> {
        let id = self.selected.as_deref()?;
        self.snapshot_rx.borrow().known.get(id).cloned()
    }

    /// Stop the background task.
    pub fn shutdown(&self) {
        self.cancel_token.cancel();
    }
}

impl Drop for ControllerHandle {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}

async fn run<F, R>(
    mut controller: ViewportFetchController<R>,
    feed: Arc<F>,
    mut events_rx: mpsc::Receiver<ControlEvent>,
    snapshot_tx: watch::Sender<ControllerSnapshot>,
    cancel_token: CancellationToken,
) where
    F: FeedSource + ?Sized + 'static,
    R: Rng,
{
    let (result_tx, mut result_rx) = mpsc::channel::<FetchOutcome>(4);
    let period = controller.config().effective_poll_interval();
    let mut poll = interval_at(Instant::now() + period, period);
    poll.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!(
        "Controller started ({}, polling every {}s)",
        feed.name(),
        period.as_secs()
    );

    loop {
        let ticket = tokio::select! {
            () = cancel_token.cancelled() => {
                info!("Controller cancelled");
                return;
            }
            event = events_rx.recv() => match event {
                Some(ControlEvent::ViewportSettled(bounds)) => {
                    controller.on_viewport_settled(bounds, Utc::now())
                }
                Some(ControlEvent::Refresh) => controller.on_poll_tick(Utc::now()),
                None => {
                    info!("Controller handle dropped");
                    return;
                }
            },
            _ = poll.tick() => controller.on_poll_tick(Utc::now()),
            Some((ticket, result)) = result_rx.recv() => {
                controller.complete(ticket, result, Utc::now())
            }
        };

        if let Some(ticket) = ticket {
            spawn_fetch(Arc::clone(&feed), ticket, result_tx.clone(), cancel_token.clone());
        }
        snapshot_tx.send_replace(controller.snapshot());
    }
}

fn spawn_fetch<F>(
    feed: Arc<F>,
    ticket: FetchTicket,
    result_tx: mpsc::Sender<FetchOutcome>,
    cancel_token: CancellationToken,
) where
    F: FeedSource + ?Sized + 'static,
{
    debug!("Starting fetch #{} from {}", ticket.seq, feed.name());
    tokio::spawn(async move {
        tokio::select! {
            result = feed.fetch(Some(ticket.bounds)) => {
                let _ = result_tx.send((ticket, result)).await;
            }
            () = cancel_token.cancelled() => {}
        }
    });
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::geo::Coordinate;

    struct EmptyFeed;

    #[async_trait]
    impl FeedSource for EmptyFeed {
        async fn fetch(
            &self,
            _bounds: Option<ViewportBounds>,
        ) -> Result<Vec<FlightRecord>, FetchError> {
            Err(FetchError::Empty)
        }
    }

    struct FixedFeed {
        flights: Vec<FlightRecord>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl FeedSource for FixedFeed {
        async fn fetch(
            &self,
            _bounds: Option<ViewportBounds>,
        ) -> Result<Vec<FlightRecord>, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.flights.clone())
        }
    }

    fn live(id: &str, latitude: f64, longitude: f64) -> FlightRecord {
        FlightRecord {
            id: id.to_string(),
            callsign: Some(format!("LIVE{id}")),
            country: "Testland".to_string(),
            position: Coordinate::new(latitude, longitude),
            heading_degrees: 90.0,
            altitude_m: 11_000.0,
            ground_speed_mps: 240.0,
            on_ground: false,
            route: None,
            photo_url: None,
            last_update: Utc::now(),
        }
    }

    fn controller() -> ViewportFetchController {
        ViewportFetchController::new(ControllerConfig::default(), FlightSimulator::seeded(7))
    }

    fn europe() -> ViewportBounds {
        ViewportBounds::new(35.0, -10.0, 60.0, 30.0)
    }

    #[test]
    fn test_starts_idle_and_ignores_polls_without_bounds() {
        let mut c = controller();
        assert_eq!(c.state(), FetchState::Idle);
        assert!(c.on_poll_tick(Utc::now()).is_none());
        assert_eq!(c.state(), FetchState::Idle);
        assert!(c.known().is_empty());
    }

    #[test]
    fn test_failure_falls_back_to_simulation() {
        let mut c = controller();
        let now = Utc::now();
        let ticket = c.on_viewport_settled(europe(), now).unwrap();
        assert_eq!(c.state(), FetchState::Loading);

        let next = c.complete(ticket, Err(FetchError::Empty), now);
        assert!(next.is_none());
        assert_eq!(c.state(), FetchState::Ready);
        assert_eq!(c.known().source, DataSource::Simulated);
        assert!(!c.known().is_empty());
        assert_eq!(c.simulator().len(), 4000);

        let bounds = europe();
        assert!(c.known().flights.iter().all(|f| bounds.contains(f.position)));
    }

    #[test]
    fn test_success_replaces_collection() {
        let mut c = controller();
        let now = Utc::now();

        let ticket = c.on_viewport_settled(europe(), now).unwrap();
        c.complete(ticket, Err(FetchError::Disabled), now);
        let simulated_generation = c.known().generation;

        let ticket = c.on_poll_tick(now).unwrap();
        c.complete(
            ticket,
            Ok(vec![live("aaa111", 50.0, 5.0), live("bbb222", 45.0, 10.0)]),
            now,
        );
        assert_eq!(c.known().source, DataSource::Live);
        assert_eq!(c.known().len(), 2);
        assert!(c.known().generation > simulated_generation);
        assert!(c.known().get("aaa111").is_some());

        let ticket = c.on_poll_tick(now).unwrap();
        c.complete(ticket, Ok(vec![live("ccc333", 40.0, 0.0)]), now);
        let ids: Vec<_> = c.known().flights.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, ["ccc333"]);
    }

    #[test]
    fn test_triggers_while_loading_are_coalesced() {
        let mut c = controller();
        let now = Utc::now();
        let first = c.on_viewport_settled(europe(), now).unwrap();

        let moved = europe().shifted(1.0, 2.0);
        assert!(c.on_poll_tick(now).is_none());
        assert!(c.on_viewport_settled(moved, now).is_none());
        assert!(c.has_pending());

        let follow_up = c
            .complete(first, Ok(vec![live("aaa111", 50.0, 5.0)]), now)
            .unwrap();
        assert_eq!(follow_up.bounds, moved);
        assert!(follow_up.seq > first.seq);
        assert_eq!(c.state(), FetchState::Loading);
        assert!(!c.has_pending());

        assert!(c
            .complete(follow_up, Ok(vec![live("aaa111", 51.0, 5.0)]), now)
            .is_none());
        assert_eq!(c.state(), FetchState::Ready);
    }

    #[test]
    fn test_stale_fetch_is_abandoned_and_late_result_discarded() {
        let mut c = controller();
        let t0 = Utc::now();
        let first = c.on_viewport_settled(europe(), t0).unwrap();

        assert!(c.on_poll_tick(t0 + TimeDelta::seconds(5)).is_none());
        let second = c.on_poll_tick(t0 + TimeDelta::seconds(16)).unwrap();
        assert_ne!(first.seq, second.seq);

        let late = c.complete(first, Ok(vec![live("old000", 50.0, 5.0)]), t0);
        assert!(late.is_none());
        assert_eq!(c.state(), FetchState::Loading);
        assert!(c.known().is_empty());

        c.complete(second, Ok(vec![live("new000", 50.0, 5.0)]), t0);
        assert_eq!(c.state(), FetchState::Ready);
        assert!(c.known().get("new000").is_some());
    }

    #[tokio::test]
    async fn test_drive_with_empty_feed_ends_ready_and_simulated() {
        let mut c = controller();
        let ticket = c.on_viewport_settled(ViewportBounds::world(), Utc::now()).unwrap();
        c.drive(&EmptyFeed, ticket).await;

        assert_eq!(c.state(), FetchState::Ready);
        assert_eq!(c.known().source, DataSource::Simulated);
        assert_eq!(c.known().len(), 4000);
    }

    #[tokio::test]
    async fn test_background_task_publishes_live_data() {
        let feed = Arc::new(FixedFeed {
            flights: vec![live("aaa111", 50.0, 5.0), live("bbb222", 10.0, 100.0)],
            calls: AtomicUsize::new(0),
        });
        let mut handle = ControllerHandle::spawn(controller(), Arc::clone(&feed));
        handle.viewport_settled(europe()).await;

        tokio::time::timeout(Duration::from_secs(5), async {
            while handle.snapshot().state != FetchState::Ready {
                assert!(handle.changed().await);
            }
        })
        .await
        .unwrap();

        let snapshot = handle.snapshot();
        assert_eq!(snapshot.known.source, DataSource::Live);
        assert_eq!(feed.calls.load(Ordering::SeqCst), 1);

        // Only the flight near the viewport is rendered.
        handle.select(Some("aaa111".to_string()));
        let points = handle.render_set(&europe());
        assert_eq!(points.len(), 1);
        assert!(points[0].is_selected);
        assert_eq!(handle.selected_flight().unwrap().id, "aaa111");

        handle.shutdown();
    }

    #[tokio::test]
    async fn test_background_task_falls_back_to_simulation() {
        let mut handle = ControllerHandle::spawn(controller(), Arc::new(EmptyFeed));
        handle.viewport_settled(ViewportBounds::world()).await;

        tokio::time::timeout(Duration::from_secs(5), async {
            while handle.snapshot().state != FetchState::Ready {
                assert!(handle.changed().await);
            }
        })
        .await
        .unwrap();

        let snapshot = handle.snapshot();
        assert_eq!(snapshot.known.source, DataSource::Simulated);
        assert!(!handle.render_set(&ViewportBounds::world()).is_empty());
    }

    #[test]
    fn test_poll_interval_is_clamped() {
        let config = ControllerConfig {
            poll_interval: Duration::ZERO,
            ..ControllerConfig::default()
        };
        assert_eq!(config.effective_poll_interval(), MIN_POLL_INTERVAL);
        assert_eq!(
            ControllerConfig::default().effective_poll_interval(),
            Duration::from_secs(10)
        );
    }

    async fn wait_until<P>(handle: &mut ControllerHandle, mut done: P)
    where
        P: FnMut(&ControllerSnapshot) -> bool,
    {
        tokio::time::timeout(Duration::from_secs(60), async {
            while !done(&handle.snapshot()) {
                assert!(handle.changed().await);
            }
        })
        .await
        .unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_timer_refetches_only_once_bounds_are_known() {
        let feed = Arc::new(FixedFeed {
            flights: vec![live("aaa111", 50.0, 5.0)],
            calls: AtomicUsize::new(0),
        });
        let mut handle = ControllerHandle::spawn(controller(), Arc::clone(&feed));

        // Several poll periods pass without a settled viewport.
        tokio::time::advance(Duration::from_secs(35)).await;
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert_eq!(feed.calls.load(Ordering::SeqCst), 0);
        assert_eq!(handle.snapshot().state, FetchState::Idle);

        handle.viewport_settled(europe()).await;
        wait_until(&mut handle, |s| s.state == FetchState::Ready).await;
        let first_calls = feed.calls.load(Ordering::SeqCst);
        let first_generation = handle.snapshot().known.generation;
        assert!(first_calls >= 1);

        tokio::time::advance(Duration::from_secs(11)).await;
        wait_until(&mut handle, |s| s.known.generation > first_generation).await;

        assert!(feed.calls.load(Ordering::SeqCst) > first_calls);
        assert_eq!(handle.snapshot().known.source, DataSource::Live);
        handle.shutdown();
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_poll_interval_keeps_task_alive() {
        let config = ControllerConfig {
            poll_interval: Duration::ZERO,
            ..ControllerConfig::default()
        };
        let controller = ViewportFetchController::new(config, FlightSimulator::seeded(7));
        let mut handle = ControllerHandle::spawn(controller, Arc::new(EmptyFeed));
        handle.viewport_settled(europe()).await;

        wait_until(&mut handle, |s| s.state == FetchState::Ready).await;
        let generation = handle.snapshot().known.generation;

        tokio::time::advance(MIN_POLL_INTERVAL * 2).await;
        wait_until(&mut handle, |s| s.known.generation > generation).await;
        assert_eq!(handle.snapshot().known.source, DataSource::Simulated);
    }
}
