// Telemetry poller - Fetch cycles, live timer and state reconciliation
use crate::application::telemetry_source::TelemetrySource;
use crate::domain::poller_state::PollerState;
use crate::domain::telemetry::TelemetrySample;
use chrono::Utc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

const ABORTED_FETCH: &str = "Telemetry fetch aborted unexpectedly";

struct Shared {
    source: Arc<dyn TelemetrySource>,
    state: watch::Sender<PollerState>,
    next_ticket: AtomicU64,
}

impl Shared {
    fn issue_ticket(&self) -> u64 {
        self.next_ticket.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Marks a fetch in flight and returns its ticket
    fn begin(&self) -> u64 {
        let mut ticket = 0;
        self.state.send_modify(|state| {
            state.begin_fetch();
            ticket = self.issue_ticket();
        });
        ticket
    }

    /// Same as `begin`, but only when a manual refresh is currently allowed.
    /// Check and mark happen in one state update.
    fn try_begin_manual(&self) -> Option<u64> {
        let mut ticket = None;
        self.state.send_if_modified(|state| {
            if !state.can_refresh() {
                return false;
            }
            state.begin_fetch();
            ticket = Some(self.issue_ticket());
            true
        });
        ticket
    }

    async fn run(&self, ticket: u64) {
        let slot = FetchSlot::new(self, ticket);

        let outcome = match self.source.fetch_latest().await {
            Ok(sample) => {
                tracing::debug!(ticket, device_id = %sample.device_id, "Fetched telemetry sample");
                Ok(sample)
            }
            Err(e) => {
                tracing::warn!(ticket, "Telemetry fetch failed: {}", e);
                Err(e.to_string())
            }
        };

        if !slot.complete(outcome) {
            tracing::debug!(ticket, "Discarded out-of-order fetch completion");
        }
    }
}

/// In-flight slot of one fetch. If the fetch unwinds or is cancelled before
/// completing, dropping the slot records it as a failure.
struct FetchSlot<'a> {
    shared: &'a Shared,
    ticket: u64,
    settled: bool,
}

impl<'a> FetchSlot<'a> {
    fn new(shared: &'a Shared, ticket: u64) -> Self {
        Self {
            shared,
            ticket,
            settled: false,
        }
    }

    fn settle(&mut self, outcome: Result<TelemetrySample, String>) -> bool {
        self.settled = true;
        let ticket = self.ticket;
        let completed_at = Utc::now();
        let mut applied = false;
        self.shared.state.send_modify(|state| {
            applied = state.complete_fetch(ticket, outcome, completed_at);
        });
        applied
    }

    fn complete(mut self, outcome: Result<TelemetrySample, String>) -> bool {
        self.settle(outcome)
    }
}

impl Drop for FetchSlot<'_> {
    fn drop(&mut self) {
        if !self.settled {
            tracing::error!(ticket = self.ticket, "{}", ABORTED_FETCH);
            self.settle(Err(ABORTED_FETCH.to_string()));
        }
    }
}

/// Runs the fetch on its own task so it always completes, even if whoever
/// started it stops waiting.
fn spawn_fetch(shared: Arc<Shared>, ticket: u64) -> JoinHandle<()> {
    tokio::spawn(async move { shared.run(ticket).await })
}

fn spawn_live_timer(shared: Arc<Shared>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        // First tick lands one full period after live mode is enabled
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            let ticket = shared.begin();
            tracing::trace!(ticket, "Live tick");
            spawn_fetch(Arc::clone(&shared), ticket);
        }
    })
}

/// Owns the viewer state and decides when fetches happen.
///
/// Fetches started by a live tick are not cancelled when live mode is turned
/// off; their result is still applied. Dropping the poller aborts the timer.
pub struct TelemetryPoller {
    shared: Arc<Shared>,
    interval: Duration,
    live_timer: Mutex<Option<JoinHandle<()>>>,
    activated: AtomicBool,
}

impl TelemetryPoller {
    pub fn new(source: Arc<dyn TelemetrySource>, interval: Duration) -> Self {
        let interval = if interval.is_zero() {
            tracing::warn!("Poll interval of zero requested, using {:?}", DEFAULT_POLL_INTERVAL);
            DEFAULT_POLL_INTERVAL
        } else {
            interval
        };

        let (state, _) = watch::channel(PollerState::default());

        Self {
            shared: Arc::new(Shared {
                source,
                state,
                next_ticket: AtomicU64::new(0),
            }),
            interval,
            live_timer: Mutex::new(None),
            activated: AtomicBool::new(false),
        }
    }

    pub fn snapshot(&self) -> PollerState {
        self.shared.state.borrow().clone()
    }

    /// Read-only feed of every state change
    pub fn subscribe(&self) -> watch::Receiver<PollerState> {
        self.shared.state.subscribe()
    }

    /// Initial population: one fetch regardless of live mode. Later calls
    /// do nothing.
    pub async fn activate(&self) {
        if self.activated.swap(true, Ordering::AcqRel) {
            tracing::debug!("Poller already activated");
            return;
        }
        self.fetch_once().await;
    }

    /// Startup sequence. Live mode is switched on before the initial fetch so
    /// a toggle made while that fetch is in flight is not overridden.
    pub async fn start(&self, live_on_start: bool) {
        if live_on_start {
            self.set_live_enabled(true);
        }
        self.activate().await;
    }

    /// One retrieval cycle. Failures end up in the state, never here.
    pub async fn fetch_once(&self) {
        let ticket = self.shared.begin();
        self.await_fetch(ticket).await;
    }

    /// Returns false without fetching while live mode is on or a fetch is
    /// in flight.
    pub async fn refresh_manual(&self) -> bool {
        let Some(ticket) = self.shared.try_begin_manual() else {
            tracing::debug!("Manual refresh ignored");
            return false;
        };
        self.await_fetch(ticket).await;
        true
    }

    pub fn set_live_enabled(&self, enabled: bool) {
        let mut timer = self.live_timer.lock().unwrap_or_else(PoisonError::into_inner);
        self.shared
            .state
            .send_if_modified(|state| state.set_live_enabled(enabled));

        if enabled {
            if timer.is_none() {
                tracing::info!(interval_secs = self.interval.as_secs_f64(), "Live mode enabled");
                *timer = Some(spawn_live_timer(Arc::clone(&self.shared), self.interval));
            }
        } else if let Some(handle) = timer.take() {
            handle.abort();
            tracing::info!("Live mode disabled");
        }
    }

    async fn await_fetch(&self, ticket: u64) {
        if let Err(e) = spawn_fetch(Arc::clone(&self.shared), ticket).await {
            tracing::error!(ticket, "Fetch task ended abnormally: {}", e);
        }
    }
}

impl Drop for TelemetryPoller {
    fn drop(&mut self) {
        let timer = self.live_timer.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = timer.take() {
            handle.abort();
        }
    }
}
