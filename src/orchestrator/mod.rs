//! Fetch orchestration for a single location
//!
//! [`FetchOrchestrator`] keeps the sunshine data of one station fresh. It
//! issues the bundled hourly/daily/location fetch, races it against a
//! timeout, retries transient failures with exponential backoff, refreshes
//! silently in the background and publishes every state transition.
//!
//! All timers are tokio tasks whose handles live on the orchestrator, so
//! superseding a fetch or deactivating cancels them deterministically. Each
//! issued fetch carries a sequence id; a completion that is not from the
//! latest issued fetch is dropped.

mod state;

pub use state::{FetchOutcome, OrchestratorState, RetryPolicy, StateMachine};

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::cache::DatasetCache;
use crate::data::Dataset;
use crate::error::{FetchError, OrchestratorError};
use crate::provider::DataProvider;
use crate::refresh::{RefreshTicker, DEFAULT_REFRESH_INTERVAL};

/// Default time allowed for the bundled fetch
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Orchestrator settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrchestratorConfig {
    /// Time allowed for the combined hourly/daily/location fetch
    pub request_timeout: Duration,
    pub retry: RetryPolicy,
    /// Period of the silent background refresh
    pub refresh_interval: Duration,
    /// Whether the background refresh runs
    pub auto_refresh: bool,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            retry: RetryPolicy::default(),
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            auto_refresh: true,
        }
    }
}

/// Why a fetch was issued
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FetchKind {
    /// Activation or manual refetch; shows the loading flag
    Visible,
    /// Background refresh tick
    Silent,
    /// Backoff retry after a transient failure
    Retry,
}

struct Control {
    machine: StateMachine,
    location_id: Option<String>,
    active: bool,
    /// Id of the most recently issued fetch
    seq: u64,
    auto_refresh: bool,
    refresh_interval: Duration,
    in_flight: Option<JoinHandle<()>>,
    retry_timer: Option<JoinHandle<()>>,
    ticker: Option<RefreshTicker>,
}

impl Control {
    fn fetch_in_flight(&self) -> bool {
        self.in_flight.as_ref().is_some_and(|task| !task.is_finished())
    }

    fn cancel_pending(&mut self) {
        if let Some(task) = self.in_flight.take() {
            task.abort();
        }
        if let Some(timer) = self.retry_timer.take() {
            timer.abort();
        }
        self.ticker = None;
    }
}

struct Inner {
    provider: Arc<dyn DataProvider>,
    request_timeout: Duration,
    retry: RetryPolicy,
    cache: Option<DatasetCache>,
    control: Mutex<Control>,
    publisher: watch::Sender<OrchestratorState>,
}

/// Keeps the data of one location fresh
///
/// Control operations must be called from within a Tokio runtime. Dropping
/// the orchestrator deactivates it.
pub struct FetchOrchestrator {
    inner: Arc<Inner>,
}

impl FetchOrchestrator {
    pub fn new(provider: Arc<dyn DataProvider>, config: OrchestratorConfig) -> Self {
        Self::with_cache(provider, config, None)
    }

    /// Create an orchestrator that seeds activation from, and saves
    /// successful fetches to, `cache`
    pub fn with_cache(
        provider: Arc<dyn DataProvider>,
        config: OrchestratorConfig,
        cache: Option<DatasetCache>,
    ) -> Self {
        let (publisher, _) = watch::channel(OrchestratorState::default());
        let control = Control {
            machine: StateMachine::new(),
            location_id: None,
            active: false,
            seq: 0,
            auto_refresh: config.auto_refresh,
            refresh_interval: config.refresh_interval,
            in_flight: None,
            retry_timer: None,
            ticker: None,
        };

        Self {
            inner: Arc::new(Inner {
                provider,
                request_timeout: config.request_timeout,
                retry: config.retry,
                cache,
                control: Mutex::new(control),
                publisher,
            }),
        }
    }

    /// Starts (or restarts) the lifecycle for `location_id` with an
    /// immediate visible fetch
    pub fn activate(&self, location_id: &str) {
        let inner = &self.inner;
        let mut ctl = inner.control.lock();
        ctl.cancel_pending();

        tracing::info!(location = location_id, "Activating orchestrator");
        ctl.location_id = Some(location_id.to_string());
        ctl.active = true;
        ctl.machine = StateMachine::new();

        if let Some(cached) = inner.cache.as_ref().and_then(|c| c.load(location_id)) {
            tracing::debug!(
                location = location_id,
                cached_at = %cached.cached_at,
                expired = cached.is_expired,
                "Seeding state from cache"
            );
            if let Err(e) = ctl.machine.seed(cached.data, cached.cached_at) {
                tracing::warn!(location = location_id, error = %e, "Ignoring invalid cache entry");
            }
        }

        inner.issue_fetch(&mut ctl, FetchKind::Visible);
        if ctl.auto_refresh {
            inner.arm_ticker(&mut ctl);
        }
    }

    /// Cancels every pending fetch, retry and refresh. Idempotent.
    pub fn deactivate(&self) {
        let mut ctl = self.inner.control.lock();
        if !ctl.active {
            return;
        }

        tracing::info!(location = ?ctl.location_id, "Deactivating orchestrator");
        ctl.cancel_pending();
        ctl.active = false;
        ctl.seq += 1;
        ctl.machine.halt();
        self.inner.publish(&ctl);
    }

    /// Manual refresh: resets the retry sequence, cancels any pending retry
    /// and fetches immediately with the loading flag shown
    pub fn refetch(&self) {
        let mut ctl = self.inner.control.lock();
        if !ctl.active {
            tracing::debug!("Ignoring refetch on inactive orchestrator");
            return;
        }
        ctl.machine.reset_retries();
        self.inner.issue_fetch(&mut ctl, FetchKind::Visible);
    }

    pub fn set_auto_refresh(&self, enabled: bool) {
        let mut ctl = self.inner.control.lock();
        ctl.auto_refresh = enabled;
        if !enabled {
            ctl.ticker = None;
        } else if ctl.active && ctl.ticker.is_none() {
            self.inner.arm_ticker(&mut ctl);
        }
    }

    /// Changes the background refresh period. A running ticker is re-armed
    /// with the new period.
    pub fn set_refresh_interval(&self, interval: Duration) -> Result<(), OrchestratorError> {
        if interval.is_zero() {
            return Err(OrchestratorError::InvalidRefreshInterval);
        }

        let mut ctl = self.inner.control.lock();
        ctl.refresh_interval = interval;
        if ctl.ticker.is_some() {
            self.inner.arm_ticker(&mut ctl);
        }
        Ok(())
    }

    /// Snapshot with synthetic series substituted for empty ones
    pub fn state(&self) -> OrchestratorState {
        self.raw_state().with_fallback(Utc::now().date_naive())
    }

    /// Snapshot exactly as stored
    pub fn raw_state(&self) -> OrchestratorState {
        self.inner.control.lock().machine.state().clone()
    }

    /// Receiver that observes every published transition (raw, without fallback)
    pub fn subscribe(&self) -> watch::Receiver<OrchestratorState> {
        self.inner.publisher.subscribe()
    }

    pub fn retry_count(&self) -> u32 {
        self.inner.control.lock().machine.retry_count()
    }

    pub fn auto_refresh(&self) -> bool {
        self.inner.control.lock().auto_refresh
    }

    pub fn refresh_interval(&self) -> Duration {
        self.inner.control.lock().refresh_interval
    }

    pub fn location_id(&self) -> Option<String> {
        self.inner.control.lock().location_id.clone()
    }

    pub fn is_active(&self) -> bool {
        self.inner.control.lock().active
    }
}

impl Drop for FetchOrchestrator {
    fn drop(&mut self) {
        self.deactivate();
    }
}

impl Inner {
    fn publish(&self, ctl: &Control) {
        self.publisher.send_replace(ctl.machine.state().clone());
    }

    fn issue_fetch(self: &Arc<Self>, ctl: &mut Control, kind: FetchKind) {
        let Some(location_id) = ctl.location_id.clone() else {
            return;
        };

        if let Some(timer) = ctl.retry_timer.take() {
            // A retry is issued from its own timer task
            if kind != FetchKind::Retry {
                tracing::debug!("Cancelling pending retry");
                timer.abort();
            }
        }
        if let Some(task) = ctl.in_flight.take() {
            task.abort();
        }

        ctl.seq += 1;
        let seq = ctl.seq;
        if kind == FetchKind::Visible {
            ctl.machine.begin_visible_fetch();
            self.publish(ctl);
        }

        tracing::debug!(location = %location_id, seq, ?kind, "Issuing fetch");
        let inner = Arc::clone(self);
        ctl.in_flight = Some(tokio::spawn(async move {
            inner.run_fetch(location_id, seq).await;
        }));
    }

    async fn run_fetch(self: Arc<Self>, location_id: String, seq: u64) {
        let result = self.fetch_bundle(&location_id).await;

        let mut ctl = self.control.lock();
        if !ctl.active || ctl.seq != seq {
            tracing::debug!(location = %location_id, seq, latest = ctl.seq, "Discarding stale fetch result");
            return;
        }
        ctl.in_flight = None;

        if let Err(e) = &result {
            if e.is_transient() {
                tracing::warn!(location = %location_id, error = %e, "Fetch failed");
            } else {
                tracing::error!(location = %location_id, error = %e, "Fetch failed");
            }
        }

        let outcome = ctl.machine.apply(result, &self.retry, Utc::now());
        let to_cache = match outcome {
            FetchOutcome::Updated => {
                tracing::info!(location = %location_id, "Sunshine data updated");
                ctl.machine.dataset()
            }
            FetchOutcome::RetryScheduled { attempt, delay } => {
                tracing::info!(
                    location = %location_id,
                    attempt,
                    max = self.retry.max_retries,
                    delay_ms = delay.as_millis() as u64,
                    "Scheduling retry"
                );
                self.schedule_retry(&mut ctl, delay);
                None
            }
            FetchOutcome::Failed => None,
        };
        self.publish(&ctl);
        drop(ctl);

        if let (Some(cache), Some(dataset)) = (&self.cache, to_cache) {
            if let Err(e) = cache.store(&location_id, &dataset) {
                tracing::warn!(location = %location_id, error = %e, "Failed to write dataset cache");
            }
        }
    }

    /// Fetches hourly, daily and location data concurrently, bounded by the
    /// request timeout
    async fn fetch_bundle(&self, location_id: &str) -> Result<Dataset, FetchError> {
        let provider = &self.provider;
        let bundle = async {
            let (hourly, daily, location_info) = futures::try_join!(
                provider.fetch_hourly(location_id),
                provider.fetch_daily(location_id),
                async { Ok::<_, FetchError>(provider.fetch_location(location_id).await) },
            )?;
            Ok::<_, FetchError>(Dataset {
                hourly_data: hourly.data,
                daily_data: daily.data,
                location_info,
                metadata: hourly.metadata,
            })
        };

        match tokio::time::timeout(self.request_timeout, bundle).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout(self.request_timeout)),
        }
    }

    fn schedule_retry(self: &Arc<Self>, ctl: &mut Control, delay: Duration) {
        let weak = Arc::downgrade(self);
        let seq = ctl.seq;
        ctl.retry_timer = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let Some(inner) = weak.upgrade() else {
                return;
            };
            let mut ctl = inner.control.lock();
            // Superseded by a manual refetch or deactivation while sleeping
            if !ctl.active || ctl.seq != seq {
                return;
            }
            inner.issue_fetch(&mut ctl, FetchKind::Retry);
        }));
    }

    fn arm_ticker(self: &Arc<Self>, ctl: &mut Control) {
        let weak = Arc::downgrade(self);
        ctl.ticker = Some(RefreshTicker::spawn(ctl.refresh_interval, move || {
            if let Some(inner) = weak.upgrade() {
                inner.on_refresh_tick();
            }
        }));
    }

    fn on_refresh_tick(self: &Arc<Self>) {
        let mut ctl = self.control.lock();
        if !ctl.active || !ctl.auto_refresh {
            return;
        }
        if ctl.machine.state().loading || ctl.machine.retry_count() > 0 || ctl.fetch_in_flight() {
            tracing::debug!("Skipping background refresh while a fetch is pending");
            return;
        }
        self.issue_fetch(&mut ctl, FetchKind::Silent);
    }
}
