//! Published state and the transitions applied to it
//!
//! [`StateMachine`] holds the state together with the retry counter and
//! applies fetch outcomes. It does no I/O and owns no timers; the
//! orchestrator decides what to schedule from the [`FetchOutcome`] it returns.

use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::data::{
    DailyPoint, Dataset, FetchMetadata, HourlyPoint, LocationInfo, DAILY_WINDOW, HOURS_PER_DAY,
};
use crate::error::FetchError;
use crate::fallback::{fallback_daily, fallback_hourly};

/// Snapshot of everything the orchestrator knows about its location
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrchestratorState {
    pub hourly_data: Vec<HourlyPoint>,
    pub daily_data: Vec<DailyPoint>,
    pub location_info: Option<LocationInfo>,
    pub metadata: Option<FetchMetadata>,
    pub loading: bool,
    pub error: Option<String>,
    pub last_updated: Option<DateTime<Utc>>,
}

impl OrchestratorState {
    /// Replaces empty series with synthetic ones for `today`. Everything else,
    /// including `error`, is left as is.
    pub fn with_fallback(mut self, today: NaiveDate) -> Self {
        if self.hourly_data.is_empty() {
            self.hourly_data = fallback_hourly(today);
        }
        if self.daily_data.is_empty() {
            self.daily_data = fallback_daily(today);
        }
        self
    }

    /// Whether the state holds data from a fetch (or the cache) rather than nothing
    pub fn has_data(&self) -> bool {
        !self.hourly_data.is_empty() || !self.daily_data.is_empty()
    }
}

/// Retry bound and backoff schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    /// Delay before the first retry; doubles for each subsequent one
    pub backoff_base: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff_base: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (1-based): `base * 2^(attempt-1)`
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.backoff_base.saturating_mul(factor)
    }
}

/// What applying a fetch result led to
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// New data was stored
    Updated,
    /// A transient failure; retry number `attempt` should run after `delay`
    RetryScheduled { attempt: u32, delay: Duration },
    /// A terminal failure, or a transient one with no retries left
    Failed,
}

/// Orchestrator state plus the retry counter of the current sequence
#[derive(Debug, Clone, Default)]
pub struct StateMachine {
    state: OrchestratorState,
    retry_count: u32,
}

impl StateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &OrchestratorState {
        &self.state
    }

    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    pub fn reset_retries(&mut self) {
        self.retry_count = 0;
    }

    /// Start of a user-visible fetch
    pub fn begin_visible_fetch(&mut self) {
        self.state.loading = true;
        self.state.error = None;
    }

    /// No fetch is pending any more (the orchestrator was deactivated)
    pub fn halt(&mut self) {
        self.state.loading = false;
        self.retry_count = 0;
    }

    /// Fills the state from a previously cached dataset. A dataset with
    /// series of the wrong length is rejected and the state is left as is.
    pub fn seed(&mut self, dataset: Dataset, cached_at: DateTime<Utc>) -> Result<(), FetchError> {
        self.store(validate(dataset)?);
        self.state.last_updated = Some(cached_at);
        Ok(())
    }

    /// The stored data as a dataset, if a fetch or the cache provided one
    pub fn dataset(&self) -> Option<Dataset> {
        Some(Dataset {
            hourly_data: self.state.hourly_data.clone(),
            daily_data: self.state.daily_data.clone(),
            location_info: self.state.location_info.clone()?,
            metadata: self.state.metadata.clone()?,
        })
    }

    /// Applies the result of a bundled fetch
    pub fn apply(
        &mut self,
        result: Result<Dataset, FetchError>,
        policy: &RetryPolicy,
        now: DateTime<Utc>,
    ) -> FetchOutcome {
        match result.and_then(validate) {
            Ok(dataset) => {
                self.store(dataset);
                self.state.loading = false;
                self.state.error = None;
                self.state.last_updated = Some(now);
                self.retry_count = 0;
                FetchOutcome::Updated
            }
            Err(error) => self.apply_failure(&error, policy),
        }
    }

    fn apply_failure(&mut self, error: &FetchError, policy: &RetryPolicy) -> FetchOutcome {
        let message = error.user_message();
        self.state.loading = false;

        if error.is_transient() && self.retry_count < policy.max_retries {
            self.retry_count += 1;
            let attempt = self.retry_count;
            self.state.error = Some(format!(
                "{} (Attempt {}/{})",
                message, attempt, policy.max_retries
            ));
            FetchOutcome::RetryScheduled {
                attempt,
                delay: policy.delay_for_attempt(attempt),
            }
        } else {
            self.state.error = Some(message.to_string());
            self.retry_count = 0;
            FetchOutcome::Failed
        }
    }

    fn store(&mut self, dataset: Dataset) {
        self.state.hourly_data = dataset.hourly_data;
        self.state.daily_data = dataset.daily_data;
        self.state.location_info = Some(dataset.location_info);
        self.state.metadata = Some(dataset.metadata);
    }
}

/// Rejects datasets whose series are not a full day and a full window
fn validate(dataset: Dataset) -> Result<Dataset, FetchError> {
    if dataset.hourly_data.len() != HOURS_PER_DAY {
        return Err(FetchError::Unknown(format!(
            "Expected {} hourly points, got {}",
            HOURS_PER_DAY,
            dataset.hourly_data.len()
        )));
    }
    if dataset.daily_data.len() != DAILY_WINDOW {
        return Err(FetchError::Unknown(format!(
            "Expected {} daily points, got {}",
            DAILY_WINDOW,
            dataset.daily_data.len()
        )));
    }
    Ok(dataset)
}
