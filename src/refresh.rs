//! Periodic background refresh ticker
//!
//! Runs a callback every `interval` on a tokio task until the ticker is shut
//! down or dropped. The first tick fires one full interval after spawning.

use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Default period between silent refreshes
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(15 * 60);

/// Handle to a running refresh ticker
///
/// Dropping the handle stops the ticker.
#[derive(Debug)]
pub struct RefreshTicker {
    interval: Duration,
    shutdown_tx: mpsc::Sender<()>,
    task: JoinHandle<()>,
}

impl RefreshTicker {
    /// Spawns a ticker calling `on_tick` every `interval`.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn<F>(interval: Duration, on_tick: F) -> Self
    where
        F: Fn() + Send + 'static,
    {
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // Skip the first tick (immediate)
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => on_tick(),
                    _ = shutdown_rx.recv() => break,
                }
            }
        });

        Self {
            interval,
            shutdown_tx,
            task,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Stops the ticker; no tick fires after this returns
    pub fn shutdown(self) {
        drop(self);
    }
}

impl Drop for RefreshTicker {
    fn drop(&mut self) {
        let _ = self.shutdown_tx.try_send(());
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counting_ticker(interval: Duration) -> (RefreshTicker, Arc<AtomicUsize>) {
        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&ticks);
        let ticker = RefreshTicker::spawn(interval, move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        (ticker, ticks)
    }

    #[test]
    fn test_default_interval_is_fifteen_minutes() {
        assert_eq!(DEFAULT_REFRESH_INTERVAL, Duration::from_secs(900));
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_tick_waits_one_interval() {
        let (_ticker, ticks) = counting_ticker(Duration::from_secs(60));

        tokio::time::sleep(Duration::from_secs(59)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_repeat() {
        let (ticker, ticks) = counting_ticker(Duration::from_secs(10));
        assert_eq!(ticker.interval(), Duration::from_secs(10));

        tokio::time::sleep(Duration::from_secs(35)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_stops_ticks() {
        let (ticker, ticks) = counting_ticker(Duration::from_secs(10));

        tokio::time::sleep(Duration::from_secs(15)).await;
        ticker.shutdown();
        tokio::time::sleep(Duration::from_secs(60)).await;

        assert_eq!(ticks.load(Ordering::SeqCst), 1);
    }
}
