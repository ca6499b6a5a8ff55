//! In-process simulated sunshine backend
//!
//! Produces realistic-looking series: hourly sunshine follows the solar angle
//! with random cloud cover, daily sunshine follows a seasonal curve with a
//! small weekend bonus. Requests take a random latency and fail at a
//! configurable rate so that the retry path gets exercised.

use std::f64::consts::PI;
use std::ops::Range;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate, Utc, Weekday};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::DataProvider;
use crate::data::{
    day_label, hour_label, resolve_location, DailyPoint, FetchMetadata, HealthReport,
    HourlyPoint, LocationInfo, SeriesResponse, ServiceStatus, DAILY_WINDOW, HOURS_PER_DAY,
};
use crate::error::FetchError;
use crate::fallback::{solar_intensity, start_of_hour};

/// Name reported as the data source in metadata
const SOURCE_NAME: &str = "NOAA Weather API v2.1.3";

/// Default probability that a series request fails
pub const DEFAULT_ERROR_RATE: f64 = 0.01;

/// Default simulated latency range in milliseconds
const DEFAULT_LATENCY_MS: Range<u64> = 200..500;

/// Simulated data provider backed by a random number generator
#[derive(Debug)]
pub struct SimulatedProvider {
    rng: Mutex<StdRng>,
    error_rate: f64,
    latency_ms: Range<u64>,
}

impl Default for SimulatedProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedProvider {
    /// Create a provider with default latency and error rate
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
            error_rate: DEFAULT_ERROR_RATE,
            latency_ms: DEFAULT_LATENCY_MS,
        }
    }

    /// Use a fixed seed so runs are reproducible
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Mutex::new(StdRng::seed_from_u64(seed));
        self
    }

    /// Set the probability (0.0 to 1.0) that a series request fails
    pub fn with_error_rate(mut self, error_rate: f64) -> Self {
        self.error_rate = error_rate.clamp(0.0, 1.0);
        self
    }

    /// Set the simulated latency range in milliseconds. An empty range
    /// disables the delay.
    pub fn with_latency_ms(mut self, latency_ms: Range<u64>) -> Self {
        self.latency_ms = latency_ms;
        self
    }

    async fn simulate_latency(&self) {
        if self.latency_ms.is_empty() {
            return;
        }
        let millis = self.rng.lock().gen_range(self.latency_ms.clone());
        tokio::time::sleep(Duration::from_millis(millis)).await;
    }

    fn should_fail(&self) -> bool {
        self.error_rate > 0.0 && self.rng.lock().gen::<f64>() < self.error_rate
    }

    fn metadata(&self, location_id: &str) -> FetchMetadata {
        let mut rng = self.rng.lock();
        FetchMetadata {
            location: location_id.to_string(),
            last_updated: Utc::now(),
            source: SOURCE_NAME.to_string(),
            accuracy: 98.5 + rng.gen::<f64>(),
            completeness: 99.0 + rng.gen::<f64>() * 0.5,
            status: ServiceStatus::Operational,
        }
    }

    fn generate_hourly(&self, today: NaiveDate) -> Vec<HourlyPoint> {
        let mut rng = self.rng.lock();
        (0..HOURS_PER_DAY as u32)
            .map(|hour| {
                let intensity = solar_intensity(hour);
                // Up to 30% cloud cover
                let weather_factor = 1.0 - rng.gen::<f64>() * 0.3;
                let duration =
                    (intensity * 55.0 * weather_factor + (rng.gen::<f64>() - 0.5) * 8.0).max(0.0);
                let uv_index =
                    (intensity * 11.0 * weather_factor + (rng.gen::<f64>() - 0.5) * 1.5).max(0.0);

                HourlyPoint {
                    time: hour_label(hour),
                    duration: round_to_tenth(duration),
                    uv_index: round_to_tenth(uv_index),
                    timestamp: start_of_hour(today, hour),
                }
            })
            .collect()
    }

    fn generate_daily(&self, today: NaiveDate) -> Vec<DailyPoint> {
        let mut rng = self.rng.lock();
        (0..DAILY_WINDOW as i64)
            .map(|i| {
                let date = today - chrono::Duration::days(DAILY_WINDOW as i64 - 1 - i);
                let month_factor = seasonal_factor(date.month());
                let daily_variation = (rng.gen::<f64>() - 0.5) * 0.3;
                let weekend_bonus = if matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
                    0.1
                } else {
                    0.0
                };

                let duration = (month_factor * 450.0 + daily_variation * 150.0 + weekend_bonus * 50.0)
                    .max(200.0);
                let temperature = 12.0 + month_factor * 18.0 + (rng.gen::<f64>() - 0.5) * 6.0;

                DailyPoint {
                    date: day_label(date),
                    duration: duration.round(),
                    avg_temperature: round_to_tenth(temperature),
                    timestamp: start_of_hour(date, 0),
                }
            })
            .collect()
    }
}

/// Seasonal sunshine factor for a month (1-12), in `[0.2, 1.0]`
fn seasonal_factor(month: u32) -> f64 {
    (f64::from(month) * PI / 6.0).sin() * 0.4 + 0.6
}

fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[async_trait]
impl DataProvider for SimulatedProvider {
    async fn fetch_hourly(
        &self,
        location_id: &str,
    ) -> Result<SeriesResponse<HourlyPoint>, FetchError> {
        self.simulate_latency().await;
        if self.should_fail() {
            return Err(FetchError::Server(
                "Temporary server issue. Please try again.".to_string(),
            ));
        }

        let data = self.generate_hourly(Utc::now().date_naive());
        Ok(SeriesResponse {
            data,
            metadata: self.metadata(location_id),
        })
    }

    async fn fetch_daily(&self, location_id: &str) -> Result<SeriesResponse<DailyPoint>, FetchError> {
        self.simulate_latency().await;
        if self.should_fail() {
            return Err(FetchError::ServiceUnavailable(
                "Data service briefly unavailable.".to_string(),
            ));
        }

        let data = self.generate_daily(Utc::now().date_naive());
        Ok(SeriesResponse {
            data,
            metadata: self.metadata(location_id),
        })
    }

    async fn fetch_location(&self, location_id: &str) -> LocationInfo {
        self.simulate_latency().await;
        resolve_location(location_id)
    }

    async fn check_health(&self) -> Result<HealthReport, FetchError> {
        self.simulate_latency().await;
        Ok(HealthReport {
            status: "healthy".to_string(),
            timestamp: Utc::now(),
            uptime: "99.9%".to_string(),
        })
    }
}
