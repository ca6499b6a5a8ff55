//! Remote data providers
//!
//! The orchestrator only depends on the [`DataProvider`] contract. Two
//! implementations ship with the crate: [`SimulatedProvider`], an in-process
//! mock backend, and [`HttpProvider`], a REST client.

pub mod http;
pub mod simulated;

pub use http::HttpProvider;
pub use simulated::SimulatedProvider;

use async_trait::async_trait;

use crate::data::{
    all_stations, DailyPoint, HealthReport, HourlyPoint, LocationInfo, SeriesResponse,
};
use crate::error::FetchError;

/// Source of sunshine data for a location
#[async_trait]
pub trait DataProvider: Send + Sync {
    /// Fetch the 24 hourly points of the current day
    async fn fetch_hourly(&self, location_id: &str)
        -> Result<SeriesResponse<HourlyPoint>, FetchError>;

    /// Fetch the 30 most recent daily points, oldest first
    async fn fetch_daily(&self, location_id: &str)
        -> Result<SeriesResponse<DailyPoint>, FetchError>;

    /// Resolve station information. Unknown ids resolve to the default
    /// station; this never fails.
    async fn fetch_location(&self, location_id: &str) -> LocationInfo;

    /// List the locations the provider can serve
    async fn available_locations(&self) -> Vec<LocationInfo> {
        all_stations().iter().map(|s| s.to_location_info()).collect()
    }

    /// Check that the provider is reachable and healthy
    async fn check_health(&self) -> Result<HealthReport, FetchError>;
}
