//! Core data models for sunwatch
//!
//! This module contains the data types exchanged with data providers and
//! published to callers: hourly and daily sunshine points, station
//! information, and the metadata attached to every series response.

pub mod station;

pub use station::{all_stations, get_station_by_id, resolve_location, DEFAULT_STATION_ID};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Number of hourly points in a complete day
pub const HOURS_PER_DAY: usize = 24;

/// Number of daily points in the rolling window
pub const DAILY_WINDOW: usize = 30;

/// Sunshine measurement for a single hour of the day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HourlyPoint {
    /// Hour label in `HH:00` form
    pub time: String,
    /// Minutes of sunshine within the hour
    pub duration: f64,
    /// UV index, never negative
    pub uv_index: f64,
    /// Start of the hour
    pub timestamp: DateTime<Utc>,
}

/// Sunshine summary for a single day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyPoint {
    /// Day label in `M/D` form
    pub date: String,
    /// Minutes of sunshine over the day
    pub duration: f64,
    /// Average temperature in Celsius
    pub avg_temperature: f64,
    /// Start of the day
    pub timestamp: DateTime<Utc>,
}

/// Reference information about a monitoring station
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationInfo {
    pub id: String,
    pub name: String,
    /// Formatted coordinates, e.g. `40.7128° N, 74.0060° W`
    pub coordinates: String,
    /// Formatted elevation, e.g. `45m`
    pub elevation: String,
    pub timezone: String,
}

/// Operational status reported by the data source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
    Operational,
    Degraded,
    Maintenance,
}

impl std::fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServiceStatus::Operational => write!(f, "operational"),
            ServiceStatus::Degraded => write!(f, "degraded"),
            ServiceStatus::Maintenance => write!(f, "maintenance"),
        }
    }
}

/// Provenance and quality information attached to a series response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchMetadata {
    /// Location id the series belongs to
    pub location: String,
    /// When the source last updated the series
    pub last_updated: DateTime<Utc>,
    /// Name of the upstream data source
    pub source: String,
    /// Accuracy percentage
    pub accuracy: f64,
    /// Completeness percentage
    pub completeness: f64,
    pub status: ServiceStatus,
}

/// A series of points together with its metadata, as returned by a provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesResponse<T> {
    pub data: Vec<T>,
    pub metadata: FetchMetadata,
}

/// Everything a single successful bundled fetch produces
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    pub hourly_data: Vec<HourlyPoint>,
    pub daily_data: Vec<DailyPoint>,
    pub location_info: LocationInfo,
    pub metadata: FetchMetadata,
}

/// Result of a provider health check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub uptime: String,
}

/// Formats the `HH:00` label for an hour of the day
pub fn hour_label(hour: u32) -> String {
    format!("{:02}:00", hour)
}

/// Formats the `M/D` label for a date
pub fn day_label(date: chrono::NaiveDate) -> String {
    use chrono::Datelike;
    format!("{}/{}", date.month(), date.day())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};

    #[test]
    fn test_hour_label_is_zero_padded() {
        assert_eq!(hour_label(0), "00:00");
        assert_eq!(hour_label(9), "09:00");
        assert_eq!(hour_label(23), "23:00");
    }

    #[test]
    fn test_day_label_has_no_padding() {
        let date = NaiveDate::from_ymd_opt(2025, 8, 3).unwrap();
        assert_eq!(day_label(date), "8/3");
        let date = NaiveDate::from_ymd_opt(2025, 12, 28).unwrap();
        assert_eq!(day_label(date), "12/28");
    }

    #[test]
    fn test_hourly_point_uses_camel_case_on_the_wire() {
        let point = HourlyPoint {
            time: "12:00".to_string(),
            duration: 48.5,
            uv_index: 9.1,
            timestamp: Utc.with_ymd_and_hms(2025, 8, 28, 12, 0, 0).unwrap(),
        };

        let json = serde_json::to_string(&point).expect("Failed to serialize HourlyPoint");
        assert!(json.contains("\"uvIndex\":9.1"));
        assert!(json.contains("\"time\":\"12:00\""));
    }

    #[test]
    fn test_metadata_parses_backend_payload() {
        let json = r#"{
            "location": "station-002",
            "lastUpdated": "2025-08-28T10:15:00Z",
            "source": "NOAA Weather API v2.1.3",
            "accuracy": 98.9,
            "completeness": 99.2,
            "status": "degraded"
        }"#;

        let metadata: FetchMetadata =
            serde_json::from_str(json).expect("Failed to parse FetchMetadata");

        assert_eq!(metadata.location, "station-002");
        assert_eq!(metadata.status, ServiceStatus::Degraded);
        assert!((metadata.accuracy - 98.9).abs() < 0.001);
    }

    #[test]
    fn test_service_status_display() {
        assert_eq!(ServiceStatus::Operational.to_string(), "operational");
        assert_eq!(ServiceStatus::Degraded.to_string(), "degraded");
        assert_eq!(ServiceStatus::Maintenance.to_string(), "maintenance");
    }
}
