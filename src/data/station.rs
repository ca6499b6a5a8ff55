//! Static registry of monitoring stations
//!
//! Lookups for unknown ids never fail: they resolve to the default station.

use super::LocationInfo;

/// Station used when an id is not in the registry
pub const DEFAULT_STATION_ID: &str = "station-001";

/// A monitoring station known to the registry
///
/// Uses `&'static str` fields so the registry can be a static array.
/// Convert to an owned [`LocationInfo`] with [`Station::to_location_info`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Station {
    pub id: &'static str,
    pub name: &'static str,
    pub coordinates: &'static str,
    pub elevation: &'static str,
    pub timezone: &'static str,
}

impl Station {
    pub fn to_location_info(&self) -> LocationInfo {
        LocationInfo {
            id: self.id.to_string(),
            name: self.name.to_string(),
            coordinates: self.coordinates.to_string(),
            elevation: self.elevation.to_string(),
            timezone: self.timezone.to_string(),
        }
    }
}

/// All known stations, default station first
pub static STATIONS: [Station; 3] = [
    Station {
        id: "station-001",
        name: "Central Weather Station",
        coordinates: "40.7128° N, 74.0060° W",
        elevation: "45m",
        timezone: "UTC-5",
    },
    Station {
        id: "station-002",
        name: "North Observatory",
        coordinates: "40.7589° N, 73.9851° W",
        elevation: "82m",
        timezone: "UTC-5",
    },
    Station {
        id: "station-003",
        name: "South Monitoring Point",
        coordinates: "40.6782° N, 73.9442° W",
        elevation: "23m",
        timezone: "UTC-5",
    },
];

/// Get a station by its id
///
/// # Returns
///
/// Returns `Some(&Station)` if found, `None` otherwise
///
/// # Example
///
/// ```
/// use sunwatch::data::station::get_station_by_id;
///
/// if let Some(station) = get_station_by_id("station-002") {
///     println!("Found: {}", station.name);
/// }
/// ```
pub fn get_station_by_id(id: &str) -> Option<&'static Station> {
    STATIONS.iter().find(|station| station.id == id)
}

/// Get all known stations
pub fn all_stations() -> &'static [Station] {
    &STATIONS
}

/// Resolve a location id to its station information, falling back to the
/// default station for unknown ids
pub fn resolve_location(id: &str) -> LocationInfo {
    get_station_by_id(id)
        .unwrap_or(&STATIONS[0])
        .to_location_info()
}
