//! On-disk cache of the last good dataset per station
//!
//! Each entry is a JSON file holding the dataset and its cache timestamps.
//! Expired entries are still returned (flagged with `is_expired`) so a
//! restarted orchestrator can show the last known data while it refetches.

use chrono::{DateTime, Duration, Utc};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::data::Dataset;

/// How long a cached dataset counts as fresh
pub const DEFAULT_TTL_MINUTES: i64 = 60;

#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry<T> {
    data: T,
    cached_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

/// A dataset read back from the cache
#[derive(Debug, Clone)]
pub struct CachedData<T> {
    pub data: T,
    /// When the data was written
    pub cached_at: DateTime<Utc>,
    pub is_expired: bool,
}

/// Stores datasets as JSON files under the XDG cache directory
/// (`~/.cache/sunwatch/` on Linux)
#[derive(Debug, Clone)]
pub struct DatasetCache {
    cache_dir: PathBuf,
    ttl: Duration,
}

impl DatasetCache {
    /// Creates a cache in the XDG cache directory.
    ///
    /// Returns `None` if the directory cannot be determined (e.g. no home directory).
    pub fn new() -> Option<Self> {
        let project_dirs = ProjectDirs::from("", "", "sunwatch")?;
        Some(Self::with_dir(project_dirs.cache_dir().to_path_buf()))
    }

    /// Creates a cache rooted at a custom directory
    pub fn with_dir(cache_dir: PathBuf) -> Self {
        Self {
            cache_dir,
            ttl: Duration::minutes(DEFAULT_TTL_MINUTES),
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn dir(&self) -> &PathBuf {
        &self.cache_dir
    }

    fn cache_path(&self, location_id: &str) -> PathBuf {
        self.cache_dir
            .join(format!("dataset_{}.json", encode_key(location_id)))
    }

    /// Writes the dataset under its location id, replacing any previous entry
    pub fn store(&self, location_id: &str, dataset: &Dataset) -> std::io::Result<()> {
        fs::create_dir_all(&self.cache_dir)?;

        let now = Utc::now();
        let entry = CacheEntry {
            data: dataset,
            cached_at: now,
            expires_at: now + self.ttl,
        };

        let json = serde_json::to_string_pretty(&entry)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

        fs::write(self.cache_path(location_id), json)
    }

    /// Reads the cached dataset for a location
    ///
    /// Returns `None` if there is no entry or it cannot be parsed.
    pub fn load(&self, location_id: &str) -> Option<CachedData<Dataset>> {
        let content = fs::read_to_string(self.cache_path(location_id)).ok()?;
        let entry: CacheEntry<Dataset> = match serde_json::from_str(&content) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(location = location_id, error = %e, "Ignoring unreadable cache entry");
                return None;
            }
        };

        Some(CachedData {
            data: entry.data,
            cached_at: entry.cached_at,
            is_expired: Utc::now() > entry.expires_at,
        })
    }
}

/// Percent-encodes every byte outside `[A-Za-z0-9-]`, so distinct ids
/// always map to distinct file names
fn encode_key(location_id: &str) -> String {
    let mut key = String::with_capacity(location_id.len());
    for byte in location_id.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' {
            key.push(char::from(byte));
        } else {
            key.push_str(&format!("%{:02X}", byte));
        }
    }
    key
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::resolve_location;
    use crate::data::{FetchMetadata, ServiceStatus};
    use crate::fallback::{fallback_daily, fallback_hourly};
    use std::thread;
    use std::time::Duration as StdDuration;
    use tempfile::TempDir;

    fn sample_dataset(location_id: &str) -> Dataset {
        let today = Utc::now().date_naive();
        Dataset {
            hourly_data: fallback_hourly(today),
            daily_data: fallback_daily(today),
            location_info: resolve_location(location_id),
            metadata: FetchMetadata {
                location: location_id.to_string(),
                last_updated: Utc::now(),
                source: "test".to_string(),
                accuracy: 99.0,
                completeness: 99.5,
                status: ServiceStatus::Operational,
            },
        }
    }

    fn create_test_cache() -> (DatasetCache, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let cache = DatasetCache::with_dir(temp_dir.path().to_path_buf());
        (cache, temp_dir)
    }

    #[test]
    fn test_store_creates_file_per_location() {
        let (cache, temp_dir) = create_test_cache();
        cache
            .store("station-002", &sample_dataset("station-002"))
            .expect("Store should succeed");

        let expected = temp_dir.path().join("dataset_station-002.json");
        assert!(expected.exists(), "Cache file should exist");
        let content = fs::read_to_string(&expected).expect("Should read file");
        assert!(content.contains("\"hourlyData\""));
        assert!(content.contains("North Observatory"));
    }

    #[test]
    fn test_load_returns_none_for_missing_location() {
        let (cache, _temp_dir) = create_test_cache();
        assert!(cache.load("station-003").is_none());
    }

    #[test]
    fn test_load_returns_fresh_entry() {
        let (cache, _temp_dir) = create_test_cache();
        let dataset = sample_dataset("station-001");
        cache.store("station-001", &dataset).expect("Store should succeed");

        let cached = cache.load("station-001").expect("Should load entry");
        assert_eq!(cached.data, dataset);
        assert!(!cached.is_expired);
    }

    #[test]
    fn test_load_flags_expired_entry() {
        let (cache, _temp_dir) = create_test_cache();
        let cache = cache.with_ttl(Duration::zero());
        cache
            .store("station-001", &sample_dataset("station-001"))
            .expect("Store should succeed");

        thread::sleep(StdDuration::from_millis(10));

        let cached = cache.load("station-001").expect("Expired entry is still returned");
        assert!(cached.is_expired);
    }

    #[test]
    fn test_corrupt_entry_is_ignored() {
        let (cache, temp_dir) = create_test_cache();
        fs::write(temp_dir.path().join("dataset_station-001.json"), "{ not json")
            .expect("Should write file");
        assert!(cache.load("station-001").is_none());
    }

    #[test]
    fn test_location_id_is_sanitized_into_file_name() {
        let (cache, temp_dir) = create_test_cache();
        cache
            .store("../evil/id", &sample_dataset("station-001"))
            .expect("Store should succeed");
        assert!(temp_dir.path().join("dataset_%2E%2E%2Fevil%2Fid.json").exists());
    }

    #[test]
    fn test_similar_ids_do_not_share_an_entry() {
        let (cache, _temp_dir) = create_test_cache();
        let slash = sample_dataset("station-001");
        let mut underscore = sample_dataset("station-002");
        underscore.metadata.source = "underscore".to_string();

        cache.store("a/b", &slash).expect("Store should succeed");
        cache.store("a_b", &underscore).expect("Store should succeed");

        assert_eq!(cache.load("a/b").expect("Should load entry").data, slash);
        assert_eq!(cache.load("a_b").expect("Should load entry").data, underscore);
    }

    #[test]
    fn test_encode_key() {
        assert_eq!(encode_key("station-001"), "station-001");
        assert_eq!(encode_key("a_b"), "a%5Fb");
        assert_eq!(encode_key("a/b"), "a%2Fb");
        assert_eq!(encode_key("é"), "%C3%A9");
    }

    #[test]
    fn test_store_creates_missing_directory() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let nested = temp_dir.path().join("nested").join("cache");
        let cache = DatasetCache::with_dir(nested.clone());

        cache
            .store("station-001", &sample_dataset("station-001"))
            .expect("Store should succeed");
        assert!(nested.join("dataset_station-001.json").exists());
    }
}
