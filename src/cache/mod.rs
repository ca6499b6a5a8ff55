//! Persistent cache for the last successfully fetched dataset
//!
//! Lets a freshly activated orchestrator show the last known data for a
//! station while its first live fetch is in progress.

mod manager;

pub use manager::{CachedData, DatasetCache, DEFAULT_TTL_MINUTES};
