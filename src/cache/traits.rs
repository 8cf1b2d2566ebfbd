//! Core traits and types for the caching system.

use chrono::{DateTime, Utc};
use std::fmt::Debug;
use std::hash::Hash;

/// Identifies one cached query (e.g. "the cat list").
///
/// Keys are compared for equality when joining in-flight fetches and when
/// routing invalidations to observers.
pub trait QueryKey: Clone + Debug + Eq + Hash + Send + Sync + 'static {
  /// Human-readable description for logs and status lines
  fn description(&self) -> String;
}

/// Result from a cache operation, including data and metadata about the source.
#[derive(Debug, Clone)]
pub struct CacheResult<T> {
  /// The actual data
  pub data: T,
  /// Where the data came from
  pub source: CacheSource,
  /// When the data was cached (if from cache)
  pub cached_at: Option<DateTime<Utc>>,
}

impl<T> CacheResult<T> {
  /// Create a new cache result from fresh network data.
  pub fn from_network(data: T) -> Self {
    Self {
      data,
      source: CacheSource::Network,
      cached_at: None,
    }
  }

  /// Create a new cache result from cached data.
  pub fn from_cache(data: T, cached_at: DateTime<Utc>) -> Self {
    Self {
      data,
      source: CacheSource::CacheFresh,
      cached_at: Some(cached_at),
    }
  }

  /// Create a new cache result for a failed refetch that fell back to stale data.
  pub fn offline(data: T, cached_at: DateTime<Utc>) -> Self {
    Self {
      data,
      source: CacheSource::Offline,
      cached_at: Some(cached_at),
    }
  }
}

/// Indicates where cached data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheSource {
  /// Fresh data from network
  Network,
  /// Data from cache, still considered fresh
  CacheFresh,
  /// Refetch failed, serving the last successful value
  Offline,
}
