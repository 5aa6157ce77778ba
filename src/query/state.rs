//! Query status and read-only cache entry snapshots.

use chrono::{DateTime, Utc};

/// The lifecycle state of one cached resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
  /// Never fetched
  Idle,
  /// A fetch is in flight
  Loading,
  /// The last fetch failed
  Error,
  /// The last fetch succeeded
  Success,
}

impl QueryStatus {
  pub fn is_idle(self) -> bool {
    matches!(self, QueryStatus::Idle)
  }

  pub fn is_loading(self) -> bool {
    matches!(self, QueryStatus::Loading)
  }

  pub fn is_error(self) -> bool {
    matches!(self, QueryStatus::Error)
  }

  pub fn is_success(self) -> bool {
    matches!(self, QueryStatus::Success)
  }
}

/// Point-in-time, read-only view of one cached resource.
///
/// `data` can be present while `status` is `Error`: a failed refetch keeps
/// the previously cached value so callers can keep rendering stale data.
#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
  pub key: String,
  pub data: Option<T>,
  pub status: QueryStatus,
  pub error: Option<String>,
  pub last_fetched_at: Option<DateTime<Utc>>,
  pub enabled: bool,
}

impl<T> CacheEntry<T> {
  /// Entry for a key the cache has never seen.
  pub fn missing(key: String) -> Self {
    Self {
      key,
      data: None,
      status: QueryStatus::Idle,
      error: None,
      last_fetched_at: None,
      enabled: true,
    }
  }
}
