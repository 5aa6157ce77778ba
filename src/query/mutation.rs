//! The mutation-invalidation contract.
//!
//! Every write operation declares up front which read queries it makes stale.
//! Invalidation runs strictly after the operation succeeds; a failed
//! operation leaves every cache entry untouched. Concurrent mutations against
//! the same key each trigger their own invalidation, which is harmless
//! because invalidation is idempotent.

use std::future::Future;
use tracing::debug;

use super::cache::QueryCache;
use super::keys::QueryKey;
use crate::error::Result;

/// One cache target a mutation invalidates on success.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InvalidationTarget {
  Key(String),
  Prefix(String),
}

/// A write operation coupled with the cache entries it invalidates.
///
/// ```ignore
/// Mutation::new(&cache)
///     .invalidates(&HrQueryKey::Notifications)
///     .run(client.mark_notification_read(id))
///     .await?;
/// ```
#[must_use = "a mutation does nothing until run"]
pub struct Mutation {
  cache: QueryCache,
  targets: Vec<InvalidationTarget>,
}

impl Mutation {
  pub fn new(cache: &QueryCache) -> Self {
    Self {
      cache: cache.clone(),
      targets: Vec::new(),
    }
  }

  pub fn invalidates<K: QueryKey + ?Sized>(mut self, key: &K) -> Self {
    self.targets.push(InvalidationTarget::Key(key.cache_key()));
    self
  }

  pub fn invalidates_prefix(mut self, prefix: &str) -> Self {
    self
      .targets
      .push(InvalidationTarget::Prefix(prefix.to_string()));
    self
  }

  /// Await the operation, then invalidate the declared targets in order.
  pub async fn run<T, Fut>(self, op: Fut) -> Result<T>
  where
    Fut: Future<Output = Result<T>>,
  {
    let output = op.await?;

    for target in &self.targets {
      match target {
        InvalidationTarget::Key(key) => {
          debug!(key = %key, "mutation invalidates key");
          self.cache.invalidate_key(key);
        }
        InvalidationTarget::Prefix(prefix) => {
          debug!(prefix = %prefix, "mutation invalidates prefix");
          self.cache.invalidate_prefix(prefix);
        }
      }
    }

    Ok(output)
  }
}
