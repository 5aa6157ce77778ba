//! Keyed async cache of resource state with in-flight deduplication,
//! invalidation and interval refetch.
//!
//! Inspired by TanStack Query: each logical resource is addressed by a cache
//! key and holds data, loading state and error state. The cache guarantees at
//! most one in-flight fetch per key; concurrent readers join the same fetch
//! instead of issuing duplicate requests.
//!
//! # Example
//!
//! ```ignore
//! let cache = QueryCache::new();
//! let client = client.clone();
//! let notifications: Vec<ApiNotification> = cache
//!     .fetch(&HrQueryKey::Notifications, move || {
//!         let client = client.clone();
//!         async move { client.list_notifications().await }
//!     })
//!     .await?;
//!
//! // A mutation elsewhere marks the key stale and refetches it:
//! cache.invalidate(&HrQueryKey::Notifications);
//! ```

use chrono::{DateTime, Utc};
use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::keys::QueryKey;
use super::retry::{run_with_retry, RetryPolicy};
use super::state::{CacheEntry, QueryStatus};
use crate::error::{Error, Result};

/// Factory producing fetch futures for one cache key, type-erased to JSON.
type FetcherFn = Arc<dyn Fn() -> BoxFuture<'static, Result<Value>> + Send + Sync>;

/// Handle every concurrent reader of an in-flight fetch awaits.
type SharedFetch = Shared<BoxFuture<'static, Result<Value>>>;

/// Options for `QueryCache::subscribe`.
#[derive(Debug, Clone, Copy)]
pub struct SubscribeOptions {
  /// `false` suppresses fetching entirely until re-enabled
  pub enabled: bool,
  /// Re-fetch on this interval while the subscription is held
  pub refetch_interval: Option<Duration>,
}

impl Default for SubscribeOptions {
  fn default() -> Self {
    Self {
      enabled: true,
      refetch_interval: None,
    }
  }
}

struct CacheSlot {
  status: QueryStatus,
  data: Option<Value>,
  error: Option<Error>,
  last_fetched_at: Option<DateTime<Utc>>,
  stale: bool,
  enabled: bool,
  generation: u64,
  inflight: Option<SharedFetch>,
  fetcher: Option<FetcherFn>,
  subscribers: usize,
}

impl CacheSlot {
  fn new() -> Self {
    Self {
      status: QueryStatus::Idle,
      data: None,
      error: None,
      last_fetched_at: None,
      stale: true,
      enabled: true,
      generation: 0,
      inflight: None,
      fetcher: None,
      subscribers: 0,
    }
  }

  fn is_fresh(&self) -> bool {
    self.status.is_success() && !self.stale
  }
}

struct CacheShared {
  slots: Mutex<HashMap<String, CacheSlot>>,
  retry: RetryPolicy,
}

impl CacheShared {
  fn lock_slots(&self) -> MutexGuard<'_, HashMap<String, CacheSlot>> {
    // A poisoned lock only means a fetch task panicked mid-commit; the slot
    // map itself is still usable.
    self.slots.lock().unwrap_or_else(|e| e.into_inner())
  }
}

/// Keyed cache of async resource state, shared by every subscriber.
///
/// This is an explicit injected service, not a hidden global: construct one
/// per session (or one per test) and hand clones to whoever issues queries.
/// Clones share the same underlying state.
#[derive(Clone)]
pub struct QueryCache {
  shared: Arc<CacheShared>,
}

impl Default for QueryCache {
  fn default() -> Self {
    Self::new()
  }
}

impl QueryCache {
  pub fn new() -> Self {
    Self::with_retry(RetryPolicy::default())
  }

  pub fn with_retry(retry: RetryPolicy) -> Self {
    Self {
      shared: Arc::new(CacheShared {
        slots: Mutex::new(HashMap::new()),
        retry,
      }),
    }
  }

  /// Fetch a resource through the cache.
  ///
  /// Fresh cached data is served without touching the network. If a fetch for
  /// the key is already in flight, this call joins it instead of issuing a
  /// second request. The fetcher is remembered so a later `invalidate` can
  /// refresh the key in the background.
  pub async fn fetch<T, K, F, Fut>(&self, key: &K, fetcher: F) -> Result<T>
  where
    T: Serialize + DeserializeOwned + Send + 'static,
    K: QueryKey + ?Sized,
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T>> + Send + 'static,
  {
    let key = key.cache_key();
    self.register(&key, fetcher);
    self.ensure_fetch(&key).await
  }

  /// Subscribe to a key: register its fetcher, trigger an initial fetch when
  /// enabled, and poll on `refetch_interval` while the subscription is held.
  ///
  /// Dropping the subscription stops the polling timer but does not cancel an
  /// in-flight request; a late response still lands in the cache, where the
  /// next subscriber picks it up.
  pub fn subscribe<T, K, F, Fut>(
    &self,
    key: &K,
    fetcher: F,
    options: SubscribeOptions,
  ) -> QuerySubscription
  where
    T: Serialize + DeserializeOwned + Send + 'static,
    K: QueryKey + ?Sized,
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T>> + Send + 'static,
  {
    let key = key.cache_key();
    self.register(&key, fetcher);

    {
      let mut slots = self.shared.lock_slots();
      if let Some(slot) = slots.get_mut(&key) {
        slot.subscribers += 1;
        slot.enabled = options.enabled;
        if options.enabled && slot.inflight.is_none() && !slot.is_fresh() {
          let _ = self.start_fetch(&key, slot);
        }
      }
    }

    let timer = match (options.enabled, options.refetch_interval) {
      (true, Some(period)) => Some(self.spawn_interval(key.clone(), period)),
      _ => None,
    };

    QuerySubscription {
      cache: self.clone(),
      key,
      interval: options.refetch_interval,
      timer,
      enabled: options.enabled,
    }
  }

  /// Mark a key stale. A key with live subscribers refetches immediately in
  /// the background; otherwise the next read refetches. Idempotent.
  pub fn invalidate<K: QueryKey + ?Sized>(&self, key: &K) {
    self.invalidate_key(&key.cache_key());
  }

  /// Invalidate every key sharing a string prefix (e.g. all employees pages).
  pub fn invalidate_prefix(&self, prefix: &str) {
    let mut slots = self.shared.lock_slots();
    let keys: Vec<String> = slots
      .keys()
      .filter(|k| k.starts_with(prefix))
      .cloned()
      .collect();
    for key in keys {
      if let Some(slot) = slots.get_mut(&key) {
        self.invalidate_slot(&key, slot);
      }
    }
  }

  pub(crate) fn invalidate_key(&self, key: &str) {
    let mut slots = self.shared.lock_slots();
    if let Some(slot) = slots.get_mut(key) {
      self.invalidate_slot(key, slot);
    }
  }

  /// Point-in-time view of a key's state. Unknown keys read as `Idle`.
  pub fn snapshot<T, K>(&self, key: &K) -> CacheEntry<T>
  where
    T: DeserializeOwned,
    K: QueryKey + ?Sized,
  {
    let key = key.cache_key();
    let slots = self.shared.lock_slots();
    match slots.get(&key) {
      None => CacheEntry::missing(key),
      Some(slot) => CacheEntry {
        // A slot that no longer deserializes as T just reads as absent
        data: slot
          .data
          .as_ref()
          .and_then(|value| serde_json::from_value(value.clone()).ok()),
        status: slot.status,
        error: slot.error.as_ref().map(|e| e.to_string()),
        last_fetched_at: slot.last_fetched_at,
        enabled: slot.enabled,
        key,
      },
    }
  }

  fn invalidate_slot(&self, key: &str, slot: &mut CacheSlot) {
    slot.stale = true;
    debug!(key, "cache entry invalidated");
    // A fetch already in flight is left to finish; the stale mark makes the
    // next read refetch on top of whatever it commits.
    if slot.subscribers > 0 && slot.enabled && slot.inflight.is_none() {
      let _ = self.start_fetch(key, slot);
    }
  }

  fn register<T, F, Fut>(&self, key: &str, fetcher: F)
  where
    T: Serialize + DeserializeOwned + Send + 'static,
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T>> + Send + 'static,
  {
    let wrapped: FetcherFn = Arc::new(move || {
      let fut = fetcher();
      async move {
        let data = fut.await?;
        serde_json::to_value(&data).map_err(|e| Error::Decode(e.to_string()))
      }
      .boxed()
    });

    let mut slots = self.shared.lock_slots();
    let slot = slots.entry(key.to_string()).or_insert_with(CacheSlot::new);
    slot.fetcher = Some(wrapped);
  }

  async fn ensure_fetch<T: DeserializeOwned>(&self, key: &str) -> Result<T> {
    let wait: SharedFetch = {
      let mut slots = self.shared.lock_slots();
      let slot = slots.entry(key.to_string()).or_insert_with(CacheSlot::new);

      if !slot.enabled {
        // Fetching is suppressed; serve whatever the cache holds.
        return match &slot.data {
          Some(value) => decode_value(key, value),
          None => Err(Error::Validation(format!("query '{}' is disabled", key))),
        };
      }

      if let Some(inflight) = &slot.inflight {
        inflight.clone()
      } else if slot.is_fresh() {
        return match &slot.data {
          Some(value) => decode_value(key, value),
          None => Err(Error::Decode(format!("query '{}' has no cached data", key))),
        };
      } else {
        match self.start_fetch(key, slot) {
          Some(shared) => shared,
          None => {
            return Err(Error::Validation(format!(
              "no fetcher registered for query '{}'",
              key
            )))
          }
        }
      }
    };

    let value = wait.await?;
    decode_value(key, &value)
  }

  /// Start a fetch for a slot. Must be called with the slot map locked; the
  /// fetch itself runs on a spawned task and commits under its own lock, so a
  /// subscriber going away cannot cancel it.
  fn start_fetch(&self, key: &str, slot: &mut CacheSlot) -> Option<SharedFetch> {
    let fetcher = slot.fetcher.clone()?;

    slot.generation += 1;
    slot.status = QueryStatus::Loading;
    slot.stale = false;
    let generation = slot.generation;

    let (tx, rx) = oneshot::channel::<Result<Value>>();
    let shared: SharedFetch = rx
      .map(|received| match received {
        Ok(result) => result,
        Err(_) => Err(Error::Network("fetch task dropped".to_string())),
      })
      .boxed()
      .shared();
    slot.inflight = Some(shared.clone());

    let shared_state = Arc::clone(&self.shared);
    let retry = self.shared.retry;
    let key = key.to_string();
    tokio::spawn(async move {
      let result = run_with_retry(retry, || fetcher()).await;

      {
        let mut slots = shared_state.lock_slots();
        if let Some(slot) = slots.get_mut(&key) {
          // A newer fetch supersedes this one; let its commit win.
          if slot.generation == generation {
            slot.inflight = None;
            slot.last_fetched_at = Some(Utc::now());
            match &result {
              Ok(value) => {
                slot.status = QueryStatus::Success;
                slot.data = Some(value.clone());
                slot.error = None;
                debug!(key = %key, "query fetched");
              }
              Err(err) => {
                // Keep previously cached data so stale-but-present results
                // can still be rendered.
                slot.status = QueryStatus::Error;
                slot.error = Some(err.clone());
                warn!(key = %key, error = %err, "query fetch failed");
              }
            }
          }
        }
      }

      let _ = tx.send(result);
    });

    Some(shared)
  }

  fn set_slot_enabled(&self, key: &str, enabled: bool) {
    let mut slots = self.shared.lock_slots();
    if let Some(slot) = slots.get_mut(key) {
      slot.enabled = enabled;
      if enabled && slot.inflight.is_none() && !slot.is_fresh() {
        let _ = self.start_fetch(key, slot);
      }
    }
  }

  fn refetch_in_background(&self, key: &str) {
    let mut slots = self.shared.lock_slots();
    if let Some(slot) = slots.get_mut(key) {
      if slot.enabled && slot.inflight.is_none() {
        slot.stale = true;
        let _ = self.start_fetch(key, slot);
      }
    }
  }

  fn release(&self, key: &str) {
    let mut slots = self.shared.lock_slots();
    if let Some(slot) = slots.get_mut(key) {
      slot.subscribers = slot.subscribers.saturating_sub(1);
    }
  }

  fn spawn_interval(&self, key: String, period: Duration) -> JoinHandle<()> {
    let cache = self.clone();
    tokio::spawn(async move {
      let mut ticker = tokio::time::interval(period);
      ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
      // The first tick completes immediately; the initial fetch already ran.
      ticker.tick().await;
      loop {
        ticker.tick().await;
        cache.refetch_in_background(&key);
      }
    })
  }
}

fn decode_value<T: DeserializeOwned>(key: &str, value: &Value) -> Result<T> {
  serde_json::from_value(value.clone())
    .map_err(|e| Error::Decode(format!("cached value for '{}': {}", key, e)))
}

/// Live subscription to one cache key.
///
/// Holds the interval refetch timer; dropping it stops polling and releases
/// the subscriber slot.
pub struct QuerySubscription {
  cache: QueryCache,
  key: String,
  interval: Option<Duration>,
  timer: Option<JoinHandle<()>>,
  enabled: bool,
}

impl QuerySubscription {
  pub fn key(&self) -> &str {
    &self.key
  }

  pub fn is_enabled(&self) -> bool {
    self.enabled
  }

  /// Snapshot of the subscribed entry.
  pub fn snapshot<T: DeserializeOwned>(&self) -> CacheEntry<T> {
    self.cache.snapshot(&self.key)
  }

  /// Await a cached-or-fresh read of the subscribed resource.
  pub async fn resolve<T: DeserializeOwned>(&self) -> Result<T> {
    self.cache.ensure_fetch(&self.key).await
  }

  /// Enable or disable fetching for the subscribed key. Enabling a disabled
  /// subscription triggers an immediate fetch and restarts the poll timer.
  pub fn set_enabled(&mut self, enabled: bool) {
    if enabled == self.enabled {
      return;
    }
    self.enabled = enabled;
    self.cache.set_slot_enabled(&self.key, enabled);

    if enabled {
      if let Some(period) = self.interval {
        self.timer = Some(self.cache.spawn_interval(self.key.clone(), period));
      }
    } else if let Some(timer) = self.timer.take() {
      timer.abort();
    }
  }
}

impl Drop for QuerySubscription {
  fn drop(&mut self) {
    if let Some(timer) = self.timer.take() {
      timer.abort();
    }
    self.cache.release(&self.key);
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::atomic::{AtomicU32, Ordering};

  fn test_cache() -> QueryCache {
    // RUST_LOG=hrsync=debug surfaces fetch/commit traces while debugging.
    let _ = tracing_subscriber::fmt()
      .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
      .try_init();

    QueryCache::with_retry(RetryPolicy {
      max_attempts: 1,
      base_backoff_ms: 1,
    })
  }

  fn counting_fetcher(
    calls: Arc<AtomicU32>,
    data: Vec<i32>,
  ) -> impl Fn() -> futures::future::BoxFuture<'static, Result<Vec<i32>>> + Clone + Send + Sync + 'static
  {
    move || {
      let calls = calls.clone();
      let data = data.clone();
      async move {
        calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(20)).await;
        Ok(data)
      }
      .boxed()
    }
  }

  #[tokio::test]
  async fn concurrent_fetches_share_one_network_call() {
    let cache = test_cache();
    let calls = Arc::new(AtomicU32::new(0));
    let fetcher = counting_fetcher(calls.clone(), vec![1, 2, 3]);

    let (a, b) = tokio::join!(
      cache.fetch::<Vec<i32>, _, _, _>(&"numbers", fetcher.clone()),
      cache.fetch::<Vec<i32>, _, _, _>(&"numbers", fetcher.clone()),
    );

    assert_eq!(a.unwrap(), vec![1, 2, 3]);
    assert_eq!(b.unwrap(), vec![1, 2, 3]);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn fresh_data_is_served_from_cache() {
    let cache = test_cache();
    let calls = Arc::new(AtomicU32::new(0));
    let fetcher = counting_fetcher(calls.clone(), vec![4]);

    for _ in 0..3 {
      let data: Vec<i32> = cache.fetch(&"numbers", fetcher.clone()).await.unwrap();
      assert_eq!(data, vec![4]);
    }

    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn invalidate_unsubscribed_key_defers_to_next_read() {
    let cache = test_cache();
    let calls = Arc::new(AtomicU32::new(0));
    let fetcher = counting_fetcher(calls.clone(), vec![1]);

    let _: Vec<i32> = cache.fetch(&"numbers", fetcher.clone()).await.unwrap();
    cache.invalidate(&"numbers");

    // No subscriber: nothing refetches until someone reads the key again.
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    let _: Vec<i32> = cache.fetch(&"numbers", fetcher.clone()).await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);
  }

  #[tokio::test]
  async fn invalidate_subscribed_key_refetches_immediately() {
    let cache = test_cache();
    let calls = Arc::new(AtomicU32::new(0));
    let fetcher = counting_fetcher(calls.clone(), vec![1]);

    let subscription = cache.subscribe::<Vec<i32>, _, _, _>(
      &"numbers",
      fetcher,
      SubscribeOptions::default(),
    );
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    cache.invalidate(&"numbers");
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    let entry = subscription.snapshot::<Vec<i32>>();
    assert!(entry.status.is_success());
  }

  #[tokio::test]
  async fn disabled_subscription_never_fetches_until_enabled() {
    let cache = test_cache();
    let calls = Arc::new(AtomicU32::new(0));
    let fetcher = counting_fetcher(calls.clone(), vec![1]);

    let mut subscription = cache.subscribe::<Vec<i32>, _, _, _>(
      &"numbers",
      fetcher,
      SubscribeOptions {
        enabled: false,
        refetch_interval: None,
      },
    );

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert!(subscription.snapshot::<Vec<i32>>().status.is_idle());

    // The false -> true transition triggers the fetch.
    subscription.set_enabled(true);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(subscription.snapshot::<Vec<i32>>().status.is_success());
  }

  #[tokio::test]
  async fn interval_refetches_while_subscribed_and_stops_on_drop() {
    let cache = test_cache();
    let calls = Arc::new(AtomicU32::new(0));
    let fetcher = counting_fetcher(calls.clone(), vec![1]);

    let subscription = cache.subscribe::<Vec<i32>, _, _, _>(
      &"numbers",
      fetcher,
      SubscribeOptions {
        enabled: true,
        refetch_interval: Some(Duration::from_millis(40)),
      },
    );

    tokio::time::sleep(Duration::from_millis(150)).await;
    let while_subscribed = calls.load(Ordering::SeqCst);
    assert!(while_subscribed >= 2, "expected polling refetches");

    drop(subscription);
    tokio::time::sleep(Duration::from_millis(120)).await;
    assert_eq!(calls.load(Ordering::SeqCst), while_subscribed);
  }

  #[tokio::test]
  async fn failed_refetch_preserves_previous_data() {
    let cache = test_cache();
    let calls = Arc::new(AtomicU32::new(0));

    let good = counting_fetcher(calls.clone(), vec![1, 2]);
    let _: Vec<i32> = cache.fetch(&"numbers", good).await.unwrap();

    cache.invalidate(&"numbers");
    let result: Result<Vec<i32>> = cache
      .fetch(&"numbers", || async {
        Err(Error::Network("connection refused".to_string()))
      })
      .await;
    assert!(matches!(result, Err(Error::Network(_))));

    let entry = cache.snapshot::<Vec<i32>, _>(&"numbers");
    assert!(entry.status.is_error());
    assert_eq!(entry.data, Some(vec![1, 2]));
    assert!(entry.error.is_some());
  }

  #[tokio::test]
  async fn snapshot_of_unknown_key_is_idle() {
    let cache = test_cache();
    let entry = cache.snapshot::<Vec<i32>, _>(&"nothing");
    assert!(entry.status.is_idle());
    assert_eq!(entry.data, None);
  }
}
