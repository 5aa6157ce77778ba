//! Merges the leave and general notification streams into one ordered,
//! deduplicated, role-aware view with reconciled read state.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use super::overrides::LocalReadOverrides;
use super::types::{NotificationFeed, NotificationRecord, Role, SourceType, StreamKind};
use crate::client::types::{ApiNotification, LeaveNotice};
use crate::error::{Error, Result};
use crate::query::{HrQueryKey, Mutation, QueryCache, QuerySubscription, SubscribeOptions};

/// Remote operations the aggregator needs from the notification endpoints.
///
/// `HrClient` is the production implementation; tests substitute stubs.
#[async_trait]
pub trait NotificationGateway: Send + Sync {
  async fn fetch_general(&self) -> Result<Vec<ApiNotification>>;
  async fn fetch_leave(&self) -> Result<Vec<LeaveNotice>>;
  async fn mark_read(&self, id: i64) -> Result<()>;
  async fn mark_all_read(&self) -> Result<()>;
}

/// Outcome of selecting a notification.
///
/// `route` is where the UI should navigate (`None` means stay put). `error`
/// carries a failed mark-as-read mutation for user-visible reporting; the
/// failure never suppresses navigation.
#[derive(Debug)]
pub struct SelectOutcome {
  pub route: Option<String>,
  pub error: Option<Error>,
}

/// Merges role-gated notification streams into a single feed.
///
/// The aggregator owns the local read-override set and the stream
/// subscriptions; the query cache is injected so several components (and
/// tests) can share one.
pub struct NotificationAggregator {
  gateway: Arc<dyn NotificationGateway>,
  cache: QueryCache,
  role: Role,
  overrides: LocalReadOverrides,
  visible_limit: usize,
  refetch_interval: Duration,
  general_sub: Option<QuerySubscription>,
  leave_sub: Option<QuerySubscription>,
}

impl NotificationAggregator {
  pub fn new(gateway: Arc<dyn NotificationGateway>, cache: QueryCache, role: Role) -> Self {
    Self {
      gateway,
      cache,
      role,
      overrides: LocalReadOverrides::new(),
      visible_limit: 5,
      refetch_interval: Duration::from_secs(30),
      general_sub: None,
      leave_sub: None,
    }
  }

  pub fn with_visible_limit(mut self, limit: usize) -> Self {
    self.visible_limit = limit;
    self
  }

  pub fn with_refetch_interval(mut self, interval: Duration) -> Self {
    self.refetch_interval = interval;
    self
  }

  pub fn role(&self) -> Role {
    self.role
  }

  pub fn is_open(&self) -> bool {
    self.general_sub.is_some()
  }

  /// Open the notification surface and start fetching.
  ///
  /// The general stream is always subscribed and polls on the refetch
  /// interval. The leave stream is subscribed too, but stays disabled for
  /// roles outside admin/hr, so no leave fetch is ever issued for them.
  pub fn open_surface(&mut self) {
    if self.is_open() {
      return;
    }
    debug!(role = ?self.role, "notification surface opened");

    let gateway = Arc::clone(&self.gateway);
    self.general_sub = Some(self.cache.subscribe(
      &HrQueryKey::Notifications,
      move || {
        let gateway = Arc::clone(&gateway);
        async move { gateway.fetch_general().await }
      },
      SubscribeOptions {
        enabled: true,
        refetch_interval: Some(self.refetch_interval),
      },
    ));

    let gateway = Arc::clone(&self.gateway);
    self.leave_sub = Some(self.cache.subscribe(
      &HrQueryKey::LeaveNotices,
      move || {
        let gateway = Arc::clone(&gateway);
        async move { gateway.fetch_leave().await }
      },
      SubscribeOptions {
        enabled: self.role.can_view_leave_notices(),
        refetch_interval: None,
      },
    ));
  }

  /// Close the surface: stop polling. Cached data stays for the next open,
  /// and an in-flight fetch still lands in the cache.
  pub fn close_surface(&mut self) {
    self.general_sub = None;
    self.leave_sub = None;
  }

  /// Await a refresh of every enabled stream.
  ///
  /// Fetch failures are degraded, not surfaced: the stream contributes an
  /// empty sequence to the feed while the cache records the error.
  pub async fn refresh(&self) {
    if let Some(sub) = &self.general_sub {
      if let Err(err) = sub.resolve::<Vec<ApiNotification>>().await {
        debug!(error = %err, "general notification fetch failed");
      }
    }
    if let Some(sub) = &self.leave_sub {
      if sub.is_enabled() {
        if let Err(err) = sub.resolve::<Vec<LeaveNotice>>().await {
          debug!(error = %err, "leave notice fetch failed");
        }
      }
    }
  }

  /// Build the merged view from whatever is currently cached.
  ///
  /// Streams concatenate in a fixed order (leave first, then general) before
  /// the stable sort, so the result does not depend on which fetch resolved
  /// first. Ties on `created_at` keep that concatenation order.
  pub fn feed(&self) -> NotificationFeed {
    let mut records: Vec<NotificationRecord> = Vec::new();

    if self.role.can_view_leave_notices() {
      let notices: Vec<LeaveNotice> = self
        .cache
        .snapshot(&HrQueryKey::LeaveNotices)
        .data
        .unwrap_or_default();
      records.extend(
        notices
          .into_iter()
          .map(|notice| NotificationRecord::from_leave(notice, self.role)),
      );
    }

    let notifications: Vec<ApiNotification> = self
      .cache
      .snapshot(&HrQueryKey::Notifications)
      .data
      .unwrap_or_default();
    records.extend(
      notifications
        .into_iter()
        .map(|notification| NotificationRecord::from_general(notification, self.role)),
    );

    // Identity in the merged view is (origin, id); ids may collide across
    // streams without being duplicates.
    let mut seen: HashSet<(StreamKind, i64)> = HashSet::new();
    records.retain(|record| seen.insert((record.origin, record.id)));

    for record in &mut records {
      if self.overrides.contains(record.origin, record.id) {
        record.is_read = true;
      }
    }

    records.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    NotificationFeed::new(records, self.visible_limit)
  }

  /// Handle selection of a record, returning where to navigate.
  ///
  /// Leave-type records only get a local read marker: that stream has no
  /// remote mark-read endpoint. Everything else goes through the mark-read
  /// mutation, which invalidates the general stream on success; on failure
  /// the local marker is rolled back and the error is reported alongside the
  /// route, never instead of it.
  pub async fn select(&mut self, record: &NotificationRecord) -> SelectOutcome {
    let error = if record.source_type == SourceType::Leave {
      self.overrides.mark(record.origin, record.id);
      None
    } else {
      // Optimistic: mark before the server confirms.
      self.overrides.mark(record.origin, record.id);

      let gateway = Arc::clone(&self.gateway);
      let result = Mutation::new(&self.cache)
        .invalidates(&HrQueryKey::Notifications)
        .run(async move { gateway.mark_read(record.id).await })
        .await;

      match result {
        Ok(()) => None,
        Err(err) => {
          self.overrides.unmark(record.origin, record.id);
          warn!(id = record.id, error = %err, "mark-as-read failed");
          Some(err)
        }
      }
    };

    SelectOutcome {
      route: record.route.clone(),
      error,
    }
  }

  /// Mark everything read: the remote mark-all mutation for the general
  /// stream, plus local markers for every cached leave notice.
  pub async fn mark_all_read(&mut self) -> Result<()> {
    let gateway = Arc::clone(&self.gateway);
    Mutation::new(&self.cache)
      .invalidates(&HrQueryKey::Notifications)
      .run(async move { gateway.mark_all_read().await })
      .await?;

    if self.role.can_view_leave_notices() {
      let notices: Vec<LeaveNotice> = self
        .cache
        .snapshot(&HrQueryKey::LeaveNotices)
        .data
        .unwrap_or_default();
      for notice in notices {
        self.overrides.mark(StreamKind::Leave, notice.id);
      }
    }

    Ok(())
  }
}
