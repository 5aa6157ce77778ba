//! Cached data service over the HR API.
//!
//! Wraps `HrClient` with the query cache: reads are cached and deduplicated
//! per key, writes go through the mutation-invalidation contract so dependent
//! reads refetch after a confirmed change.

use crate::client::types::{
  ApiNotification, AttendanceRecord, Employee, EmployeePayload, Holiday, LeaveNotice,
  LeaveRequest, LeaveStatus, NewNotification,
};
use crate::client::HrClient;
use crate::error::Result;
use crate::query::{HrQueryKey, Mutation, QueryCache};

/// HR data access with transparent caching and invalidation.
#[derive(Clone)]
pub struct HrDataService {
  client: HrClient,
  cache: QueryCache,
}

impl HrDataService {
  /// The cache is injected so the service, the notification aggregator and
  /// tests can share one instance.
  pub fn new(client: HrClient, cache: QueryCache) -> Self {
    Self { client, cache }
  }

  pub fn cache(&self) -> &QueryCache {
    &self.cache
  }

  // ==========================================================================
  // Cached reads
  // ==========================================================================

  pub async fn employees(&self, skip: u32, limit: u32) -> Result<Vec<Employee>> {
    let client = self.client.clone();
    self
      .cache
      .fetch(&HrQueryKey::Employees { skip, limit }, move || {
        let client = client.clone();
        async move { client.list_employees(skip, limit).await }
      })
      .await
  }

  pub async fn attendance(&self) -> Result<Vec<AttendanceRecord>> {
    let client = self.client.clone();
    self
      .cache
      .fetch(&HrQueryKey::Attendance, move || {
        let client = client.clone();
        async move { client.list_attendance().await }
      })
      .await
  }

  pub async fn leave_requests(&self) -> Result<Vec<LeaveRequest>> {
    let client = self.client.clone();
    self
      .cache
      .fetch(&HrQueryKey::LeaveRequests, move || {
        let client = client.clone();
        async move { client.list_leave_requests().await }
      })
      .await
  }

  pub async fn holidays(&self) -> Result<Vec<Holiday>> {
    let client = self.client.clone();
    self
      .cache
      .fetch(&HrQueryKey::Holidays, move || {
        let client = client.clone();
        async move { client.list_holidays().await }
      })
      .await
  }

  pub async fn notifications(&self) -> Result<Vec<ApiNotification>> {
    let client = self.client.clone();
    self
      .cache
      .fetch(&HrQueryKey::Notifications, move || {
        let client = client.clone();
        async move { client.list_notifications().await }
      })
      .await
  }

  pub async fn leave_notices(&self) -> Result<Vec<LeaveNotice>> {
    let client = self.client.clone();
    self
      .cache
      .fetch(&HrQueryKey::LeaveNotices, move || {
        let client = client.clone();
        async move { client.list_leave_notices().await }
      })
      .await
  }

  // ==========================================================================
  // Mutations
  // ==========================================================================

  /// Creating an employee makes every cached employees page stale.
  pub async fn create_employee(&self, payload: &EmployeePayload) -> Result<Employee> {
    let client = self.client.clone();
    let payload = payload.clone();
    Mutation::new(&self.cache)
      .invalidates_prefix(HrQueryKey::EMPLOYEES_PREFIX)
      .run(async move { client.create_employee(&payload).await })
      .await
  }

  pub async fn update_employee(&self, id: i64, payload: &EmployeePayload) -> Result<Employee> {
    let client = self.client.clone();
    let payload = payload.clone();
    Mutation::new(&self.cache)
      .invalidates_prefix(HrQueryKey::EMPLOYEES_PREFIX)
      .run(async move { client.update_employee(id, &payload).await })
      .await
  }

  pub async fn delete_employee(&self, id: i64) -> Result<()> {
    let client = self.client.clone();
    Mutation::new(&self.cache)
      .invalidates_prefix(HrQueryKey::EMPLOYEES_PREFIX)
      .run(async move { client.delete_employee(id).await })
      .await
  }

  /// Approving or rejecting a leave request changes both the request list
  /// and the admin leave notice stream.
  pub async fn update_leave_status(&self, id: i64, status: LeaveStatus) -> Result<LeaveRequest> {
    let client = self.client.clone();
    Mutation::new(&self.cache)
      .invalidates(&HrQueryKey::LeaveRequests)
      .invalidates(&HrQueryKey::LeaveNotices)
      .run(async move { client.update_leave_status(id, status).await })
      .await
  }

  pub async fn mark_notification_read(&self, id: i64) -> Result<()> {
    let client = self.client.clone();
    Mutation::new(&self.cache)
      .invalidates(&HrQueryKey::Notifications)
      .run(async move { client.mark_notification_read(id).await })
      .await
  }

  pub async fn mark_all_notifications_read(&self) -> Result<()> {
    let client = self.client.clone();
    Mutation::new(&self.cache)
      .invalidates(&HrQueryKey::Notifications)
      .run(async move { client.mark_all_notifications_read().await })
      .await
  }

  pub async fn delete_notification(&self, id: i64) -> Result<()> {
    let client = self.client.clone();
    Mutation::new(&self.cache)
      .invalidates(&HrQueryKey::Notifications)
      .run(async move { client.delete_notification(id).await })
      .await
  }

  pub async fn create_notification(&self, new: &NewNotification) -> Result<ApiNotification> {
    let client = self.client.clone();
    let new = new.clone();
    Mutation::new(&self.cache)
      .invalidates(&HrQueryKey::Notifications)
      .run(async move { client.create_notification(&new).await })
      .await
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::ApiConfig;
  use crate::error::Error;
  use crate::query::QueryKey;

  fn offline_service(cache: QueryCache) -> HrDataService {
    let client = HrClient::new(&ApiConfig::default()).unwrap();
    HrDataService::new(client, cache)
  }

  #[tokio::test]
  async fn rejected_payload_never_invalidates_the_cache() {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    let cache = QueryCache::new();
    let calls = Arc::new(AtomicU32::new(0));

    // Seed an employees page so there is something to invalidate.
    let key = HrQueryKey::Employees { skip: 0, limit: 50 };
    let seed = {
      let calls = calls.clone();
      move || {
        let calls = calls.clone();
        async move {
          calls.fetch_add(1, Ordering::SeqCst);
          Ok(vec![1, 2, 3])
        }
      }
    };
    let _: Vec<i32> = cache.fetch(&key, seed.clone()).await.unwrap();

    let service = offline_service(cache.clone());
    let invalid = EmployeePayload {
      first_name: "Ada".to_string(),
      last_name: "Mensah".to_string(),
      email: "no-at-sign".to_string(),
      department: None,
      position: None,
    };

    // Validation fails before any network call, so the mutation never runs
    // its invalidation step.
    let result = service.create_employee(&invalid).await;
    assert!(matches!(result, Err(Error::Validation(_))));

    // Still fresh: the page serves from cache without a second call.
    let page: Vec<i32> = cache.fetch(&key, seed).await.unwrap();
    assert_eq!(page, vec![1, 2, 3]);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(key.cache_key(), "employees:0:50");
  }
}
