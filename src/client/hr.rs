//! HR API client: one method per endpoint.

use async_trait::async_trait;

use super::rest::RestClient;
use super::types::{
  ApiNotification, AttendanceRecord, Employee, EmployeePayload, Holiday, LeaveNotice,
  LeaveRequest, LeaveStatus, NewNotification,
};
use crate::config::ApiConfig;
use crate::error::Result;
use crate::notify::NotificationGateway;

/// Client for the HR management REST API.
#[derive(Clone)]
pub struct HrClient {
  rest: RestClient,
}

impl HrClient {
  pub fn new(config: &ApiConfig) -> Result<Self> {
    Ok(Self {
      rest: RestClient::new(config)?,
    })
  }

  // ==========================================================================
  // Notifications
  // ==========================================================================

  pub async fn list_notifications(&self) -> Result<Vec<ApiNotification>> {
    self.rest.get_json("/notifications").await
  }

  /// Idempotent on the server side.
  pub async fn mark_notification_read(&self, id: i64) -> Result<()> {
    self
      .rest
      .put_empty(&format!("/notifications/{}/read", id))
      .await
  }

  pub async fn mark_all_notifications_read(&self) -> Result<()> {
    self.rest.put_empty("/notifications/mark-all-read").await
  }

  pub async fn delete_notification(&self, id: i64) -> Result<()> {
    self.rest.delete(&format!("/notifications/{}", id)).await
  }

  pub async fn create_notification(&self, new: &NewNotification) -> Result<ApiNotification> {
    new.validate()?;
    self.rest.post_json("/notifications", new).await
  }

  /// Pending leave notices for the admin-side stream. Role gating is enforced
  /// by the aggregator; the endpoint itself rejects unauthorized callers.
  pub async fn list_leave_notices(&self) -> Result<Vec<LeaveNotice>> {
    self.rest.get_json("/leaves/notifications").await
  }

  // ==========================================================================
  // Employees
  // ==========================================================================

  pub async fn list_employees(&self, skip: u32, limit: u32) -> Result<Vec<Employee>> {
    self
      .rest
      .get_json(&format!("/employees?skip={}&limit={}", skip, limit))
      .await
  }

  pub async fn create_employee(&self, payload: &EmployeePayload) -> Result<Employee> {
    payload.validate()?;
    self.rest.post_json("/employees", payload).await
  }

  pub async fn update_employee(&self, id: i64, payload: &EmployeePayload) -> Result<Employee> {
    payload.validate()?;
    self
      .rest
      .put_json(&format!("/employees/{}", id), payload)
      .await
  }

  pub async fn delete_employee(&self, id: i64) -> Result<()> {
    self.rest.delete(&format!("/employees/{}", id)).await
  }

  // ==========================================================================
  // Attendance, leave, holidays
  // ==========================================================================

  pub async fn list_attendance(&self) -> Result<Vec<AttendanceRecord>> {
    self.rest.get_json("/attendance").await
  }

  pub async fn list_leave_requests(&self) -> Result<Vec<LeaveRequest>> {
    self.rest.get_json("/leaves").await
  }

  pub async fn update_leave_status(&self, id: i64, status: LeaveStatus) -> Result<LeaveRequest> {
    self
      .rest
      .put_json(
        &format!("/leaves/{}/status", id),
        &serde_json::json!({ "status": status }),
      )
      .await
  }

  pub async fn list_holidays(&self) -> Result<Vec<Holiday>> {
    self.rest.get_json("/api/holidays/").await
  }
}

#[async_trait]
impl NotificationGateway for HrClient {
  async fn fetch_general(&self) -> Result<Vec<ApiNotification>> {
    self.list_notifications().await
  }

  async fn fetch_leave(&self) -> Result<Vec<LeaveNotice>> {
    self.list_leave_notices().await
  }

  async fn mark_read(&self, id: i64) -> Result<()> {
    self.mark_notification_read(id).await
  }

  async fn mark_all_read(&self) -> Result<()> {
    self.mark_all_notifications_read().await
  }
}
