//! Wire types for the HR REST API.
//!
//! Each notification stream has its own tagged input type; the merge layer
//! converts them through total mapping functions instead of duck-typed field
//! fallbacks, so a missing timestamp is a decode error rather than a silent
//! default.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// General notification as returned by `GET /notifications`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiNotification {
  pub id: i64,
  pub title: String,
  pub message: String,
  #[serde(alias = "type")]
  pub notification_type: String,
  #[serde(default)]
  pub priority: Option<String>,
  #[serde(default)]
  pub is_read: bool,
  pub created_at: DateTime<Utc>,
  /// Explicit navigation target, when the server supplies one
  #[serde(default)]
  pub route: Option<String>,
}

/// Payload for `POST /notifications`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewNotification {
  pub title: String,
  pub message: String,
  pub notification_type: String,
  #[serde(default)]
  pub priority: Option<String>,
  #[serde(default)]
  pub route: Option<String>,
}

impl NewNotification {
  pub fn validate(&self) -> Result<()> {
    if self.title.trim().is_empty() {
      return Err(Error::Validation("notification title is required".to_string()));
    }
    if self.message.trim().is_empty() {
      return Err(Error::Validation(
        "notification message is required".to_string(),
      ));
    }
    Ok(())
  }
}

/// Pending leave request notice from the leave domain, visible to admin/hr.
///
/// This stream carries no read flag; read state for it lives entirely in the
/// session-local override set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaveNotice {
  pub id: i64,
  pub employee_name: String,
  pub leave_type: String,
  pub start_date: NaiveDate,
  pub end_date: NaiveDate,
  pub status: String,
  pub created_at: DateTime<Utc>,
}

/// Employee record from `GET /employees`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Employee {
  pub id: i64,
  pub first_name: String,
  pub last_name: String,
  pub email: String,
  #[serde(default)]
  pub department: Option<String>,
  #[serde(default)]
  pub position: Option<String>,
  #[serde(default = "default_true")]
  pub is_active: bool,
}

fn default_true() -> bool {
  true
}

/// Payload for creating or updating an employee.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmployeePayload {
  pub first_name: String,
  pub last_name: String,
  pub email: String,
  #[serde(default)]
  pub department: Option<String>,
  #[serde(default)]
  pub position: Option<String>,
}

impl EmployeePayload {
  /// Client-side checks, rejected before any network call.
  pub fn validate(&self) -> Result<()> {
    if self.first_name.trim().is_empty() || self.last_name.trim().is_empty() {
      return Err(Error::Validation("employee name is required".to_string()));
    }
    if !self.email.contains('@') {
      return Err(Error::Validation(format!(
        "invalid email address: {}",
        self.email
      )));
    }
    Ok(())
  }
}

/// Daily attendance record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceRecord {
  pub id: i64,
  pub employee_id: i64,
  pub date: NaiveDate,
  #[serde(default)]
  pub check_in: Option<DateTime<Utc>>,
  #[serde(default)]
  pub check_out: Option<DateTime<Utc>>,
  pub status: String,
}

/// Leave request lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeaveStatus {
  Pending,
  Approved,
  Rejected,
}

/// Leave request from `GET /leaves`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaveRequest {
  pub id: i64,
  pub employee_id: i64,
  pub leave_type: String,
  pub start_date: NaiveDate,
  pub end_date: NaiveDate,
  pub status: LeaveStatus,
  #[serde(default)]
  pub reason: Option<String>,
}

/// Company holiday from `GET /api/holidays/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Holiday {
  pub id: i64,
  pub name: String,
  pub date: NaiveDate,
  pub holiday_type: String,
  #[serde(default)]
  pub description: Option<String>,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn notification_decodes_with_type_alias_and_defaults() {
    let json = r#"{
      "id": 3,
      "title": "Review due",
      "message": "Q1 review is due",
      "type": "performance",
      "created_at": "2025-01-05T09:30:00Z"
    }"#;

    let notification: ApiNotification = serde_json::from_str(json).unwrap();
    assert_eq!(notification.notification_type, "performance");
    assert!(!notification.is_read);
    assert_eq!(notification.priority, None);
    assert_eq!(notification.route, None);
  }

  #[test]
  fn notification_without_timestamp_fails_to_decode() {
    let json = r#"{"id": 1, "title": "t", "message": "m", "type": "other"}"#;
    assert!(serde_json::from_str::<ApiNotification>(json).is_err());
  }

  #[test]
  fn employee_payload_validation() {
    let payload = EmployeePayload {
      first_name: "Ada".to_string(),
      last_name: "Mensah".to_string(),
      email: "ada.mensah".to_string(),
      department: None,
      position: None,
    };
    assert!(matches!(payload.validate(), Err(Error::Validation(_))));

    let payload = EmployeePayload {
      email: "ada.mensah@example.com".to_string(),
      ..payload
    };
    assert!(payload.validate().is_ok());
  }

  #[test]
  fn leave_status_round_trips_lowercase() {
    assert_eq!(
      serde_json::to_string(&LeaveStatus::Approved).unwrap(),
      "\"approved\""
    );
    let status: LeaveStatus = serde_json::from_str("\"pending\"").unwrap();
    assert_eq!(status, LeaveStatus::Pending);
  }
}
