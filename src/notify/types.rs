//! Unified notification view types and the per-stream conversions into them.

use chrono::{DateTime, Utc};

use super::routes::resolve_route;
use crate::client::types::{ApiNotification, LeaveNotice};

/// Viewer role; drives stream gating and route resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
  Admin,
  Hr,
  Employee,
  TeamLead,
}

impl Role {
  /// Roles that navigate the admin-side namespace.
  pub fn is_admin_like(self) -> bool {
    !matches!(self, Role::Employee)
  }

  /// Only admin and HR may fetch the leave notice stream.
  pub fn can_view_leave_notices(self) -> bool {
    matches!(self, Role::Admin | Role::Hr)
  }
}

/// Which source stream produced a record.
///
/// Ids are unique only within one stream, so `(StreamKind, id)` is the
/// identity of a record in the merged view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamKind {
  Leave,
  General,
}

/// Semantic category of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceType {
  Leave,
  Attendance,
  Performance,
  Announcement,
  Employee,
  Recruitment,
  Training,
  Document,
  Other,
}

impl SourceType {
  /// Total mapping from wire strings; anything unrecognized is `Other`.
  pub fn from_wire(raw: &str) -> Self {
    match raw.trim().to_lowercase().as_str() {
      "leave" => SourceType::Leave,
      "attendance" => SourceType::Attendance,
      "performance" => SourceType::Performance,
      "announcement" => SourceType::Announcement,
      "employee" => SourceType::Employee,
      "recruitment" => SourceType::Recruitment,
      "training" => SourceType::Training,
      "document" => SourceType::Document,
      _ => SourceType::Other,
    }
  }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum Priority {
  Low,
  #[default]
  Medium,
  High,
}

impl Priority {
  /// Absent or unrecognized wire values read as `Medium`.
  pub fn from_wire(raw: Option<&str>) -> Self {
    match raw.map(|r| r.trim().to_lowercase()) {
      Some(ref p) if p == "low" => Priority::Low,
      Some(ref p) if p == "high" => Priority::High,
      _ => Priority::Medium,
    }
  }
}

/// One entry in the merged notification view.
#[derive(Debug, Clone)]
pub struct NotificationRecord {
  pub origin: StreamKind,
  pub id: i64,
  pub title: String,
  pub message: String,
  pub source_type: SourceType,
  pub priority: Priority,
  pub is_read: bool,
  pub created_at: DateTime<Utc>,
  pub route: Option<String>,
}

impl NotificationRecord {
  /// Convert a general-stream record, resolving a route for the viewer's
  /// role when the server did not send one.
  pub fn from_general(notification: ApiNotification, role: Role) -> Self {
    let source_type = SourceType::from_wire(&notification.notification_type);
    let route = notification
      .route
      .or_else(|| Some(resolve_route(source_type, role).to_string()));

    Self {
      origin: StreamKind::General,
      id: notification.id,
      title: notification.title,
      message: notification.message,
      source_type,
      priority: Priority::from_wire(notification.priority.as_deref()),
      is_read: notification.is_read,
      created_at: notification.created_at,
      route,
    }
  }

  /// Convert a leave-stream record. The stream carries no remote read state,
  /// so records start unread and only local overrides can mark them.
  pub fn from_leave(notice: LeaveNotice, role: Role) -> Self {
    let message = format!(
      "{} requested {} leave from {} to {}",
      notice.employee_name, notice.leave_type, notice.start_date, notice.end_date
    );

    Self {
      origin: StreamKind::Leave,
      id: notice.id,
      title: format!("Leave request from {}", notice.employee_name),
      message,
      source_type: SourceType::Leave,
      priority: Priority::Medium,
      is_read: false,
      created_at: notice.created_at,
      route: Some(resolve_route(SourceType::Leave, role).to_string()),
    }
  }
}

/// Merged, ordered notification view plus its unread count.
#[derive(Debug, Clone)]
pub struct NotificationFeed {
  records: Vec<NotificationRecord>,
  unread: usize,
  visible_limit: usize,
}

impl NotificationFeed {
  /// The unread count is computed over the full merged list, never over the
  /// truncated display slice.
  pub(crate) fn new(records: Vec<NotificationRecord>, visible_limit: usize) -> Self {
    let unread = records.iter().filter(|r| !r.is_read).count();
    Self {
      records,
      unread,
      visible_limit,
    }
  }

  /// Every record, sorted newest first.
  pub fn records(&self) -> &[NotificationRecord] {
    &self.records
  }

  /// The display slice: the first `visible_limit` records.
  pub fn visible(&self) -> &[NotificationRecord] {
    let end = self.visible_limit.min(self.records.len());
    &self.records[..end]
  }

  pub fn unread(&self) -> usize {
    self.unread
  }

  pub fn len(&self) -> usize {
    self.records.len()
  }

  pub fn is_empty(&self) -> bool {
    self.records.is_empty()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn source_type_mapping_is_total() {
    assert_eq!(SourceType::from_wire("leave"), SourceType::Leave);
    assert_eq!(SourceType::from_wire(" Performance "), SourceType::Performance);
    assert_eq!(SourceType::from_wire("payroll"), SourceType::Other);
    assert_eq!(SourceType::from_wire(""), SourceType::Other);
  }

  #[test]
  fn priority_defaults_to_medium() {
    assert_eq!(Priority::from_wire(None), Priority::Medium);
    assert_eq!(Priority::from_wire(Some("HIGH")), Priority::High);
    assert_eq!(Priority::from_wire(Some("urgent")), Priority::Medium);
  }

  #[test]
  fn general_record_keeps_explicit_route() {
    let notification = ApiNotification {
      id: 1,
      title: "t".to_string(),
      message: "m".to_string(),
      notification_type: "training".to_string(),
      priority: None,
      is_read: false,
      created_at: "2025-01-01T00:00:00Z".parse().unwrap(),
      route: Some("/custom/target".to_string()),
    };

    let record = NotificationRecord::from_general(notification, Role::Admin);
    assert_eq!(record.route.as_deref(), Some("/custom/target"));
    assert_eq!(record.source_type, SourceType::Training);
  }

  #[test]
  fn feed_unread_ignores_truncation() {
    let records: Vec<NotificationRecord> = (0..10)
      .map(|i| NotificationRecord {
        origin: StreamKind::General,
        id: i,
        title: format!("n{}", i),
        message: String::new(),
        source_type: SourceType::Other,
        priority: Priority::Medium,
        is_read: i >= 8,
        created_at: "2025-01-01T00:00:00Z".parse().unwrap(),
        route: None,
      })
      .collect();

    let feed = NotificationFeed::new(records, 5);
    assert_eq!(feed.visible().len(), 5);
    assert_eq!(feed.len(), 10);
    assert_eq!(feed.unread(), 8);
  }
}
