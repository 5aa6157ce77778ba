//! Typed cache keys for HR API queries.

/// A value that identifies one logical async resource in the cache.
pub trait QueryKey {
  /// Stable string key used for slot lookup and prefix invalidation.
  fn cache_key(&self) -> String;

  /// Human-readable description for logs.
  fn description(&self) -> String;
}

/// Query key types for the HR API.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HrQueryKey {
  /// General notification stream
  Notifications,
  /// Admin-side leave notice stream
  LeaveNotices,
  /// One page of the employee list
  Employees { skip: u32, limit: u32 },
  /// Attendance records
  Attendance,
  /// Leave requests
  LeaveRequests,
  /// Company holidays
  Holidays,
}

impl HrQueryKey {
  /// Shared prefix of every employees page key, for mutation invalidation.
  pub const EMPLOYEES_PREFIX: &'static str = "employees";
}

impl QueryKey for HrQueryKey {
  fn cache_key(&self) -> String {
    match self {
      Self::Notifications => "notifications".to_string(),
      Self::LeaveNotices => "admin-leave-notifications".to_string(),
      Self::Employees { skip, limit } => format!("employees:{}:{}", skip, limit),
      Self::Attendance => "attendance".to_string(),
      Self::LeaveRequests => "leave-requests".to_string(),
      Self::Holidays => "holidays".to_string(),
    }
  }

  fn description(&self) -> String {
    match self {
      Self::Notifications => "general notifications".to_string(),
      Self::LeaveNotices => "admin leave notices".to_string(),
      Self::Employees { skip, limit } => {
        format!("employees page (skip {}, limit {})", skip, limit)
      }
      Self::Attendance => "attendance records".to_string(),
      Self::LeaveRequests => "leave requests".to_string(),
      Self::Holidays => "company holidays".to_string(),
    }
  }
}

// Plain strings work as keys too, mainly for tests and ad hoc queries.
impl QueryKey for &str {
  fn cache_key(&self) -> String {
    (*self).to_string()
  }

  fn description(&self) -> String {
    (*self).to_string()
  }
}

impl QueryKey for String {
  fn cache_key(&self) -> String {
    self.clone()
  }

  fn description(&self) -> String {
    self.clone()
  }
}
