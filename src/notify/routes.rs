//! Role-scoped navigation targets per notification category.

use super::types::{Role, SourceType};

/// Fallback for categories with no mapping in the employee table.
pub const EMPLOYEE_DEFAULT_ROUTE: &str = "/employee/dashboard";

/// Fallback for categories with no mapping in the admin table.
pub const ADMIN_DEFAULT_ROUTE: &str = "/admin/dashboard";

const EMPLOYEE_ROUTES: &[(SourceType, &str)] = &[
  (SourceType::Leave, "/employee/leave"),
  (SourceType::Attendance, "/employee/attendance"),
  (SourceType::Performance, "/employee/performance"),
  (SourceType::Announcement, "/employee/announcements"),
  (SourceType::Employee, "/employee/profile"),
  (SourceType::Training, "/employee/training"),
  (SourceType::Document, "/employee/documents"),
];

const ADMIN_ROUTES: &[(SourceType, &str)] = &[
  (SourceType::Leave, "/admin/leave-management"),
  (SourceType::Attendance, "/admin/attendance"),
  (SourceType::Performance, "/admin/performance"),
  (SourceType::Announcement, "/admin/announcements"),
  (SourceType::Employee, "/admin/employees"),
  (SourceType::Recruitment, "/admin/recruitment"),
  (SourceType::Training, "/admin/training"),
  (SourceType::Document, "/admin/documents"),
];

/// Resolve the navigation target for a notification category and viewer role.
///
/// Pure table lookup: employees get the employee table, every other role the
/// admin table. Unmapped categories fall back to the table's default path,
/// never an error.
pub fn resolve_route(source_type: SourceType, role: Role) -> &'static str {
  let (table, fallback) = if role.is_admin_like() {
    (ADMIN_ROUTES, ADMIN_DEFAULT_ROUTE)
  } else {
    (EMPLOYEE_ROUTES, EMPLOYEE_DEFAULT_ROUTE)
  };

  table
    .iter()
    .find(|(candidate, _)| *candidate == source_type)
    .map(|(_, path)| *path)
    .unwrap_or(fallback)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn leave_routes_per_role() {
    assert_eq!(
      resolve_route(SourceType::Leave, Role::Employee),
      "/employee/leave"
    );
    assert_eq!(
      resolve_route(SourceType::Leave, Role::Admin),
      "/admin/leave-management"
    );
  }

  #[test]
  fn team_lead_uses_the_admin_table() {
    assert_eq!(
      resolve_route(SourceType::Attendance, Role::TeamLead),
      "/admin/attendance"
    );
  }

  #[test]
  fn unmapped_categories_fall_back_to_the_table_default() {
    assert_eq!(
      resolve_route(SourceType::Other, Role::Admin),
      ADMIN_DEFAULT_ROUTE
    );
    assert_eq!(
      resolve_route(SourceType::Other, Role::Employee),
      EMPLOYEE_DEFAULT_ROUTE
    );
    // Recruitment notifications exist only on the admin side.
    assert_eq!(
      resolve_route(SourceType::Recruitment, Role::Employee),
      EMPLOYEE_DEFAULT_ROUTE
    );
  }

  #[test]
  fn every_category_resolves_for_every_role() {
    let categories = [
      SourceType::Leave,
      SourceType::Attendance,
      SourceType::Performance,
      SourceType::Announcement,
      SourceType::Employee,
      SourceType::Recruitment,
      SourceType::Training,
      SourceType::Document,
      SourceType::Other,
    ];

    for category in categories {
      for role in [Role::Admin, Role::Hr, Role::Employee, Role::TeamLead] {
        assert!(resolve_route(category, role).starts_with('/'));
      }
    }
  }
}
