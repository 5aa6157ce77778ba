//! Notification aggregation: stream merging, read-state reconciliation and
//! role-scoped routing.

mod aggregator;
mod overrides;
mod routes;
mod types;

pub use aggregator::{NotificationAggregator, NotificationGateway, SelectOutcome};
pub use overrides::LocalReadOverrides;
pub use routes::{resolve_route, ADMIN_DEFAULT_ROUTE, EMPLOYEE_DEFAULT_ROUTE};
pub use types::{NotificationFeed, NotificationRecord, Priority, Role, SourceType, StreamKind};
