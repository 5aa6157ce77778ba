//! Data synchronization and notification aggregation engine for an HR
//! management console.
//!
//! The crate fetches server-owned entities (employees, attendance, leave,
//! holidays, notifications) over REST, caches them in a keyed query cache
//! with invalidation-on-mutation, and merges the leave and general
//! notification streams into one role-aware, time-ordered, read-state
//! reconciled feed.
//!
//! # Example
//!
//! ```ignore
//! let config = Config::load(None)?;
//! let cache = QueryCache::with_retry((&config.retry).into());
//! let client = HrClient::new(&config.api)?;
//!
//! let service = HrDataService::new(client.clone(), cache.clone());
//! let mut notifications =
//!     NotificationAggregator::new(Arc::new(client), cache, Role::Hr);
//!
//! notifications.open_surface();
//! notifications.refresh().await;
//! let feed = notifications.feed();
//! println!("{} unread", feed.unread());
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod notify;
pub mod query;
pub mod service;

pub use client::HrClient;
pub use config::Config;
pub use error::{Error, Result};
pub use notify::{NotificationAggregator, NotificationFeed, NotificationGateway, Role};
pub use query::{CacheEntry, HrQueryKey, QueryCache, QueryStatus};
pub use service::HrDataService;
