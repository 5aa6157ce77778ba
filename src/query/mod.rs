//! Async query layer: keyed cache, typed keys, retry policy and the
//! mutation-invalidation contract.

mod cache;
mod keys;
mod mutation;
mod retry;
mod state;

pub use cache::{QueryCache, QuerySubscription, SubscribeOptions};
pub use keys::{HrQueryKey, QueryKey};
pub use mutation::{InvalidationTarget, Mutation};
pub use retry::RetryPolicy;
pub use state::{CacheEntry, QueryStatus};
