//! Expiring persistence for notification records.
//!
//! Records are write-once: they are stored with a TTL at dispatch time
//! and disappear passively when the TTL elapses. There is no delete or
//! update operation.

mod memory;
mod redis;

pub use memory::InMemoryNotificationStore;
pub use redis::RedisNotificationStore;

use crate::error::NotificationResult;
use crate::models::NotificationRecord;
use async_trait::async_trait;
use std::time::Duration;

/// Keyed, expiring store for dispatch outcomes.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationStore: Send + Sync {
    /// Store a record under its id with the given time-to-live.
    async fn put(&self, record: &NotificationRecord, ttl: Duration) -> NotificationResult<()>;

    /// Fetch a record by id. Expired records are indistinguishable from
    /// ones that never existed.
    async fn get(&self, id: &str) -> NotificationResult<Option<NotificationRecord>>;

    /// Return every non-expired record. Retention is bounded, so a full
    /// listing stays small; history queries filter and sort in memory.
    async fn list_all(&self) -> NotificationResult<Vec<NotificationRecord>>;
}
