//! In-memory notification store for tests and local development.

use super::NotificationStore;
use crate::error::NotificationResult;
use crate::models::NotificationRecord;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

struct ExpiringRecord {
    record: NotificationRecord,
    expires_at: DateTime<Utc>,
}

impl ExpiringRecord {
    fn live(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// Notification store backed by a `HashMap`, honoring TTLs on read.
#[derive(Clone, Default)]
pub struct InMemoryNotificationStore {
    records: Arc<RwLock<HashMap<String, ExpiringRecord>>>,
}

impl InMemoryNotificationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl NotificationStore for InMemoryNotificationStore {
    async fn put(&self, record: &NotificationRecord, ttl: Duration) -> NotificationResult<()> {
        let now = Utc::now();
        let mut records = self.records.write().await;

        records.retain(|_, entry| entry.live(now));
        records.insert(
            record.id.clone(),
            ExpiringRecord {
                record: record.clone(),
                expires_at: now + chrono::Duration::seconds(ttl.as_secs() as i64),
            },
        );

        Ok(())
    }

    async fn get(&self, id: &str) -> NotificationResult<Option<NotificationRecord>> {
        let now = Utc::now();
        let records = self.records.read().await;

        Ok(records
            .get(id)
            .filter(|entry| entry.live(now))
            .map(|entry| entry.record.clone()))
    }

    async fn list_all(&self) -> NotificationResult<Vec<NotificationRecord>> {
        let now = Utc::now();
        let records = self.records.read().await;

        Ok(records
            .values()
            .filter(|entry| entry.live(now))
            .map(|entry| entry.record.clone())
            .collect())
    }
}
