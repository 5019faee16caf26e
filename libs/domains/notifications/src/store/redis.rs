//! Redis-backed notification store.
//!
//! Records are stored as JSON strings under `notification:{id}` with a
//! Redis-native TTL, so expiry needs no housekeeping on our side.

use super::NotificationStore;
use crate::error::{NotificationError, NotificationResult};
use crate::models::NotificationRecord;
use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

const KEY_PREFIX: &str = "notification:";

/// Notification store backed by Redis with per-key TTLs.
#[derive(Clone)]
pub struct RedisNotificationStore {
    redis: Arc<ConnectionManager>,
}

impl RedisNotificationStore {
    pub fn new(redis: ConnectionManager) -> Self {
        Self {
            redis: Arc::new(redis),
        }
    }

    fn key(id: &str) -> String {
        format!("{}{}", KEY_PREFIX, id)
    }
}

#[async_trait]
impl NotificationStore for RedisNotificationStore {
    async fn put(&self, record: &NotificationRecord, ttl: Duration) -> NotificationResult<()> {
        let mut conn = (*self.redis).clone();
        let payload = serde_json::to_string(record)?;

        let _: () = conn
            .set_ex(Self::key(&record.id), payload, ttl.as_secs())
            .await?;

        debug!(
            notification_id = %record.id,
            ttl_secs = ttl.as_secs(),
            "Stored notification record"
        );

        Ok(())
    }

    async fn get(&self, id: &str) -> NotificationResult<Option<NotificationRecord>> {
        let mut conn = (*self.redis).clone();

        let payload: Option<String> = conn.get(Self::key(id)).await?;

        match payload {
            Some(json) => {
                let record = serde_json::from_str(&json).map_err(|e| {
                    NotificationError::Store(format!(
                        "Corrupt notification record '{}': {}",
                        id, e
                    ))
                })?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    async fn list_all(&self) -> NotificationResult<Vec<NotificationRecord>> {
        let mut conn = (*self.redis).clone();

        // Retention is bounded (at most a week), so the keyspace stays
        // small enough for a pattern scan per query.
        let keys: Vec<String> = conn.keys(format!("{}*", KEY_PREFIX)).await?;

        let mut records = Vec::with_capacity(keys.len());
        for key in keys {
            // A key can expire between the scan and the read; skip it.
            let payload: Option<String> = conn.get(&key).await?;
            if let Some(json) = payload {
                match serde_json::from_str::<NotificationRecord>(&json) {
                    Ok(record) => records.push(record),
                    Err(e) => {
                        warn!(key = %key, error = %e, "Skipping corrupt notification record");
                    }
                }
            }
        }

        Ok(records)
    }
}
