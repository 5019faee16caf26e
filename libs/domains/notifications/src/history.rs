//! History queries over stored notification records.

use crate::error::{NotificationError, NotificationResult};
use crate::models::{HistoryResponse, NotificationRecord, Pagination, StatusResponse};
use crate::store::NotificationStore;
use std::sync::Arc;
use tracing::instrument;

const DEFAULT_PAGE: usize = 1;
const DEFAULT_LIMIT: usize = 10;

/// Read-side service over the notification store.
pub struct HistoryService<S>
where
    S: NotificationStore,
{
    store: Arc<S>,
}

impl<S> HistoryService<S>
where
    S: NotificationStore,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// List stored notifications, newest first, one page at a time.
    ///
    /// When `owner_id` is given, only records carrying that `userId`
    /// are returned. Ties on timestamp are broken by id ascending so
    /// pagination is deterministic.
    #[instrument(skip(self))]
    pub async fn list(
        &self,
        owner_id: Option<&str>,
        page: Option<usize>,
        limit: Option<usize>,
    ) -> NotificationResult<HistoryResponse> {
        let page = page.unwrap_or(DEFAULT_PAGE).max(1);
        let limit = limit.unwrap_or(DEFAULT_LIMIT).max(1);

        let mut records: Vec<NotificationRecord> = self
            .store
            .list_all()
            .await?
            .into_iter()
            .filter(|record| match owner_id {
                Some(owner) => record.user_id.as_deref() == Some(owner),
                None => true,
            })
            .collect();

        records.sort_by(|a, b| {
            b.timestamp
                .cmp(&a.timestamp)
                .then_with(|| a.id.cmp(&b.id))
        });

        let total = records.len();
        let notifications: Vec<NotificationRecord> = records
            .into_iter()
            .skip((page - 1) * limit)
            .take(limit)
            .collect();

        Ok(HistoryResponse {
            notifications,
            pagination: Pagination {
                total,
                page,
                limit,
                total_pages: total.div_ceil(limit),
            },
        })
    }

    /// Look up a single notification by id.
    ///
    /// An expired record is indistinguishable from one that never
    /// existed; both come back as not-found.
    #[instrument(skip(self))]
    pub async fn status(&self, id: &str) -> NotificationResult<StatusResponse> {
        match self.store.get(id).await? {
            Some(notification) => Ok(StatusResponse { notification }),
            None => Err(NotificationError::NotFound(id.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NotificationKind, NotificationStatus};
    use crate::store::InMemoryNotificationStore;
    use chrono::{TimeZone, Utc};
    use std::time::Duration;

    fn record(id: &str, user_id: Option<&str>, secs: i64) -> NotificationRecord {
        NotificationRecord {
            id: id.to_string(),
            kind: NotificationKind::Email,
            to: "user@example.com".to_string(),
            subject: "Hello".to_string(),
            status: NotificationStatus::Sent,
            message_id: None,
            task_id: None,
            user_id: user_id.map(str::to_string),
            timestamp: Utc.timestamp_opt(secs, 0).unwrap(),
        }
    }

    async fn seeded_service(records: &[NotificationRecord]) -> HistoryService<InMemoryNotificationStore> {
        let store = Arc::new(InMemoryNotificationStore::new());
        for record in records {
            store.put(record, Duration::from_secs(3600)).await.unwrap();
        }
        HistoryService::new(store)
    }

    #[tokio::test]
    async fn list_sorts_newest_first() {
        let service = seeded_service(&[
            record("email_1_a", None, 100),
            record("email_3_c", None, 300),
            record("email_2_b", None, 200),
        ])
        .await;

        let page = service.list(None, None, None).await.unwrap();
        let ids: Vec<&str> = page.notifications.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["email_3_c", "email_2_b", "email_1_a"]);
    }

    #[tokio::test]
    async fn list_breaks_timestamp_ties_by_id() {
        let service = seeded_service(&[
            record("email_9_b", None, 100),
            record("email_9_a", None, 100),
        ])
        .await;

        let page = service.list(None, None, None).await.unwrap();
        let ids: Vec<&str> = page.notifications.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["email_9_a", "email_9_b"]);
    }

    #[tokio::test]
    async fn list_filters_by_owner() {
        let service = seeded_service(&[
            record("email_1_a", Some("user-1"), 100),
            record("email_2_b", Some("user-2"), 200),
            record("email_3_c", None, 300),
        ])
        .await;

        let page = service.list(Some("user-1"), None, None).await.unwrap();
        assert_eq!(page.notifications.len(), 1);
        assert_eq!(page.notifications[0].id, "email_1_a");
        assert_eq!(page.pagination.total, 1);
    }

    #[tokio::test]
    async fn pagination_covers_all_records_without_overlap() {
        let records: Vec<NotificationRecord> = (0..5)
            .map(|i| record(&format!("email_{}_x", i), None, 100 + i as i64))
            .collect();
        let service = seeded_service(&records).await;

        let first = service.list(None, Some(1), Some(2)).await.unwrap();
        let second = service.list(None, Some(2), Some(2)).await.unwrap();
        let third = service.list(None, Some(3), Some(2)).await.unwrap();

        assert_eq!(first.pagination.total, 5);
        assert_eq!(first.pagination.total_pages, 3);
        assert_eq!(first.notifications.len(), 2);
        assert_eq!(second.notifications.len(), 2);
        assert_eq!(third.notifications.len(), 1);

        let mut seen: Vec<String> = first
            .notifications
            .into_iter()
            .chain(second.notifications)
            .chain(third.notifications)
            .map(|n| n.id)
            .collect();
        seen.dedup();
        assert_eq!(seen.len(), 5);
    }

    #[tokio::test]
    async fn page_past_the_end_is_empty() {
        let service = seeded_service(&[record("email_1_a", None, 100)]).await;

        let page = service.list(None, Some(9), Some(10)).await.unwrap();
        assert!(page.notifications.is_empty());
        assert_eq!(page.pagination.total, 1);
        assert_eq!(page.pagination.page, 9);
    }

    #[tokio::test]
    async fn zero_page_and_limit_are_clamped() {
        let service = seeded_service(&[record("email_1_a", None, 100)]).await;

        let page = service.list(None, Some(0), Some(0)).await.unwrap();
        assert_eq!(page.pagination.page, 1);
        assert_eq!(page.pagination.limit, 1);
        assert_eq!(page.notifications.len(), 1);
    }

    #[tokio::test]
    async fn status_of_missing_record_is_not_found() {
        let service = seeded_service(&[]).await;

        let err = service.status("email_gone").await.unwrap_err();
        assert!(matches!(err, NotificationError::NotFound(_)));
    }

    #[tokio::test]
    async fn status_returns_stored_record() {
        let service = seeded_service(&[record("email_1_a", Some("user-1"), 100)]).await;

        let found = service.status("email_1_a").await.unwrap();
        assert_eq!(found.notification.id, "email_1_a");
    }
}
