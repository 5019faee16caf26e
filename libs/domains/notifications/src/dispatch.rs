//! Dispatch orchestration: compose, send, and record notifications.
//!
//! All three dispatch flows funnel through one send-and-record path.
//! Validation happens before any external call, transport failures
//! leave no record behind, and a store failure after a successful send
//! surfaces as the distinct delivered-but-unrecorded fault.

use crate::error::{NotificationError, NotificationResult};
use crate::models::{
    DispatchReceipt, NotificationKind, NotificationRecord, NotificationStatus,
    ProviderInfoResponse, SendEmailRequest, TaskEventKind, TaskEventRequest, TaskPriority,
    TaskReminderRequest, TestEmailRequest, mint_id,
};
use crate::providers::{EmailMessage, EmailProvider};
use crate::resolver::IdentityResolver;
use crate::store::NotificationStore;
use crate::templates::{TaskEventData, TaskReminderData, TemplateEngine};
use chrono::DateTime;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Orchestrator-level configuration.
#[derive(Debug, Clone, Default)]
pub struct DispatchConfig {
    /// Fallback recipient for task lifecycle events when the request
    /// carries no address.
    pub task_owner_email: Option<String>,
}

impl DispatchConfig {
    pub fn from_env() -> Self {
        Self {
            task_owner_email: std::env::var("TASK_OWNER_EMAIL")
                .ok()
                .filter(|v| !v.is_empty()),
        }
    }
}

/// Service that dispatches notifications and records their outcome.
pub struct DispatchService<S, R>
where
    S: NotificationStore,
    R: IdentityResolver,
{
    provider: Arc<dyn EmailProvider>,
    store: Arc<S>,
    resolver: Arc<R>,
    templates: TemplateEngine,
    config: DispatchConfig,
}

impl<S, R> DispatchService<S, R>
where
    S: NotificationStore,
    R: IdentityResolver,
{
    pub fn new(
        provider: Arc<dyn EmailProvider>,
        store: Arc<S>,
        resolver: Arc<R>,
        config: DispatchConfig,
    ) -> NotificationResult<Self> {
        Ok(Self {
            provider,
            store,
            resolver,
            templates: TemplateEngine::new()?,
            config,
        })
    }

    /// Send a direct email with a caller-supplied body.
    ///
    /// When `to` is not an address and a `userId` is present, the
    /// recipient is resolved against the user service; resolution
    /// failures fall back to the literal `to` value rather than
    /// failing the send.
    #[instrument(skip(self, request), fields(user_id = ?request.user_id))]
    pub async fn send_direct(
        &self,
        request: SendEmailRequest,
    ) -> NotificationResult<DispatchReceipt> {
        let (to, subject) = match (present(request.to), present(request.subject)) {
            (Some(to), Some(subject)) if request.text.is_some() || request.html.is_some() => {
                (to, subject)
            }
            _ => {
                return Err(NotificationError::Validation(
                    "Missing required fields: to, subject, and text/html".to_string(),
                ));
            }
        };

        let recipient = match (&request.user_id, to.contains('@')) {
            (Some(user_id), false) => match self.resolver.resolve_email(user_id).await {
                Ok(Some(email)) => email,
                Ok(None) => {
                    warn!(user_id = %user_id, "User has no email, using provided to address");
                    to
                }
                Err(e) => {
                    warn!(user_id = %user_id, error = %e, "Could not fetch user email, using provided to address");
                    to
                }
            },
            _ => to,
        };

        self.send_and_record(
            NotificationKind::Email,
            recipient,
            subject,
            request.text,
            request.html,
            request.user_id,
            None,
        )
        .await
    }

    /// Send a due-date reminder to a task's owner.
    ///
    /// Unlike `send_direct`, identity resolution is mandatory here: a
    /// reminder without an address is useless, so resolution failures
    /// abort before any transport call.
    #[instrument(skip(self, request), fields(user_id = ?request.user_id, task_id = ?request.task_id))]
    pub async fn send_task_reminder(
        &self,
        request: TaskReminderRequest,
    ) -> NotificationResult<DispatchReceipt> {
        let (user_id, task_id, task_title) = match (
            present(request.user_id),
            present(request.task_id),
            present(request.task_title),
        ) {
            (Some(user_id), Some(task_id), Some(task_title)) => (user_id, task_id, task_title),
            _ => {
                return Err(NotificationError::Validation(
                    "Missing required fields: userId, taskId, taskTitle".to_string(),
                ));
            }
        };

        let recipient = match self.resolver.resolve_email(&user_id).await {
            Ok(Some(email)) => email,
            Ok(None) | Err(_) => {
                return Err(NotificationError::Resolution(
                    "Could not fetch user details".to_string(),
                ));
            }
        };

        let rendered = self.templates.render_task_reminder(&TaskReminderData {
            task_title,
            due_date: format_due_date(request.due_date.as_deref(), "No due date set"),
        })?;

        self.send_and_record(
            NotificationKind::TaskReminder,
            recipient,
            rendered.subject,
            Some(rendered.text),
            Some(rendered.html),
            Some(user_id),
            Some(task_id),
        )
        .await
    }

    /// Send a task lifecycle notification (created / updated / completed).
    #[instrument(skip(self, request), fields(task_id = ?request.task_id))]
    pub async fn send_task_event(
        &self,
        request: TaskEventRequest,
    ) -> NotificationResult<DispatchReceipt> {
        let task_title = present(request.task_title).ok_or_else(|| {
            NotificationError::Validation("Missing required fields: taskTitle".to_string())
        })?;

        let event = request
            .notification_type
            .as_deref()
            .and_then(TaskEventKind::parse)
            .ok_or_else(|| {
                NotificationError::Validation(format!(
                    "Unknown notificationType: {}",
                    request.notification_type.as_deref().unwrap_or("<missing>")
                ))
            })?;

        let recipient = request
            .user_email
            .filter(|email| !email.is_empty())
            .or_else(|| self.config.task_owner_email.clone())
            .ok_or_else(|| {
                NotificationError::Validation(
                    "No recipient: provide userEmail or configure TASK_OWNER_EMAIL".to_string(),
                )
            })?;

        let rendered = self.templates.render_task_event(&TaskEventData::new(
            event,
            task_title,
            request.task_description,
            TaskPriority::parse(request.task_priority.as_deref()),
            request
                .task_due_date
                .map(|raw| format_due_date(Some(&raw), "No due date")),
        ))?;

        self.send_and_record(
            event.kind(),
            recipient,
            rendered.subject,
            Some(rendered.text),
            Some(rendered.html),
            None,
            request.task_id,
        )
        .await
    }

    /// Send a fixed-content test email to verify transport configuration.
    #[instrument(skip(self, request))]
    pub async fn send_test_email(
        &self,
        request: TestEmailRequest,
    ) -> NotificationResult<DispatchReceipt> {
        let to = present(request.to).ok_or_else(|| {
            NotificationError::Validation("Email address required".to_string())
        })?;

        let rendered = self.templates.test_email();

        self.send_and_record(
            NotificationKind::Email,
            to,
            rendered.subject,
            Some(rendered.text),
            Some(rendered.html),
            None,
            None,
        )
        .await
    }

    /// Report which transport is active and whether it looks configured.
    pub fn provider_info(&self) -> ProviderInfoResponse {
        ProviderInfoResponse {
            provider: self.provider.name().to_string(),
            configured: self.provider.configured(),
        }
    }

    /// The shared send-and-record path.
    ///
    /// Transport failures propagate without writing a record. A store
    /// failure after a successful send becomes `DeliveredUnrecorded`,
    /// carrying the provider message id for manual reconciliation.
    #[allow(clippy::too_many_arguments)]
    async fn send_and_record(
        &self,
        kind: NotificationKind,
        to: String,
        subject: String,
        text: Option<String>,
        html: Option<String>,
        user_id: Option<String>,
        task_id: Option<String>,
    ) -> NotificationResult<DispatchReceipt> {
        let message = EmailMessage {
            to: to.clone(),
            subject: subject.clone(),
            text,
            html,
        };

        let sent = self.provider.send(&message).await?;

        let (id, created_at) = mint_id(kind);
        let record = NotificationRecord {
            id: id.clone(),
            kind,
            to,
            subject,
            status: NotificationStatus::Sent,
            message_id: sent.message_id.clone(),
            task_id,
            user_id,
            timestamp: created_at,
        };

        if let Err(e) = self.store.put(&record, kind.retention()).await {
            warn!(
                notification_id = %id,
                message_id = ?sent.message_id,
                error = %e,
                "Email delivered but record write failed"
            );
            return Err(NotificationError::DeliveredUnrecorded {
                message_id: sent.message_id,
                detail: e.to_string(),
            });
        }

        info!(
            notification_id = %id,
            kind = %kind,
            provider = self.provider.name(),
            "Notification dispatched"
        );

        Ok(DispatchReceipt {
            notification_id: id,
            message_id: sent.message_id,
            provider: self.provider.name(),
        })
    }
}

/// Collapse an absent or empty request field into `None` so both forms
/// hit the same validation branch.
fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Format an RFC 3339 due date for display, passing unparseable values
/// through unchanged.
fn format_due_date(raw: Option<&str>, fallback: &'static str) -> String {
    match raw {
        Some(value) => DateTime::parse_from_rfc3339(value)
            .map(|dt| dt.format("%m/%d/%Y").to_string())
            .unwrap_or_else(|_| value.to_string()),
        None => fallback.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DIRECT_EMAIL_TTL, TASK_NOTIFICATION_TTL};
    use crate::providers::{MockEmailProvider, SentEmail};
    use crate::resolver::MockIdentityResolver;
    use crate::store::{InMemoryNotificationStore, MockNotificationStore, NotificationStore};

    fn sending_provider(message_id: &str) -> MockEmailProvider {
        let message_id = message_id.to_string();
        let mut provider = MockEmailProvider::new();
        provider.expect_send().returning(move |_| {
            Ok(SentEmail {
                message_id: Some(message_id.clone()),
            })
        });
        provider.expect_name().return_const("smtp");
        provider.expect_configured().return_const(true);
        provider
    }

    fn silent_resolver() -> MockIdentityResolver {
        let mut resolver = MockIdentityResolver::new();
        resolver.expect_resolve_email().never();
        resolver
    }

    fn service(
        provider: MockEmailProvider,
        resolver: MockIdentityResolver,
    ) -> (
        DispatchService<InMemoryNotificationStore, MockIdentityResolver>,
        Arc<InMemoryNotificationStore>,
    ) {
        let store = Arc::new(InMemoryNotificationStore::new());
        let service = DispatchService::new(
            Arc::new(provider),
            Arc::clone(&store),
            Arc::new(resolver),
            DispatchConfig::default(),
        )
        .unwrap();
        (service, store)
    }

    fn email_request(to: &str) -> SendEmailRequest {
        SendEmailRequest {
            to: Some(to.to_string()),
            subject: Some("Hello".to_string()),
            text: Some("Hi".to_string()),
            html: None,
            user_id: None,
        }
    }

    #[tokio::test]
    async fn send_direct_records_sent_outcome() {
        let (service, store) = service(sending_provider("msg-1"), silent_resolver());

        let receipt = service
            .send_direct(email_request("user@example.com"))
            .await
            .unwrap();

        assert!(receipt.notification_id.starts_with("email_"));
        assert_eq!(receipt.message_id.as_deref(), Some("msg-1"));
        assert_eq!(receipt.provider, "smtp");

        let record = store
            .get(&receipt.notification_id)
            .await
            .unwrap()
            .expect("record stored");
        assert_eq!(record.status, NotificationStatus::Sent);
        assert_eq!(record.to, "user@example.com");
        assert_eq!(record.kind, NotificationKind::Email);
    }

    #[tokio::test]
    async fn send_direct_rejects_missing_body() {
        let mut provider = MockEmailProvider::new();
        provider.expect_send().never();
        let (service, store) = service(provider, silent_resolver());

        let err = service
            .send_direct(SendEmailRequest {
                to: Some("user@example.com".to_string()),
                subject: Some("Hello".to_string()),
                text: None,
                html: None,
                user_id: None,
            })
            .await
            .unwrap_err();

        assert!(matches!(err, NotificationError::Validation(_)));
        assert!(store.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn send_direct_rejects_absent_subject() {
        let mut provider = MockEmailProvider::new();
        provider.expect_send().never();
        let (service, store) = service(provider, silent_resolver());

        let err = service
            .send_direct(SendEmailRequest {
                to: Some("user@example.com".to_string()),
                subject: None,
                text: Some("Hello".to_string()),
                html: None,
                user_id: None,
            })
            .await
            .unwrap_err();

        assert!(matches!(err, NotificationError::Validation(_)));
        assert!(store.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn send_direct_resolves_bare_user_id_recipient() {
        let mut resolver = MockIdentityResolver::new();
        resolver
            .expect_resolve_email()
            .withf(|id| id == "user-7")
            .returning(|_| Ok(Some("resolved@example.com".to_string())));
        let (service, store) = service(sending_provider("msg-2"), resolver);

        let mut request = email_request("user-7");
        request.user_id = Some("user-7".to_string());
        let receipt = service.send_direct(request).await.unwrap();

        let record = store.get(&receipt.notification_id).await.unwrap().unwrap();
        assert_eq!(record.to, "resolved@example.com");
        assert_eq!(record.user_id.as_deref(), Some("user-7"));
    }

    #[tokio::test]
    async fn send_direct_falls_back_when_resolution_fails() {
        let mut resolver = MockIdentityResolver::new();
        resolver
            .expect_resolve_email()
            .returning(|_| Err(NotificationError::Resolution("timeout".to_string())));
        let (service, store) = service(sending_provider("msg-3"), resolver);

        let mut request = email_request("user-7");
        request.user_id = Some("user-7".to_string());
        let receipt = service.send_direct(request).await.unwrap();

        let record = store.get(&receipt.notification_id).await.unwrap().unwrap();
        assert_eq!(record.to, "user-7");
    }

    #[tokio::test]
    async fn send_direct_skips_resolution_for_literal_address() {
        let (service, _store) = service(sending_provider("msg-4"), silent_resolver());

        let mut request = email_request("user@example.com");
        request.user_id = Some("user-7".to_string());
        service.send_direct(request).await.unwrap();
    }

    #[tokio::test]
    async fn transport_failure_leaves_no_record() {
        let mut provider = MockEmailProvider::new();
        provider
            .expect_send()
            .returning(|_| Err(NotificationError::Provider("connection refused".to_string())));
        let (service, store) = service(provider, silent_resolver());

        let err = service
            .send_direct(email_request("user@example.com"))
            .await
            .unwrap_err();

        assert!(matches!(err, NotificationError::Provider(_)));
        assert!(store.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn store_failure_after_send_is_delivered_unrecorded() {
        let mut store = MockNotificationStore::new();
        store
            .expect_put()
            .returning(|_, _| Err(NotificationError::Store("redis down".to_string())));

        let service = DispatchService::new(
            Arc::new(sending_provider("msg-5")),
            Arc::new(store),
            Arc::new(silent_resolver()),
            DispatchConfig::default(),
        )
        .unwrap();

        let err = service
            .send_direct(email_request("user@example.com"))
            .await
            .unwrap_err();

        match err {
            NotificationError::DeliveredUnrecorded { message_id, .. } => {
                assert_eq!(message_id.as_deref(), Some("msg-5"));
            }
            other => panic!("expected DeliveredUnrecorded, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn reminder_requires_resolvable_owner() {
        let mut provider = MockEmailProvider::new();
        provider.expect_send().never();
        let mut resolver = MockIdentityResolver::new();
        resolver.expect_resolve_email().returning(|_| Ok(None));
        let (service, store) = service(provider, resolver);

        let err = service
            .send_task_reminder(TaskReminderRequest {
                user_id: Some("user-7".to_string()),
                task_id: Some("task-1".to_string()),
                task_title: Some("Ship it".to_string()),
                due_date: None,
            })
            .await
            .unwrap_err();

        assert!(matches!(err, NotificationError::Resolution(_)));
        assert!(store.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn reminder_records_task_reference() {
        let mut resolver = MockIdentityResolver::new();
        resolver
            .expect_resolve_email()
            .returning(|_| Ok(Some("owner@example.com".to_string())));
        let (service, store) = service(sending_provider("msg-6"), resolver);

        let receipt = service
            .send_task_reminder(TaskReminderRequest {
                user_id: Some("user-7".to_string()),
                task_id: Some("task-1".to_string()),
                task_title: Some("Ship it".to_string()),
                due_date: Some("2026-09-15T00:00:00Z".to_string()),
            })
            .await
            .unwrap();

        let record = store.get(&receipt.notification_id).await.unwrap().unwrap();
        assert_eq!(record.kind, NotificationKind::TaskReminder);
        assert_eq!(record.task_id.as_deref(), Some("task-1"));
        assert_eq!(record.subject, "Task Reminder: Ship it");
        assert_eq!(record.to, "owner@example.com");
    }

    #[tokio::test]
    async fn task_event_records_kind_and_subject() {
        let (service, store) = service(sending_provider("msg-7"), silent_resolver());

        let receipt = service
            .send_task_event(TaskEventRequest {
                task_id: Some("task-9".to_string()),
                task_title: Some("Write report".to_string()),
                task_description: None,
                task_priority: Some("high".to_string()),
                task_due_date: None,
                user_email: Some("owner@example.com".to_string()),
                notification_type: Some("created".to_string()),
            })
            .await
            .unwrap();

        assert!(receipt.notification_id.starts_with("task_created_"));
        let record = store.get(&receipt.notification_id).await.unwrap().unwrap();
        assert_eq!(record.kind, NotificationKind::TaskCreated);
        assert!(record.subject.contains("Write report"));
    }

    #[tokio::test]
    async fn task_event_rejects_unknown_type() {
        let mut provider = MockEmailProvider::new();
        provider.expect_send().never();
        let (service, _store) = service(provider, silent_resolver());

        let err = service
            .send_task_event(TaskEventRequest {
                task_id: None,
                task_title: Some("Write report".to_string()),
                task_description: None,
                task_priority: None,
                task_due_date: None,
                user_email: Some("owner@example.com".to_string()),
                notification_type: Some("deleted".to_string()),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, NotificationError::Validation(_)));
    }

    #[tokio::test]
    async fn task_event_falls_back_to_configured_owner() {
        let store = Arc::new(InMemoryNotificationStore::new());
        let service = DispatchService::new(
            Arc::new(sending_provider("msg-8")),
            Arc::clone(&store),
            Arc::new(silent_resolver()),
            DispatchConfig {
                task_owner_email: Some("fallback@example.com".to_string()),
            },
        )
        .unwrap();

        let receipt = service
            .send_task_event(TaskEventRequest {
                task_id: None,
                task_title: Some("Write report".to_string()),
                task_description: None,
                task_priority: None,
                task_due_date: None,
                user_email: None,
                notification_type: Some("updated".to_string()),
            })
            .await
            .unwrap();

        let record = store.get(&receipt.notification_id).await.unwrap().unwrap();
        assert_eq!(record.to, "fallback@example.com");
    }

    #[tokio::test]
    async fn task_event_without_any_recipient_is_rejected() {
        let mut provider = MockEmailProvider::new();
        provider.expect_send().never();
        let (service, _store) = service(provider, silent_resolver());

        let err = service
            .send_task_event(TaskEventRequest {
                task_id: None,
                task_title: Some("Write report".to_string()),
                task_description: None,
                task_priority: None,
                task_due_date: None,
                user_email: None,
                notification_type: Some("created".to_string()),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, NotificationError::Validation(_)));
    }

    #[tokio::test]
    async fn test_email_uses_fixed_subject_and_short_ttl() {
        let mut store = MockNotificationStore::new();
        store
            .expect_put()
            .withf(|record, ttl| {
                record.subject == "Test Email - Task Management System"
                    && *ttl == DIRECT_EMAIL_TTL
            })
            .returning(|_, _| Ok(()));

        let service = DispatchService::new(
            Arc::new(sending_provider("msg-9")),
            Arc::new(store),
            Arc::new(silent_resolver()),
            DispatchConfig::default(),
        )
        .unwrap();

        service
            .send_test_email(TestEmailRequest {
                to: Some("admin@example.com".to_string()),
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn task_kinds_use_long_ttl() {
        let mut store = MockNotificationStore::new();
        store
            .expect_put()
            .withf(|_, ttl| *ttl == TASK_NOTIFICATION_TTL)
            .returning(|_, _| Ok(()));

        let service = DispatchService::new(
            Arc::new(sending_provider("msg-10")),
            Arc::new(store),
            Arc::new(silent_resolver()),
            DispatchConfig::default(),
        )
        .unwrap();

        service
            .send_task_event(TaskEventRequest {
                task_id: None,
                task_title: Some("Write report".to_string()),
                task_description: None,
                task_priority: None,
                task_due_date: None,
                user_email: Some("owner@example.com".to_string()),
                notification_type: Some("completed".to_string()),
            })
            .await
            .unwrap();
    }

    #[test]
    fn due_date_formatting() {
        assert_eq!(
            format_due_date(Some("2026-09-15T00:00:00Z"), "No due date"),
            "09/15/2026"
        );
        assert_eq!(format_due_date(Some("next week"), "No due date"), "next week");
        assert_eq!(format_due_date(None, "No due date"), "No due date");
    }
}
