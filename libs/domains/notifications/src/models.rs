//! Data models for the notifications domain.

use chrono::{DateTime, Utc};
use rand::distr::{Alphanumeric, SampleString};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;
use utoipa::{IntoParams, ToSchema};

/// Retention for direct and test emails.
pub const DIRECT_EMAIL_TTL: Duration = Duration::from_secs(86_400);

/// Retention for task-derived notifications (reminders and lifecycle events).
pub const TASK_NOTIFICATION_TTL: Duration = Duration::from_secs(604_800);

// ============================================================================
// Notification Records
// ============================================================================

/// Kinds of notifications this service dispatches.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum NotificationKind {
    /// Direct email (including test emails).
    Email,
    /// Due-date reminder for a task owner.
    TaskReminder,
    /// Task lifecycle: a task was created.
    TaskCreated,
    /// Task lifecycle: a task was updated.
    TaskUpdated,
    /// Task lifecycle: a task was completed.
    TaskCompleted,
}

impl NotificationKind {
    /// Prefix used when minting record ids (`email_...`, `task_created_...`).
    pub fn id_prefix(&self) -> &'static str {
        match self {
            NotificationKind::Email => "email",
            NotificationKind::TaskReminder => "task_reminder",
            NotificationKind::TaskCreated => "task_created",
            NotificationKind::TaskUpdated => "task_updated",
            NotificationKind::TaskCompleted => "task_completed",
        }
    }

    /// Retention class: direct emails are short-lived, task-derived
    /// notifications stay around for a week.
    pub fn retention(&self) -> Duration {
        match self {
            NotificationKind::Email => DIRECT_EMAIL_TTL,
            _ => TASK_NOTIFICATION_TTL,
        }
    }
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotificationKind::Email => write!(f, "email"),
            NotificationKind::TaskReminder => write!(f, "task-reminder"),
            NotificationKind::TaskCreated => write!(f, "task-created"),
            NotificationKind::TaskUpdated => write!(f, "task-updated"),
            NotificationKind::TaskCompleted => write!(f, "task-completed"),
        }
    }
}

/// Outcome of a dispatch attempt. Records are write-once: a retry mints
/// a fresh record instead of transitioning an existing one.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum NotificationStatus {
    Sent,
    Failed,
}

/// A persisted dispatch outcome.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRecord {
    /// Globally unique id, minted once at dispatch time, never reused.
    pub id: String,
    /// Kind of notification.
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    /// Resolved recipient address (never a raw user id).
    pub to: String,
    /// Subject line, always populated.
    pub subject: String,
    /// Dispatch outcome. No interim states.
    pub status: NotificationStatus,
    /// Provider-assigned message id, absent on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    /// Back-reference to the originating task, for task-derived kinds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    /// Originating user id, used to scope history queries. Absent for
    /// system-originated sends.
    pub user_id: Option<String>,
    /// Creation time. Immutable; drives sort order and expiry.
    pub timestamp: DateTime<Utc>,
}

// Millisecond clock for id minting. Clamping to last+1 keeps timestamps
// strictly increasing even when two dispatches land in the same
// millisecond, which the history sort contract depends on.
static LAST_MINT_MILLIS: AtomicI64 = AtomicI64::new(0);

/// Mint a fresh notification id and its creation timestamp.
///
/// Ids have the shape `{prefix}_{unix_millis}_{9 random alphanumerics}`
/// and the millisecond component is strictly monotonic per process.
pub fn mint_id(kind: NotificationKind) -> (String, DateTime<Utc>) {
    let now = Utc::now().timestamp_millis();
    let minted = LAST_MINT_MILLIS
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
            Some((last + 1).max(now))
        })
        .map(|last| (last + 1).max(now))
        .unwrap_or(now);

    let suffix = Alphanumeric.sample_string(&mut rand::rng(), 9);

    let created_at = DateTime::from_timestamp_millis(minted).unwrap_or_else(Utc::now);
    (
        format!("{}_{}_{}", kind.id_prefix(), minted, suffix),
        created_at,
    )
}

// ============================================================================
// Task Event Presentation
// ============================================================================

/// Lifecycle events the task service reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskEventKind {
    Created,
    Updated,
    Completed,
}

impl TaskEventKind {
    /// Parse the `notificationType` request field. Unknown values are a
    /// caller error, not a silent default.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "created" => Some(TaskEventKind::Created),
            "updated" => Some(TaskEventKind::Updated),
            "completed" => Some(TaskEventKind::Completed),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TaskEventKind::Created => "created",
            TaskEventKind::Updated => "updated",
            TaskEventKind::Completed => "completed",
        }
    }

    pub fn kind(&self) -> NotificationKind {
        match self {
            TaskEventKind::Created => NotificationKind::TaskCreated,
            TaskEventKind::Updated => NotificationKind::TaskUpdated,
            TaskEventKind::Completed => NotificationKind::TaskCompleted,
        }
    }
}

/// Presentation tier for task priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskPriority {
    High,
    Medium,
    Low,
}

impl TaskPriority {
    /// Absent or unrecognized priorities fall back to `Medium`.
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some("high") => TaskPriority::High,
            Some("low") => TaskPriority::Low,
            _ => TaskPriority::Medium,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TaskPriority::High => "high",
            TaskPriority::Medium => "medium",
            TaskPriority::Low => "low",
        }
    }

    /// Accent color used in HTML bodies.
    pub fn color(&self) -> &'static str {
        match self {
            TaskPriority::High => "#ef4444",
            TaskPriority::Medium => "#f59e0b",
            TaskPriority::Low => "#10b981",
        }
    }
}

// ============================================================================
// Request / Response DTOs
// ============================================================================

/// Request body for `POST /notifications/email`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SendEmailRequest {
    /// Recipient address, or a bare user id to be resolved.
    pub to: Option<String>,
    pub subject: Option<String>,
    pub text: Option<String>,
    pub html: Option<String>,
    /// Originating user id; also used to resolve `to` when it is not an
    /// address.
    pub user_id: Option<String>,
}

/// Request body for `POST /notifications/task-reminder`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TaskReminderRequest {
    pub user_id: Option<String>,
    pub task_id: Option<String>,
    pub task_title: Option<String>,
    pub due_date: Option<String>,
}

/// Request body for `POST /notifications/task-event`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TaskEventRequest {
    pub task_id: Option<String>,
    pub task_title: Option<String>,
    pub task_description: Option<String>,
    pub task_priority: Option<String>,
    pub task_due_date: Option<String>,
    /// Target mailbox; falls back to the configured owner address.
    pub user_email: Option<String>,
    /// One of `created`, `updated`, `completed`.
    pub notification_type: Option<String>,
}

/// Request body for `POST /notifications/test-email`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct TestEmailRequest {
    pub to: Option<String>,
}

/// Common success body for the dispatch endpoints.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DispatchResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
}

/// Query parameters for the history endpoint.
#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct HistoryQuery {
    /// 1-based page number, defaults to 1.
    pub page: Option<usize>,
    /// Page size, defaults to 10.
    pub limit: Option<usize>,
}

/// Pagination metadata returned alongside a history page.
#[derive(Debug, Clone, Serialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub total: usize,
    pub page: usize,
    pub limit: usize,
    pub total_pages: usize,
}

/// One page of notification history.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct HistoryResponse {
    pub notifications: Vec<NotificationRecord>,
    pub pagination: Pagination,
}

/// Response body for the status endpoint.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StatusResponse {
    pub notification: NotificationRecord,
}

/// Response body for `GET /notifications/provider`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProviderInfoResponse {
    /// Name of the active transport.
    pub provider: String,
    /// Whether its configuration looks complete.
    pub configured: bool,
}

/// Internal receipt returned by dispatch operations.
#[derive(Debug, Clone)]
pub struct DispatchReceipt {
    pub notification_id: String,
    pub message_id: Option<String>,
    pub provider: &'static str,
}
