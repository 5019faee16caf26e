//! HTTP handlers for the notifications API.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use std::sync::Arc;
use utoipa::OpenApi;

use crate::dispatch::DispatchService;
use crate::error::{ErrorResponse, NotificationResult};
use crate::history::HistoryService;
use crate::models::{
    DispatchResponse, HistoryQuery, HistoryResponse, NotificationRecord, Pagination,
    ProviderInfoResponse, SendEmailRequest, StatusResponse, TaskEventRequest, TaskReminderRequest,
    TestEmailRequest,
};
use crate::resolver::IdentityResolver;
use crate::store::NotificationStore;

/// Shared state for the notifications router.
pub struct ApiState<S, R>
where
    S: NotificationStore,
    R: IdentityResolver,
{
    pub dispatch: Arc<DispatchService<S, R>>,
    pub history: Arc<HistoryService<S>>,
}

impl<S, R> Clone for ApiState<S, R>
where
    S: NotificationStore,
    R: IdentityResolver,
{
    fn clone(&self) -> Self {
        Self {
            dispatch: Arc::clone(&self.dispatch),
            history: Arc::clone(&self.history),
        }
    }
}

/// OpenAPI documentation for the Notifications API
#[derive(OpenApi)]
#[openapi(
    paths(
        send_email,
        send_task_reminder,
        send_task_event,
        send_test_email,
        get_history,
        get_status,
        get_provider,
    ),
    components(
        schemas(
            SendEmailRequest,
            TaskReminderRequest,
            TaskEventRequest,
            TestEmailRequest,
            DispatchResponse,
            HistoryResponse,
            StatusResponse,
            ProviderInfoResponse,
            NotificationRecord,
            Pagination,
            ErrorResponse,
        )
    ),
    tags(
        (name = "notifications", description = "Email dispatch and delivery tracking")
    )
)]
pub struct NotificationsApiDoc;

/// Send a direct email
#[utoipa::path(
    post,
    path = "/email",
    tag = "notifications",
    request_body = SendEmailRequest,
    responses(
        (status = 200, description = "Email sent and recorded", body = DispatchResponse),
        (status = 400, description = "Missing required fields", body = ErrorResponse),
        (status = 500, description = "Transport or store failure", body = ErrorResponse)
    )
)]
pub async fn send_email<S: NotificationStore, R: IdentityResolver>(
    State(state): State<ApiState<S, R>>,
    Json(input): Json<SendEmailRequest>,
) -> NotificationResult<Json<DispatchResponse>> {
    let receipt = state.dispatch.send_direct(input).await?;
    Ok(Json(DispatchResponse {
        message: "Email sent successfully".to_string(),
        notification_id: Some(receipt.notification_id),
        message_id: receipt.message_id,
        provider: Some(receipt.provider.to_string()),
    }))
}

/// Send a task due-date reminder
#[utoipa::path(
    post,
    path = "/task-reminder",
    tag = "notifications",
    request_body = TaskReminderRequest,
    responses(
        (status = 200, description = "Reminder sent and recorded", body = DispatchResponse),
        (status = 400, description = "Missing fields or unresolvable owner", body = ErrorResponse),
        (status = 500, description = "Transport or store failure", body = ErrorResponse)
    )
)]
pub async fn send_task_reminder<S: NotificationStore, R: IdentityResolver>(
    State(state): State<ApiState<S, R>>,
    Json(input): Json<TaskReminderRequest>,
) -> NotificationResult<Json<DispatchResponse>> {
    let receipt = state.dispatch.send_task_reminder(input).await?;
    Ok(Json(DispatchResponse {
        message: "Task reminder sent successfully".to_string(),
        notification_id: Some(receipt.notification_id),
        message_id: None,
        provider: None,
    }))
}

/// Send a task lifecycle notification
#[utoipa::path(
    post,
    path = "/task-event",
    tag = "notifications",
    request_body = TaskEventRequest,
    responses(
        (status = 200, description = "Event notification sent and recorded", body = DispatchResponse),
        (status = 400, description = "Missing title, unknown event type, or no recipient", body = ErrorResponse),
        (status = 500, description = "Transport or store failure", body = ErrorResponse)
    )
)]
pub async fn send_task_event<S: NotificationStore, R: IdentityResolver>(
    State(state): State<ApiState<S, R>>,
    Json(input): Json<TaskEventRequest>,
) -> NotificationResult<Json<DispatchResponse>> {
    // Dispatch rejects an absent or unknown type, so the success message
    // only ever sees a valid one.
    let event_type = input.notification_type.clone().unwrap_or_default();
    let receipt = state.dispatch.send_task_event(input).await?;
    Ok(Json(DispatchResponse {
        message: format!("Task {} notification sent successfully", event_type),
        notification_id: Some(receipt.notification_id),
        message_id: receipt.message_id,
        provider: Some(receipt.provider.to_string()),
    }))
}

/// Send a test email to verify transport configuration
#[utoipa::path(
    post,
    path = "/test-email",
    tag = "notifications",
    request_body = TestEmailRequest,
    responses(
        (status = 200, description = "Test email sent", body = DispatchResponse),
        (status = 400, description = "Email address required", body = ErrorResponse),
        (status = 500, description = "Transport or store failure", body = ErrorResponse)
    )
)]
pub async fn send_test_email<S: NotificationStore, R: IdentityResolver>(
    State(state): State<ApiState<S, R>>,
    Json(input): Json<TestEmailRequest>,
) -> NotificationResult<Json<DispatchResponse>> {
    let receipt = state.dispatch.send_test_email(input).await?;
    Ok(Json(DispatchResponse {
        message: "Test email sent successfully".to_string(),
        notification_id: Some(receipt.notification_id),
        message_id: receipt.message_id,
        provider: Some(receipt.provider.to_string()),
    }))
}

/// Get a user's notification history, newest first
#[utoipa::path(
    get,
    path = "/history/{user_id}",
    tag = "notifications",
    params(
        ("user_id" = String, Path, description = "Owner user id"),
        HistoryQuery
    ),
    responses(
        (status = 200, description = "One page of history", body = HistoryResponse),
        (status = 500, description = "Store failure", body = ErrorResponse)
    )
)]
pub async fn get_history<S: NotificationStore, R: IdentityResolver>(
    State(state): State<ApiState<S, R>>,
    Path(user_id): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> NotificationResult<Json<HistoryResponse>> {
    let page = state
        .history
        .list(Some(&user_id), query.page, query.limit)
        .await?;
    Ok(Json(page))
}

/// Get the status of a single notification
#[utoipa::path(
    get,
    path = "/status/{notification_id}",
    tag = "notifications",
    params(
        ("notification_id" = String, Path, description = "Notification id")
    ),
    responses(
        (status = 200, description = "Notification found", body = StatusResponse),
        (status = 404, description = "Notification not found or expired", body = ErrorResponse)
    )
)]
pub async fn get_status<S: NotificationStore, R: IdentityResolver>(
    State(state): State<ApiState<S, R>>,
    Path(notification_id): Path<String>,
) -> NotificationResult<Json<StatusResponse>> {
    let status = state.history.status(&notification_id).await?;
    Ok(Json(status))
}

/// Get the active email provider and its configuration state
#[utoipa::path(
    get,
    path = "/provider",
    tag = "notifications",
    responses(
        (status = 200, description = "Active provider info", body = ProviderInfoResponse)
    )
)]
pub async fn get_provider<S: NotificationStore, R: IdentityResolver>(
    State(state): State<ApiState<S, R>>,
) -> Json<ProviderInfoResponse> {
    Json(state.dispatch.provider_info())
}

/// Create the notifications router.
pub fn router<S, R>(state: ApiState<S, R>) -> Router
where
    S: NotificationStore + 'static,
    R: IdentityResolver + 'static,
{
    Router::new()
        .route("/email", post(send_email))
        .route("/task-reminder", post(send_task_reminder))
        .route("/task-event", post(send_task_event))
        .route("/test-email", post(send_test_email))
        .route("/history/{user_id}", get(get_history))
        .route("/status/{notification_id}", get(get_status))
        .route("/provider", get(get_provider))
        .with_state(state)
}
