use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use redis::aio::ConnectionManager;
use serde::Serialize;
use serde_json::json;
use tower_http::compression::CompressionLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;
use utoipa::OpenApi;

use crate::config::AppInfo;
use domain_notifications::NotificationsApiDoc;

/// Top-level OpenAPI documentation for the notifier service.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Notifier API",
        version = "0.1.0",
        description = "Email dispatch and delivery tracking for the task management system"
    ),
    servers(
        (url = "/api", description = "API base path")
    ),
    nest(
        (path = "/notifications", api = NotificationsApiDoc)
    )
)]
pub struct ApiDoc;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub name: &'static str,
    pub version: &'static str,
}

/// Liveness check: returns 200 whenever the process is up.
async fn health_handler(State(app): State<AppInfo>) -> Response {
    let response = HealthResponse {
        status: "healthy",
        name: app.name,
        version: app.version,
    };

    (StatusCode::OK, Json(response)).into_response()
}

/// Creates a router with the /health endpoint.
pub fn health_router(app_info: AppInfo) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .with_state(app_info)
}

/// Readiness check: verifies the Redis connection with a PING.
async fn ready_handler(State(redis): State<ConnectionManager>) -> Response {
    let mut conn = redis.clone();
    match redis::cmd("PING").query_async::<String>(&mut conn).await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({ "status": "ready", "redis": "connected" })),
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Readiness check failed: redis error: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "not ready", "redis": "disconnected" })),
            )
                .into_response()
        }
    }
}

/// Creates a router with the /ready endpoint.
pub fn ready_router(redis: ConnectionManager) -> Router {
    Router::new()
        .route("/ready", get(ready_handler))
        .with_state(redis)
}

/// 404 fallback for unmatched routes.
async fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": "NOT_FOUND", "message": "Resource not found" })),
    )
        .into_response()
}

/// Creates the application router with common middleware and docs.
///
/// API routes land under `/api`; Swagger UI is served at `/swagger-ui`
/// with the OpenAPI document at `/api-docs/openapi.json`.
pub fn create_router<T>(apis: Router) -> Router
where
    T: OpenApi + 'static,
{
    use utoipa_swagger_ui::SwaggerUi;

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", T::openapi()))
        .nest("/api", apis)
        .fallback(not_found)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(CompressionLayer::new())
}
