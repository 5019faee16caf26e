//! Notifications Domain
//!
//! Email dispatch and delivery tracking for the task-management
//! product.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────┐
//! │      Handlers      │  ← HTTP surface, OpenAPI docs
//! └──────┬──────┬──────┘
//!        │      │
//! ┌──────▼───┐ ┌▼─────────┐
//! │ Dispatch │ │ History  │  ← Orchestration / read-side queries
//! └─┬──┬──┬──┘ └┬─────────┘
//!   │  │  │     │
//!   │  │  └─────▼────┐
//!   │  │  │  Store   │  ← Expiring record persistence (trait + impls)
//!   │  │  └──────────┘
//!   │  └───────────┐
//!   │  │ Providers │  ← Email transports (trait + impls)
//!   │  └───────────┘
//!   └──────────┐
//!   │ Resolver │  ← User id → email lookup
//!   └──────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use domain_notifications::{
//!     ApiState, DispatchConfig, DispatchService, HistoryService, HttpIdentityResolver,
//!     InMemoryNotificationStore, SmtpConfig, SmtpProvider,
//! };
//! use std::sync::Arc;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let provider = SmtpProvider::new(SmtpConfig::from_env())?;
//! let store = Arc::new(InMemoryNotificationStore::new());
//! let resolver = Arc::new(HttpIdentityResolver::from_env()?);
//!
//! let dispatch = DispatchService::new(
//!     Arc::new(provider),
//!     Arc::clone(&store),
//!     resolver,
//!     DispatchConfig::from_env(),
//! )?;
//! let history = HistoryService::new(store);
//!
//! let router = domain_notifications::router(ApiState {
//!     dispatch: Arc::new(dispatch),
//!     history: Arc::new(history),
//! });
//! # Ok(())
//! # }
//! ```

pub mod dispatch;
pub mod error;
pub mod handlers;
pub mod history;
pub mod models;
pub mod providers;
pub mod resolver;
pub mod store;
pub mod templates;

// Re-export commonly used types
pub use dispatch::{DispatchConfig, DispatchService};
pub use error::{ErrorResponse, NotificationError, NotificationResult};
pub use handlers::{ApiState, NotificationsApiDoc, router};
pub use history::HistoryService;
pub use models::{
    DispatchReceipt, DispatchResponse, HistoryResponse, NotificationKind, NotificationRecord,
    NotificationStatus, Pagination, ProviderInfoResponse, SendEmailRequest, StatusResponse,
    TaskEventRequest, TaskReminderRequest, TestEmailRequest,
};
pub use providers::{EmailMessage, EmailProvider, SendGridConfig, SendGridProvider, SentEmail, SmtpConfig, SmtpProvider};
pub use resolver::{HttpIdentityResolver, IdentityResolver};
pub use store::{InMemoryNotificationStore, NotificationStore, RedisNotificationStore};
