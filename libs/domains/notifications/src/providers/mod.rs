//! Email transport implementations.
//!
//! This module contains the `EmailProvider` trait and the two
//! interchangeable transports: SendGrid (bulk relay HTTP API) and SMTP
//! (direct mail submission). The active transport is chosen once at
//! startup; callers never branch on which one is live.

mod sendgrid;
mod smtp;

pub use sendgrid::{SendGridConfig, SendGridProvider};
pub use smtp::{SmtpConfig, SmtpProvider};

use crate::error::NotificationResult;
use async_trait::async_trait;

/// A message handed to a transport. Exactly one of `text`/`html` must be
/// present; both is a multipart send. The dispatch layer validates this
/// before any provider is invoked.
#[derive(Debug, Clone, Default)]
pub struct EmailMessage {
    /// Single recipient address.
    pub to: String,
    pub subject: String,
    pub text: Option<String>,
    pub html: Option<String>,
}

/// Result of a successful transport send.
#[derive(Debug, Clone)]
pub struct SentEmail {
    /// Provider-assigned message id, when the provider reports one.
    pub message_id: Option<String>,
}

/// Trait for email sending transports.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmailProvider: Send + Sync {
    /// Deliver a message, returning the provider message id on success.
    async fn send(&self, message: &EmailMessage) -> NotificationResult<SentEmail>;

    /// Transport name reported to callers and logs.
    fn name(&self) -> &'static str;

    /// Whether the transport's configuration looks complete.
    fn configured(&self) -> bool;
}
