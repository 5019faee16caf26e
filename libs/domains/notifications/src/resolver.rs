//! Recipient email resolution against the user service.

use crate::error::{NotificationError, NotificationResult};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

const DEFAULT_USER_SERVICE_URL: &str = "http://localhost:3001";
const RESOLUTION_TIMEOUT: Duration = Duration::from_secs(5);

/// Looks up the email address behind a user id.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    /// Returns the user's email, or `None` when the user is unknown or
    /// carries no email address.
    async fn resolve_email(&self, user_id: &str) -> NotificationResult<Option<String>>;
}

#[derive(Debug, Deserialize)]
struct UserEnvelope {
    user: UserDetails,
}

#[derive(Debug, Deserialize)]
struct UserDetails {
    email: Option<String>,
}

/// Resolver that queries the user service over HTTP.
#[derive(Clone)]
pub struct HttpIdentityResolver {
    client: reqwest::Client,
    base_url: String,
}

impl HttpIdentityResolver {
    pub fn new(base_url: impl Into<String>) -> NotificationResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(RESOLUTION_TIMEOUT)
            .build()
            .map_err(|e| {
                NotificationError::Internal(format!("Failed to build HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    pub fn from_env() -> NotificationResult<Self> {
        let base_url = std::env::var("USER_SERVICE_URL")
            .unwrap_or_else(|_| DEFAULT_USER_SERVICE_URL.to_string());
        Self::new(base_url)
    }
}

#[async_trait]
impl IdentityResolver for HttpIdentityResolver {
    async fn resolve_email(&self, user_id: &str) -> NotificationResult<Option<String>> {
        let url = format!("{}/api/users/{}", self.base_url, user_id);
        debug!(user_id = %user_id, url = %url, "Resolving user email");

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            debug!(
                user_id = %user_id,
                status = %response.status(),
                "User service returned non-success status"
            );
            return Ok(None);
        }

        let envelope: UserEnvelope = response.json().await?;
        Ok(envelope.user.email)
    }
}
