//! SendGrid transport implementation (bulk relay HTTP API).

use super::{EmailMessage, EmailProvider, SentEmail};
use crate::error::{NotificationError, NotificationResult};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

/// SendGrid API configuration.
#[derive(Debug, Clone)]
pub struct SendGridConfig {
    /// SendGrid API key.
    pub api_key: String,
    /// Sender address used for all outbound mail.
    pub from_email: String,
    /// Sender display name.
    pub from_name: String,
    /// API base URL (defaults to production).
    pub api_url: String,
}

impl SendGridConfig {
    pub fn new(api_key: String, from_email: String, from_name: String) -> Self {
        Self {
            api_key,
            from_email,
            from_name,
            api_url: "https://api.sendgrid.com/v3".to_string(),
        }
    }

    /// Read configuration from `SENDGRID_*` environment variables.
    /// The API key and sender address are required.
    pub fn from_env() -> NotificationResult<Self> {
        let api_key = std::env::var("SENDGRID_API_KEY").map_err(|_| {
            NotificationError::ProviderConfig("SENDGRID_API_KEY not set".to_string())
        })?;
        let from_email = std::env::var("SENDGRID_FROM_EMAIL")
            .or_else(|_| std::env::var("FROM_EMAIL"))
            .map_err(|_| {
                NotificationError::ProviderConfig("SENDGRID_FROM_EMAIL not set".to_string())
            })?;
        let from_name =
            std::env::var("FROM_NAME").unwrap_or_else(|_| "Task Manager".to_string());

        Ok(Self::new(api_key, from_email, from_name))
    }
}

/// SendGrid email transport.
pub struct SendGridProvider {
    config: SendGridConfig,
    client: Client,
}

impl SendGridProvider {
    pub fn new(config: SendGridConfig) -> Self {
        Self {
            config,
            client: Client::new(),
        }
    }

    /// Create a provider from `SENDGRID_*` environment variables.
    pub fn from_env() -> NotificationResult<Self> {
        let config = SendGridConfig::from_env()?;
        Ok(Self::new(config))
    }
}

// SendGrid API request/response structures

#[derive(Debug, Serialize)]
struct SendGridRequest {
    personalizations: Vec<Personalization>,
    from: EmailAddress,
    subject: String,
    content: Vec<Content>,
}

#[derive(Debug, Serialize)]
struct Personalization {
    to: Vec<EmailAddress>,
}

#[derive(Debug, Serialize)]
struct EmailAddress {
    email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

#[derive(Debug, Serialize)]
struct Content {
    #[serde(rename = "type")]
    content_type: &'static str,
    value: String,
}

#[derive(Debug, Deserialize)]
struct SendGridError {
    errors: Vec<SendGridErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct SendGridErrorDetail {
    message: String,
}

#[async_trait]
impl EmailProvider for SendGridProvider {
    async fn send(&self, message: &EmailMessage) -> NotificationResult<SentEmail> {
        // SendGrid requires text/plain before text/html.
        let mut content = Vec::new();
        if let Some(text) = &message.text {
            content.push(Content {
                content_type: "text/plain",
                value: text.clone(),
            });
        }
        if let Some(html) = &message.html {
            content.push(Content {
                content_type: "text/html",
                value: html.clone(),
            });
        }
        if content.is_empty() {
            return Err(NotificationError::Validation(
                "Message body requires text or html content".to_string(),
            ));
        }

        let request = SendGridRequest {
            personalizations: vec![Personalization {
                to: vec![EmailAddress {
                    email: message.to.clone(),
                    name: None,
                }],
            }],
            from: EmailAddress {
                email: self.config.from_email.clone(),
                name: Some(self.config.from_name.clone()),
            },
            subject: message.subject.clone(),
            content,
        };

        debug!(
            to = %message.to,
            subject = %message.subject,
            "Sending email via SendGrid"
        );

        let response = self
            .client
            .post(format!("{}/mail/send", self.config.api_url))
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let message_id = response
            .headers()
            .get("x-message-id")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        if status.is_success() {
            info!(
                to = %message.to,
                message_id = ?message_id,
                "Email sent via SendGrid"
            );
            return Ok(SentEmail { message_id });
        }

        let error_body = response.text().await.unwrap_or_default();
        error!(
            to = %message.to,
            status = %status,
            error = %error_body,
            "Failed to send email via SendGrid"
        );

        let error_message =
            if let Ok(sg_error) = serde_json::from_str::<SendGridError>(&error_body) {
                sg_error
                    .errors
                    .into_iter()
                    .map(|e| e.message)
                    .collect::<Vec<_>>()
                    .join(", ")
            } else {
                error_body
            };

        // 401/403 point at the API key, everything else is the transport.
        if status == reqwest::StatusCode::UNAUTHORIZED
            || status == reqwest::StatusCode::FORBIDDEN
        {
            Err(NotificationError::ProviderConfig(format!(
                "SendGrid rejected credentials ({}): {}",
                status, error_message
            )))
        } else {
            Err(NotificationError::Provider(format!(
                "SendGrid error ({}): {}",
                status, error_message
            )))
        }
    }

    fn name(&self) -> &'static str {
        "sendgrid"
    }

    fn configured(&self) -> bool {
        self.config.api_key.starts_with("SG.") && !self.config.from_email.is_empty()
    }
}
