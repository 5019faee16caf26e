//! SMTP transport implementation using lettre.
//!
//! Used both for production SMTP relays (TLS + credentials) and for
//! local development against Mailpit-style catch-all servers.

use super::{EmailMessage, EmailProvider, SentEmail};
use crate::error::{NotificationError, NotificationResult};
use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, MultiPart, header::ContentType},
    transport::smtp::authentication::Credentials,
};
use std::sync::Arc;
use tracing::{debug, error, info};

/// SMTP configuration.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    /// SMTP server host.
    pub host: String,
    /// SMTP server port.
    pub port: u16,
    /// Sender address used for all outbound mail.
    pub from_email: String,
    /// Sender display name.
    pub from_name: String,
    /// SMTP username (optional for dev servers).
    pub username: Option<String>,
    /// SMTP password (optional for dev servers).
    pub password: Option<String>,
    /// Whether to use a TLS relay (false for local dev servers).
    pub use_tls: bool,
}

impl SmtpConfig {
    pub fn new(host: String, port: u16, from_email: String, from_name: String) -> Self {
        Self {
            host,
            port,
            from_email,
            from_name,
            username: None,
            password: None,
            use_tls: false,
        }
    }

    /// Read configuration from `SMTP_*` environment variables.
    pub fn from_env() -> Self {
        let username = std::env::var("SMTP_USER").ok();
        let from_email = std::env::var("FROM_EMAIL")
            .ok()
            .or_else(|| username.clone())
            .unwrap_or_else(|| "noreply@taskmanager.local".to_string());

        Self {
            host: std::env::var("SMTP_HOST").unwrap_or_else(|_| "localhost".to_string()),
            port: std::env::var("SMTP_PORT")
                .unwrap_or_else(|_| "587".to_string())
                .parse()
                .unwrap_or(587),
            from_email,
            from_name: std::env::var("FROM_NAME")
                .unwrap_or_else(|_| "Task Manager".to_string()),
            username,
            password: std::env::var("SMTP_PASS").ok(),
            use_tls: std::env::var("SMTP_USE_TLS")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
        }
    }

    /// Builder method to set TLS.
    pub fn with_tls(mut self, use_tls: bool) -> Self {
        self.use_tls = use_tls;
        self
    }

    /// Builder method to set credentials.
    pub fn with_credentials(mut self, username: String, password: String) -> Self {
        self.username = Some(username);
        self.password = Some(password);
        self
    }
}

/// SMTP email transport.
pub struct SmtpProvider {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    config: Arc<SmtpConfig>,
}

impl SmtpProvider {
    pub fn new(config: SmtpConfig) -> NotificationResult<Self> {
        let transport = Self::build_transport(&config)?;
        Ok(Self {
            transport,
            config: Arc::new(config),
        })
    }

    /// Create a provider from `SMTP_*` environment variables.
    pub fn from_env() -> NotificationResult<Self> {
        Self::new(SmtpConfig::from_env())
    }

    fn build_transport(
        config: &SmtpConfig,
    ) -> NotificationResult<AsyncSmtpTransport<Tokio1Executor>> {
        let transport = if config.use_tls {
            let mut builder = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
                .map_err(|e| {
                    NotificationError::ProviderConfig(format!(
                        "Failed to create SMTP relay: {}",
                        e
                    ))
                })?
                .port(config.port);

            if let (Some(username), Some(password)) = (&config.username, &config.password) {
                builder =
                    builder.credentials(Credentials::new(username.clone(), password.clone()));
            }

            builder.build()
        } else {
            let mut builder =
                AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
                    .port(config.port);

            if let (Some(username), Some(password)) = (&config.username, &config.password) {
                builder =
                    builder.credentials(Credentials::new(username.clone(), password.clone()));
            }

            builder.build()
        };

        Ok(transport)
    }

    /// Build a lettre Message. The body is a single part when only one
    /// of text/html is present, multipart/alternative when both are.
    fn build_message(&self, message: &EmailMessage) -> NotificationResult<Message> {
        let from: Mailbox = format!("{} <{}>", self.config.from_name, self.config.from_email)
            .parse()
            .map_err(|e| {
                NotificationError::ProviderConfig(format!("Invalid from address: {}", e))
            })?;

        let to: Mailbox = message.to.parse().map_err(|e| {
            NotificationError::Validation(format!("Invalid to address '{}': {}", message.to, e))
        })?;

        let builder = Message::builder()
            .from(from)
            .to(to)
            .subject(&message.subject);

        let built = match (&message.text, &message.html) {
            (Some(text), Some(html)) => builder.multipart(
                MultiPart::alternative_plain_html(text.clone(), html.clone()),
            ),
            (Some(text), None) => builder
                .header(ContentType::TEXT_PLAIN)
                .body(text.clone()),
            (None, Some(html)) => builder.header(ContentType::TEXT_HTML).body(html.clone()),
            (None, None) => {
                return Err(NotificationError::Validation(
                    "Message body requires text or html content".to_string(),
                ));
            }
        };

        built.map_err(|e| {
            NotificationError::Provider(format!("Failed to build email message: {}", e))
        })
    }
}

#[async_trait]
impl EmailProvider for SmtpProvider {
    async fn send(&self, message: &EmailMessage) -> NotificationResult<SentEmail> {
        debug!(
            to = %message.to,
            subject = %message.subject,
            host = %self.config.host,
            port = %self.config.port,
            "Sending email via SMTP"
        );

        let mail = self.build_message(message)?;

        let response = self.transport.send(mail).await.map_err(|e| {
            error!(to = %message.to, error = %e, "Failed to send email via SMTP");
            NotificationError::Provider(format!("SMTP send failed: {}", e))
        })?;

        let message_id = response.message().next().map(|s| s.to_string());

        info!(
            to = %message.to,
            message_id = ?message_id,
            "Email sent via SMTP"
        );

        Ok(SentEmail { message_id })
    }

    fn name(&self) -> &'static str {
        "smtp"
    }

    fn configured(&self) -> bool {
        !self.config.host.is_empty()
            && self.config.username.is_some()
            && self.config.password.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> SmtpConfig {
        SmtpConfig::new(
            "mail.example.com".to_string(),
            587,
            "noreply@example.com".to_string(),
            "Example".to_string(),
        )
    }

    #[test]
    fn test_smtp_config_new() {
        let config = test_config();
        assert_eq!(config.host, "mail.example.com");
        assert_eq!(config.port, 587);
        assert!(!config.use_tls);
        assert!(config.username.is_none());
    }

    #[test]
    fn test_smtp_config_with_credentials() {
        let config = test_config()
            .with_tls(true)
            .with_credentials("user".to_string(), "pass".to_string());

        assert!(config.use_tls);
        assert_eq!(config.username, Some("user".to_string()));
        assert_eq!(config.password, Some("pass".to_string()));
    }

    #[test]
    fn test_configured_requires_credentials() {
        let provider = SmtpProvider::new(test_config()).unwrap();
        assert!(!provider.configured());

        let provider = SmtpProvider::new(
            test_config().with_credentials("user".to_string(), "pass".to_string()),
        )
        .unwrap();
        assert!(provider.configured());
    }

    #[test]
    fn test_build_message_rejects_empty_body() {
        let provider = SmtpProvider::new(test_config()).unwrap();
        let message = EmailMessage {
            to: "a@x.com".to_string(),
            subject: "Hi".to_string(),
            text: None,
            html: None,
        };
        assert!(provider.build_message(&message).is_err());
    }

    #[test]
    fn test_build_message_text_only() {
        let provider = SmtpProvider::new(test_config()).unwrap();
        let message = EmailMessage {
            to: "a@x.com".to_string(),
            subject: "Hi".to_string(),
            text: Some("Hello".to_string()),
            html: None,
        };
        assert!(provider.build_message(&message).is_ok());
    }

    #[test]
    fn test_build_message_multipart() {
        let provider = SmtpProvider::new(test_config()).unwrap();
        let message = EmailMessage {
            to: "a@x.com".to_string(),
            subject: "Hi".to_string(),
            text: Some("Hello".to_string()),
            html: Some("<p>Hello</p>".to_string()),
        };
        assert!(provider.build_message(&message).is_ok());
    }
}
