//! SMTP transport via lettre.
//!
//! The lettre transport is built once at start and shared by every
//! invocation. Sends are blocking, so they run on the blocking pool while
//! the invocation awaits the result.

use std::time::Duration;

use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::response::Response;
use lettre::{Message, SmtpTransport, Transport};
use secrecy::ExposeSecret;
use uuid::Uuid;

use super::{BodyFormat, DeliveryReceipt, MailTransport, OutboundEmail};
use crate::config::SmtpConfig;
use crate::error::{ConfigError, TransportError};

const TRANSPORT_NAME: &str = "smtp";

/// Mail transport backed by an SMTP relay.
pub struct SmtpMailTransport {
    transport: SmtpTransport,
    host: String,
    timeout: Duration,
}

impl SmtpMailTransport {
    /// Build the SMTP client. No connection is opened until the first send.
    pub fn new(config: &SmtpConfig) -> Result<Self, ConfigError> {
        let builder = if config.secure {
            SmtpTransport::relay(&config.host).map_err(|e| ConfigError::InvalidValue {
                key: "SMTP_HOST".into(),
                message: format!("cannot set up TLS for {}: {e}", config.host),
            })?
        } else {
            SmtpTransport::builder_dangerous(&config.host)
        };

        let mut builder = builder.port(config.port).timeout(Some(config.timeout));
        if let Some(creds) = &config.credentials {
            builder = builder.credentials(Credentials::new(
                creds.username.clone(),
                creds.password.expose_secret().to_string(),
            ));
        }

        tracing::info!(
            host = %config.host,
            port = config.port,
            secure = config.secure,
            authenticated = config.credentials.is_some(),
            "SMTP transport configured"
        );

        Ok(Self {
            transport: builder.build(),
            host: config.host.clone(),
            timeout: config.timeout,
        })
    }

    fn classify(&self, err: lettre::transport::smtp::Error) -> TransportError {
        if err.is_timeout() {
            TransportError::Timeout {
                transport: TRANSPORT_NAME.into(),
                timeout: self.timeout,
            }
        } else if err.is_permanent() || err.is_transient() {
            TransportError::Rejected {
                transport: TRANSPORT_NAME.into(),
                reason: err.to_string(),
            }
        } else {
            TransportError::Unreachable {
                transport: TRANSPORT_NAME.into(),
                reason: format!("{}: {err}", self.host),
            }
        }
    }
}

#[async_trait]
impl MailTransport for SmtpMailTransport {
    fn name(&self) -> &str {
        TRANSPORT_NAME
    }

    async fn send(&self, email: OutboundEmail) -> Result<DeliveryReceipt, TransportError> {
        let message_id = new_message_id(&email.from);
        let message = build_message(&email, &message_id)?;

        let transport = self.transport.clone();
        let response = tokio::task::spawn_blocking(move || transport.send(&message))
            .await
            .map_err(|e| TransportError::Aborted {
                transport: TRANSPORT_NAME.into(),
                reason: e.to_string(),
            })?
            .map_err(|e| self.classify(e))?;

        let response = describe_response(&response);
        tracing::info!(message_id = %message_id, response = %response, "SMTP accepted message");

        Ok(DeliveryReceipt {
            message_id,
            transport: TRANSPORT_NAME.into(),
            response,
        })
    }
}

/// `<uuid@sender-domain>`
fn new_message_id(from: &Mailbox) -> String {
    format!("<{}@{}>", Uuid::new_v4(), from.email.domain())
}

/// Build the MIME message for `email`.
pub fn build_message(email: &OutboundEmail, message_id: &str) -> Result<Message, TransportError> {
    let content_type = match email.format {
        BodyFormat::Html => ContentType::TEXT_HTML,
        BodyFormat::PlainText => ContentType::TEXT_PLAIN,
    };

    Message::builder()
        .message_id(Some(message_id.to_string()))
        .from(email.from.clone())
        .to(email.to.clone())
        .subject(email.subject.clone())
        .header(content_type)
        .body(email.body.clone())
        .map_err(|e| TransportError::InvalidMessage(e.to_string()))
}

fn describe_response(response: &Response) -> String {
    let lines: Vec<&str> = response.message().collect();
    format!("{} {}", response.code(), lines.join(" "))
}
