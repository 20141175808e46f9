//! Mail transport abstraction.

pub mod smtp;

pub use smtp::SmtpMailTransport;

use async_trait::async_trait;
use lettre::message::Mailbox;

use crate::error::TransportError;

/// Body encoding of an outbound email.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyFormat {
    Html,
    PlainText,
}

/// A fully addressed email ready for submission.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundEmail {
    pub from: Mailbox,
    pub to: Mailbox,
    pub subject: String,
    pub body: String,
    pub format: BodyFormat,
}

/// Confirmation that a transport accepted a message for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReceipt {
    /// Message-ID header of the submitted message.
    pub message_id: String,
    /// Name of the transport that accepted it.
    pub transport: String,
    /// Server reply, e.g. `250 OK: queued`.
    pub response: String,
}

/// Something that can submit an email for delivery.
///
/// Each `send` call is exactly one delivery attempt; implementations never
/// retry.
#[async_trait]
pub trait MailTransport: Send + Sync {
    /// Transport name (e.g., "smtp").
    fn name(&self) -> &str;

    /// Submit `email` and wait until the transport accepts or refuses it.
    async fn send(&self, email: OutboundEmail) -> Result<DeliveryReceipt, TransportError>;
}
