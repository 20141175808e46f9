//! Mail dispatch — hands a rendered message to the configured transport.

use std::sync::Arc;

use tracing::{error, info};

use crate::config::MailIdentity;
use crate::error::TransportError;
use crate::mail::{DeliveryReceipt, MailTransport, OutboundEmail};
use crate::pipeline::render::RenderedMessage;

/// Sends rendered messages from the fixed sender to the fixed recipient.
#[derive(Clone)]
pub struct MailDispatcher {
    transport: Arc<dyn MailTransport>,
    identity: MailIdentity,
}

impl MailDispatcher {
    pub fn new(transport: Arc<dyn MailTransport>, identity: MailIdentity) -> Self {
        Self {
            transport,
            identity,
        }
    }

    /// Make exactly one delivery attempt and wait for its outcome.
    pub async fn dispatch(&self, message: &RenderedMessage) -> Result<DeliveryReceipt, TransportError> {
        let email = OutboundEmail {
            from: self.identity.from.clone(),
            to: self.identity.to.clone(),
            subject: message.subject.clone(),
            body: message.body.clone(),
            format: message.format,
        };

        match self.transport.send(email).await {
            Ok(receipt) => {
                info!(
                    transport = self.transport.name(),
                    message_id = %receipt.message_id,
                    to = %self.identity.to,
                    "Order notification accepted for delivery"
                );
                Ok(receipt)
            }
            Err(e) => {
                error!(
                    transport = self.transport.name(),
                    error = %e,
                    "Order notification was not accepted"
                );
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::mail::BodyFormat;

    /// Records every email it is asked to send and accepts it.
    #[derive(Default)]
    struct RecordingTransport {
        sent: Mutex<Vec<OutboundEmail>>,
    }

    #[async_trait]
    impl MailTransport for RecordingTransport {
        fn name(&self) -> &str {
            "recording"
        }

        async fn send(&self, email: OutboundEmail) -> Result<DeliveryReceipt, TransportError> {
            self.sent.lock().unwrap().push(email);
            Ok(DeliveryReceipt {
                message_id: "<1@shop.com>".into(),
                transport: "recording".into(),
                response: "250 OK".into(),
            })
        }
    }

    /// Counts attempts and always refuses.
    #[derive(Default)]
    struct RefusingTransport {
        attempts: Mutex<usize>,
    }

    #[async_trait]
    impl MailTransport for RefusingTransport {
        fn name(&self) -> &str {
            "refusing"
        }

        async fn send(&self, _email: OutboundEmail) -> Result<DeliveryReceipt, TransportError> {
            *self.attempts.lock().unwrap() += 1;
            Err(TransportError::Unreachable {
                transport: "refusing".into(),
                reason: "connection refused".into(),
            })
        }
    }

    fn identity() -> MailIdentity {
        MailIdentity::new(
            "\"Website Order\" <shop-notifications@shop.com>",
            "shop-notifications@example.com",
        )
        .unwrap()
    }

    fn message() -> RenderedMessage {
        RenderedMessage {
            subject: "New website order ✔ (Ada - ada@example.com)".into(),
            body: "<p>hi</p>".into(),
            format: BodyFormat::Html,
        }
    }

    #[tokio::test]
    async fn dispatch_addresses_message_from_identity() {
        let transport = Arc::new(RecordingTransport::default());
        let dispatcher = MailDispatcher::new(transport.clone(), identity());

        let receipt = dispatcher.dispatch(&message()).await.unwrap();
        assert_eq!(receipt.message_id, "<1@shop.com>");

        let sent = transport.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].from, identity().from);
        assert_eq!(sent[0].to, identity().to);
        assert_eq!(sent[0].subject, message().subject);
        assert_eq!(sent[0].body, "<p>hi</p>");
        assert_eq!(sent[0].format, BodyFormat::Html);
    }

    #[tokio::test]
    async fn dispatch_failure_is_not_retried() {
        let transport = Arc::new(RefusingTransport::default());
        let dispatcher = MailDispatcher::new(transport.clone(), identity());

        let err = dispatcher.dispatch(&message()).await.unwrap_err();
        assert!(matches!(err, TransportError::Unreachable { .. }));
        assert_eq!(*transport.attempts.lock().unwrap(), 1);
    }
}
