//! Acknowledgement — the outbound event reporting a sent notification.
//!
//! The outbound envelope is described by [`ACK_FIELD_RULES`]: each attribute
//! is either copied from the inbound event, fixed to this notifier's
//! identity, or freshly generated. Extension attributes are not carried.

use chrono::{SecondsFormat, Utc};
use tracing::{debug, trace};
use uuid::Uuid;

use crate::event::{CloudEvent, EnvelopeField, SPEC_VERSION};
use crate::mail::DeliveryReceipt;

/// Producer identity of acknowledgement events.
pub const ACK_SOURCE: &str = "com.shop.products.order.notifications.email.sender";

/// Type of acknowledgement events.
pub const ACK_TYPE: &str = "com.shop.products.order.notifications.email.sent";

/// How one outbound attribute is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRule {
    /// Copied verbatim from the inbound event; absent stays absent.
    PassThrough,
    /// Always this value.
    Fixed(&'static str),
    /// A new value per acknowledgement.
    Generated,
}

pub const ACK_FIELD_RULES: [(EnvelopeField, FieldRule); 10] = [
    (EnvelopeField::SpecVersion, FieldRule::Fixed(SPEC_VERSION)),
    (EnvelopeField::Id, FieldRule::Generated),
    (EnvelopeField::Source, FieldRule::Fixed(ACK_SOURCE)),
    (EnvelopeField::Type, FieldRule::Fixed(ACK_TYPE)),
    (EnvelopeField::Time, FieldRule::Generated),
    (EnvelopeField::Subject, FieldRule::PassThrough),
    (EnvelopeField::DataSchema, FieldRule::PassThrough),
    (EnvelopeField::DataContentType, FieldRule::PassThrough),
    (EnvelopeField::Data, FieldRule::PassThrough),
    (EnvelopeField::DataBase64, FieldRule::PassThrough),
];

/// Build the acknowledgement for `inbound` once `receipt` confirms the
/// notification was accepted.
pub fn acknowledge(inbound: &CloudEvent, receipt: &DeliveryReceipt) -> CloudEvent {
    let mut ack = CloudEvent::new("", "", "");

    for (field, rule) in ACK_FIELD_RULES {
        trace!(field = field.name(), ?rule, "Applying acknowledgement field rule");
        match rule {
            FieldRule::PassThrough => field.copy(inbound, &mut ack),
            FieldRule::Fixed(value) => field.set_text(&mut ack, value.to_string()),
            FieldRule::Generated => field.set_text(&mut ack, generate(field)),
        }
    }

    debug!(
        inbound_id = %inbound.id,
        ack_id = %ack.id,
        message_id = %receipt.message_id,
        "Built acknowledgement event"
    );
    ack
}

fn generate(field: EnvelopeField) -> String {
    match field {
        EnvelopeField::Time => Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        _ => Uuid::new_v4().to_string(),
    }
}
