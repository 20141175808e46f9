//! Notification pipeline — ingest → render → dispatch → acknowledge.
//!
//! Stages run strictly in order. The first failure ends the invocation and
//! no acknowledgement is produced.

use tracing::{info, warn};

use crate::config::PipelineConfig;
use crate::error::Error;
use crate::event::CloudEvent;
use crate::pipeline::acknowledge::acknowledge;
use crate::pipeline::dispatch::MailDispatcher;
use crate::pipeline::ingest::ingest;
use crate::pipeline::render::render;

/// Handles one order event per call. Holds no per-invocation state, so one
/// instance serves concurrent invocations.
#[derive(Clone)]
pub struct NotificationPipeline {
    config: PipelineConfig,
    dispatcher: MailDispatcher,
}

impl NotificationPipeline {
    pub fn new(config: PipelineConfig, dispatcher: MailDispatcher) -> Self {
        Self { config, dispatcher }
    }

    /// Process one inbound event and return its acknowledgement.
    #[tracing::instrument(skip_all, fields(event_id = %event.id, event_type = %event.event_type))]
    pub async fn handle(&self, event: &CloudEvent) -> Result<CloudEvent, Error> {
        info!(source = %event.source, "Order event received");

        let payload = ingest(event, self.config.require_fields).inspect_err(|e| {
            warn!(error = %e, "Order event failed validation");
        })?;

        let message = render(payload.as_deref(), self.config.render_template).inspect_err(|e| {
            warn!(error = %e, "Order event could not be rendered");
        })?;

        let receipt = self.dispatcher.dispatch(&message).await?;

        let ack = acknowledge(event, &receipt);
        info!(ack_id = %ack.id, message_id = %receipt.message_id, "Order notification sent");
        Ok(ack)
    }
}
