//! Order notification pipeline.
//!
//! Every inbound order event flows through:
//! 1. `ingest()` — extract the payload, optionally require key fields
//! 2. `render()` — build the email subject and body
//! 3. `MailDispatcher::dispatch()` — one delivery attempt via the transport
//! 4. `acknowledge()` — build the outbound "email sent" event
//!
//! `NotificationPipeline` runs the stages in order and stops at the first
//! error.

pub mod acknowledge;
pub mod dispatch;
pub mod ingest;
pub mod processor;
pub mod render;

pub use acknowledge::{ACK_SOURCE, ACK_TYPE, acknowledge};
pub use dispatch::MailDispatcher;
pub use ingest::ingest;
pub use processor::NotificationPipeline;
pub use render::{RenderedMessage, render};
