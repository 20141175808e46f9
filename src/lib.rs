//! Order notifier — emails a summary of each completed order event and
//! answers with an "email sent" event.

pub mod config;
pub mod error;
pub mod event;
pub mod mail;
pub mod order;
pub mod pipeline;
pub mod server;
