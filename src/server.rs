//! HTTP binding for the pipeline.
//!
//! Accepts CloudEvents in structured mode (`application/cloudevents+json`)
//! or binary mode (`ce-*` headers, body is the event data) and answers with
//! the acknowledgement in structured mode.

use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use base64::{Engine, engine::general_purpose::STANDARD};
use serde_json::Value;
use tracing::{info, warn};

use crate::error::Error;
use crate::event::{CloudEvent, STRUCTURED_CONTENT_TYPE, is_json_media_type};
use crate::pipeline::NotificationPipeline;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<NotificationPipeline>,
}

/// Build the router: `POST /` for events, `GET /health` for probes.
pub fn event_routes(pipeline: Arc<NotificationPipeline>) -> Router {
    Router::new()
        .route("/", post(receive_event))
        .route("/health", get(health))
        .with_state(AppState { pipeline })
}

/// The request could not be read as a CloudEvent.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("Invalid structured event: {0}")]
    Structured(#[source] serde_json::Error),

    #[error("Header {0} is not valid text")]
    Header(String),

    #[error("Invalid JSON event data: {0}")]
    JsonData(#[source] serde_json::Error),
}

// ── Health ──────────────────────────────────────────────────────────────

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "order-notifier"
    }))
}

// ── Events ──────────────────────────────────────────────────────────────

async fn receive_event(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let event = match decode_event(&headers, &body) {
        Ok(event) => event,
        Err(e) => {
            warn!(error = %e, "Rejected undecodable event");
            return error_response(StatusCode::BAD_REQUEST, "decode", &e.to_string());
        }
    };

    match state.pipeline.handle(&event).await {
        Ok(ack) => match serde_json::to_vec(&ack) {
            Ok(bytes) => (
                StatusCode::OK,
                [(header::CONTENT_TYPE, STRUCTURED_CONTENT_TYPE)],
                bytes,
            )
                .into_response(),
            Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, "encode", &e.to_string()),
        },
        Err(e) => {
            info!(event_id = %event.id, kind = e.kind(), "Invocation failed");
            error_response(status_for(&e), e.kind(), &e.to_string())
        }
    }
}

/// HTTP status reported for a failed invocation.
pub fn status_for(err: &Error) -> StatusCode {
    match err {
        Error::Validation(_) => StatusCode::BAD_REQUEST,
        Error::Render(_) => StatusCode::UNPROCESSABLE_ENTITY,
        Error::Transport(_) => StatusCode::BAD_GATEWAY,
    }
}

fn error_response(status: StatusCode, kind: &str, message: &str) -> Response {
    (
        status,
        Json(serde_json::json!({"error": message, "kind": kind})),
    )
        .into_response()
}

/// Decode an HTTP request into a CloudEvent.
pub fn decode_event(headers: &HeaderMap, body: &[u8]) -> Result<CloudEvent, DecodeError> {
    let content_type = header_text(headers, header::CONTENT_TYPE.as_str())?;

    let structured = content_type.as_deref().is_some_and(|ct| {
        ct.split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .eq_ignore_ascii_case(STRUCTURED_CONTENT_TYPE)
    });
    if structured {
        return serde_json::from_slice(body).map_err(DecodeError::Structured);
    }

    decode_binary(headers, content_type, body)
}

fn decode_binary(
    headers: &HeaderMap,
    content_type: Option<String>,
    body: &[u8],
) -> Result<CloudEvent, DecodeError> {
    let mut event = CloudEvent::new("", "", "");

    for (name, value) in headers {
        let Some(attribute) = name.as_str().strip_prefix("ce-") else {
            continue;
        };
        let value = value
            .to_str()
            .map_err(|_| DecodeError::Header(name.to_string()))?
            .to_string();
        match attribute {
            "specversion" => event.specversion = value,
            "id" => event.id = value,
            "source" => event.source = value,
            "type" => event.event_type = value,
            "subject" => event.subject = Some(value),
            "time" => event.time = Some(value),
            "dataschema" => event.dataschema = Some(value),
            other => {
                event.extensions.insert(other.to_string(), Value::String(value));
            }
        }
    }

    // Text stays in `data`; anything else travels base64-encoded
    if !body.is_empty() {
        let media_type = content_type.as_deref();
        if media_type.is_none_or(is_json_media_type) {
            event.data = Some(serde_json::from_slice(body).map_err(DecodeError::JsonData)?);
        } else {
            match std::str::from_utf8(body) {
                Ok(text) if media_type.is_some_and(is_text_media_type) => {
                    event.data = Some(Value::String(text.to_string()));
                }
                _ => event.data_base64 = Some(STANDARD.encode(body)),
            }
        }
    }
    event.datacontenttype = content_type;

    Ok(event)
}

fn is_text_media_type(content_type: &str) -> bool {
    content_type.trim_start().to_ascii_lowercase().starts_with("text/")
}

fn header_text(headers: &HeaderMap, name: &str) -> Result<Option<String>, DecodeError> {
    headers
        .get(name)
        .map(|v| {
            v.to_str()
                .map(str::to_string)
                .map_err(|_| DecodeError::Header(name.to_string()))
        })
        .transpose()
}
