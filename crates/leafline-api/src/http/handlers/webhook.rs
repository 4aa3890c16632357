//! Webhook verification and event receiver handlers.
//!
//! `GET /webhook` answers the platform's subscription handshake; `POST
//! /webhook` acknowledges every page delivery with `200 EVENT_RECEIVED`
//! and fans each event out to a detached processing task. No per-event
//! failure may change the acknowledgment -- the platform retries the whole
//! batch on anything but a 200.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use secrecy::ExposeSecret;
use serde::Deserialize;

use leafline_types::event::{InboundEvent, WebhookBody};

use crate::state::AppState;

/// Query parameters of the subscription verification request.
#[derive(Debug, Deserialize)]
pub struct VerifyParams {
    #[serde(rename = "hub.mode")]
    pub mode: Option<String>,
    #[serde(rename = "hub.verify_token")]
    pub verify_token: Option<String>,
    #[serde(rename = "hub.challenge")]
    pub challenge: Option<String>,
}

/// GET /webhook - Subscription verification handshake.
///
/// Echoes the challenge on a matching mode and token, 403 on a mismatch,
/// 400 when mode or token is missing entirely.
pub async fn verify_webhook(
    State(state): State<AppState>,
    Query(params): Query<VerifyParams>,
) -> Response {
    let (Some(mode), Some(token)) = (params.mode, params.verify_token) else {
        return StatusCode::BAD_REQUEST.into_response();
    };

    if mode == "subscribe" && token == state.verify_token.expose_secret() {
        tracing::info!("webhook verified");
        (StatusCode::OK, params.challenge.unwrap_or_default()).into_response()
    } else {
        tracing::warn!("webhook verification failed");
        StatusCode::FORBIDDEN.into_response()
    }
}

/// POST /webhook - Receive a batch of page events.
///
/// Non-page deliveries get a 404 and no processing. Page deliveries are
/// acknowledged immediately; each well-formed event is handled in its own
/// spawned task with no ordering guarantee across the batch (every event
/// touches only its own sender's record).
pub async fn receive_webhook(
    State(state): State<AppState>,
    Json(body): Json<WebhookBody>,
) -> Response {
    if body.object != "page" {
        return StatusCode::NOT_FOUND.into_response();
    }

    for event in collect_events(body) {
        let conversation = Arc::clone(&state.conversation);
        tokio::spawn(async move {
            let sender = event.sender.clone();
            if let Err(e) = conversation.handle_event(event).await {
                tracing::error!(sender = %sender, error = %e, "event processing failed");
            }
        });
    }

    (StatusCode::OK, "EVENT_RECEIVED").into_response()
}

/// Pull the parseable events out of a delivery batch.
///
/// `messaging` is an array on the wire but only ever carries one event per
/// entry, so only the first element is taken. Malformed events are logged
/// and skipped; the rest of the batch continues.
fn collect_events(body: WebhookBody) -> Vec<InboundEvent> {
    let mut events = Vec::new();
    for entry in body.entry {
        let Some(raw) = entry.messaging.into_iter().next() else {
            continue;
        };
        match InboundEvent::from_wire(raw) {
            Ok(event) => events.push(event),
            Err(e) => tracing::warn!(error = %e, "skipping malformed event"),
        }
    }
    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use leafline_types::event::EventKind;

    fn body(json: serde_json::Value) -> WebhookBody {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_collect_events_one_per_entry() {
        let events = collect_events(body(serde_json::json!({
            "object": "page",
            "entry": [
                {"messaging": [{"sender": {"id": "1"}, "message": {"text": "a"}}]},
                {"messaging": [{"sender": {"id": "2"}, "postback": {"payload": "Post"}}]},
                {"messaging": [{"sender": {"id": "3"}, "message": {"text": "c"}}]}
            ]
        })));

        assert_eq!(events.len(), 3);
        assert_eq!(events[0].sender.as_str(), "1");
        assert!(matches!(events[1].kind, EventKind::Postback { .. }));
    }

    #[test]
    fn test_collect_events_skips_malformed_and_continues() {
        let events = collect_events(body(serde_json::json!({
            "object": "page",
            "entry": [
                {"messaging": [{"message": {"text": "no sender"}}]},
                {"messaging": []},
                {"messaging": [{"sender": {"id": "2"}, "message": {"text": "ok"}}]}
            ]
        })));

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].sender.as_str(), "2");
    }

    #[test]
    fn test_collect_events_takes_first_messaging_element_only() {
        let events = collect_events(body(serde_json::json!({
            "object": "page",
            "entry": [{"messaging": [
                {"sender": {"id": "1"}, "message": {"text": "first"}},
                {"sender": {"id": "1"}, "message": {"text": "second"}}
            ]}]
        })));

        assert_eq!(events.len(), 1);
        assert_eq!(
            events[0].kind,
            EventKind::Text {
                body: "first".to_string()
            }
        );
    }
}
