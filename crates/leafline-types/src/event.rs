//! Inbound webhook events.
//!
//! The wire types mirror the Messenger Platform webhook envelope
//! (`entry[].messaging[0]`); [`InboundEvent`] is the parsed domain event the
//! state machine consumes. Parsing resolves the text-vs-attachment
//! precedence once, attachment-first: a message carrying both never
//! produces a `Text` event.

use serde::{Deserialize, Serialize};

use crate::error::EventError;
use crate::record::Psid;

// ---------------------------------------------------------------------------
// Wire envelope (Messenger webhook POST body)
// ---------------------------------------------------------------------------

/// Top-level webhook POST body.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WebhookBody {
    /// Subscription object type; only `"page"` deliveries are processed.
    pub object: String,
    #[serde(default)]
    pub entry: Vec<WebhookEntry>,
}

/// One page entry. `messaging` is an array on the wire but only ever
/// carries one event per entry.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WebhookEntry {
    #[serde(default)]
    pub messaging: Vec<MessagingEvent>,
}

/// One raw messaging event: a message or a postback from one sender.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MessagingEvent {
    pub sender: Option<WireSender>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<WireMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postback: Option<WirePostback>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WireSender {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WireMessage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachments: Option<Vec<WireAttachment>>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WireAttachment {
    #[serde(rename = "type")]
    pub kind: String,
    pub payload: Option<WireAttachmentPayload>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WireAttachmentPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<WireCoordinates>,
}

/// Messenger spells longitude `long` on the wire.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct WireCoordinates {
    pub lat: f64,
    #[serde(rename = "long")]
    pub lng: f64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WirePostback {
    pub payload: String,
}

// ---------------------------------------------------------------------------
// Parsed domain event
// ---------------------------------------------------------------------------

/// A well-formed inbound event, attributed to its sender.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundEvent {
    pub sender: Psid,
    pub kind: EventKind,
}

/// What the sender did.
#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
    /// Free-text message (only when no attachments were present).
    Text { body: String },
    /// Shared location attachment.
    Location {
        url: Option<String>,
        lat: f64,
        lng: f64,
    },
    /// Image attachment.
    Image { url: String },
    /// Attachment of a type the flow cannot use (video, audio, file, ...).
    UnknownAttachment { kind: String },
    /// Structured button click carrying a fixed payload string.
    Postback { payload: String },
}

impl InboundEvent {
    /// Parse a raw messaging event into a domain event.
    ///
    /// Returns [`EventError::Malformed`] for events with no usable sender id
    /// or with neither a message body nor a postback; callers log and skip
    /// these without failing the batch.
    pub fn from_wire(event: MessagingEvent) -> Result<Self, EventError> {
        let sender = event
            .sender
            .and_then(|s| Psid::new(s.id))
            .ok_or_else(|| EventError::Malformed("missing sender id".to_string()))?;

        // Attachment-first precedence: a message carrying both text and
        // attachments is handled as an attachment event.
        if let Some(message) = event.message {
            if let Some(attachments) = message.attachments
                && let Some(first) = attachments.into_iter().next()
            {
                return Ok(Self {
                    sender,
                    kind: EventKind::from_attachment(first),
                });
            }
            if let Some(text) = message.text {
                return Ok(Self {
                    sender,
                    kind: EventKind::Text { body: text },
                });
            }
            return Err(EventError::Malformed(
                "message without text or attachments".to_string(),
            ));
        }

        if let Some(postback) = event.postback {
            return Ok(Self {
                sender,
                kind: EventKind::Postback {
                    payload: postback.payload,
                },
            });
        }

        Err(EventError::Malformed(
            "event is neither message nor postback".to_string(),
        ))
    }
}

impl EventKind {
    /// Classify one wire attachment. Attachments missing the fields their
    /// declared type requires degrade to `UnknownAttachment` so the user
    /// gets an explanatory reply instead of silence.
    fn from_attachment(attachment: WireAttachment) -> Self {
        let payload = attachment.payload;
        match attachment.kind.as_str() {
            "location" => {
                let url = payload.as_ref().and_then(|p| p.url.clone());
                match payload.and_then(|p| p.coordinates) {
                    Some(coords) => Self::Location {
                        url,
                        lat: coords.lat,
                        lng: coords.lng,
                    },
                    None => Self::UnknownAttachment {
                        kind: "location".to_string(),
                    },
                }
            }
            "image" => match payload.and_then(|p| p.url) {
                Some(url) => Self::Image { url },
                None => Self::UnknownAttachment {
                    kind: "image".to_string(),
                },
            },
            other => Self::UnknownAttachment {
                kind: other.to_string(),
            },
        }
    }
}
