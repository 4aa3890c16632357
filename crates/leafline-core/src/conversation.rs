//! Conversation state machine.
//!
//! [`decide`] is a pure function from one inbound event plus the user's
//! current record snapshot to a record mutation and an outbound response.
//! It holds no state across invocations; every event is decided against the
//! store's current snapshot.
//!
//! On `Cancel` the record fields are intentionally left intact so the user
//! can resume where they left off (preserved observed behavior; pending
//! product clarification whether a reset is wanted).

use leafline_types::event::EventKind;
use leafline_types::record::{ConversationState, Posting, UserPatch, UserRecord};
use leafline_types::response::{CardAction, OutboundResponse};

/// Postback payload confirming a posting.
pub const PAYLOAD_POST: &str = "Post";
/// Postback payload abandoning the confirmation.
pub const PAYLOAD_CANCEL: &str = "Cancel";

const LOCATION_PROMPT: &str = "Hello, please provide a location of your leave pickup";
const CARD_TITLE: &str = "Confirm yard waste collection posting";
const CARD_SUBTITLE: &str = "Tap a button to answer.";
const CARD_SUBTITLE_IMAGE: &str = "Image saved. Tap a button to answer.";
const UNKNOWN_ATTACHMENT_REPLY: &str = "Sorry, unable to find location data from the input";
const POSTED_REPLY: &str = "Thanks!";
const CANCELLED_REPLY: &str = "Cancelling";
const UNKNOWN_POSTBACK_REPLY: &str = "Sorry, I didn't understand that.";

/// Desired change to the user's stored record.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordMutation {
    /// Field-level merge; the store applies it atomically per row.
    Merge(UserPatch),
    /// Append one confirmed posting to the append-only history.
    AppendPosting(Posting),
}

/// Outcome of one state machine step.
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub mutation: Option<RecordMutation>,
    pub response: OutboundResponse,
}

impl Decision {
    fn respond(response: OutboundResponse) -> Self {
        Self {
            mutation: None,
            response,
        }
    }
}

/// Decide the record mutation and response for one inbound event.
///
/// Total over state x event: every combination yields a response, and the
/// user-visible flow never fails on missing data (a `Post` against an
/// absent record produces a posting with null fields).
pub fn decide(event: &EventKind, snapshot: Option<&UserRecord>) -> Decision {
    let state = ConversationState::of(snapshot);

    match event {
        // Free text never advances the flow; in every state the answer is
        // the location prompt with a quick-reply location picker.
        EventKind::Text { .. } => Decision::respond(OutboundResponse::QuickReplyPrompt {
            body: LOCATION_PROMPT.to_string(),
            options: vec!["location".to_string()],
        }),

        EventKind::Location { url, lat, lng } => {
            let mutation = RecordMutation::Merge(UserPatch {
                lat: Some(*lat),
                lng: Some(*lng),
                ..Default::default()
            });
            // The card prefers the location attachment's own image, falling
            // back to a previously saved photo of the pile.
            let image_url = url
                .clone()
                .or_else(|| snapshot.and_then(|r| r.image_url.clone()));
            let subtitle = if state == ConversationState::ReadyToPost {
                CARD_SUBTITLE_IMAGE
            } else {
                CARD_SUBTITLE
            };
            Decision {
                mutation: Some(mutation),
                response: confirmation_card(subtitle, image_url),
            }
        }

        EventKind::Image { url } => Decision {
            mutation: Some(RecordMutation::Merge(UserPatch {
                image_url: Some(url.clone()),
                ..Default::default()
            })),
            response: confirmation_card(CARD_SUBTITLE_IMAGE, Some(url.clone())),
        },

        EventKind::UnknownAttachment { .. } => Decision::respond(OutboundResponse::PlainText {
            body: UNKNOWN_ATTACHMENT_REPLY.to_string(),
        }),

        EventKind::Postback { payload } => match payload.as_str() {
            PAYLOAD_POST => Decision {
                mutation: Some(RecordMutation::AppendPosting(Posting::from_snapshot(
                    snapshot,
                ))),
                response: OutboundResponse::PlainText {
                    body: POSTED_REPLY.to_string(),
                },
            },
            PAYLOAD_CANCEL => Decision::respond(OutboundResponse::PlainText {
                body: CANCELLED_REPLY.to_string(),
            }),
            _ => Decision::respond(OutboundResponse::PlainText {
                body: UNKNOWN_POSTBACK_REPLY.to_string(),
            }),
        },
    }
}

fn confirmation_card(subtitle: &str, image_url: Option<String>) -> OutboundResponse {
    OutboundResponse::ConfirmationCard {
        title: CARD_TITLE.to_string(),
        subtitle: subtitle.to_string(),
        image_url,
        actions: vec![
            CardAction::new("Post", PAYLOAD_POST),
            CardAction::new("Cancel", PAYLOAD_CANCEL),
        ],
    }
}
