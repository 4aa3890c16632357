//! Outbound response variants.
//!
//! The state machine emits these platform-neutral responses; the payload
//! builder in `leafline-core` translates them into the Messenger Send API
//! wire shape.

/// What to send back to the user.
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundResponse {
    /// Plain text message.
    PlainText { body: String },
    /// Text plus quick-reply chips (e.g. the `location` picker).
    QuickReplyPrompt {
        body: String,
        options: Vec<String>,
    },
    /// Generic-template card with postback buttons.
    ConfirmationCard {
        title: String,
        subtitle: String,
        image_url: Option<String>,
        actions: Vec<CardAction>,
    },
}

/// One postback button on a confirmation card.
#[derive(Debug, Clone, PartialEq)]
pub struct CardAction {
    /// Button label shown to the user.
    pub title: String,
    /// Payload echoed back in the postback event.
    pub payload: String,
}

impl CardAction {
    pub fn new(title: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            payload: payload.into(),
        }
    }
}

/// Name and profile fields returned by the platform profile lookup.
/// Either field may be absent (only real platform accounts carry names).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Profile {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl Profile {
    /// True when the lookup returned nothing worth merging.
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none() && self.last_name.is_none()
    }
}
