//! Send API payload builder.
//!
//! Translates the platform-neutral [`OutboundResponse`] union into the
//! Messenger Send API `message` object. Pure construction, no side effects;
//! the union is closed so there is no failure mode.

use serde::Serialize;

use leafline_types::response::OutboundResponse;

/// The `message` object of a Send API call.
///
/// Exactly one of the field groups is populated, matching the wire shapes
/// the platform accepts: `text`, `text` + `quick_replies`, or `attachment`.
#[derive(Debug, Clone, Serialize)]
pub struct SendMessage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quick_replies: Option<Vec<QuickReply>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachment: Option<TemplateAttachment>,
}

#[derive(Debug, Clone, Serialize)]
pub struct QuickReply {
    pub content_type: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TemplateAttachment {
    #[serde(rename = "type")]
    pub kind: String,
    pub payload: TemplatePayload,
}

#[derive(Debug, Clone, Serialize)]
pub struct TemplatePayload {
    pub template_type: String,
    pub elements: Vec<TemplateElement>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TemplateElement {
    pub title: String,
    pub subtitle: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub buttons: Vec<TemplateButton>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TemplateButton {
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub payload: String,
}

/// Build the Send API `message` object for a response.
pub fn build_message(response: &OutboundResponse) -> SendMessage {
    match response {
        OutboundResponse::PlainText { body } => SendMessage {
            text: Some(body.clone()),
            quick_replies: None,
            attachment: None,
        },

        OutboundResponse::QuickReplyPrompt { body, options } => SendMessage {
            text: Some(body.clone()),
            quick_replies: Some(
                options
                    .iter()
                    .map(|option| QuickReply {
                        content_type: option.clone(),
                    })
                    .collect(),
            ),
            attachment: None,
        },

        OutboundResponse::ConfirmationCard {
            title,
            subtitle,
            image_url,
            actions,
        } => SendMessage {
            text: None,
            quick_replies: None,
            attachment: Some(TemplateAttachment {
                kind: "template".to_string(),
                payload: TemplatePayload {
                    template_type: "generic".to_string(),
                    elements: vec![TemplateElement {
                        title: title.clone(),
                        subtitle: subtitle.clone(),
                        image_url: image_url.clone(),
                        buttons: actions
                            .iter()
                            .map(|action| TemplateButton {
                                kind: "postback".to_string(),
                                title: action.title.clone(),
                                payload: action.payload.clone(),
                            })
                            .collect(),
                    }],
                },
            }),
        },
    }
}
