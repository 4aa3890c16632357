//! GraphClient -- concrete [`MessagingClient`] implementation for the
//! Facebook Graph API.
//!
//! Sends outbound messages through the Send API (`/me/messages`) and
//! fetches profile name fields by page-scoped id. Both calls authenticate
//! via the page access token as a query parameter.
//!
//! The access token is wrapped in [`secrecy::SecretString`] and is never
//! logged or included in `Debug` output.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use leafline_core::client::MessagingClient;
use leafline_core::payload::{SendMessage, build_message};
use leafline_types::error::SendError;
use leafline_types::record::Psid;
use leafline_types::response::{OutboundResponse, Profile};

/// Messaging client against the Graph API.
pub struct GraphClient {
    client: reqwest::Client,
    access_token: SecretString,
    base_url: String,
}

impl GraphClient {
    /// Create a new Graph API client with the given page access token.
    pub fn new(access_token: SecretString) -> Result<Self, SendError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| SendError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            access_token,
            base_url: "https://graph.facebook.com/v2.6".to_string(),
        })
    }

    /// Override the base URL (useful for testing or proxies).
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }
}

/// Send API request envelope: `{recipient: {id}, message: ...}`.
#[derive(Debug, Serialize)]
struct SendRequest {
    recipient: Recipient,
    message: SendMessage,
}

#[derive(Debug, Serialize)]
struct Recipient {
    id: String,
}

#[derive(Debug, Deserialize)]
struct ProfileResponse {
    first_name: Option<String>,
    last_name: Option<String>,
}

impl MessagingClient for GraphClient {
    async fn send(&self, recipient: &Psid, response: &OutboundResponse) -> Result<(), SendError> {
        let body = SendRequest {
            recipient: Recipient {
                id: recipient.as_str().to_string(),
            },
            message: build_message(response),
        };

        let http_response = self
            .client
            .post(format!("{}/me/messages", self.base_url))
            .query(&[("access_token", self.access_token.expose_secret())])
            .json(&body)
            .send()
            .await
            .map_err(|e| SendError::Transport(e.to_string()))?;

        let status = http_response.status();
        if !status.is_success() {
            return Err(SendError::Api {
                status: status.as_u16(),
                body: http_response.text().await.unwrap_or_default(),
            });
        }

        tracing::debug!(recipient = %recipient, "message sent");
        Ok(())
    }

    async fn fetch_profile(&self, psid: &Psid) -> Result<Profile, SendError> {
        let http_response = self
            .client
            .get(format!("{}/{}", self.base_url, psid.as_str()))
            .query(&[
                ("fields", "first_name,last_name"),
                ("access_token", self.access_token.expose_secret()),
            ])
            .send()
            .await
            .map_err(|e| SendError::Transport(e.to_string()))?;

        let status = http_response.status();
        if !status.is_success() {
            return Err(SendError::Api {
                status: status.as_u16(),
                body: http_response.text().await.unwrap_or_default(),
            });
        }

        let profile: ProfileResponse = http_response
            .json()
            .await
            .map_err(|e| SendError::Transport(e.to_string()))?;

        Ok(Profile {
            first_name: profile.first_name,
            last_name: profile.last_name,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_request_envelope_shape() {
        let request = SendRequest {
            recipient: Recipient {
                id: "4078".to_string(),
            },
            message: build_message(&OutboundResponse::PlainText {
                body: "Thanks!".to_string(),
            }),
        };

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            serde_json::json!({
                "recipient": {"id": "4078"},
                "message": {"text": "Thanks!"}
            })
        );
    }

    #[test]
    fn test_profile_response_tolerates_absent_fields() {
        let profile: ProfileResponse = serde_json::from_str("{}").unwrap();
        assert!(profile.first_name.is_none());
        assert!(profile.last_name.is_none());

        let profile: ProfileResponse =
            serde_json::from_str(r#"{"first_name": "Ada"}"#).unwrap();
        assert_eq!(profile.first_name.as_deref(), Some("Ada"));
    }

    #[tokio::test]
    async fn test_send_to_unreachable_host_is_transport_error() {
        let client = GraphClient::new(SecretString::from("test-token"))
            .unwrap()
            .with_base_url("http://127.0.0.1:1".to_string());

        let err = client
            .send(
                &Psid::new("4078").unwrap(),
                &OutboundResponse::PlainText {
                    body: "hi".to_string(),
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, SendError::Transport(_)));
    }
}
