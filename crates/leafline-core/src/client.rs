//! Messaging client trait definition.
//!
//! The implementation lives in leafline-infra (GraphClient, against the
//! Facebook Graph API). Both operations are best effort: the service logs
//! failures and never retries or surfaces them to the user.

use leafline_types::error::SendError;
use leafline_types::record::Psid;
use leafline_types::response::{OutboundResponse, Profile};

/// Outbound side of the messaging platform.
pub trait MessagingClient: Send + Sync {
    /// Send one response to a recipient. Fire and forget from the caller's
    /// perspective; an error means the user simply receives nothing.
    fn send(
        &self,
        recipient: &Psid,
        response: &OutboundResponse,
    ) -> impl std::future::Future<Output = Result<(), SendError>> + Send;

    /// Fetch the user's profile name fields. Absent fields are returned as
    /// an empty [`Profile`], not an error.
    fn fetch_profile(
        &self,
        psid: &Psid,
    ) -> impl std::future::Future<Output = Result<Profile, SendError>> + Send;
}
