//! HTTP ingress for the Messenger webhook.

pub mod handlers;
pub mod router;
