//! Shared domain types for Leafline.
//!
//! This crate contains the core domain types used across the Leafline bot:
//! UserRecord, Posting, inbound webhook events, outbound responses, and
//! their associated error types.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod error;
pub mod event;
pub mod record;
pub mod response;
