//! Facebook Graph API messaging client.

pub mod client;

pub use client::GraphClient;
