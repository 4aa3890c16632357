//! Infrastructure layer for Leafline.
//!
//! Contains implementations of the port traits defined in `leafline-core`:
//! the SQLite record store, the Facebook Graph API messaging client, and
//! the environment-driven settings loader.

pub mod messenger;
pub mod settings;
pub mod sqlite;
