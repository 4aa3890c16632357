//! SQLite-backed record store.

pub mod pool;
pub mod user;
