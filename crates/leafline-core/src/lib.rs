//! Business logic and port trait definitions for Leafline.
//!
//! This crate holds the conversation state machine, the Send API payload
//! builder, and the traits ("ports") the infrastructure layer implements.
//! It depends only on `leafline-types` -- never on `leafline-infra` or any
//! database/HTTP crate.

pub mod client;
pub mod conversation;
pub mod payload;
pub mod repository;
pub mod service;
