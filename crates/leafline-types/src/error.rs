use thiserror::Error;

/// Errors from parsing inbound webhook events.
#[derive(Debug, Error)]
pub enum EventError {
    #[error("malformed event: {0}")]
    Malformed(String),
}

/// Errors from record store operations (trait definitions live in
/// leafline-core, implementations in leafline-infra).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),
}

/// Errors from outbound messaging calls. Sends are fire-and-forget: the
/// caller logs these and moves on, no retry.
#[derive(Debug, Error)]
pub enum SendError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("send API returned status {status}: {body}")]
    Api { status: u16, body: String },
}
