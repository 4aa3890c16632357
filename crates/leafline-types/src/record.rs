use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;

/// Page-scoped sender id -- the opaque key the messaging platform uses
/// for one user of one page. Guaranteed non-empty by construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Psid(String);

impl Psid {
    /// Create a Psid, rejecting empty or whitespace-only input.
    pub fn new(id: impl Into<String>) -> Option<Self> {
        let id = id.into();
        if id.trim().is_empty() { None } else { Some(Self(id)) }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Psid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A user's mutable conversation record.
///
/// Created lazily on first contact. Fields are merged in piecemeal as the
/// conversation progresses -- a write never wholesale-replaces the record.
/// `postings` is append-only: confirmed postings are never edited or removed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub psid: Psid,
    /// From profile enrichment; may lag the conversation or stay absent.
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// URL of the most recent image attachment, if any.
    pub image_url: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    /// Confirmed postings in submission order.
    pub postings: Vec<Posting>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Partial-field update for a [`UserRecord`].
///
/// `None` fields are left untouched by the store's merge; the store applies
/// the whole patch atomically per row so concurrent writers (the main flow
/// and profile enrichment) cannot lose each other's fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub image_url: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

impl UserPatch {
    /// True when the patch would change nothing.
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.image_url.is_none()
            && self.lat.is_none()
            && self.lng.is_none()
    }
}

/// An immutable confirmed pickup-request submission.
///
/// Snapshotted from the user's record at the moment of the "Post" postback.
/// Fields may be absent when the record was incomplete -- the flow is best
/// effort and never fails on missing data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Posting {
    /// UUID v7 (time-sortable).
    pub id: Uuid,
    pub image_url: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    /// Submission time as epoch milliseconds.
    pub created_at_ms: i64,
}

impl Posting {
    /// Snapshot a posting from the current record fields, stamped now.
    pub fn from_snapshot(record: Option<&UserRecord>) -> Self {
        Self {
            id: Uuid::now_v7(),
            image_url: record.and_then(|r| r.image_url.clone()),
            lat: record.and_then(|r| r.lat),
            lng: record.and_then(|r| r.lng),
            created_at_ms: Utc::now().timestamp_millis(),
        }
    }
}

/// Explicit conversation state, derived once per request from the record
/// snapshot rather than re-inferred ad hoc in each handler branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversationState {
    /// No location on file yet.
    New,
    /// Location captured, no image yet.
    LocationSet,
    /// Location and image both captured.
    ReadyToPost,
}

impl ConversationState {
    /// Derive the state from a record snapshot (absent record == `New`).
    pub fn of(record: Option<&UserRecord>) -> Self {
        match record {
            Some(r) if r.lat.is_some() && r.lng.is_some() => {
                if r.image_url.is_some() {
                    Self::ReadyToPost
                } else {
                    Self::LocationSet
                }
            }
            _ => Self::New,
        }
    }
}
