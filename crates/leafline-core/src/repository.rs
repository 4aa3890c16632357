//! Record store trait definition.
//!
//! The implementation lives in leafline-infra (SqliteUserRepository).
//! Uses native async fn in traits (Rust 2024 edition, no async_trait macro).

use leafline_types::error::RepositoryError;
use leafline_types::record::{Posting, Psid, UserPatch, UserRecord};

/// Keyed store of per-user records with an append-only posting history.
pub trait UserRepository: Send + Sync {
    /// Load the record for a user, postings included, or `None` if the user
    /// has never been seen.
    fn get(
        &self,
        psid: &Psid,
    ) -> impl std::future::Future<Output = Result<Option<UserRecord>, RepositoryError>> + Send;

    /// Merge a partial-field patch into the user's record, creating the
    /// record lazily if absent. The merge must be atomic per row: only the
    /// patch's populated fields change, so two concurrent writers for the
    /// same user cannot lose each other's updates.
    fn merge(
        &self,
        psid: &Psid,
        patch: &UserPatch,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Append one posting to the user's history, creating the record lazily
    /// if absent. Postings are never updated or deleted.
    fn append_posting(
        &self,
        psid: &Psid,
        posting: &Posting,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;
}
