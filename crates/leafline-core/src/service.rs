//! Conversation service.
//!
//! Orchestrates one inbound event end to end: load the record snapshot,
//! run the state machine, apply the mutation, send the response, and spawn
//! fire-and-forget profile enrichment. Generic over the repository and
//! messaging client traits -- leafline-core never depends on leafline-infra.

use std::sync::Arc;

use leafline_types::error::RepositoryError;
use leafline_types::event::InboundEvent;
use leafline_types::record::{Psid, UserPatch};
use leafline_types::response::OutboundResponse;

use crate::client::MessagingClient;
use crate::conversation::{RecordMutation, decide};
use crate::repository::UserRepository;

/// Service handling one webhook event per invocation.
///
/// Stateless across invocations: every event is decided against the
/// store's current snapshot.
pub struct ConversationService<R, M> {
    repo: Arc<R>,
    client: Arc<M>,
}

impl<R, M> ConversationService<R, M>
where
    R: UserRepository + 'static,
    M: MessagingClient + 'static,
{
    pub fn new(repo: Arc<R>, client: Arc<M>) -> Self {
        Self { repo, client }
    }

    /// Handle one inbound event.
    ///
    /// Repository errors abort the event (the webhook ack is unaffected;
    /// the caller logs and drops). Send failures are logged and swallowed
    /// here -- delivery is best effort. Returns the response that was
    /// (attempted to be) sent.
    ///
    /// Profile enrichment runs as a detached task with no ordering
    /// guarantee relative to this path; both writers go through the
    /// store's atomic field merge, and name fields are idempotent across
    /// calls, so last-writer-wins is acceptable.
    pub async fn handle_event(
        &self,
        event: InboundEvent,
    ) -> Result<OutboundResponse, RepositoryError> {
        self.spawn_enrichment(event.sender.clone());

        let snapshot = self.repo.get(&event.sender).await?;
        let decision = decide(&event.kind, snapshot.as_ref());

        match &decision.mutation {
            Some(RecordMutation::Merge(patch)) => {
                self.repo.merge(&event.sender, patch).await?;
            }
            Some(RecordMutation::AppendPosting(posting)) => {
                self.repo.append_posting(&event.sender, posting).await?;
            }
            None => {}
        }

        if let Err(e) = self.client.send(&event.sender, &decision.response).await {
            tracing::warn!(recipient = %event.sender, error = %e, "failed to send response");
        }

        Ok(decision.response)
    }

    /// Spawn the fire-and-forget profile enrichment task.
    fn spawn_enrichment(&self, psid: Psid) {
        let repo = Arc::clone(&self.repo);
        let client = Arc::clone(&self.client);
        tokio::spawn(async move {
            Self::enrich(&*repo, &*client, &psid).await;
        });
    }

    /// Fetch the sender's profile name and merge it into their record.
    /// Every failure mode is logged at debug and otherwise ignored; the
    /// conversation outcome never depends on enrichment.
    async fn enrich(repo: &R, client: &M, psid: &Psid) {
        let profile = match client.fetch_profile(psid).await {
            Ok(profile) => profile,
            Err(e) => {
                tracing::debug!(psid = %psid, error = %e, "profile lookup failed");
                return;
            }
        };

        if profile.is_empty() {
            return;
        }

        let patch = UserPatch {
            first_name: profile.first_name,
            last_name: profile.last_name,
            ..Default::default()
        };
        if let Err(e) = repo.merge(psid, &patch).await {
            tracing::debug!(psid = %psid, error = %e, "profile merge failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    use chrono::Utc;
    use leafline_types::error::SendError;
    use leafline_types::event::EventKind;
    use leafline_types::record::{Posting, UserRecord};
    use leafline_types::response::Profile;

    /// In-memory repository with the same merge semantics as the SQLite one.
    #[derive(Default)]
    struct MemoryRepo {
        records: Mutex<HashMap<String, UserRecord>>,
    }

    impl UserRepository for MemoryRepo {
        async fn get(&self, psid: &Psid) -> Result<Option<UserRecord>, RepositoryError> {
            Ok(self.records.lock().unwrap().get(psid.as_str()).cloned())
        }

        async fn merge(&self, psid: &Psid, patch: &UserPatch) -> Result<(), RepositoryError> {
            let mut records = self.records.lock().unwrap();
            let now = Utc::now();
            let record = records
                .entry(psid.as_str().to_string())
                .or_insert_with(|| UserRecord {
                    psid: psid.clone(),
                    first_name: None,
                    last_name: None,
                    image_url: None,
                    lat: None,
                    lng: None,
                    postings: Vec::new(),
                    created_at: now,
                    updated_at: now,
                });
            if let Some(v) = &patch.first_name {
                record.first_name = Some(v.clone());
            }
            if let Some(v) = &patch.last_name {
                record.last_name = Some(v.clone());
            }
            if let Some(v) = &patch.image_url {
                record.image_url = Some(v.clone());
            }
            if let Some(v) = patch.lat {
                record.lat = Some(v);
            }
            if let Some(v) = patch.lng {
                record.lng = Some(v);
            }
            record.updated_at = now;
            Ok(())
        }

        async fn append_posting(
            &self,
            psid: &Psid,
            posting: &Posting,
        ) -> Result<(), RepositoryError> {
            self.merge(psid, &UserPatch::default()).await?;
            let mut records = self.records.lock().unwrap();
            records
                .get_mut(psid.as_str())
                .ok_or(RepositoryError::Query("missing record".to_string()))?
                .postings
                .push(posting.clone());
            Ok(())
        }
    }

    /// Client that records sends and serves a canned profile.
    struct RecordingClient {
        sent: Mutex<Vec<(String, OutboundResponse)>>,
        profile: Profile,
        fail_sends: bool,
    }

    impl RecordingClient {
        fn new() -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
                profile: Profile::default(),
                fail_sends: false,
            }
        }
    }

    impl MessagingClient for RecordingClient {
        async fn send(
            &self,
            recipient: &Psid,
            response: &OutboundResponse,
        ) -> Result<(), SendError> {
            if self.fail_sends {
                return Err(SendError::Transport("connection refused".to_string()));
            }
            self.sent
                .lock()
                .unwrap()
                .push((recipient.as_str().to_string(), response.clone()));
            Ok(())
        }

        async fn fetch_profile(&self, _psid: &Psid) -> Result<Profile, SendError> {
            Ok(self.profile.clone())
        }
    }

    fn service(
        client: RecordingClient,
    ) -> (
        ConversationService<MemoryRepo, RecordingClient>,
        Arc<MemoryRepo>,
        Arc<RecordingClient>,
    ) {
        let repo = Arc::new(MemoryRepo::default());
        let client = Arc::new(client);
        (
            ConversationService::new(Arc::clone(&repo), Arc::clone(&client)),
            repo,
            client,
        )
    }

    fn event(kind: EventKind) -> InboundEvent {
        InboundEvent {
            sender: Psid::new("4078").unwrap(),
            kind,
        }
    }

    #[tokio::test]
    async fn test_text_event_sends_prompt_without_creating_record() {
        let (service, repo, client) = service(RecordingClient::new());

        let response = service
            .handle_event(event(EventKind::Text {
                body: "hi".to_string(),
            }))
            .await
            .unwrap();

        assert!(matches!(response, OutboundResponse::QuickReplyPrompt { .. }));
        let sent = client.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "4078");
        // Text carries no mutation; enrichment had nothing to merge either.
        assert!(repo.records.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_location_event_merges_before_sending() {
        let (service, repo, _client) = service(RecordingClient::new());

        service
            .handle_event(event(EventKind::Location {
                url: Some("https://maps/pin".to_string()),
                lat: 47.6,
                lng: -122.3,
            }))
            .await
            .unwrap();

        let records = repo.records.lock().unwrap();
        let record = records.get("4078").unwrap();
        assert_eq!(record.lat, Some(47.6));
        assert_eq!(record.lng, Some(-122.3));
    }

    #[tokio::test]
    async fn test_post_appends_posting_from_snapshot() {
        let (service, repo, _client) = service(RecordingClient::new());

        service
            .handle_event(event(EventKind::Image {
                url: "https://cdn/pile.jpg".to_string(),
            }))
            .await
            .unwrap();
        service
            .handle_event(event(EventKind::Postback {
                payload: "Post".to_string(),
            }))
            .await
            .unwrap();

        let records = repo.records.lock().unwrap();
        let record = records.get("4078").unwrap();
        assert_eq!(record.postings.len(), 1);
        assert_eq!(
            record.postings[0].image_url.as_deref(),
            Some("https://cdn/pile.jpg")
        );
        // Cancel-free flow: the record fields survive the posting.
        assert_eq!(record.image_url.as_deref(), Some("https://cdn/pile.jpg"));
    }

    #[tokio::test]
    async fn test_send_failure_is_swallowed() {
        let client = RecordingClient {
            fail_sends: true,
            ..RecordingClient::new()
        };
        let (service, repo, _client) = service(client);

        let result = service
            .handle_event(event(EventKind::Location {
                url: None,
                lat: 1.0,
                lng: 2.0,
            }))
            .await;

        // The mutation landed and the event succeeded despite the dead send.
        assert!(result.is_ok());
        assert!(repo.records.lock().unwrap().contains_key("4078"));
    }

    #[tokio::test]
    async fn test_enrich_merges_profile_name() {
        let client = RecordingClient {
            profile: Profile {
                first_name: Some("Ada".to_string()),
                last_name: Some("Lovelace".to_string()),
            },
            ..RecordingClient::new()
        };
        let repo = Arc::new(MemoryRepo::default());
        let client = Arc::new(client);
        let psid = Psid::new("4078").unwrap();

        ConversationService::enrich(&*repo, &*client, &psid).await;

        let records = repo.records.lock().unwrap();
        let record = records.get("4078").unwrap();
        assert_eq!(record.first_name.as_deref(), Some("Ada"));
        assert_eq!(record.last_name.as_deref(), Some("Lovelace"));
    }

    #[tokio::test]
    async fn test_enrich_empty_profile_creates_nothing() {
        let repo = Arc::new(MemoryRepo::default());
        let client = Arc::new(RecordingClient::new());
        let psid = Psid::new("4078").unwrap();

        ConversationService::enrich(&*repo, &*client, &psid).await;

        assert!(repo.records.lock().unwrap().is_empty());
    }
}
