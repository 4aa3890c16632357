//! Application state wiring the services together.
//!
//! The conversation service is generic over repository/client traits, but
//! AppState pins it to the concrete infra implementations.

use std::sync::Arc;

use secrecy::SecretString;

use leafline_core::service::ConversationService;
use leafline_infra::messenger::GraphClient;
use leafline_infra::settings::Settings;
use leafline_infra::sqlite::pool::DatabasePool;
use leafline_infra::sqlite::user::SqliteUserRepository;

/// Concrete type alias for the service generics pinned to infra implementations.
pub type ConcreteConversationService = ConversationService<SqliteUserRepository, GraphClient>;

/// Shared application state for the webhook handlers and CLI commands.
#[derive(Clone)]
pub struct AppState {
    pub conversation: Arc<ConcreteConversationService>,
    /// Shared secret for webhook verification (the page access token,
    /// as in the original subscription setup).
    pub verify_token: SecretString,
    pub db_pool: DatabasePool,
}

impl AppState {
    /// Initialize the application state: connect to the store, wire the
    /// Graph client and conversation service.
    pub async fn init(settings: &Settings) -> anyhow::Result<Self> {
        tokio::fs::create_dir_all(&settings.data_dir).await?;

        let db_pool = DatabasePool::new(&settings.database_url).await?;
        let repo = Arc::new(SqliteUserRepository::new(db_pool.clone()));
        let client = Arc::new(GraphClient::new(settings.page_access_token.clone())?);

        Ok(Self {
            conversation: Arc::new(ConversationService::new(repo, client)),
            verify_token: settings.page_access_token.clone(),
            db_pool,
        })
    }
}
