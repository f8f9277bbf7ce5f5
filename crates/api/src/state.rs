use std::sync::Arc;

use gatehouse_db::Store;
use gatehouse_events::SessionEventBus;

use crate::auth::jwt::TokenCodec;
use crate::config::ServerConfig;
use crate::services::auth::AuthService;
use crate::services::directory::Directory;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Persistence backend (Postgres in production, in-memory in tests).
    pub store: Arc<dyn Store>,
    /// Token codec built from `config.jwt`.
    pub codec: Arc<TokenCodec>,
    /// Bus carrying post-commit session events to the recorder.
    pub event_bus: Arc<SessionEventBus>,
    pub auth: AuthService,
    pub directory: Directory,
}

impl AppState {
    /// Wire the services together from configuration and a store.
    pub fn new(
        config: ServerConfig,
        store: Arc<dyn Store>,
        event_bus: Arc<SessionEventBus>,
    ) -> Self {
        let codec = Arc::new(TokenCodec::new(config.jwt.clone()));
        let directory = Directory::new(Arc::clone(&store), config.jwt.access_ttl());
        let auth = AuthService::new(Arc::clone(&store), Arc::clone(&codec), Arc::clone(&event_bus));

        Self {
            config: Arc::new(config),
            store,
            codec,
            event_bus,
            auth,
            directory,
        }
    }
}
