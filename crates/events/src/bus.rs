//! In-process event bus backed by a `tokio::sync::broadcast` channel.

use chrono::Utc;
use gatehouse_core::types::{DbId, Timestamp};
use tokio::sync::broadcast;

/// Connection metadata captured from the request that obtained a token.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientInfo {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// Something happened to a refresh credential that the session log should
/// reflect. Published only after the owning transaction has committed.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// A new credential was issued by registration or login.
    Opened {
        user_id: DbId,
        refresh_token_id: DbId,
        client: ClientInfo,
        occurred_at: Timestamp,
    },
    /// An existing credential was rotated in place.
    Refreshed {
        user_id: DbId,
        refresh_token_id: DbId,
        client: ClientInfo,
        occurred_at: Timestamp,
    },
}

impl SessionEvent {
    pub fn opened(user_id: DbId, refresh_token_id: DbId, client: ClientInfo) -> Self {
        Self::Opened {
            user_id,
            refresh_token_id,
            client,
            occurred_at: Utc::now(),
        }
    }

    pub fn refreshed(user_id: DbId, refresh_token_id: DbId, client: ClientInfo) -> Self {
        Self::Refreshed {
            user_id,
            refresh_token_id,
            client,
            occurred_at: Utc::now(),
        }
    }

    pub fn user_id(&self) -> DbId {
        match self {
            Self::Opened { user_id, .. } | Self::Refreshed { user_id, .. } => *user_id,
        }
    }

    pub fn refresh_token_id(&self) -> DbId {
        match self {
            Self::Opened {
                refresh_token_id, ..
            }
            | Self::Refreshed {
                refresh_token_id, ..
            } => *refresh_token_id,
        }
    }

    /// Short name for log fields.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Opened { .. } => "session.opened",
            Self::Refreshed { .. } => "session.refreshed",
        }
    }
}

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// Fan-out bus for [`SessionEvent`]s, shared via `Arc<SessionEventBus>`.
pub struct SessionEventBus {
    sender: broadcast::Sender<SessionEvent>,
}

impl SessionEventBus {
    /// When the buffer is full the oldest events are dropped and slow
    /// receivers observe `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish to all current subscribers. Dropped silently when nobody is
    /// listening.
    pub fn publish(&self, event: SessionEvent) {
        if self.sender.send(event).is_err() {
            tracing::debug!("No session event subscribers, event dropped");
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.sender.subscribe()
    }
}

impl Default for SessionEventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
