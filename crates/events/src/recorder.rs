//! Background consumer that records login sessions and user activity.
//!
//! [`SessionRecorder`] subscribes to the [`SessionEventBus`](crate::bus::SessionEventBus)
//! and writes one transaction per event. It runs as a long-lived task and
//! exits when the bus sender is dropped.

use std::sync::Arc;

use gatehouse_core::user_agent;
use gatehouse_db::models::login_session::{CreateLoginSession, TouchLoginSession};
use gatehouse_db::{DbError, SessionStore, Store, UserStore};
use tokio::sync::broadcast;

use crate::bus::{ClientInfo, SessionEvent};

pub struct SessionRecorder {
    store: Arc<dyn Store>,
    /// Seconds added to a user's `total_active_time` per event; equal to the
    /// access-token lifetime.
    activity_quantum_secs: i64,
}

impl SessionRecorder {
    pub fn new(store: Arc<dyn Store>, activity_quantum_secs: i64) -> Self {
        Self {
            store,
            activity_quantum_secs,
        }
    }

    /// Run the recording loop until the channel closes.
    pub async fn run(self, mut receiver: broadcast::Receiver<SessionEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    if let Err(e) = self.handle(&event).await {
                        tracing::error!(
                            error = %e,
                            event = event.name(),
                            user_id = event.user_id(),
                            refresh_token_id = event.refresh_token_id(),
                            "Failed to record session event"
                        );
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(
                        skipped = n,
                        "Session recorder lagged, some sessions were not recorded"
                    );
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Session event bus closed, recorder shutting down");
                    break;
                }
            }
        }
    }

    /// Apply a single event in its own transaction.
    pub async fn handle(&self, event: &SessionEvent) -> Result<(), DbError> {
        let mut tx = self.store.begin().await?;

        match event {
            SessionEvent::Opened {
                user_id,
                refresh_token_id,
                client,
                occurred_at,
            } => {
                let labels = ClientLabels::from(client);
                tx.create_login_session(&CreateLoginSession {
                    user_id: *user_id,
                    refresh_token_id: *refresh_token_id,
                    ip_address: labels.ip_address,
                    user_agent: labels.user_agent,
                    device_type: labels.device_type,
                    browser: labels.browser,
                    os: labels.os,
                })
                .await?;
                tx.record_activity(*user_id, *occurred_at, self.activity_quantum_secs)
                    .await?;
            }
            SessionEvent::Refreshed {
                user_id,
                refresh_token_id,
                client,
                occurred_at,
            } => {
                let labels = ClientLabels::from(client);
                let touch = TouchLoginSession {
                    ip_address: labels.ip_address,
                    user_agent: labels.user_agent,
                    device_type: labels.device_type,
                    browser: labels.browser,
                    os: labels.os,
                    at: *occurred_at,
                };
                let touched = tx.touch_login_session(*refresh_token_id, &touch).await?;
                if touched.is_none() {
                    tracing::debug!(
                        refresh_token_id,
                        "No login session for refreshed credential"
                    );
                }
                tx.record_activity(*user_id, *occurred_at, self.activity_quantum_secs)
                    .await?;
            }
        }

        tx.commit().await?;
        tracing::debug!(
            event = event.name(),
            user_id = event.user_id(),
            "Recorded session event"
        );
        Ok(())
    }
}

/// Client fields written to a login session, raw and classified.
struct ClientLabels {
    ip_address: Option<String>,
    user_agent: Option<String>,
    device_type: Option<String>,
    browser: Option<String>,
    os: Option<String>,
}

impl From<&ClientInfo> for ClientLabels {
    fn from(client: &ClientInfo) -> Self {
        let profile = user_agent::classify(client.user_agent.as_deref());
        Self {
            ip_address: client.ip_address.clone(),
            user_agent: client.user_agent.clone(),
            device_type: profile
                .as_ref()
                .map(|p| p.device_type.as_str().to_string()),
            browser: profile.as_ref().map(|p| p.browser.clone()),
            os: profile.map(|p| p.os),
        }
    }
}
