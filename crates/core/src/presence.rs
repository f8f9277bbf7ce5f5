//! Derived "online" presence.
//!
//! Presence is not stored. A user counts as online only while the most recent
//! access token they could have obtained is still within its lifetime, so the
//! window is exactly the access-token TTL.

use chrono::Duration;

use crate::types::Timestamp;

/// Returns `true` when `now - last_active_at < access_ttl`.
pub fn is_online(last_active_at: Option<Timestamp>, now: Timestamp, access_ttl: Duration) -> bool {
    match last_active_at {
        Some(at) => now.signed_duration_since(at) < access_ttl,
        None => false,
    }
}
