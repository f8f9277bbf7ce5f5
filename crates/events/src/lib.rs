//! Post-commit session bookkeeping.
//!
//! - [`SessionEventBus`] -- in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`SessionEvent`] -- emitted by the auth service after a token-issuing
//!   transaction commits.
//! - [`SessionRecorder`] -- background consumer that writes login sessions and
//!   user activity. Its failures are logged and never reach the request that
//!   triggered them.

pub mod bus;
pub mod recorder;

pub use bus::{ClientInfo, SessionEvent, SessionEventBus};
pub use recorder::SessionRecorder;
