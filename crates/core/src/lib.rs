//! Domain primitives shared by every Gatehouse crate.
//!
//! Nothing in here touches storage or the network: roles and the guards built
//! on them, the domain error type, input validation, presence rules and the
//! user-agent classifier.

pub mod error;
pub mod presence;
pub mod roles;
pub mod search;
pub mod types;
pub mod user_agent;
pub mod validation;
