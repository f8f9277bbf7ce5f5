//! Role hierarchy and the permission guards built on it.
//!
//! Roles form a strict total order by [`Role::priority`]. Every permission
//! decision in the service goes through one of the three guards below:
//!
//! - [`require_role`] -- the actor must rank at least as high as a minimum.
//! - [`check_role_assignment`] -- the escalation guard for create/update.
//! - [`check_mutation`] -- who may update or delete an existing account.
//!
//! Role names must match the `chk_users_role` constraint in the users
//! migration.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::DbId;

pub const ROLE_USER: &str = "user";
pub const ROLE_MODERATOR: &str = "moderator";
pub const ROLE_ADMIN: &str = "admin";

/// Account role. Ordering follows [`Role::priority`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Moderator,
    Admin,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::User, Role::Moderator, Role::Admin];

    /// Integer rank, strictly increasing with privilege.
    pub fn priority(self) -> u8 {
        match self {
            Role::User => 1,
            Role::Moderator => 2,
            Role::Admin => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => ROLE_USER,
            Role::Moderator => ROLE_MODERATOR,
            Role::Admin => ROLE_ADMIN,
        }
    }
}

impl Ord for Role {
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority().cmp(&other.priority())
    }
}

impl PartialOrd for Role {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string does not name a known role.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct ParseRoleError(pub String);

impl FromStr for Role {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            ROLE_USER => Ok(Role::User),
            ROLE_MODERATOR => Ok(Role::Moderator),
            ROLE_ADMIN => Ok(Role::Admin),
            other => Err(ParseRoleError(other.to_string())),
        }
    }
}

impl TryFrom<String> for Role {
    type Error = ParseRoleError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// The authenticated principal performing an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub id: DbId,
    pub role: Role,
}

impl Actor {
    pub fn new(id: DbId, role: Role) -> Self {
        Self { id, role }
    }
}

/// Reject actors ranked below `minimum`.
pub fn require_role(actor_role: Role, minimum: Role) -> Result<(), CoreError> {
    if actor_role < minimum {
        return Err(CoreError::Forbidden(format!("Role required: {minimum}")));
    }
    Ok(())
}

/// Escalation guard applied whenever a role is assigned.
///
/// - Anonymous actors (self-registration) may only assign [`Role::User`].
/// - Acting on themselves, an actor may keep or lower their role but never
///   raise it.
/// - Acting on another account, the assigned role must rank strictly below
///   the actor's own.
///
/// `target_id` is `None` when the account does not exist yet.
pub fn check_role_assignment(
    actor: Option<&Actor>,
    target_id: Option<DbId>,
    requested: Role,
) -> Result<(), CoreError> {
    let Some(actor) = actor else {
        if requested != Role::User {
            return Err(CoreError::Validation(format!(
                "Self-registration may only create '{}' accounts",
                Role::User
            )));
        }
        return Ok(());
    };

    if target_id == Some(actor.id) {
        if requested > actor.role {
            return Err(CoreError::Validation(
                "Cannot raise your own role".to_string(),
            ));
        }
        return Ok(());
    }

    if requested >= actor.role {
        return Err(CoreError::Validation(
            "Cannot assign a role equal to or above your own".to_string(),
        ));
    }
    Ok(())
}

/// Mutation guard applied before updating or deleting an existing account.
///
/// Self-action is always allowed; acting on someone else requires a strictly
/// higher role than the target currently holds.
pub fn check_mutation(actor: &Actor, target_id: DbId, target_role: Role) -> Result<(), CoreError> {
    if actor.id == target_id || actor.role > target_role {
        return Ok(());
    }
    Err(CoreError::Forbidden(
        "Insufficient privileges to modify this user".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn test_priority_is_strictly_increasing() {
        assert!(Role::User.priority() < Role::Moderator.priority());
        assert!(Role::Moderator.priority() < Role::Admin.priority());
        assert!(Role::User < Role::Moderator && Role::Moderator < Role::Admin);
    }

    #[test]
    fn test_no_priority_ties() {
        for a in Role::ALL {
            for b in Role::ALL {
                assert_eq!(a == b, a.priority() == b.priority());
            }
        }
    }

    #[test]
    fn test_parse_and_display() {
        for role in Role::ALL {
            assert_eq!(role.to_string().parse::<Role>(), Ok(role));
        }
        assert_eq!(
            "superuser".parse::<Role>(),
            Err(ParseRoleError("superuser".into()))
        );
        assert!("Admin".parse::<Role>().is_err(), "names are case-sensitive");
    }

    #[test]
    fn test_serde_uses_lowercase_names() {
        let json = serde_json::to_string(&Role::Moderator).unwrap();
        assert_eq!(json, "\"moderator\"");
        let role: Role = serde_json::from_str("\"admin\"").unwrap();
        assert_eq!(role, Role::Admin);
    }

    #[test]
    fn test_default_is_lowest() {
        assert_eq!(Role::default(), Role::User);
    }

    #[test]
    fn test_require_role() {
        assert!(require_role(Role::Admin, Role::Admin).is_ok());
        assert!(require_role(Role::Admin, Role::Moderator).is_ok());
        assert_matches!(
            require_role(Role::Moderator, Role::Admin),
            Err(CoreError::Forbidden(_))
        );
    }

    #[test]
    fn test_anonymous_may_only_assign_user() {
        assert!(check_role_assignment(None, None, Role::User).is_ok());
        assert_matches!(
            check_role_assignment(None, None, Role::Moderator),
            Err(CoreError::Validation(_))
        );
        assert_matches!(
            check_role_assignment(None, None, Role::Admin),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn test_assigning_to_others_requires_strictly_lower_role() {
        let admin = Actor::new(1, Role::Admin);
        assert!(check_role_assignment(Some(&admin), None, Role::Moderator).is_ok());
        assert!(check_role_assignment(Some(&admin), Some(2), Role::User).is_ok());
        assert_matches!(
            check_role_assignment(Some(&admin), Some(2), Role::Admin),
            Err(CoreError::Validation(_))
        );

        let moderator = Actor::new(3, Role::Moderator);
        assert_matches!(
            check_role_assignment(Some(&moderator), None, Role::Moderator),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn test_self_assignment_may_keep_or_lower_but_not_raise() {
        let moderator = Actor::new(7, Role::Moderator);
        assert!(check_role_assignment(Some(&moderator), Some(7), Role::Moderator).is_ok());
        assert!(check_role_assignment(Some(&moderator), Some(7), Role::User).is_ok());
        assert_matches!(
            check_role_assignment(Some(&moderator), Some(7), Role::Admin),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn test_mutation_guard_matrix() {
        for actor_role in Role::ALL {
            for target_role in Role::ALL {
                let actor = Actor::new(1, actor_role);
                let allowed = check_mutation(&actor, 2, target_role).is_ok();
                assert_eq!(
                    allowed,
                    actor_role > target_role,
                    "{actor_role} acting on {target_role}"
                );
                // Self-action is unconditional.
                assert!(check_mutation(&actor, 1, target_role).is_ok());
            }
        }
    }

    #[test]
    fn test_mutation_denial_is_forbidden() {
        let user = Actor::new(1, Role::User);
        assert_matches!(
            check_mutation(&user, 2, Role::User),
            Err(CoreError::Forbidden(_))
        );
    }
}
