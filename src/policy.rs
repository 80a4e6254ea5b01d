//! Authorization decision table for protected mutations.
//!
//! The rules differ per resource on purpose: objects are owner-or-admin,
//! user updates are self-or-admin-partial, user deletes are self-only with
//! no admin override, and places only require an authenticated caller.
//! Keeping every variant in one table keeps the asymmetry visible instead
//! of scattered through the handlers.

use uuid::Uuid;

/// The acting identity, with its admin flag already resolved by the caller.
#[derive(Debug, Clone, Copy)]
pub struct Actor {
    pub id: Uuid,
    pub admin: bool,
}

/// A protected mutation, keyed by resource kind.
#[derive(Debug, Clone, Copy)]
pub enum ProtectedAction {
    /// Update or delete an object owned by `owner`.
    ObjectMutate { owner: Uuid },
    /// Update the account of `target`.
    UserUpdate { target: Uuid },
    /// Delete the account of `target`.
    UserDelete { target: Uuid },
    /// Create, update, or delete any place.
    PlaceMutate,
}

/// Outcome of an authorization check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    /// Admin acting on another user's account: only the admin flag may be
    /// changed, every other field is left untouched.
    AllowAdminFlagOnly,
    Deny,
}

pub fn authorize(actor: Actor, action: ProtectedAction) -> Decision {
    use ProtectedAction::*;

    match action {
        ObjectMutate { owner } if actor.id == owner || actor.admin => Decision::Allow,
        ObjectMutate { .. } => Decision::Deny,

        UserUpdate { target } if actor.id == target => Decision::Allow,
        UserUpdate { .. } if actor.admin => Decision::AllowAdminFlagOnly,
        UserUpdate { .. } => Decision::Deny,

        // Deliberately no admin override: only the account holder may
        // delete the account.
        UserDelete { target } if actor.id == target => Decision::Allow,
        UserDelete { .. } => Decision::Deny,

        // Any authenticated user may alter any place.
        PlaceMutate => Decision::Allow,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> Actor {
        Actor {
            id: Uuid::new_v4(),
            admin: false,
        }
    }

    fn admin() -> Actor {
        Actor {
            id: Uuid::new_v4(),
            admin: true,
        }
    }

    #[test]
    fn test_object_mutate_owner_or_admin() {
        let owner = user();
        let action = ProtectedAction::ObjectMutate { owner: owner.id };

        assert_eq!(authorize(owner, action), Decision::Allow);
        assert_eq!(authorize(admin(), action), Decision::Allow);
        assert_eq!(authorize(user(), action), Decision::Deny);
    }

    #[test]
    fn test_user_update_self_full() {
        let actor = user();
        assert_eq!(
            authorize(actor, ProtectedAction::UserUpdate { target: actor.id }),
            Decision::Allow
        );
    }

    #[test]
    fn test_user_update_other_admin_flag_only() {
        let target = user();
        assert_eq!(
            authorize(admin(), ProtectedAction::UserUpdate { target: target.id }),
            Decision::AllowAdminFlagOnly
        );
        assert_eq!(
            authorize(user(), ProtectedAction::UserUpdate { target: target.id }),
            Decision::Deny
        );
    }

    #[test]
    fn test_admin_updating_self_keeps_full_access() {
        let actor = admin();
        assert_eq!(
            authorize(actor, ProtectedAction::UserUpdate { target: actor.id }),
            Decision::Allow
        );
    }

    #[test]
    fn test_user_delete_self_only_no_admin_override() {
        let target = user();
        assert_eq!(
            authorize(target, ProtectedAction::UserDelete { target: target.id }),
            Decision::Allow
        );
        // An admin deleting somebody else is still denied.
        assert_eq!(
            authorize(admin(), ProtectedAction::UserDelete { target: target.id }),
            Decision::Deny
        );
        assert_eq!(
            authorize(user(), ProtectedAction::UserDelete { target: target.id }),
            Decision::Deny
        );
    }

    #[test]
    fn test_place_mutate_any_authenticated_user() {
        assert_eq!(authorize(user(), ProtectedAction::PlaceMutate), Decision::Allow);
        assert_eq!(authorize(admin(), ProtectedAction::PlaceMutate), Decision::Allow);
    }
}
