//! Role-mutation authorization rules.
//!
//! Pure and total: no I/O, no clock, no ambient state. [`RoleService`]
//! (the only caller that mutates anything) evaluates these against the
//! target's stored role before touching storage.
//!
//! [`RoleService`]: crate::roles::RoleService

use covera_core::error::DenyReason;
use covera_core::models::role::{Actor, Role};
use uuid::Uuid;

/// May `actor` set the role of `target_id`, where `role` is either the
/// target's current role or the role being assigned?
///
/// Rules, evaluated in order:
/// 1. nobody may modify their own role;
/// 2. devs may modify anyone else;
/// 3. admins may modify accounts as long as the role involved is not
///    itself dev or admin;
/// 4. users and customers may not mutate roles at all.
///
/// Note this is not a strict privilege ladder — `User` and `Customer` are
/// equally unprivileged here.
pub fn can_change_role(actor: &Actor, target_id: Uuid, role: Role) -> bool {
    if actor.id == target_id {
        return false;
    }
    match actor.role {
        Role::Dev => true,
        Role::Admin => !role.is_protected(),
        Role::User | Role::Customer => false,
    }
}

/// Reasoned authorization for a concrete role change: the target's current
/// role and the requested role must both pass [`can_change_role`], and the
/// first failing rule names the reason so the caller can render a specific
/// message.
pub fn authorize_role_change(
    actor: &Actor,
    target_id: Uuid,
    current_role: Role,
    new_role: Role,
) -> Result<(), DenyReason> {
    if actor.id == target_id {
        return Err(DenyReason::SelfChange);
    }
    match actor.role {
        Role::Dev => Ok(()),
        Role::Admin => {
            if current_role.is_protected() || new_role.is_protected() {
                Err(DenyReason::ProtectedTarget)
            } else {
                Ok(())
            }
        }
        Role::User | Role::Customer => Err(DenyReason::InsufficientRole),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_ROLES: [Role; 4] = [Role::Dev, Role::Admin, Role::User, Role::Customer];

    fn actor(role: Role) -> Actor {
        Actor {
            id: Uuid::new_v4(),
            role,
        }
    }

    #[test]
    fn nobody_may_change_their_own_role() {
        for role in ALL_ROLES {
            let a = actor(role);
            for target_role in ALL_ROLES {
                assert!(!can_change_role(&a, a.id, target_role), "{role:?}");
            }
        }
    }

    #[test]
    fn self_change_is_reported_first_even_for_devs() {
        let a = actor(Role::Dev);
        assert_eq!(
            authorize_role_change(&a, a.id, Role::Dev, Role::Customer),
            Err(DenyReason::SelfChange)
        );
    }

    #[test]
    fn dev_may_change_anyone_else() {
        let a = actor(Role::Dev);
        for role in ALL_ROLES {
            assert!(can_change_role(&a, Uuid::new_v4(), role), "{role:?}");
        }
    }

    #[test]
    fn admin_may_manage_unprivileged_accounts() {
        let a = actor(Role::Admin);
        assert!(can_change_role(&a, Uuid::new_v4(), Role::User));
        assert!(can_change_role(&a, Uuid::new_v4(), Role::Customer));
    }

    #[test]
    fn admin_may_not_touch_protected_roles() {
        let a = actor(Role::Admin);
        assert!(!can_change_role(&a, Uuid::new_v4(), Role::Dev));
        assert!(!can_change_role(&a, Uuid::new_v4(), Role::Admin));
    }

    #[test]
    fn admin_demoting_a_dev_is_a_protected_target() {
        // The current role matters even when the requested role is
        // harmless: an admin may not demote a dev to customer.
        let a = actor(Role::Admin);
        assert_eq!(
            authorize_role_change(&a, Uuid::new_v4(), Role::Dev, Role::Customer),
            Err(DenyReason::ProtectedTarget)
        );
    }

    #[test]
    fn admin_minting_an_admin_is_a_protected_target() {
        let a = actor(Role::Admin);
        assert_eq!(
            authorize_role_change(&a, Uuid::new_v4(), Role::Customer, Role::Admin),
            Err(DenyReason::ProtectedTarget)
        );
    }

    #[test]
    fn unprivileged_actors_are_rejected_outright() {
        for role in [Role::User, Role::Customer] {
            let a = actor(role);
            assert_eq!(
                authorize_role_change(&a, Uuid::new_v4(), Role::Customer, Role::User),
                Err(DenyReason::InsufficientRole),
                "{role:?}"
            );
        }
    }

    #[test]
    fn reasoned_and_boolean_forms_agree() {
        for actor_role in ALL_ROLES {
            let a = actor(actor_role);
            let target = Uuid::new_v4();
            for current in ALL_ROLES {
                for new in ALL_ROLES {
                    let allowed = can_change_role(&a, target, current)
                        && can_change_role(&a, target, new);
                    assert_eq!(
                        authorize_role_change(&a, target, current, new).is_ok(),
                        allowed,
                        "{actor_role:?} {current:?} -> {new:?}"
                    );
                }
            }
        }
    }
}
