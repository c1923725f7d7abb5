//! Integration tests for the role assignment service.

use covera_core::error::{CoveraError, DenyReason};
use covera_core::models::role::{Actor, Role};
use covera_db::repository::SurrealRoleDirectory;
use covera_engine::RoleService;
use surrealdb::Surreal;
use surrealdb::engine::local::Mem;
use uuid::Uuid;

async fn setup() -> RoleService<SurrealRoleDirectory<surrealdb::engine::local::Db>> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    covera_db::run_migrations(&db).await.unwrap();
    RoleService::new(SurrealRoleDirectory::new(db))
}

fn actor(role: Role) -> Actor {
    Actor {
        id: Uuid::new_v4(),
        role,
    }
}

/// Seed a stored role through the service itself, acting as a dev.
async fn seed_role(
    svc: &RoleService<SurrealRoleDirectory<surrealdb::engine::local::Db>>,
    user_id: Uuid,
    role: Role,
) {
    let dev = actor(Role::Dev);
    svc.change_role(&dev, user_id, role).await.unwrap();
}

#[tokio::test]
async fn admin_cannot_change_own_role() {
    let svc = setup().await;
    let admin = actor(Role::Admin);

    let err = svc
        .change_role(&admin, admin.id, Role::Admin)
        .await
        .unwrap_err();
    assert!(
        matches!(
            err,
            CoveraError::PermissionDenied {
                reason: DenyReason::SelfChange
            }
        ),
        "{err:?}"
    );
}

#[tokio::test]
async fn admin_cannot_demote_a_dev_account() {
    let svc = setup().await;
    let dev_user = Uuid::new_v4();
    seed_role(&svc, dev_user, Role::Dev).await;

    let admin = actor(Role::Admin);
    let err = svc
        .change_role(&admin, dev_user, Role::Customer)
        .await
        .unwrap_err();
    assert!(
        matches!(
            err,
            CoveraError::PermissionDenied {
                reason: DenyReason::ProtectedTarget
            }
        ),
        "{err:?}"
    );

    // The stored role is untouched.
    assert_eq!(svc.role_of(dev_user).await.unwrap(), Role::Dev);
}

#[tokio::test]
async fn admin_cannot_mint_another_admin() {
    let svc = setup().await;
    let admin = actor(Role::Admin);

    let err = svc
        .change_role(&admin, Uuid::new_v4(), Role::Admin)
        .await
        .unwrap_err();
    assert!(
        matches!(
            err,
            CoveraError::PermissionDenied {
                reason: DenyReason::ProtectedTarget
            }
        ),
        "{err:?}"
    );
}

#[tokio::test]
async fn admin_promotes_a_customer_to_user() {
    let svc = setup().await;
    let admin = actor(Role::Admin);
    let target = Uuid::new_v4();

    let record = svc.change_role(&admin, target, Role::User).await.unwrap();
    assert_eq!(record.old_role, Role::Customer);
    assert_eq!(record.new_role, Role::User);
    assert_eq!(record.changed_by_id, admin.id);

    assert_eq!(svc.role_of(target).await.unwrap(), Role::User);
    assert_eq!(svc.history(target).await.unwrap().len(), 1);
}

#[tokio::test]
async fn dev_may_manage_protected_accounts() {
    let svc = setup().await;
    let admin_user = Uuid::new_v4();
    seed_role(&svc, admin_user, Role::Admin).await;

    let dev = actor(Role::Dev);
    let record = svc
        .change_role(&dev, admin_user, Role::Customer)
        .await
        .unwrap();
    assert_eq!(record.old_role, Role::Admin);
    assert_eq!(svc.role_of(admin_user).await.unwrap(), Role::Customer);
}

#[tokio::test]
async fn unprivileged_actors_cannot_reach_the_directory() {
    let svc = setup().await;

    for role in [Role::User, Role::Customer] {
        let a = actor(role);
        let err = svc
            .change_role(&a, Uuid::new_v4(), Role::User)
            .await
            .unwrap_err();
        assert!(
            matches!(
                err,
                CoveraError::PermissionDenied {
                    reason: DenyReason::InsufficientRole
                }
            ),
            "{role:?}: {err:?}"
        );
    }
}

#[tokio::test]
async fn denied_attempts_leave_no_audit_record() {
    let svc = setup().await;
    let admin = actor(Role::Admin);
    let target = Uuid::new_v4();

    let _ = svc.change_role(&admin, target, Role::Admin).await.unwrap_err();

    assert!(svc.history(target).await.unwrap().is_empty());
    assert!(svc.recent_changes(10).await.unwrap().is_empty());
}
