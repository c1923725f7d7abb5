//! Integration tests for the role directory using in-memory SurrealDB.

use covera_core::models::role::{NewRoleChange, Role};
use covera_core::repository::RoleDirectory;
use covera_db::repository::SurrealRoleDirectory;
use surrealdb::Surreal;
use surrealdb::engine::local::Mem;
use uuid::Uuid;

/// Helper: spin up in-memory DB and run migrations.
async fn setup() -> SurrealRoleDirectory<surrealdb::engine::local::Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    covera_db::run_migrations(&db).await.unwrap();
    SurrealRoleDirectory::new(db)
}

#[tokio::test]
async fn unassigned_user_reads_as_customer() {
    let directory = setup().await;

    let role = directory.role_of(Uuid::new_v4()).await.unwrap();
    assert_eq!(role, Role::Customer);
}

#[tokio::test]
async fn assignment_applies_role_and_appends_record() {
    let directory = setup().await;
    let target = Uuid::new_v4();
    let actor = Uuid::new_v4();

    let record = directory
        .assign_role_recorded(NewRoleChange {
            user_id: target,
            new_role: Role::Admin,
            changed_by_id: actor,
        })
        .await
        .unwrap();

    // The record reflects the transition from the implicit default.
    assert_eq!(record.user_id, target);
    assert_eq!(record.old_role, Role::Customer);
    assert_eq!(record.new_role, Role::Admin);
    assert_eq!(record.changed_by_id, actor);

    // The role itself was applied in the same unit.
    assert_eq!(directory.role_of(target).await.unwrap(), Role::Admin);

    // And the history shows exactly one record.
    let history = directory.changes_for(target).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].id, record.id);
}

#[tokio::test]
async fn reassignment_records_the_previous_role() {
    let directory = setup().await;
    let target = Uuid::new_v4();
    let actor = Uuid::new_v4();

    directory
        .assign_role_recorded(NewRoleChange {
            user_id: target,
            new_role: Role::Admin,
            changed_by_id: actor,
        })
        .await
        .unwrap();

    let second = directory
        .assign_role_recorded(NewRoleChange {
            user_id: target,
            new_role: Role::User,
            changed_by_id: actor,
        })
        .await
        .unwrap();

    assert_eq!(second.old_role, Role::Admin);
    assert_eq!(second.new_role, Role::User);
    assert_eq!(directory.role_of(target).await.unwrap(), Role::User);

    let history = directory.changes_for(target).await.unwrap();
    assert_eq!(history.len(), 2);
}

#[tokio::test]
async fn history_is_scoped_to_the_user() {
    let directory = setup().await;
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();
    let actor = Uuid::new_v4();

    directory
        .assign_role_recorded(NewRoleChange {
            user_id: alice,
            new_role: Role::User,
            changed_by_id: actor,
        })
        .await
        .unwrap();
    directory
        .assign_role_recorded(NewRoleChange {
            user_id: bob,
            new_role: Role::Admin,
            changed_by_id: actor,
        })
        .await
        .unwrap();

    let history = directory.changes_for(alice).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].user_id, alice);
}

#[tokio::test]
async fn recent_changes_respects_the_limit() {
    let directory = setup().await;
    let actor = Uuid::new_v4();

    for _ in 0..5 {
        directory
            .assign_role_recorded(NewRoleChange {
                user_id: Uuid::new_v4(),
                new_role: Role::User,
                changed_by_id: actor,
            })
            .await
            .unwrap();
    }

    let recent = directory.recent_changes(3).await.unwrap();
    assert_eq!(recent.len(), 3);
}
