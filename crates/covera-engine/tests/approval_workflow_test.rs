//! Integration tests for the warranty approval workflow.

use chrono::{Duration, Utc};
use covera_core::error::CoveraError;
use covera_core::models::warranty::{
    ApprovalDecision, ApprovalStatus, CreateWarranty, EffectiveStatus, WarrantyStatus,
};
use covera_core::repository::WarrantyRepository;
use covera_db::repository::SurrealWarrantyRepository;
use covera_engine::ApprovalService;
use surrealdb::Surreal;
use surrealdb::engine::local::Mem;
use uuid::Uuid;

type Db = surrealdb::engine::local::Db;

async fn setup() -> (ApprovalService<SurrealWarrantyRepository<Db>>, SurrealWarrantyRepository<Db>)
{
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    covera_db::run_migrations(&db).await.unwrap();

    let repo = SurrealWarrantyRepository::new(db.clone());
    (ApprovalService::new(SurrealWarrantyRepository::new(db)), repo)
}

async fn pending_warranty(repo: &SurrealWarrantyRepository<Db>, days_left: i64) -> Uuid {
    let now = Utc::now();
    repo.create(CreateWarranty {
        user_id: Uuid::new_v4(),
        address_id: Uuid::new_v4(),
        warranty_type_id: Uuid::new_v4(),
        warranty_start: now - Duration::days(30),
        warranty_end: now + Duration::days(days_left),
        status: WarrantyStatus::Active,
    })
    .await
    .unwrap()
    .id
}

#[tokio::test]
async fn approval_stamps_decider_and_time() {
    let (svc, repo) = setup().await;
    let warranty_id = pending_warranty(&repo, 365).await;
    let approver = Uuid::new_v4();

    let decided = svc
        .decide(warranty_id, approver, ApprovalDecision::Approved)
        .await
        .unwrap();

    assert_eq!(decided.approval_status, ApprovalStatus::Approved);
    assert_eq!(decided.approved_by_id, Some(approver));
    assert!(decided.approved_at.is_some());
    assert_eq!(decided.effective_status(Utc::now()), EffectiveStatus::Active);
}

#[tokio::test]
async fn rejection_stamps_the_decider_too() {
    let (svc, repo) = setup().await;
    let warranty_id = pending_warranty(&repo, 365).await;
    let approver = Uuid::new_v4();

    let decided = svc
        .decide(warranty_id, approver, ApprovalDecision::Rejected)
        .await
        .unwrap();

    assert_eq!(decided.approval_status, ApprovalStatus::Rejected);
    assert_eq!(decided.approved_by_id, Some(approver));
    assert!(decided.approved_at.is_some());
    // Rejection outranks the healthy date range.
    assert_eq!(
        decided.effective_status(Utc::now()),
        EffectiveStatus::Rejected
    );
}

#[tokio::test]
async fn second_decision_reports_already_decided() {
    let (svc, repo) = setup().await;
    let warranty_id = pending_warranty(&repo, 365).await;

    svc.decide(warranty_id, Uuid::new_v4(), ApprovalDecision::Approved)
        .await
        .unwrap();

    let err = svc
        .decide(warranty_id, Uuid::new_v4(), ApprovalDecision::Rejected)
        .await
        .unwrap_err();
    assert!(
        matches!(err, CoveraError::AlreadyDecided { warranty_id: id } if id == warranty_id),
        "{err:?}"
    );

    // The first decision stands.
    let stored = repo.get(warranty_id).await.unwrap();
    assert_eq!(stored.approval_status, ApprovalStatus::Approved);
}

#[tokio::test]
async fn concurrent_decisions_elect_exactly_one_winner() {
    let (svc, repo) = setup().await;
    let warranty_id = pending_warranty(&repo, 365).await;
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();

    let (approve, reject) = tokio::join!(
        svc.decide(warranty_id, alice, ApprovalDecision::Approved),
        svc.decide(warranty_id, bob, ApprovalDecision::Rejected),
    );

    // However the two sessions interleave, they cannot both commit.
    assert!(
        !(approve.is_ok() && reject.is_ok()),
        "both concurrent decisions committed"
    );

    let stored = repo.get(warranty_id).await.unwrap();
    if approve.is_ok() {
        assert_eq!(stored.approval_status, ApprovalStatus::Approved);
        assert_eq!(stored.approved_by_id, Some(alice));
    }
    if reject.is_ok() {
        assert_eq!(stored.approval_status, ApprovalStatus::Rejected);
        assert_eq!(stored.approved_by_id, Some(bob));
    }
    for result in [approve, reject] {
        if let Err(err) = result {
            assert!(
                matches!(
                    err,
                    CoveraError::AlreadyDecided { .. } | CoveraError::Storage(_)
                ),
                "{err:?}"
            );
        }
    }
}

#[tokio::test]
async fn pending_queue_lists_undecided_warranties_oldest_first() {
    let (svc, repo) = setup().await;
    let first = pending_warranty(&repo, 100).await;
    let second = pending_warranty(&repo, 200).await;

    let queue = svc.pending_queue().await.unwrap();
    assert_eq!(queue.len(), 2);
    assert_eq!(queue[0].id, first);

    svc.decide(first, Uuid::new_v4(), ApprovalDecision::Approved)
        .await
        .unwrap();

    let queue = svc.pending_queue().await.unwrap();
    assert_eq!(queue.len(), 1);
    assert_eq!(queue[0].id, second);
}

#[tokio::test]
async fn undecided_warranty_displays_as_pending_regardless_of_dates() {
    let (_svc, repo) = setup().await;
    // Ends within the expiring window, but the approval state wins.
    let warranty_id = pending_warranty(&repo, 10).await;

    let stored = repo.get(warranty_id).await.unwrap();
    assert_eq!(stored.effective_status(Utc::now()), EffectiveStatus::Pending);
}
