use std::sync::Arc;

use chrono::NaiveDate;
use uuid::Uuid;

use engine::{
    DonationListFilter, DonationNewCmd, DonationStatus, DonationUpdateCmd, Engine, EngineError,
    LocalStore, ProgramNewCmd, ProgramStatus, RegisterProfileCmd, UserRole, UserUpdateCmd,
};

fn engine_with_store() -> Engine {
    Engine::builder()
        .store(Arc::new(LocalStore::in_memory()))
        .build()
        .unwrap()
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

async fn seed_program(engine: &Engine, target_minor: i64) -> Uuid {
    engine
        .create_program(ProgramNewCmd {
            title: "Clean Water".to_string(),
            description: "Wells for rural communities".to_string(),
            category: "Water".to_string(),
            location: "Kisumu".to_string(),
            manager: "Ada".to_string(),
            start_date: date(2025, 1, 1),
            end_date: date(2025, 12, 31),
            target_minor,
            status: ProgramStatus::Active,
            is_featured: false,
            image_url: None,
            tags: Vec::new(),
        })
        .await
        .unwrap()
}

fn donation_cmd(program_id: Uuid, amount_minor: i64) -> DonationNewCmd {
    DonationNewCmd {
        program_id,
        donor_id: "donor-1".to_string(),
        donor_name: "Alice".to_string(),
        amount_minor,
        date: date(2025, 6, 1),
        status: DonationStatus::Completed,
        payment_method: "card".to_string(),
        is_anonymous: false,
        note: None,
        idempotency_key: None,
    }
}

#[tokio::test]
async fn create_and_delete_reconcile_raised() {
    let engine = engine_with_store();
    let program_id = seed_program(&engine, 10_000_00).await;

    let first = engine
        .create_donation(donation_cmd(program_id, 2_500_00))
        .await
        .unwrap();
    assert_eq!(engine.program(program_id).await.unwrap().raised_minor, 2_500_00);

    engine
        .create_donation(donation_cmd(program_id, 1_500_00))
        .await
        .unwrap();
    assert_eq!(engine.program(program_id).await.unwrap().raised_minor, 4_000_00);

    engine.delete_donation(first).await.unwrap();
    assert_eq!(engine.program(program_id).await.unwrap().raised_minor, 1_500_00);
}

#[tokio::test]
async fn create_fails_for_missing_program() {
    let engine = engine_with_store();
    let err = engine
        .create_donation(donation_cmd(Uuid::new_v4(), 1_000))
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::NotFound("program".to_string()));
}

#[tokio::test]
async fn create_rejects_non_positive_amounts() {
    let engine = engine_with_store();
    let program_id = seed_program(&engine, 10_000_00).await;
    for amount in [0, -5_00] {
        let err = engine
            .create_donation(donation_cmd(program_id, amount))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidAmount(_)));
    }
}

#[tokio::test]
async fn update_amount_adjusts_raised_by_delta() {
    let engine = engine_with_store();
    let program_id = seed_program(&engine, 10_000_00).await;
    let donation_id = engine
        .create_donation(donation_cmd(program_id, 1_000_00))
        .await
        .unwrap();

    engine
        .update_donation(
            donation_id,
            DonationUpdateCmd {
                amount_minor: Some(250_00),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(engine.program(program_id).await.unwrap().raised_minor, 250_00);

    // A metadata-only update must leave the total untouched.
    engine
        .update_donation(
            donation_id,
            DonationUpdateCmd {
                note: Some("matched by employer".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(engine.program(program_id).await.unwrap().raised_minor, 250_00);
}

#[tokio::test]
async fn delete_floors_raised_at_zero() {
    let engine = engine_with_store();
    let program_id = seed_program(&engine, 10_000_00).await;

    // A pending donation is counted incrementally, but a recompute (which
    // sums completed donations only) resets the total, creating drift.
    let mut cmd = donation_cmd(program_id, 1_000_00);
    cmd.status = DonationStatus::Pending;
    let donation_id = engine.create_donation(cmd).await.unwrap();
    engine.recompute_raised(program_id).await.unwrap();
    assert_eq!(engine.program(program_id).await.unwrap().raised_minor, 0);

    engine.delete_donation(donation_id).await.unwrap();
    assert_eq!(engine.program(program_id).await.unwrap().raised_minor, 0);
}

#[tokio::test]
async fn duplicate_submit_without_key_double_counts() {
    // Documented current behavior, not a bug to silently fix: two identical
    // submits without an idempotency key create two documents.
    let engine = engine_with_store();
    let program_id = seed_program(&engine, 10_000_00).await;

    engine
        .create_donation(donation_cmd(program_id, 500_00))
        .await
        .unwrap();
    engine
        .create_donation(donation_cmd(program_id, 500_00))
        .await
        .unwrap();

    assert_eq!(engine.program(program_id).await.unwrap().raised_minor, 1_000_00);
    let listed = engine
        .list_donations(DonationListFilter {
            program_id: Some(program_id),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(listed.len(), 2);
}

#[tokio::test]
async fn duplicate_submit_with_key_counts_once() {
    let engine = engine_with_store();
    let program_id = seed_program(&engine, 10_000_00).await;

    let mut cmd = donation_cmd(program_id, 500_00);
    cmd.idempotency_key = Some("form-submit-42".to_string());
    let first = engine.create_donation(cmd.clone()).await.unwrap();
    let second = engine.create_donation(cmd).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(engine.program(program_id).await.unwrap().raised_minor, 500_00);
    let listed = engine
        .list_donations(DonationListFilter {
            program_id: Some(program_id),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(listed.len(), 1);
}

#[tokio::test]
async fn donor_avatar_is_denormalized_best_effort() {
    let engine = engine_with_store();
    let program_id = seed_program(&engine, 10_000_00).await;

    engine
        .register_profile(RegisterProfileCmd {
            uid: "donor-1".to_string(),
            name: "Alice".to_string(),
            email: "alice@example.com".to_string(),
            role: UserRole::Donor,
        })
        .await
        .unwrap();
    engine
        .update_profile(
            "donor-1",
            UserUpdateCmd {
                avatar: Some("https://cdn.example.com/a.png".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let donation_id = engine
        .create_donation(donation_cmd(program_id, 100_00))
        .await
        .unwrap();
    let donation = engine.donation(donation_id).await.unwrap();
    assert_eq!(
        donation.donor_avatar.as_deref(),
        Some("https://cdn.example.com/a.png")
    );

    // Anonymous donations never carry the avatar.
    let mut anonymous = donation_cmd(program_id, 100_00);
    anonymous.is_anonymous = true;
    let donation_id = engine.create_donation(anonymous).await.unwrap();
    assert!(engine.donation(donation_id).await.unwrap().donor_avatar.is_none());
}

#[tokio::test]
async fn recompute_corrects_incremental_drift() {
    let engine = engine_with_store();
    let program_id = seed_program(&engine, 10_000_00).await;

    engine
        .create_donation(donation_cmd(program_id, 1_000_00))
        .await
        .unwrap();
    let mut pending = donation_cmd(program_id, 500_00);
    pending.status = DonationStatus::Pending;
    engine.create_donation(pending).await.unwrap();

    // The incremental path counts every donation; recompute sums completed
    // donations only.
    assert_eq!(engine.program(program_id).await.unwrap().raised_minor, 1_500_00);
    let recomputed = engine.recompute_raised(program_id).await.unwrap();
    assert_eq!(recomputed, 1_000_00);
    assert_eq!(engine.program(program_id).await.unwrap().raised_minor, 1_000_00);
}

#[tokio::test]
async fn recent_donations_feed_pushes_refreshes() {
    let engine = engine_with_store();
    let program_id = seed_program(&engine, 10_000_00).await;

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let feed = engine.subscribe_recent_donations(5, move |recent| {
        let _ = tx.send(recent.len());
    });

    let initial = rx.recv().await.unwrap();
    assert_eq!(initial, 0);

    engine
        .create_donation(donation_cmd(program_id, 100_00))
        .await
        .unwrap();
    let refreshed = rx.recv().await.unwrap();
    assert_eq!(refreshed, 1);

    feed.unsubscribe();
}
