use std::sync::Arc;

use chrono::{DateTime, Days, NaiveDate, TimeZone, Utc};
use uuid::Uuid;

use engine::{
    DonationNewCmd, DonationStatus, Engine, LocalStore, ProgramNewCmd, ProgramStatus, ReportRange,
    VolunteerNewCmd, VolunteerStatus,
};

fn engine_with_store() -> Engine {
    Engine::builder()
        .store(Arc::new(LocalStore::in_memory()))
        .build()
        .unwrap()
}

fn anchor() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap()
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

async fn seed_program(engine: &Engine, title: &str, category: &str) -> Uuid {
    engine
        .create_program(ProgramNewCmd {
            title: title.to_string(),
            description: "".to_string(),
            category: category.to_string(),
            location: "Accra".to_string(),
            manager: "Kofi".to_string(),
            start_date: date(2025, 1, 1),
            end_date: date(2025, 12, 31),
            target_minor: 10_000_00,
            status: ProgramStatus::Active,
            is_featured: false,
            image_url: None,
            tags: Vec::new(),
        })
        .await
        .unwrap()
}

fn donation_on(program_id: Uuid, amount_minor: i64, date: NaiveDate) -> DonationNewCmd {
    DonationNewCmd {
        program_id,
        donor_id: "donor-1".to_string(),
        donor_name: "Alice".to_string(),
        amount_minor,
        date,
        status: DonationStatus::Completed,
        payment_method: "card".to_string(),
        is_anonymous: false,
        note: None,
        idempotency_key: None,
    }
}

#[tokio::test]
async fn last7days_window_filters_by_donation_date() {
    let engine = engine_with_store();
    let program_id = seed_program(&engine, "Clean Water", "Water").await;
    let now = anchor();
    let today = now.date_naive();

    let eight_days_ago = today.checked_sub_days(Days::new(8)).unwrap();
    let two_days_ago = today.checked_sub_days(Days::new(2)).unwrap();
    engine
        .create_donation(donation_on(program_id, 100_00, eight_days_ago))
        .await
        .unwrap();
    engine
        .create_donation(donation_on(program_id, 200_00, two_days_ago))
        .await
        .unwrap();

    let report = engine
        .donations_report(ReportRange::Last7Days, now)
        .await
        .unwrap();
    assert_eq!(report.count, 1);
    assert_eq!(report.rows[0].date, two_days_ago);
    assert_eq!(report.total_minor, 200_00);

    let unbounded = engine
        .donations_report(ReportRange::All, now)
        .await
        .unwrap();
    assert_eq!(unbounded.count, 2);
    assert_eq!(unbounded.total_minor, 300_00);
}

#[tokio::test]
async fn donation_rows_resolve_donor_and_program_labels() {
    let engine = engine_with_store();
    let program_id = seed_program(&engine, "Clean Water", "Water").await;

    let mut anonymous = donation_on(program_id, 50_00, date(2025, 6, 14));
    anonymous.is_anonymous = true;
    engine.create_donation(anonymous).await.unwrap();

    let report = engine
        .donations_report(ReportRange::All, anchor())
        .await
        .unwrap();
    assert_eq!(report.rows[0].donor, "Anonymous");
    assert_eq!(report.rows[0].program, "Clean Water");
}

#[tokio::test]
async fn summary_aggregates_by_category() {
    let engine = engine_with_store();
    let water = seed_program(&engine, "Clean Water", "Water").await;
    let school = seed_program(&engine, "School Kits", "Education").await;

    engine
        .create_donation(donation_on(water, 300_00, date(2025, 6, 1)))
        .await
        .unwrap();
    engine
        .create_donation(donation_on(school, 100_00, date(2025, 6, 2)))
        .await
        .unwrap();
    // Pending donations are listed but never counted as raised.
    let mut pending = donation_on(school, 900_00, date(2025, 6, 3));
    pending.status = DonationStatus::Pending;
    engine.create_donation(pending).await.unwrap();

    engine
        .create_volunteer(VolunteerNewCmd {
            program_id: water,
            name: "Ana".to_string(),
            email: "ana@example.com".to_string(),
            phone: None,
            role: "driver".to_string(),
            joined_date: date(2025, 2, 1),
            status: VolunteerStatus::Active,
        })
        .await
        .unwrap();

    let summary = engine.summary().await.unwrap();
    assert_eq!(summary.total_raised_minor, 400_00);
    assert_eq!(summary.donation_count, 3);
    assert_eq!(summary.active_programs, 2);
    assert_eq!(summary.active_volunteers, 1);

    assert_eq!(summary.by_category[0].category, "Water");
    assert_eq!(summary.by_category[0].raised_minor, 300_00);
    assert!((summary.by_category[0].share_pct - 75.0).abs() < 1e-9);
    assert_eq!(summary.by_category[1].category, "Education");
    assert!((summary.by_category[1].share_pct - 25.0).abs() < 1e-9);
}

#[tokio::test]
async fn programs_report_computes_progress() {
    let engine = engine_with_store();
    let program_id = seed_program(&engine, "Clean Water", "Water").await;
    engine
        .create_donation(donation_on(program_id, 2_500_00, date(2025, 6, 1)))
        .await
        .unwrap();

    let rows = engine.programs_report().await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].raised_minor, 2_500_00);
    assert!((rows[0].progress_pct - 25.0).abs() < 1e-9);
}

#[tokio::test]
async fn volunteers_report_labels_orphans() {
    let engine = engine_with_store();
    let program_id = seed_program(&engine, "Clean Water", "Water").await;
    engine
        .create_volunteer(VolunteerNewCmd {
            program_id,
            name: "Ana".to_string(),
            email: "ana@example.com".to_string(),
            phone: Some("123".to_string()),
            role: "driver".to_string(),
            joined_date: date(2025, 2, 1),
            status: VolunteerStatus::Active,
        })
        .await
        .unwrap();
    engine.delete_program(program_id).await.unwrap();

    let rows = engine.volunteers_report().await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].program, "(deleted program)");
}
