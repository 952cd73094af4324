use std::sync::Arc;

use chrono::NaiveDate;
use uuid::Uuid;

use engine::{
    Engine, EngineError, LocalStore, ProgramNewCmd, ProgramStatus, VolunteerNewCmd,
    VolunteerStatus, VolunteerUpdateCmd,
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

async fn seed_program(engine: &Engine, title: &str) -> Uuid {
    engine
        .create_program(ProgramNewCmd {
            title: title.to_string(),
            description: "".to_string(),
            category: "Education".to_string(),
            location: "Lima".to_string(),
            manager: "Bea".to_string(),
            start_date: date(2025, 1, 1),
            end_date: date(2025, 12, 31),
            target_minor: 5_000_00,
            status: ProgramStatus::Active,
            is_featured: false,
            image_url: None,
            tags: Vec::new(),
        })
        .await
        .unwrap()
}

fn volunteer_cmd(program_id: Uuid, name: &str, status: VolunteerStatus) -> VolunteerNewCmd {
    VolunteerNewCmd {
        program_id,
        name: name.to_string(),
        email: format!("{}@example.com", name.to_lowercase()),
        phone: None,
        role: "tutor".to_string(),
        joined_date: date(2025, 3, 10),
        status,
    }
}

#[tokio::test]
async fn count_is_recomputed_not_incremented() {
    let engine = engine_with_store();
    let program_id = seed_program(&engine, "Tutoring").await;

    for name in ["Ana", "Ben", "Cam"] {
        engine
            .create_volunteer(volunteer_cmd(program_id, name, VolunteerStatus::Active))
            .await
            .unwrap();
    }
    engine
        .create_volunteer(volunteer_cmd(program_id, "Dee", VolunteerStatus::Inactive))
        .await
        .unwrap();

    assert_eq!(engine.program(program_id).await.unwrap().volunteers, 3);
}

#[tokio::test]
async fn delete_refreshes_the_count() {
    let engine = engine_with_store();
    let program_id = seed_program(&engine, "Tutoring").await;

    let ana = engine
        .create_volunteer(volunteer_cmd(program_id, "Ana", VolunteerStatus::Active))
        .await
        .unwrap();
    engine
        .create_volunteer(volunteer_cmd(program_id, "Ben", VolunteerStatus::Active))
        .await
        .unwrap();
    assert_eq!(engine.program(program_id).await.unwrap().volunteers, 2);

    engine.delete_volunteer(ana).await.unwrap();
    assert_eq!(engine.program(program_id).await.unwrap().volunteers, 1);
}

#[tokio::test]
async fn deactivation_refreshes_the_count() {
    let engine = engine_with_store();
    let program_id = seed_program(&engine, "Tutoring").await;

    let ana = engine
        .create_volunteer(volunteer_cmd(program_id, "Ana", VolunteerStatus::Active))
        .await
        .unwrap();
    assert_eq!(engine.program(program_id).await.unwrap().volunteers, 1);

    engine
        .update_volunteer(
            ana,
            VolunteerUpdateCmd {
                status: Some(VolunteerStatus::Inactive),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(engine.program(program_id).await.unwrap().volunteers, 0);
}

#[tokio::test]
async fn moving_between_programs_recounts_both() {
    let engine = engine_with_store();
    let first = seed_program(&engine, "Tutoring").await;
    let second = seed_program(&engine, "Meals").await;

    let ana = engine
        .create_volunteer(volunteer_cmd(first, "Ana", VolunteerStatus::Active))
        .await
        .unwrap();
    assert_eq!(engine.program(first).await.unwrap().volunteers, 1);
    assert_eq!(engine.program(second).await.unwrap().volunteers, 0);

    engine
        .update_volunteer(
            ana,
            VolunteerUpdateCmd {
                program_id: Some(second),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(engine.program(first).await.unwrap().volunteers, 0);
    assert_eq!(engine.program(second).await.unwrap().volunteers, 1);
}

#[tokio::test]
async fn create_fails_for_missing_program() {
    let engine = engine_with_store();
    let err = engine
        .create_volunteer(volunteer_cmd(Uuid::new_v4(), "Ana", VolunteerStatus::Active))
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::NotFound("program".to_string()));
}
