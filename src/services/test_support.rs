use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use chrono::NaiveDate;

use crate::config::Config;
use crate::db::{
    AssignmentRepository, CreateDay, CreateMicSession, Day, DayRepository, MicAssignment,
    MicSession, SessionRepository,
};
use crate::services::init::init_memory_db;
use crate::AppState;

static NEXT_DAY: AtomicU32 = AtomicU32::new(0);

pub async fn test_state() -> Arc<AppState> {
    let db = init_memory_db().await.unwrap();
    let mut config = Config::default();
    config.media.root = std::env::temp_dir().join("mic-tracker-test-media");
    Arc::new(AppState { db, config })
}

/// A fresh day holding one session with `num_mics` assignments.
pub async fn seed_session(
    state: &Arc<AppState>,
    num_mics: i64,
) -> (Day, MicSession, Vec<MicAssignment>) {
    let offset = NEXT_DAY.fetch_add(1, Ordering::SeqCst);
    let date = NaiveDate::from_ymd_opt(2030, 1, 1)
        .unwrap()
        .checked_add_days(chrono::Days::new(offset as u64))
        .unwrap();

    let day = DayRepository::create(
        &state.db,
        &CreateDay {
            date,
            name: String::new(),
        },
    )
    .await
    .unwrap();

    let mut tx = state.db.begin().await.unwrap();
    let session = SessionRepository::create(
        &mut *tx,
        &CreateMicSession {
            day_id: day.id,
            name: "General Session".to_string(),
            location: "Main Hall".to_string(),
            num_mics,
        },
    )
    .await
    .unwrap();
    let assignments = AssignmentRepository::create_for_session(&mut *tx, session.id, num_mics)
        .await
        .unwrap();
    tx.commit().await.unwrap();

    (day, session, assignments)
}
