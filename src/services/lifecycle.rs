//! Day and session lifecycle: create, rename, collapse, duplicate, delete.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;

use crate::db::{
    AssignmentRepository, CreateDay, CreateMicSession, Day, DayRepository, GroupColor,
    MicGroupRepository, MicSession, MicType, PresenterSlotRepository, SessionRepository,
    MAX_MICS_PER_SESSION, MIN_MICS_PER_SESSION,
};
use crate::error::{AppError, AppResult};
use crate::AppState;

const MAX_NAME: usize = 200;

pub struct LifecycleService;

impl LifecycleService {
    pub async fn create_day(state: &Arc<AppState>, date: &str, name: &str) -> AppResult<Day> {
        let date = parse_date(date)?;
        check_length("Day name", name)?;

        let day = DayRepository::create(
            &state.db,
            &CreateDay {
                date,
                name: name.trim().to_string(),
            },
        )
        .await?;

        tracing::info!("Created day {} ({})", day.id, day.date);
        Ok(day)
    }

    /// Collapse state of a day: set to `target` when given, flipped otherwise.
    pub async fn toggle_day(
        state: &Arc<AppState>,
        day_id: i64,
        target: Option<bool>,
    ) -> AppResult<bool> {
        DayRepository::update_collapsed(&state.db, day_id, target)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Day {} not found", day_id)))
    }

    pub async fn rename_day(state: &Arc<AppState>, day_id: i64, name: &str) -> AppResult<()> {
        check_length("Day name", name)?;
        if !DayRepository::rename(&state.db, day_id, name).await? {
            return Err(AppError::NotFound(format!("Day {} not found", day_id)));
        }
        tracing::info!("Renamed day {}", day_id);
        Ok(())
    }

    pub async fn delete_day(state: &Arc<AppState>, day_id: i64) -> AppResult<()> {
        if !DayRepository::delete(&state.db, day_id).await? {
            return Err(AppError::NotFound(format!("Day {} not found", day_id)));
        }
        tracing::info!("Deleted day {} and its sessions", day_id);
        Ok(())
    }

    /// Create a session at the end of its day together with `num_mics` blank assignments.
    pub async fn create_session(
        state: &Arc<AppState>,
        day_id: i64,
        name: &str,
        num_mics: i64,
        location: &str,
    ) -> AppResult<MicSession> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::Validation("Session name is required".to_string()));
        }
        check_length("Session name", name)?;
        check_length("Location", location)?;
        validate_num_mics(num_mics)?;

        let mut tx = state.db.begin().await?;
        DayRepository::find_by_id(&mut *tx, day_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Day {} not found", day_id)))?;

        let session = SessionRepository::create(
            &mut *tx,
            &CreateMicSession {
                day_id,
                name: name.to_string(),
                location: location.trim().to_string(),
                num_mics,
            },
        )
        .await?;
        AssignmentRepository::create_for_session(&mut *tx, session.id, num_mics).await?;
        tx.commit().await?;

        tracing::info!(
            "Created session {} '{}' on day {} with {} mics",
            session.id,
            session.name,
            day_id,
            num_mics
        );
        Ok(session)
    }

    /// Copy a session into the same day. Presenters, photos, shared lists, notes,
    /// mic types and groups are carried over; status flags and rotation start fresh.
    pub async fn duplicate_session(
        state: &Arc<AppState>,
        source_session_id: i64,
        target_name: &str,
    ) -> AppResult<MicSession> {
        check_length("Session name", target_name)?;

        let mut tx = state.db.begin().await?;
        let source = SessionRepository::find_by_id(&mut *tx, source_session_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Session {} not found", source_session_id))
            })?;

        let name = match target_name.trim() {
            "" => format!("{} (Copy)", source.name),
            n => n.to_string(),
        };

        let copy = SessionRepository::create(
            &mut *tx,
            &CreateMicSession {
                day_id: source.day_id,
                name,
                location: source.location.clone(),
                num_mics: source.num_mics,
            },
        )
        .await?;

        let mut group_map = HashMap::new();
        for group in MicGroupRepository::list_by_session(&mut *tx, source.id).await? {
            let color = group.color().unwrap_or(GroupColor::Blue);
            let new_group = MicGroupRepository::create(&mut *tx, copy.id, &group.name, color).await?;
            group_map.insert(group.id, new_group.id);
        }

        let originals = AssignmentRepository::list_by_session(&mut *tx, source.id).await?;
        let created =
            AssignmentRepository::create_for_session(&mut *tx, copy.id, source.num_mics).await?;

        for (from, to) in originals.iter().zip(created.iter()) {
            let slots = PresenterSlotRepository::list_by_assignment(&mut *tx, from.id).await?;

            if from.mic_type() != MicType::default() {
                AssignmentRepository::set_mic_type(&mut *tx, to.id, from.mic_type()).await?;
            }
            if !from.notes.is_empty() {
                AssignmentRepository::set_notes(&mut *tx, to.id, &from.notes).await?;
            }
            if let Some(group_id) = from.group_id.and_then(|g| group_map.get(&g).copied()) {
                AssignmentRepository::set_group(&mut *tx, to.id, Some(group_id)).await?;
            }

            if let Some(primary) = slots.iter().find(|s| s.is_primary()) {
                PresenterSlotRepository::set_primary_name(&mut *tx, to.id, &primary.presenter_name)
                    .await?;
            }
            if !from.shared().is_empty() {
                AssignmentRepository::set_shared_presenters(&mut *tx, to.id, from.shared()).await?;
                PresenterSlotRepository::sync_shared(&mut *tx, to.id, from.shared()).await?;
            }

            let copied = PresenterSlotRepository::list_by_assignment(&mut *tx, to.id).await?;
            for slot in &slots {
                let (Some(photo), Some(target)) = (
                    slot.photo_path.as_deref(),
                    copied.iter().find(|s| s.position == slot.position),
                ) else {
                    continue;
                };
                PresenterSlotRepository::set_photo(&mut *tx, target.id, photo).await?;
            }
        }

        tx.commit().await?;

        tracing::info!(
            "Duplicated session {} as {} '{}'",
            source.id,
            copy.id,
            copy.name
        );
        Ok(copy)
    }

    pub async fn delete_session(state: &Arc<AppState>, session_id: i64) -> AppResult<()> {
        if !SessionRepository::delete(&state.db, session_id).await? {
            return Err(AppError::NotFound(format!("Session {} not found", session_id)));
        }
        tracing::info!("Deleted session {}", session_id);
        Ok(())
    }
}

pub fn parse_date(raw: &str) -> AppResult<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(AppError::Validation("Date is required".to_string()));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| AppError::Validation(format!("Invalid date '{}', expected YYYY-MM-DD", raw)))
}

pub fn validate_num_mics(num_mics: i64) -> AppResult<()> {
    if !(MIN_MICS_PER_SESSION..=MAX_MICS_PER_SESSION).contains(&num_mics) {
        return Err(AppError::Validation(format!(
            "Number of mics must be between {} and {}",
            MIN_MICS_PER_SESSION, MAX_MICS_PER_SESSION
        )));
    }
    Ok(())
}

fn check_length(label: &str, value: &str) -> AppResult<()> {
    if value.trim().chars().count() > MAX_NAME {
        return Err(AppError::Validation(format!(
            "{} cannot exceed {} characters",
            label, MAX_NAME
        )));
    }
    Ok(())
}
