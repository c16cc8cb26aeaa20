//! Assignment field updates, shared presenters and the aggregate statistics
//! returned to the editor after every mutation.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::db::{
    AssignmentRepository, DayRepository, DayStats, MicAssignment, MicType, PresenterSlot,
    PresenterSlotRepository, SessionRepository, SessionStats, PRIMARY_SLOT,
};
use crate::error::{AppError, AppResult};
use crate::AppState;

/// Longest presenter name accepted from the editor.
const MAX_PRESENTER_NAME: usize = 200;

/// Fields the editor may change one at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignmentField {
    PresenterName,
    MicType,
    SharedPresenters,
    IsMicd,
    IsDMic,
    Notes,
}

impl AssignmentField {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "presenter_name" | "presenter" => Some(AssignmentField::PresenterName),
            "mic_type" => Some(AssignmentField::MicType),
            "shared_presenters" => Some(AssignmentField::SharedPresenters),
            "is_micd" => Some(AssignmentField::IsMicd),
            "is_d_mic" => Some(AssignmentField::IsDMic),
            "notes" => Some(AssignmentField::Notes),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AssignmentField::PresenterName => "presenter_name",
            AssignmentField::MicType => "mic_type",
            AssignmentField::SharedPresenters => "shared_presenters",
            AssignmentField::IsMicd => "is_micd",
            AssignmentField::IsDMic => "is_d_mic",
            AssignmentField::Notes => "notes",
        }
    }

    /// Whether a change to this field alters who is shown on the mic.
    pub fn affects_presenter(self) -> bool {
        matches!(
            self,
            AssignmentField::PresenterName | AssignmentField::SharedPresenters
        )
    }
}

/// Session-wide actions offered in the session toolbar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkAction {
    ClearAll,
    MarkAllMicd,
    ClearAllMicd,
    ResetRotations,
}

impl BulkAction {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "clear_all" => Some(BulkAction::ClearAll),
            "mark_all_micd" => Some(BulkAction::MarkAllMicd),
            "clear_all_micd" => Some(BulkAction::ClearAllMicd),
            "reset_rotations" => Some(BulkAction::ResetRotations),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BulkAction::ClearAll => "clear_all",
            BulkAction::MarkAllMicd => "mark_all_micd",
            BulkAction::ClearAllMicd => "clear_all_micd",
            BulkAction::ResetRotations => "reset_rotations",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdateOutcome {
    pub session_stats: SessionStats,
    pub day_stats: DayStats,
    pub presenter_display: String,
    pub presenter_count: i64,
}

/// Assignment together with its rotation slots.
#[derive(Debug, Clone)]
pub struct AssignmentDetail {
    pub assignment: MicAssignment,
    pub slots: Vec<PresenterSlot>,
}

impl AssignmentDetail {
    pub fn primary_name(&self) -> String {
        slot_name(&self.slots, PRIMARY_SLOT)
    }

    /// Name of the presenter currently on the mic.
    pub fn current_presenter(&self) -> String {
        let name = slot_name(&self.slots, self.assignment.active_slot);
        if name.is_empty() {
            self.primary_name()
        } else {
            name
        }
    }

    pub fn presenter_count(&self) -> i64 {
        let primary = if self.primary_name().trim().is_empty() { 0 } else { 1 };
        primary + self.assignment.shared().len() as i64
    }
}

pub(crate) fn slot_name(slots: &[PresenterSlot], position: i64) -> String {
    slots
        .iter()
        .find(|s| s.position == position)
        .map(|s| s.presenter_name.clone())
        .unwrap_or_default()
}

pub struct TrackerService;

impl TrackerService {
    pub async fn load_assignment(state: &Arc<AppState>, id: i64) -> AppResult<AssignmentDetail> {
        let assignment = AssignmentRepository::find_by_id(&state.db, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Assignment {} not found", id)))?;
        let slots = PresenterSlotRepository::list_by_assignment(&state.db, id).await?;

        Ok(AssignmentDetail { assignment, slots })
    }

    /// Apply a single-field change and return the recomputed aggregates.
    pub async fn update_field(
        state: &Arc<AppState>,
        assignment_id: i64,
        field: &str,
        value: &Value,
    ) -> AppResult<UpdateOutcome> {
        let field = AssignmentField::from_str(field)
            .ok_or_else(|| AppError::BadRequest(format!("Unknown field: {}", field)))?;

        let mut tx = state.db.begin().await?;
        let assignment = AssignmentRepository::find_by_id(&mut *tx, assignment_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Assignment {} not found", assignment_id)))?;

        match field {
            AssignmentField::PresenterName => {
                let name = value_as_string(value);
                validate_presenter_name(&name)?;
                PresenterSlotRepository::set_primary_name(&mut *tx, assignment_id, &name).await?;
                AssignmentRepository::touch(&mut *tx, assignment_id).await?;
            }
            AssignmentField::MicType => {
                let raw = value_as_string(value);
                let mic_type = MicType::try_from(raw.as_str()).map_err(AppError::Validation)?;
                AssignmentRepository::set_mic_type(&mut *tx, assignment_id, mic_type).await?;
            }
            AssignmentField::SharedPresenters => {
                let names = parse_presenter_list(value)?;
                Self::replace_shared(&mut tx, &assignment, &names).await?;
            }
            AssignmentField::IsMicd => {
                let on = value_as_bool(value)?;
                let is_d_mic = if on { false } else { assignment.is_d_mic };
                AssignmentRepository::set_flags(&mut *tx, assignment_id, is_d_mic, on).await?;
            }
            AssignmentField::IsDMic => {
                let on = value_as_bool(value)?;
                let is_micd = if on { false } else { assignment.is_micd };
                AssignmentRepository::set_flags(&mut *tx, assignment_id, on, is_micd).await?;
            }
            AssignmentField::Notes => {
                AssignmentRepository::set_notes(&mut *tx, assignment_id, value_as_string(value).trim())
                    .await?;
            }
        }

        SessionRepository::touch(&mut *tx, assignment.session_id).await?;
        tx.commit().await?;

        tracing::debug!(
            "Updated {:?} on assignment {} (session {})",
            field,
            assignment_id,
            assignment.session_id
        );

        Self::outcome(state, assignment_id).await
    }

    /// Aggregates plus presenter identity for one assignment.
    pub async fn outcome(state: &Arc<AppState>, assignment_id: i64) -> AppResult<UpdateOutcome> {
        let detail = Self::load_assignment(state, assignment_id).await?;
        let session = SessionRepository::find_by_id(&state.db, detail.assignment.session_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Session not found".to_string()))?;

        let session_stats = SessionRepository::stats(&state.db, session.id).await?;
        let day_stats = DayRepository::stats(&state.db, session.day_id).await?;

        Ok(UpdateOutcome {
            session_stats,
            day_stats,
            presenter_display: detail.current_presenter(),
            presenter_count: detail.presenter_count(),
        })
    }

    pub async fn session_stats(state: &Arc<AppState>, session_id: i64) -> AppResult<SessionStats> {
        SessionRepository::stats(&state.db, session_id).await
    }

    /// Replace the shared list, keep slots aligned, and pull the active slot
    /// back to the primary when its presenter was removed.
    async fn replace_shared(
        tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
        assignment: &MicAssignment,
        names: &[String],
    ) -> AppResult<()> {
        let current = slot_name(
            &PresenterSlotRepository::list_by_assignment(&mut **tx, assignment.id).await?,
            assignment.active_slot,
        );

        AssignmentRepository::set_shared_presenters(&mut **tx, assignment.id, names).await?;
        PresenterSlotRepository::sync_shared(&mut **tx, assignment.id, names).await?;

        if assignment.active_slot != PRIMARY_SLOT {
            let new_position = names
                .iter()
                .position(|n| *n == current)
                .map(|idx| idx as i64 + 1)
                .unwrap_or(PRIMARY_SLOT);
            if new_position != assignment.active_slot {
                AssignmentRepository::set_active_slot(&mut **tx, assignment.id, new_position)
                    .await?;
            }
        }

        Ok(())
    }

    pub async fn add_shared_presenter(
        state: &Arc<AppState>,
        assignment_id: i64,
        presenter_name: &str,
    ) -> AppResult<String> {
        let name = presenter_name.trim().to_string();
        validate_presenter_name(&name)?;
        if name.is_empty() {
            return Err(AppError::Validation("Presenter name is required".to_string()));
        }

        let mut tx = state.db.begin().await?;
        let assignment = AssignmentRepository::find_by_id(&mut *tx, assignment_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Assignment {} not found", assignment_id)))?;

        if assignment.shared().iter().any(|n| *n == name) {
            return Err(AppError::Conflict(format!(
                "{} is already a shared presenter",
                name
            )));
        }

        let mut names = assignment.shared().to_vec();
        names.push(name.clone());
        Self::replace_shared(&mut tx, &assignment, &names).await?;
        SessionRepository::touch(&mut *tx, assignment.session_id).await?;
        tx.commit().await?;

        tracing::info!("Added shared presenter {} to assignment {}", name, assignment_id);
        Ok(format!("Added {} to {}", name, assignment.rf_label()))
    }

    pub async fn remove_shared_presenter(
        state: &Arc<AppState>,
        assignment_id: i64,
        presenter_name: &str,
    ) -> AppResult<String> {
        let name = presenter_name.trim();

        let mut tx = state.db.begin().await?;
        let assignment = AssignmentRepository::find_by_id(&mut *tx, assignment_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Assignment {} not found", assignment_id)))?;

        let names: Vec<String> = assignment
            .shared()
            .iter()
            .filter(|n| n.as_str() != name)
            .cloned()
            .collect();
        if names.len() == assignment.shared().len() {
            return Err(AppError::NotFound(format!(
                "{} is not a shared presenter on {}",
                name,
                assignment.rf_label()
            )));
        }

        Self::replace_shared(&mut tx, &assignment, &names).await?;
        SessionRepository::touch(&mut *tx, assignment.session_id).await?;
        tx.commit().await?;

        tracing::info!("Removed shared presenter {} from assignment {}", name, assignment_id);
        Ok(format!("Removed {} from {}", name, assignment.rf_label()))
    }

    pub async fn bulk_update(state: &Arc<AppState>, session_id: i64, action: &str) -> AppResult<u64> {
        let action = BulkAction::from_str(action)
            .ok_or_else(|| AppError::BadRequest(format!("Unknown bulk action: {}", action)))?;

        let mut tx = state.db.begin().await?;
        SessionRepository::find_by_id(&mut *tx, session_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Session {} not found", session_id)))?;

        let touched = match action {
            BulkAction::ClearAll => {
                PresenterSlotRepository::clear_session(&mut *tx, session_id).await?;
                AssignmentRepository::clear_session(&mut *tx, session_id).await?
            }
            BulkAction::MarkAllMicd => {
                AssignmentRepository::set_session_micd(&mut *tx, session_id, true).await?
            }
            BulkAction::ClearAllMicd => {
                AssignmentRepository::set_session_micd(&mut *tx, session_id, false).await?
            }
            BulkAction::ResetRotations => {
                AssignmentRepository::reset_session_rotations(&mut *tx, session_id).await?
            }
        };

        SessionRepository::touch(&mut *tx, session_id).await?;
        tx.commit().await?;

        tracing::info!(
            "Bulk {:?} on session {} touched {} assignments",
            action,
            session_id,
            touched
        );
        Ok(touched)
    }

    pub async fn list_presenters(state: &Arc<AppState>) -> AppResult<Vec<String>> {
        PresenterSlotRepository::distinct_names(&state.db).await
    }
}

fn validate_presenter_name(name: &str) -> AppResult<()> {
    if name.chars().count() > MAX_PRESENTER_NAME {
        return Err(AppError::Validation(format!(
            "Presenter name cannot exceed {} characters",
            MAX_PRESENTER_NAME
        )));
    }
    Ok(())
}

fn value_as_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.trim().to_string(),
        other => other.to_string(),
    }
}

fn value_as_bool(value: &Value) -> AppResult<bool> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::Number(n) => Ok(n.as_i64().unwrap_or(0) != 0),
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "1" | "on" | "yes" => Ok(true),
            "false" | "0" | "off" | "no" | "" => Ok(false),
            _ => Err(AppError::Validation(format!("Expected a boolean, got {}", s))),
        },
        _ => Err(AppError::Validation("Expected a boolean value".to_string())),
    }
}

/// Accepts a JSON array, a JSON-encoded array string, or a comma / newline
/// separated list. Names are trimmed, blanks dropped, duplicates rejected.
pub fn parse_presenter_list(value: &Value) -> AppResult<Vec<String>> {
    let raw: Vec<String> = match value {
        Value::Null => Vec::new(),
        Value::Array(items) => items.iter().map(value_as_string).collect(),
        Value::String(s) if s.trim_start().starts_with('[') => {
            serde_json::from_str::<Vec<String>>(s).map_err(|e| {
                AppError::Validation(format!("Invalid shared presenters list: {}", e))
            })?
        }
        Value::String(s) => {
            let sep = if s.contains('\n') { '\n' } else { ',' };
            s.split(sep).map(str::to_string).collect()
        }
        _ => {
            return Err(AppError::Validation(
                "Shared presenters must be a list of names".to_string(),
            ))
        }
    };

    let mut names: Vec<String> = Vec::with_capacity(raw.len());
    for name in raw.into_iter().map(|n| n.trim().to_string()) {
        if name.is_empty() {
            continue;
        }
        validate_presenter_name(&name)?;
        if names.contains(&name) {
            return Err(AppError::Validation(format!(
                "Duplicate shared presenter: {}",
                name
            )));
        }
        names.push(name);
    }

    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::{seed_session, test_state};
    use serde_json::json;

    #[test]
    fn presenter_list_accepts_all_encodings() {
        assert_eq!(
            parse_presenter_list(&json!(["Sue", " Tom "])).unwrap(),
            vec!["Sue", "Tom"]
        );
        assert_eq!(
            parse_presenter_list(&json!("[\"Sue\",\"Ben\"]")).unwrap(),
            vec!["Sue", "Ben"]
        );
        assert_eq!(
            parse_presenter_list(&json!("Sue, Tom,, Ben")).unwrap(),
            vec!["Sue", "Tom", "Ben"]
        );
        assert_eq!(
            parse_presenter_list(&json!("Sue\nTom, Jr.")).unwrap(),
            vec!["Sue", "Tom, Jr."]
        );
        assert!(parse_presenter_list(&json!(null)).unwrap().is_empty());
    }

    #[test]
    fn presenter_list_rejects_duplicates() {
        let err = parse_presenter_list(&json!(["Sue", "Sue"])).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn bool_values_from_form_inputs() {
        assert!(value_as_bool(&json!("on")).unwrap());
        assert!(!value_as_bool(&json!(0)).unwrap());
        assert!(value_as_bool(&json!("perhaps")).is_err());
    }

    #[tokio::test]
    async fn micd_clears_dmic_and_stats_follow() {
        let state = test_state().await;
        let (_day, session, assignments) = seed_session(&state, 4).await;
        let a = assignments[0].id;

        TrackerService::update_field(&state, a, "is_d_mic", &json!(true))
            .await
            .unwrap();
        let out = TrackerService::update_field(&state, a, "is_micd", &json!(true))
            .await
            .unwrap();

        let detail = TrackerService::load_assignment(&state, a).await.unwrap();
        assert!(detail.assignment.is_micd);
        assert!(!detail.assignment.is_d_mic);
        assert_eq!(
            out.session_stats,
            SessionStats {
                micd: 1,
                total: 4,
                shared: 0
            }
        );
        assert_eq!(out.day_stats.sessions, 1);
        assert_eq!(out.day_stats.micd, 1);

        let stats = TrackerService::session_stats(&state, session.id).await.unwrap();
        assert_eq!(stats.available(), 3);
    }

    #[tokio::test]
    async fn presenter_fields_report_display_and_count() {
        let state = test_state().await;
        let (_day, _session, assignments) = seed_session(&state, 2).await;
        let a = assignments[1].id;

        let out = TrackerService::update_field(&state, a, "presenter_name", &json!("Ana"))
            .await
            .unwrap();
        assert_eq!(out.presenter_display, "Ana");
        assert_eq!(out.presenter_count, 1);

        let out = TrackerService::update_field(
            &state,
            a,
            "shared_presenters",
            &json!("[\"Ben\",\"Cy\"]"),
        )
        .await
        .unwrap();
        assert_eq!(out.presenter_count, 3);
        assert_eq!(out.session_stats.shared, 1);

        let detail = TrackerService::load_assignment(&state, a).await.unwrap();
        let names: Vec<_> = detail.slots.iter().map(|s| s.presenter_name.as_str()).collect();
        assert_eq!(names, vec!["Ana", "Ben", "Cy"]);
    }

    #[tokio::test]
    async fn unknown_field_and_bad_mic_type_are_rejected() {
        let state = test_state().await;
        let (_day, _session, assignments) = seed_session(&state, 1).await;
        let a = assignments[0].id;

        let err = TrackerService::update_field(&state, a, "rf_number", &json!(3))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        let err = TrackerService::update_field(&state, a, "mic_type", &json!("laser"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        TrackerService::update_field(&state, a, "mic_type", &json!("hardwired"))
            .await
            .unwrap();
        let detail = TrackerService::load_assignment(&state, a).await.unwrap();
        assert_eq!(detail.assignment.mic_type(), MicType::Hardwired);
    }

    #[tokio::test]
    async fn shared_presenters_add_and_remove() {
        let state = test_state().await;
        let (_day, _session, assignments) = seed_session(&state, 1).await;
        let a = assignments[0].id;

        TrackerService::add_shared_presenter(&state, a, "Dee").await.unwrap();
        let err = TrackerService::add_shared_presenter(&state, a, " Dee ")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        TrackerService::remove_shared_presenter(&state, a, "Dee")
            .await
            .unwrap();
        let err = TrackerService::remove_shared_presenter(&state, a, "Dee")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let detail = TrackerService::load_assignment(&state, a).await.unwrap();
        assert!(detail.assignment.shared().is_empty());
        assert_eq!(detail.slots.len(), 1);
    }

    #[tokio::test]
    async fn bulk_clear_all_resets_the_session() {
        let state = test_state().await;
        let (_day, session, assignments) = seed_session(&state, 3).await;
        for a in &assignments {
            TrackerService::update_field(&state, a.id, "presenter_name", &json!("X"))
                .await
                .unwrap();
        }
        TrackerService::bulk_update(&state, session.id, "mark_all_micd")
            .await
            .unwrap();
        assert_eq!(
            TrackerService::session_stats(&state, session.id).await.unwrap().micd,
            3
        );

        let touched = TrackerService::bulk_update(&state, session.id, "clear_all")
            .await
            .unwrap();
        assert_eq!(touched, 3);
        let stats = TrackerService::session_stats(&state, session.id).await.unwrap();
        assert_eq!(stats.micd, 0);
        assert!(TrackerService::list_presenters(&state).await.unwrap().is_empty());

        assert!(TrackerService::bulk_update(&state, session.id, "explode")
            .await
            .is_err());
    }
}
