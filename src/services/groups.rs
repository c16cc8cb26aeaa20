use std::sync::Arc;

use crate::db::{
    AssignmentRepository, GroupColor, MicGroup, MicGroupRepository, SessionRepository,
};
use crate::error::{AppError, AppResult};
use crate::AppState;

const MAX_GROUP_NAME: usize = 60;

pub struct GroupService;

impl GroupService {
    pub async fn list(state: &Arc<AppState>, session_id: i64) -> AppResult<Vec<MicGroup>> {
        SessionRepository::find_by_id(&state.db, session_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Session {} not found", session_id)))?;

        MicGroupRepository::list_by_session(&state.db, session_id).await
    }

    pub async fn create(
        state: &Arc<AppState>,
        session_id: i64,
        name: Option<&str>,
        color: Option<&str>,
    ) -> AppResult<MicGroup> {
        let name = name.map(str::trim).unwrap_or_default();
        if name.is_empty() {
            return Err(AppError::Validation("Group name is required".to_string()));
        }
        if name.chars().count() > MAX_GROUP_NAME {
            return Err(AppError::Validation(format!(
                "Group name cannot exceed {} characters",
                MAX_GROUP_NAME
            )));
        }
        let color = GroupColor::try_from(color.unwrap_or("blue")).map_err(AppError::Validation)?;

        let mut tx = state.db.begin().await?;
        SessionRepository::find_by_id(&mut *tx, session_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Session {} not found", session_id)))?;
        let group = MicGroupRepository::create(&mut *tx, session_id, name, color).await?;
        SessionRepository::touch(&mut *tx, session_id).await?;
        tx.commit().await?;

        tracing::info!(
            "Created mic group {} ({}) in session {}",
            group.name,
            group.color,
            session_id
        );
        Ok(group)
    }

    /// Delete a group of `session_id`; every assignment referencing it is unassigned.
    pub async fn delete(state: &Arc<AppState>, session_id: i64, group_id: i64) -> AppResult<u64> {
        let mut tx = state.db.begin().await?;
        let group = MicGroupRepository::find_by_id(&mut *tx, group_id)
            .await?
            .filter(|g| g.session_id == session_id)
            .ok_or_else(|| AppError::NotFound(format!("Group {} not found", group_id)))?;

        let unassigned = AssignmentRepository::clear_group(&mut *tx, group.id).await?;
        MicGroupRepository::delete(&mut *tx, group.id).await?;
        SessionRepository::touch(&mut *tx, session_id).await?;
        tx.commit().await?;

        tracing::info!(
            "Deleted mic group {} from session {} ({} assignments unassigned)",
            group.id,
            session_id,
            unassigned
        );
        Ok(unassigned)
    }

    /// Attach a group to an assignment, or detach with `None`. The group must
    /// belong to the assignment's own session.
    pub async fn assign(
        state: &Arc<AppState>,
        assignment_id: i64,
        group_id: Option<i64>,
    ) -> AppResult<Option<MicGroup>> {
        let mut tx = state.db.begin().await?;
        let assignment = AssignmentRepository::find_by_id(&mut *tx, assignment_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Assignment {} not found", assignment_id)))?;

        let group = match group_id {
            Some(id) => {
                let group = MicGroupRepository::find_by_id(&mut *tx, id)
                    .await?
                    .ok_or_else(|| AppError::NotFound(format!("Group {} not found", id)))?;
                if group.session_id != assignment.session_id {
                    return Err(AppError::Validation(
                        "Group belongs to a different session".to_string(),
                    ));
                }
                Some(group)
            }
            None => None,
        };

        AssignmentRepository::set_group(&mut *tx, assignment_id, group.as_ref().map(|g| g.id))
            .await?;
        SessionRepository::touch(&mut *tx, assignment.session_id).await?;
        tx.commit().await?;

        Ok(group)
    }
}
