use std::sync::Arc;

use serde::Serialize;

use crate::db::{AssignmentRepository, SessionRepository, SessionStats, PRIMARY_SLOT};
use crate::error::AppResult;
use crate::services::tracker::{slot_name, TrackerService};
use crate::AppState;

#[derive(Debug, Clone, Serialize)]
pub struct RotationOutcome {
    pub is_d_mic: bool,
    pub is_micd: bool,
    pub current_presenter: String,
    pub previous_presenter: String,
    pub message: String,
    pub session_stats: SessionStats,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResetOutcome {
    pub current_presenter: String,
    pub message: String,
}

/// Next slot in rotation order: positions ascend through the shared
/// presenters and wrap back to the primary.
pub fn next_slot(active: i64, slot_count: usize) -> i64 {
    if slot_count <= 1 {
        return PRIMARY_SLOT;
    }
    (active.max(PRIMARY_SLOT) + 1) % slot_count as i64
}

pub struct RotationService;

impl RotationService {
    /// Toggle D-MIC. Turning it on clears MIC'D and, when shared presenters
    /// exist, hands the mic to the next presenter slot.
    pub async fn toggle_dmic_and_rotate(
        state: &Arc<AppState>,
        assignment_id: i64,
    ) -> AppResult<RotationOutcome> {
        let detail = TrackerService::load_assignment(state, assignment_id).await?;
        let assignment = &detail.assignment;
        let previous_presenter = detail.current_presenter();

        let mut tx = state.db.begin().await?;

        let (is_d_mic, is_micd, active) = if assignment.is_d_mic {
            (false, false, assignment.active_slot)
        } else {
            let active = if assignment.shared().is_empty() {
                assignment.active_slot
            } else {
                next_slot(assignment.active_slot, detail.slots.len())
            };
            (true, false, active)
        };

        AssignmentRepository::set_flags(&mut *tx, assignment_id, is_d_mic, is_micd).await?;
        if active != assignment.active_slot {
            AssignmentRepository::set_active_slot(&mut *tx, assignment_id, active).await?;
        }
        SessionRepository::touch(&mut *tx, assignment.session_id).await?;
        tx.commit().await?;

        let mut current_presenter = slot_name(&detail.slots, active);
        if current_presenter.is_empty() {
            current_presenter = detail.primary_name();
        }

        let message = if !is_d_mic {
            format!("D-MIC cleared on {}", assignment.rf_label())
        } else if current_presenter != previous_presenter {
            format!(
                "{} D-MIC'd; {} is up next",
                previous_presenter_label(&previous_presenter),
                presenter_label(&current_presenter)
            )
        } else {
            format!("D-MIC set on {}", assignment.rf_label())
        };

        tracing::info!(
            "Assignment {} D-MIC={} active slot {} -> {}",
            assignment_id,
            is_d_mic,
            assignment.active_slot,
            active
        );

        let session_stats = SessionRepository::stats(&state.db, assignment.session_id).await?;

        Ok(RotationOutcome {
            is_d_mic,
            is_micd,
            current_presenter,
            previous_presenter,
            message,
            session_stats,
        })
    }

    /// Hand the mic back to the primary presenter and clear D-MIC.
    pub async fn reset_rotation(state: &Arc<AppState>, assignment_id: i64) -> AppResult<ResetOutcome> {
        let detail = TrackerService::load_assignment(state, assignment_id).await?;
        let assignment = &detail.assignment;

        let mut tx = state.db.begin().await?;
        AssignmentRepository::set_active_slot(&mut *tx, assignment_id, PRIMARY_SLOT).await?;
        AssignmentRepository::set_flags(&mut *tx, assignment_id, false, assignment.is_micd).await?;
        SessionRepository::touch(&mut *tx, assignment.session_id).await?;
        tx.commit().await?;

        let primary = detail.primary_name();
        tracing::info!("Assignment {} rotation reset to primary", assignment_id);

        Ok(ResetOutcome {
            message: format!(
                "{} reset to {}",
                assignment.rf_label(),
                presenter_label(&primary)
            ),
            current_presenter: primary,
        })
    }
}

fn presenter_label(name: &str) -> &str {
    if name.is_empty() {
        "Unassigned"
    } else {
        name
    }
}

fn previous_presenter_label(name: &str) -> &str {
    if name.is_empty() {
        "Mic"
    } else {
        name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::{seed_session, test_state};
    use serde_json::json;

    #[test]
    fn next_slot_wraps_to_primary() {
        assert_eq!(next_slot(0, 3), 1);
        assert_eq!(next_slot(1, 3), 2);
        assert_eq!(next_slot(2, 3), 0);
        assert_eq!(next_slot(0, 1), 0);
        assert_eq!(next_slot(5, 0), 0);
    }

    #[tokio::test]
    async fn dmic_and_micd_are_never_both_set() {
        let state = test_state().await;
        let (_day, _session, assignments) = seed_session(&state, 1).await;
        let a = assignments[0].id;

        TrackerService::update_field(&state, a, "is_micd", &json!(true))
            .await
            .unwrap();

        for _ in 0..5 {
            let out = RotationService::toggle_dmic_and_rotate(&state, a).await.unwrap();
            assert!(!(out.is_d_mic && out.is_micd));
            let stored = TrackerService::load_assignment(&state, a).await.unwrap();
            assert!(!(stored.assignment.is_d_mic && stored.assignment.is_micd));
        }
    }

    #[tokio::test]
    async fn micd_assignment_checked_for_dmic_loses_micd() {
        let state = test_state().await;
        let (_day, _session, assignments) = seed_session(&state, 1).await;
        let a = assignments[0].id;
        TrackerService::update_field(&state, a, "is_micd", &json!(true))
            .await
            .unwrap();

        let out = RotationService::toggle_dmic_and_rotate(&state, a).await.unwrap();
        assert!(out.is_d_mic);
        assert!(!out.is_micd);
        assert_eq!(out.session_stats.micd, 0);
    }

    #[tokio::test]
    async fn rotation_then_reset_restores_primary() {
        let state = test_state().await;
        let (_day, _session, assignments) = seed_session(&state, 1).await;
        let a = assignments[0].id;
        TrackerService::update_field(&state, a, "presenter_name", &json!("Ana"))
            .await
            .unwrap();
        TrackerService::update_field(&state, a, "shared_presenters", &json!(["Ben", "Cy"]))
            .await
            .unwrap();

        let out = RotationService::toggle_dmic_and_rotate(&state, a).await.unwrap();
        assert_eq!(out.previous_presenter, "Ana");
        assert_eq!(out.current_presenter, "Ben");

        let reset = RotationService::reset_rotation(&state, a).await.unwrap();
        assert_eq!(reset.current_presenter, "Ana");

        let detail = TrackerService::load_assignment(&state, a).await.unwrap();
        assert_eq!(detail.assignment.active_slot, PRIMARY_SLOT);
        assert!(!detail.assignment.is_d_mic);
        assert_eq!(detail.current_presenter(), "Ana");
    }

    #[tokio::test]
    async fn toggling_off_keeps_the_current_presenter() {
        let state = test_state().await;
        let (_day, _session, assignments) = seed_session(&state, 1).await;
        let a = assignments[0].id;
        TrackerService::update_field(&state, a, "presenter_name", &json!("Ana"))
            .await
            .unwrap();
        TrackerService::add_shared_presenter(&state, a, "Ben").await.unwrap();

        RotationService::toggle_dmic_and_rotate(&state, a).await.unwrap();
        let off = RotationService::toggle_dmic_and_rotate(&state, a).await.unwrap();
        assert!(!off.is_d_mic);
        assert_eq!(off.current_presenter, "Ben");
        assert_eq!(off.previous_presenter, "Ben");

        let on = RotationService::toggle_dmic_and_rotate(&state, a).await.unwrap();
        assert_eq!(on.current_presenter, "Ana");
    }

    #[tokio::test]
    async fn removing_the_active_shared_presenter_falls_back_to_primary() {
        let state = test_state().await;
        let (_day, _session, assignments) = seed_session(&state, 1).await;
        let a = assignments[0].id;
        TrackerService::update_field(&state, a, "presenter_name", &json!("Ana"))
            .await
            .unwrap();
        TrackerService::add_shared_presenter(&state, a, "Ben").await.unwrap();
        RotationService::toggle_dmic_and_rotate(&state, a).await.unwrap();

        TrackerService::remove_shared_presenter(&state, a, "Ben")
            .await
            .unwrap();
        let detail = TrackerService::load_assignment(&state, a).await.unwrap();
        assert_eq!(detail.assignment.active_slot, PRIMARY_SLOT);
        assert_eq!(detail.current_presenter(), "Ana");
    }
}
