use crate::client::api::{ResetResult, RotationResult, TrackerApi};
use crate::client::context::{PendingConfirmation, RotationState};
use crate::client::error::{ClientError, ClientResult};
use crate::client::notify::NotificationKind;
use crate::client::view::{Node, TrackerView};
use crate::client::{RowRef, Tracker};

impl<A: TrackerApi, V: TrackerView> Tracker<A, V> {
    /// D-MIC checkbox handler. `requested` is the state the user clicked to;
    /// the checkbox keeps its committed value until the server answers.
    pub async fn toggle_dmic(&mut self, row: RowRef, requested: bool) -> ClientResult<RotationResult> {
        let id = row.assignment_id;
        let checkbox = Node::DmicCheckbox(id);

        if let Some(pending) = self.ui.pending_dmic.get(&id).copied() {
            self.view.set_checked(&checkbox, pending.previous);
            self.view
                .notify(NotificationKind::Warning, "Still saving the previous change");
            return Err(ClientError::Busy);
        }

        let previous = !requested;
        self.ui
            .pending_dmic
            .insert(id, PendingConfirmation { requested, previous });
        self.view.set_checked(&checkbox, previous);

        let result = self.api.dmic_and_rotate(id).await;
        let pending = self.ui.pending_dmic.remove(&id);

        let out = match result {
            Ok(out) => out,
            Err(e) => {
                self.view.set_checked(&checkbox, previous);
                self.report("D-MIC toggle failed", &e);
                return Err(e);
            }
        };

        self.view.set_checked(&checkbox, out.is_d_mic);
        self.view.set_checked(&Node::MicdCheckbox(id), out.is_micd);

        if let Some(stats) = &out.session_stats {
            self.apply_session_stats(row.session_id, stats);
        }

        let state = if out.is_d_mic {
            RotationState::Rotating
        } else {
            RotationState::Primary
        };
        self.ui.rotation.insert(id, state);

        if out.current_presenter != out.previous_presenter {
            self.apply_active_chip(id, &out.current_presenter);
            self.view
                .set_text(&Node::PresenterDisplay(id), &out.current_presenter);
        }
        let overridden = pending.is_some_and(|p| p.requested != out.is_d_mic);
        if overridden {
            tracing::warn!(
                "Assignment {} D-MIC requested {} but server stored {}",
                id,
                requested,
                out.is_d_mic
            );
            self.view.notify(
                NotificationKind::Warning,
                "D-MIC was changed elsewhere; showing the saved state",
            );
        } else if !out.message.is_empty() {
            self.view.notify(NotificationKind::Success, &out.message);
        }

        tracing::debug!(
            "Assignment {} D-MIC {} (presenter {})",
            id,
            out.is_d_mic,
            out.current_presenter
        );
        Ok(out)
    }

    /// Put the primary presenter back on the mic.
    pub async fn reset_rotation(&mut self, assignment_id: i64) -> ClientResult<ResetResult> {
        if !self
            .view
            .confirm("Reset to primary presenter?")
        {
            return Err(ClientError::Cancelled);
        }

        let out = match self.api.reset_rotation(assignment_id).await {
            Ok(out) => out,
            Err(e) => {
                self.report("Reset rotation failed", &e);
                return Err(e);
            }
        };

        self.apply_active_chip(assignment_id, &out.current_presenter);
        self.view
            .set_text(&Node::PresenterDisplay(assignment_id), &out.current_presenter);
        self.view
            .set_checked(&Node::DmicCheckbox(assignment_id), false);
        self.ui
            .rotation
            .insert(assignment_id, RotationState::Primary);

        let message = if out.message.is_empty() {
            "Rotation reset"
        } else {
            out.message.as_str()
        };
        self.view.notify(NotificationKind::Success, message);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    use crate::client::testing::{tracker, FakeApi};

    const ROW: RowRef = RowRef {
        assignment_id: 5,
        session_id: 2,
        day_id: 1,
    };

    fn rotated(is_d_mic: bool, current: &str, previous: &str) -> serde_json::Value {
        json!({
            "is_d_mic": is_d_mic,
            "is_micd": false,
            "current_presenter": current,
            "previous_presenter": previous,
            "message": format!("Now presenting: {}", current),
            "session_stats": { "micd": 0, "total": 4, "shared": 1 },
        })
    }

    #[tokio::test]
    async fn confirmed_toggle_rotates_and_patches_chip() {
        let api = FakeApi::new();
        api.push("dmic_and_rotate", Ok(rotated(true, "Ben", "Ana")));
        let mut t = tracker(api);
        t.view_mut().set_checked(&Node::MicdCheckbox(5), true);

        let out = t.toggle_dmic(ROW, true).await.unwrap();

        assert_eq!(out.current_presenter, "Ben");
        let view = t.view();
        assert_eq!(view.is_checked(&Node::DmicCheckbox(5)), Some(true));
        assert_eq!(view.is_checked(&Node::MicdCheckbox(5)), Some(false));
        assert_eq!(view.text(&Node::ActiveSlotChip(5)), Some("Ben"));
        assert_eq!(view.text(&Node::PresenterDisplay(5)), Some("Ben"));
        assert_eq!(view.text(&Node::SessionShared(2)), Some("Shared: 1"));
        assert_eq!(view.reloads, 0);
        assert_eq!(t.ui().rotation_state(5), RotationState::Rotating);
        assert!(t.ui().pending_dmic.is_empty());
    }

    #[tokio::test]
    async fn unchanged_presenter_leaves_chip_alone() {
        let api = FakeApi::new();
        api.push("dmic_and_rotate", Ok(rotated(false, "Ana", "Ana")));
        let mut t = tracker(api);
        t.ui_mut().rotation.insert(5, RotationState::Rotating);

        t.toggle_dmic(ROW, false).await.unwrap();

        assert_eq!(t.view().text(&Node::ActiveSlotChip(5)), None);
        assert_eq!(t.view().is_checked(&Node::DmicCheckbox(5)), Some(false));
        assert_eq!(t.ui().rotation_state(5), RotationState::Primary);
    }

    #[tokio::test]
    async fn rejected_toggle_restores_previous_state() {
        let api = FakeApi::new();
        api.push("dmic_and_rotate", Err("Assignment not found".into()));
        let mut t = tracker(api);

        let err = t.toggle_dmic(ROW, true).await.unwrap_err();

        assert!(matches!(err, ClientError::Application(_)));
        assert_eq!(t.view().is_checked(&Node::DmicCheckbox(5)), Some(false));
        assert_eq!(t.ui().rotation_state(5), RotationState::Primary);
        assert!(t.ui().pending_dmic.is_empty());
        assert_eq!(
            t.view().last_notification().map(|n| n.0),
            Some(NotificationKind::Error)
        );
    }

    #[tokio::test]
    async fn stale_click_shows_saved_state() {
        // Another client already set D-MIC, so the server toggles it off.
        let api = FakeApi::new();
        api.push("dmic_and_rotate", Ok(rotated(false, "Ana", "Ana")));
        let mut t = tracker(api);

        let out = t.toggle_dmic(ROW, true).await.unwrap();

        assert!(!out.is_d_mic);
        assert_eq!(t.view().is_checked(&Node::DmicCheckbox(5)), Some(false));
        assert_eq!(
            t.view().last_notification(),
            Some(&(
                NotificationKind::Warning,
                "D-MIC was changed elsewhere; showing the saved state".to_string()
            ))
        );
    }

    #[tokio::test]
    async fn second_toggle_while_pending_is_busy() {
        let api = FakeApi::new();
        let mut t = tracker(api);
        t.ui_mut().pending_dmic.insert(
            5,
            PendingConfirmation {
                requested: true,
                previous: false,
            },
        );

        let err = t.toggle_dmic(ROW, false).await.unwrap_err();

        assert!(matches!(err, ClientError::Busy));
        assert!(t.api().calls("dmic_and_rotate").is_empty());
        assert_eq!(t.view().is_checked(&Node::DmicCheckbox(5)), Some(false));
        assert_eq!(
            t.view().last_notification().map(|n| n.0),
            Some(NotificationKind::Warning)
        );
    }

    #[tokio::test]
    async fn reset_requires_confirmation() {
        let api = FakeApi::new();
        let mut t = tracker(api);
        t.view_mut().answer_confirms(&[false]);

        assert!(matches!(
            t.reset_rotation(5).await,
            Err(ClientError::Cancelled)
        ));
        assert_eq!(t.api().call_count(), 0);
    }

    #[tokio::test]
    async fn toggle_then_reset_returns_to_primary() {
        let api = FakeApi::new();
        api.push("dmic_and_rotate", Ok(rotated(true, "Ben", "Ana")));
        api.push(
            "reset_rotation",
            Ok(json!({ "message": "Rotation reset", "current_presenter": "Ana" })),
        );
        let mut t = tracker(api);

        t.toggle_dmic(ROW, true).await.unwrap();
        t.reset_rotation(5).await.unwrap();

        let view = t.view();
        assert_eq!(view.text(&Node::ActiveSlotChip(5)), Some("Ana"));
        assert_eq!(view.text(&Node::PresenterDisplay(5)), Some("Ana"));
        assert_eq!(view.is_checked(&Node::DmicCheckbox(5)), Some(false));
        assert_eq!(t.ui().rotation_state(5), RotationState::Primary);
    }
}
