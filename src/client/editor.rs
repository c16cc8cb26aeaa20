use serde_json::Value;

use crate::client::api::{FieldUpdate, TrackerApi};
use crate::client::error::{ClientError, ClientResult};
use crate::client::notify::{Flash, NotificationKind};
use crate::client::view::{Node, TrackerView};
use crate::client::{RowRef, Tracker};
use crate::services::tracker::{AssignmentField, BulkAction};

impl<A: TrackerApi, V: TrackerView> Tracker<A, V> {
    /// Save one edited cell. The caller's control already shows `value`; on
    /// failure it is left as typed and the row flashes red.
    pub async fn update_field(
        &mut self,
        row: RowRef,
        field: AssignmentField,
        value: Value,
    ) -> ClientResult<FieldUpdate> {
        let checked = value.as_bool().unwrap_or(false);
        let result = self
            .api
            .update_field(row.assignment_id, field.as_str(), value)
            .await;

        let update = match result {
            Ok(update) => update,
            Err(e) => {
                tracing::warn!(
                    "Update of {} on assignment {} failed: {}",
                    field.as_str(),
                    row.assignment_id,
                    e
                );
                let message = match &e {
                    ClientError::Application(msg) => format!("Update failed: {}", msg),
                    _ => "Error updating field".to_string(),
                };
                self.view.notify(NotificationKind::Error, &message);
                self.view.flash(&Node::Row(row.assignment_id), Flash::Error);
                return Err(e);
            }
        };

        self.apply_session_stats(row.session_id, &update.session_stats);
        self.apply_day_stats(row.day_id, &update.day_stats);

        if field.affects_presenter() {
            self.apply_presenter_display(
                row.assignment_id,
                &update.presenter_display,
                update.presenter_count,
            );
        }

        // The server clears the other flag; mirror it.
        match field {
            AssignmentField::IsMicd if checked => {
                self.view
                    .set_checked(&Node::DmicCheckbox(row.assignment_id), false);
            }
            AssignmentField::IsDMic if checked => {
                self.view
                    .set_checked(&Node::MicdCheckbox(row.assignment_id), false);
            }
            _ => {}
        }

        self.view.flash(&Node::Row(row.assignment_id), Flash::Success);
        Ok(update)
    }

    /// Session-wide action. `clear_all` asks first; success refreshes.
    pub async fn bulk_update(&mut self, session_id: i64, action: BulkAction) -> ClientResult<()> {
        if action == BulkAction::ClearAll
            && !self.view.confirm("Clear all assignments in this session?")
        {
            return Err(ClientError::Cancelled);
        }

        match self.api.bulk_update(session_id, action.as_str()).await {
            Ok(()) => {
                tracing::info!("Bulk {} applied to session {}", action.as_str(), session_id);
                self.view.reload();
                Ok(())
            }
            Err(e) => {
                let message = match &e {
                    ClientError::Application(msg) => format!("Bulk update failed: {}", msg),
                    _ => "Error in bulk update".to_string(),
                };
                tracing::warn!("Bulk update on session {} failed: {}", session_id, e);
                self.view.notify(NotificationKind::Error, &message);
                Err(e)
            }
        }
    }
}
