//! Shared presenters: the modal editor, the inline add/remove buttons and
//! the presenter autocomplete list.

use serde_json::Value;

use crate::client::api::{AssignmentData, TrackerApi};
use crate::client::context::{ModalKind, SharedDraft};
use crate::client::error::{ClientError, ClientResult};
use crate::client::notify::NotificationKind;
use crate::client::view::{Node, TrackerView};
use crate::client::{RowRef, Tracker};
use crate::services::tracker::AssignmentField;

impl<A: TrackerApi, V: TrackerView> Tracker<A, V> {
    pub async fn open_shared_editor(&mut self, row: RowRef) -> ClientResult<()> {
        let assignment = match self.api.get_assignment(row.assignment_id).await {
            Ok(assignment) => assignment,
            Err(e) => {
                self.report("Loading assignment failed", &e);
                return Err(e);
            }
        };

        self.ui.shared_draft = Some(SharedDraft {
            assignment_id: row.assignment_id,
            session_id: row.session_id,
            day_id: row.day_id,
            presenters: assignment.shared_presenters,
        });
        self.ui.open_modal = Some(ModalKind::SharedPresenters);
        self.view
            .set_visible(&Node::Modal(ModalKind::SharedPresenters), true);
        self.render_draft();
        Ok(())
    }

    /// Add a name to the draft. Nothing is sent until [`save_shared_editor`].
    ///
    /// [`save_shared_editor`]: Tracker::save_shared_editor
    pub fn add_shared_draft(&mut self, name: &str) -> ClientResult<()> {
        let name = name.trim();
        let Some(draft) = self.ui.shared_draft.as_mut() else {
            return Err(ClientError::Validation("No assignment selected".to_string()));
        };

        let problem = if name.is_empty() {
            Some("Please enter a presenter name")
        } else if draft.presenters.iter().any(|p| p == name) {
            Some("This presenter has already been added")
        } else {
            None
        };
        if let Some(message) = problem {
            self.view.notify(NotificationKind::Warning, message);
            return Err(ClientError::Validation(message.to_string()));
        }

        draft.presenters.push(name.to_string());
        self.render_draft();
        Ok(())
    }

    pub fn remove_shared_draft(&mut self, index: usize) -> Option<String> {
        let draft = self.ui.shared_draft.as_mut()?;
        if index >= draft.presenters.len() {
            return None;
        }
        let removed = draft.presenters.remove(index);
        self.view
            .notify(NotificationKind::Info, &format!("Removed: {}", removed));
        self.render_draft();
        Some(removed)
    }

    /// Send the draft through the field editor; the modal closes on success.
    pub async fn save_shared_editor(&mut self) -> ClientResult<()> {
        let Some(draft) = self.ui.shared_draft.clone() else {
            return Err(ClientError::Validation("No assignment selected".to_string()));
        };

        let row = RowRef::new(draft.assignment_id, draft.session_id, draft.day_id);
        let value = Value::from(draft.presenters.clone());
        self.update_field(row, AssignmentField::SharedPresenters, value)
            .await?;

        self.view.notify(
            NotificationKind::Success,
            &format!("Saved {} shared presenter(s)", draft.presenters.len()),
        );
        self.close_shared_editor();
        Ok(())
    }

    pub fn close_shared_editor(&mut self) {
        self.ui.shared_draft = None;
        if self.ui.open_modal == Some(ModalKind::SharedPresenters) {
            self.ui.open_modal = None;
        }
        self.view
            .set_visible(&Node::Modal(ModalKind::SharedPresenters), false);
    }

    pub async fn add_shared_presenter_inline(
        &mut self,
        assignment_id: i64,
        name: &str,
    ) -> ClientResult<AssignmentData> {
        let name = name.trim();
        if name.is_empty() {
            let message = "Please enter a presenter name";
            self.view.notify(NotificationKind::Warning, message);
            return Err(ClientError::Validation(message.to_string()));
        }

        match self.api.add_shared_presenter(assignment_id, name).await {
            Ok(message) => {
                self.view.notify(NotificationKind::Success, &message);
                self.refresh_presenter_cell(assignment_id).await
            }
            Err(e) => {
                self.report("Adding presenter failed", &e);
                Err(e)
            }
        }
    }

    pub async fn remove_shared_presenter_inline(
        &mut self,
        assignment_id: i64,
        name: &str,
    ) -> ClientResult<AssignmentData> {
        if !self
            .view
            .confirm(&format!("Remove {} from shared presenters?", name))
        {
            return Err(ClientError::Cancelled);
        }

        match self.api.remove_shared_presenter(assignment_id, name).await {
            Ok(message) => {
                self.view.notify(NotificationKind::Success, &message);
                self.refresh_presenter_cell(assignment_id).await
            }
            Err(e) => {
                self.report("Removing presenter failed", &e);
                Err(e)
            }
        }
    }

    /// Fill the autocomplete list with every known presenter name.
    pub async fn load_presenter_suggestions(&mut self) -> ClientResult<Vec<String>> {
        match self.api.list_presenters().await {
            Ok(names) => {
                self.view.render_list(&Node::PresenterSuggestions, &names);
                Ok(names)
            }
            Err(e) => {
                tracing::warn!("Loading presenter suggestions failed: {}", e);
                Err(e)
            }
        }
    }

    async fn refresh_presenter_cell(&mut self, assignment_id: i64) -> ClientResult<AssignmentData> {
        let assignment = match self.api.get_assignment(assignment_id).await {
            Ok(assignment) => assignment,
            Err(e) => {
                self.report("Refreshing assignment failed", &e);
                return Err(e);
            }
        };

        let display = assignment.display_name().to_string();
        self.apply_presenter_display(assignment_id, &display, assignment.presenter_count());
        Ok(assignment)
    }

    fn render_draft(&mut self) {
        if let Some(draft) = &self.ui.shared_draft {
            self.view.render_list(&Node::SharedList, &draft.presenters);
        }
    }
}
