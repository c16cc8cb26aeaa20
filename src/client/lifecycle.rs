use chrono::NaiveDate;

use crate::client::api::{DuplicateResult, NewSession, TrackerApi};
use crate::client::context::ModalKind;
use crate::client::error::{ClientError, ClientResult};
use crate::client::notify::NotificationKind;
use crate::client::view::{Node, TrackerView};
use crate::client::Tracker;
use crate::db::{MAX_MICS_PER_SESSION, MIN_MICS_PER_SESSION};

const NETWORK_ERROR: &str = "Network error. Please try again.";

impl<A: TrackerApi, V: TrackerView> Tracker<A, V> {
    /// Show the add-day modal. Returns today's date for the date field.
    pub fn open_add_day(&mut self) -> String {
        self.open_modal(ModalKind::AddDay);
        chrono::Local::now().date_naive().format("%Y-%m-%d").to_string()
    }

    pub fn open_add_session(&mut self, day_id: i64) {
        self.open_modal(ModalKind::AddSession);
        self.ui.add_session_day = Some(day_id);
    }

    pub fn close_modal(&mut self) {
        if let Some(kind) = self.ui.open_modal.take() {
            self.view.set_visible(&Node::Modal(kind), false);
            if kind == ModalKind::AddSession {
                self.ui.add_session_day = None;
            }
        }
    }

    pub async fn submit_add_day(&mut self, date: &str, name: &str) -> ClientResult<i64> {
        let date = date.trim();
        if date.is_empty() {
            return self.modal_invalid(ModalKind::AddDay, "Please select a date.");
        }
        if NaiveDate::parse_from_str(date, "%Y-%m-%d").is_err() {
            return self.modal_invalid(ModalKind::AddDay, "Date must be in YYYY-MM-DD format.");
        }
        self.hide_modal_error(ModalKind::AddDay);

        match self.api.create_day(date, name.trim()).await {
            Ok(day_id) => {
                tracing::info!("Created day {} ({})", day_id, date);
                self.close_modal();
                self.view.reload();
                Ok(day_id)
            }
            Err(e) => self.modal_failed(ModalKind::AddDay, "Failed to create day.", e),
        }
    }

    /// `num_mics` is the raw field text.
    pub async fn submit_add_session(
        &mut self,
        name: &str,
        num_mics: &str,
        location: &str,
    ) -> ClientResult<i64> {
        let name = name.trim();
        if name.is_empty() {
            return self.modal_invalid(ModalKind::AddSession, "Please enter a session name.");
        }

        let num_mics = match num_mics.trim().parse::<i64>() {
            Ok(n) if (MIN_MICS_PER_SESSION..=MAX_MICS_PER_SESSION).contains(&n) => n,
            _ => {
                return self.modal_invalid(
                    ModalKind::AddSession,
                    &format!(
                        "Mic count must be between {} and {}.",
                        MIN_MICS_PER_SESSION, MAX_MICS_PER_SESSION
                    ),
                )
            }
        };

        let Some(day_id) = self.ui.add_session_day else {
            return self.modal_invalid(ModalKind::AddSession, "No day selected.");
        };
        self.hide_modal_error(ModalKind::AddSession);

        let session = NewSession {
            day_id,
            name: name.to_string(),
            num_mics,
            location: location.trim().to_string(),
        };

        match self.api.create_session(&session).await {
            Ok(session_id) => {
                tracing::info!("Created session {} on day {}", session_id, day_id);
                self.close_modal();
                self.view.reload();
                Ok(session_id)
            }
            Err(e) => self.modal_failed(ModalKind::AddSession, "Failed to create session.", e),
        }
    }

    /// An empty target name means the user dismissed the prompt.
    pub async fn duplicate_session(
        &mut self,
        source_session_id: i64,
        target_name: &str,
    ) -> ClientResult<DuplicateResult> {
        let target_name = target_name.trim();
        if target_name.is_empty() {
            return Err(ClientError::Cancelled);
        }

        match self.api.duplicate_session(source_session_id, target_name).await {
            Ok(out) => {
                self.view.notify(NotificationKind::Success, &out.message);
                self.view.reload();
                Ok(out)
            }
            Err(e) => {
                tracing::warn!("Duplicating session {} failed: {}", source_session_id, e);
                let message = match &e {
                    ClientError::Application(msg) => format!("Duplication failed: {}", msg),
                    _ => "Error duplicating session".to_string(),
                };
                self.view.notify(NotificationKind::Error, &message);
                Err(e)
            }
        }
    }

    pub async fn delete_session(&mut self, session_id: i64) -> ClientResult<()> {
        if !self
            .view
            .confirm("Delete this session and all of its mic assignments?")
        {
            return Err(ClientError::Cancelled);
        }

        match self.api.delete_session(session_id).await {
            Ok(()) => {
                tracing::info!("Deleted session {}", session_id);
                self.view.reload();
                Ok(())
            }
            Err(e) => {
                self.report("Deleting session failed", &e);
                Err(e)
            }
        }
    }

    /// Record the collapse state the page was rendered with.
    pub fn load_day_states(&mut self, days: &[(i64, bool)]) {
        for &(day_id, collapsed) in days {
            self.set_day_collapsed(day_id, collapsed);
        }
    }

    /// Collapse or expand a day locally, then save it. The server's answer wins.
    pub async fn toggle_day(&mut self, day_id: i64) -> bool {
        let collapsed = !self.is_day_collapsed(day_id);
        self.set_day_collapsed(day_id, collapsed);
        self.save_day_state(day_id, collapsed).await
    }

    pub async fn expand_all_days(&mut self) {
        self.set_all_days(false).await;
    }

    pub async fn collapse_all_days(&mut self) {
        self.set_all_days(true).await;
    }

    pub fn is_day_collapsed(&self, day_id: i64) -> bool {
        self.ui.collapsed_days.get(&day_id).copied().unwrap_or(false)
    }

    async fn set_all_days(&mut self, collapsed: bool) {
        let mut days: Vec<i64> = self.ui.collapsed_days.keys().copied().collect();
        days.sort_unstable();
        for &day_id in &days {
            self.set_day_collapsed(day_id, collapsed);
        }
        for day_id in days {
            self.save_day_state(day_id, collapsed).await;
        }
    }

    /// Best-effort save; a failed request keeps the local state.
    async fn save_day_state(&mut self, day_id: i64, collapsed: bool) -> bool {
        match self.api.toggle_day(day_id, collapsed).await {
            Ok(stored) => {
                if stored != collapsed {
                    self.set_day_collapsed(day_id, stored);
                }
                stored
            }
            Err(e) => {
                tracing::warn!("Saving collapse state of day {} failed: {}", day_id, e);
                collapsed
            }
        }
    }

    fn set_day_collapsed(&mut self, day_id: i64, collapsed: bool) {
        self.ui.collapsed_days.insert(day_id, collapsed);
        let node = Node::Day(day_id);
        if collapsed {
            self.view.add_class(&node, "collapsed");
        } else {
            self.view.remove_class(&node, "collapsed");
        }
    }

    fn open_modal(&mut self, kind: ModalKind) {
        self.close_modal();
        self.ui.open_modal = Some(kind);
        self.hide_modal_error(kind);
        self.view.set_visible(&Node::Modal(kind), true);
    }

    fn hide_modal_error(&mut self, kind: ModalKind) {
        self.view.set_visible(&Node::ModalError(kind), false);
    }

    fn show_modal_error(&mut self, kind: ModalKind, message: &str) {
        let node = Node::ModalError(kind);
        self.view.set_text(&node, message);
        self.view.set_visible(&node, true);
    }

    fn modal_invalid<T>(&mut self, kind: ModalKind, message: &str) -> ClientResult<T> {
        self.show_modal_error(kind, message);
        Err(ClientError::Validation(message.to_string()))
    }

    fn modal_failed<T>(&mut self, kind: ModalKind, fallback: &str, err: ClientError) -> ClientResult<T> {
        tracing::warn!("{} {}", fallback, err);
        let message = match &err {
            ClientError::Application(msg) if !msg.is_empty() => msg.clone(),
            ClientError::Application(_) => fallback.to_string(),
            _ => NETWORK_ERROR.to_string(),
        };
        self.show_modal_error(kind, &message);
        Err(err)
    }
}
