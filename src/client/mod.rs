//! Page controllers for the tracker UI.
//!
//! A [`Tracker`] owns the API client, the view and the [`UiSession`]. Its
//! behaviour is split across the submodules by feature; every mutating
//! method suspends only at the API call and then patches the view.

pub mod api;
pub mod context;
pub mod editor;
pub mod error;
pub mod groups;
pub mod lifecycle;
pub mod notify;
pub mod photos;
pub mod rotation;
pub mod shared;
pub mod sync;
pub mod view;

#[cfg(test)]
pub(crate) mod testing;

pub use api::{HttpTrackerApi, TrackerApi};
pub use context::UiSession;
pub use error::{ClientError, ClientResult};
pub use view::{HeadlessView, Node, TrackerView};

use crate::db::{DayStats, SessionStats};
use self::notify::NotificationKind;

/// Where an assignment row sits on the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowRef {
    pub assignment_id: i64,
    pub session_id: i64,
    pub day_id: i64,
}

impl RowRef {
    pub fn new(assignment_id: i64, session_id: i64, day_id: i64) -> Self {
        Self {
            assignment_id,
            session_id,
            day_id,
        }
    }
}

pub struct Tracker<A, V> {
    api: A,
    view: V,
    ui: UiSession,
}

impl<A: TrackerApi, V: TrackerView> Tracker<A, V> {
    pub fn new(api: A, view: V, ui: UiSession) -> Self {
        Self { api, view, ui }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    pub fn ui(&self) -> &UiSession {
        &self.ui
    }

    pub fn ui_mut(&mut self) -> &mut UiSession {
        &mut self.ui
    }

    pub fn into_parts(self) -> (A, V, UiSession) {
        (self.api, self.view, self.ui)
    }

    /// Session footer: `MIC'D: m/t`, `Available: n` and, only when someone
    /// shares a mic, `Shared: n`.
    fn apply_session_stats(&mut self, session_id: i64, stats: &SessionStats) {
        self.view.set_text(
            &Node::SessionMicd(session_id),
            &format!("MIC'D: {}/{}", stats.micd, stats.total),
        );
        self.view.set_text(
            &Node::SessionAvailable(session_id),
            &format!("Available: {}", stats.available()),
        );

        let shared = Node::SessionShared(session_id);
        if stats.shared > 0 {
            self.view.set_text(&shared, &format!("Shared: {}", stats.shared));
            self.view.set_visible(&shared, true);
        } else {
            self.view.set_visible(&shared, false);
        }
    }

    fn apply_day_stats(&mut self, day_id: i64, stats: &DayStats) {
        self.ui.day_stats.insert(day_id, *stats);
        self.view.set_text(
            &Node::DayStats(day_id),
            &format!(
                "{} sessions • {}/{} mic'd",
                stats.sessions, stats.micd, stats.total
            ),
        );
    }

    /// Presenter cell: name, `+N` badge for shared mics and the active chip.
    fn apply_presenter_display(&mut self, assignment_id: i64, display: &str, count: i64) {
        self.view
            .set_text(&Node::PresenterDisplay(assignment_id), display);

        let badge = Node::ShareCount(assignment_id);
        if count > 1 {
            self.view.set_text(&badge, &format!("+{}", count - 1));
            self.view.set_visible(&badge, true);
        } else {
            self.view.set_visible(&badge, false);
        }

        self.apply_active_chip(assignment_id, display);
    }

    fn apply_active_chip(&mut self, assignment_id: i64, presenter: &str) {
        let label = if presenter.trim().is_empty() {
            "Unassigned"
        } else {
            presenter
        };
        self.view
            .set_text(&Node::ActiveSlotChip(assignment_id), label);
    }

    /// Log a failed request and tell the user.
    fn report(&mut self, context: &str, err: &ClientError) {
        tracing::warn!("{}: {}", context, err);
        let message = match err {
            ClientError::Network(_) => "Network error. Please try again.".to_string(),
            other => other.to_string(),
        };
        self.view.notify(NotificationKind::Error, &message);
    }
}
