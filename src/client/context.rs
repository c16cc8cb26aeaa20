use std::collections::HashMap;

use tokio::time::Instant;

use crate::client::api::GroupData;
use crate::client::sync::SyncMonitor;
use crate::config::SyncConfig;
use crate::db::DayStats;
use crate::services::checksum::ChecksumScope;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModalKind {
    AddDay,
    AddSession,
    SharedPresenters,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationState {
    /// D-MIC off, the primary presenter has the mic.
    Primary,
    Rotating,
}

/// A D-MIC toggle the server has not answered yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingConfirmation {
    pub requested: bool,
    pub previous: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Below,
    Above,
}

/// Space a group picker needs under its trigger before it flips upwards.
pub const PICKER_SPACE_BELOW: f64 = 200.0;

impl Placement {
    pub fn for_trigger(trigger_bottom: f64, viewport_height: f64) -> Self {
        if viewport_height - trigger_bottom >= PICKER_SPACE_BELOW {
            Placement::Below
        } else {
            Placement::Above
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenPicker {
    pub session_id: i64,
    pub assignment_id: i64,
    pub placement: Placement,
}

/// Working copy of an assignment's shared presenters while the modal is open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharedDraft {
    pub assignment_id: i64,
    pub session_id: i64,
    pub day_id: i64,
    pub presenters: Vec<String>,
}

/// Everything the page remembers between user actions.
#[derive(Debug)]
pub struct UiSession {
    pub open_modal: Option<ModalKind>,
    pub add_session_day: Option<i64>,
    pub group_cache: HashMap<i64, Vec<GroupData>>,
    pub pending_dmic: HashMap<i64, PendingConfirmation>,
    pub rotation: HashMap<i64, RotationState>,
    pub open_picker: Option<OpenPicker>,
    pub shared_draft: Option<SharedDraft>,
    pub collapsed_days: HashMap<i64, bool>,
    pub day_stats: HashMap<i64, DayStats>,
    pub sync_scope: ChecksumScope,
    pub sync: SyncMonitor,
}

impl UiSession {
    pub fn new(sync_scope: ChecksumScope) -> Self {
        Self::with_monitor(sync_scope, SyncMonitor::new(Instant::now()))
    }

    pub fn from_config(sync_scope: ChecksumScope, config: &SyncConfig) -> Self {
        Self::with_monitor(sync_scope, SyncMonitor::from_config(config, Instant::now()))
    }

    fn with_monitor(sync_scope: ChecksumScope, sync: SyncMonitor) -> Self {
        Self {
            open_modal: None,
            add_session_day: None,
            group_cache: HashMap::new(),
            pending_dmic: HashMap::new(),
            rotation: HashMap::new(),
            open_picker: None,
            shared_draft: None,
            collapsed_days: HashMap::new(),
            day_stats: HashMap::new(),
            sync_scope,
            sync,
        }
    }

    pub fn rotation_state(&self, assignment_id: i64) -> RotationState {
        self.rotation
            .get(&assignment_id)
            .copied()
            .unwrap_or(RotationState::Primary)
    }
}

impl Default for UiSession {
    fn default() -> Self {
        Self::new(ChecksumScope::All)
    }
}
