use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Position of the primary presenter; shared presenters follow from 1.
pub const PRIMARY_SLOT: i64 = 0;

// ============================================================================
// Presenter Slot Models
// ============================================================================

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct PresenterSlot {
    pub id: i64,
    pub assignment_id: i64,
    pub position: i64,
    pub presenter_name: String,
    pub photo_path: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl PresenterSlot {
    pub fn is_primary(&self) -> bool {
        self.position == PRIMARY_SLOT
    }
}
