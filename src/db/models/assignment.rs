use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;

use super::mic_type::MicType;
use super::presenter_slot::PRIMARY_SLOT;

// ============================================================================
// Mic Assignment Models
// ============================================================================

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct MicAssignment {
    pub id: i64,
    pub session_id: i64,
    pub rf_number: i64,
    pub mic_type: String,
    pub is_d_mic: bool,
    pub is_micd: bool,
    pub group_id: Option<i64>,
    pub shared_presenters: Json<Vec<String>>,
    pub active_slot: i64,
    pub notes: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl MicAssignment {
    pub fn mic_type(&self) -> MicType {
        MicType::from_str(&self.mic_type).unwrap_or_default()
    }

    /// Channel label as printed on the sheet, e.g. `RF07`.
    pub fn rf_label(&self) -> String {
        format!("RF{:02}", self.rf_number)
    }

    pub fn shared(&self) -> &[String] {
        &self.shared_presenters.0
    }

    pub fn is_rotating(&self) -> bool {
        self.is_d_mic && self.active_slot != PRIMARY_SLOT
    }
}

/// Aggregate counts rendered in a session footer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct SessionStats {
    pub micd: i64,
    pub total: i64,
    pub shared: i64,
}

impl SessionStats {
    pub fn available(&self) -> i64 {
        self.total - self.micd
    }
}

/// Aggregate counts across every session of one day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct DayStats {
    pub sessions: i64,
    pub total: i64,
    pub micd: i64,
    pub shared: i64,
}
