use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// ============================================================================
// Show Day Models
// ============================================================================

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Day {
    pub id: i64,
    pub date: NaiveDate,
    pub name: String,
    pub is_collapsed: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Day {
    /// Name shown in the day header; falls back to the formatted date.
    pub fn display_name(&self) -> String {
        if self.name.trim().is_empty() {
            self.date.format("%A, %B %-d").to_string()
        } else {
            self.name.clone()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDay {
    pub date: NaiveDate,
    pub name: String,
}
