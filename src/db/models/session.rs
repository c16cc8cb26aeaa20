use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Bounds for the number of physical mics in one session.
pub const MIN_MICS_PER_SESSION: i64 = 1;
pub const MAX_MICS_PER_SESSION: i64 = 100;

// ============================================================================
// Mic Session Models
// ============================================================================

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct MicSession {
    pub id: i64,
    pub day_id: i64,
    pub name: String,
    pub location: String,
    pub num_mics: i64,
    pub sort_order: i64,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMicSession {
    pub day_id: i64,
    pub name: String,
    pub location: String,
    pub num_mics: i64,
}
