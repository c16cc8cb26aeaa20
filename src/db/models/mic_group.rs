use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// ============================================================================
// Mic Group Models
// ============================================================================

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct MicGroup {
    pub id: i64,
    pub session_id: i64,
    pub name: String,
    pub color: String,
    pub created_at: NaiveDateTime,
}

/// The five fixed colours a group can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupColor {
    Blue,
    Amber,
    Red,
    Purple,
    Teal,
}

impl GroupColor {
    pub const ALL: [GroupColor; 5] = [
        GroupColor::Blue,
        GroupColor::Amber,
        GroupColor::Red,
        GroupColor::Purple,
        GroupColor::Teal,
    ];

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "blue" => Some(GroupColor::Blue),
            "amber" => Some(GroupColor::Amber),
            "red" => Some(GroupColor::Red),
            "purple" => Some(GroupColor::Purple),
            "teal" => Some(GroupColor::Teal),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            GroupColor::Blue => "blue",
            GroupColor::Amber => "amber",
            GroupColor::Red => "red",
            GroupColor::Purple => "purple",
            GroupColor::Teal => "teal",
        }
    }

    /// Swatch used for the indicator dot.
    pub fn hex(self) -> &'static str {
        match self {
            GroupColor::Blue => "#4a9eff",
            GroupColor::Amber => "#ffab00",
            GroupColor::Red => "#ff5252",
            GroupColor::Purple => "#b464ff",
            GroupColor::Teal => "#00bcd4",
        }
    }

    /// Row-level class applied to assignments carrying this group.
    pub fn row_class(self) -> String {
        format!("group-{}", self.as_str())
    }
}

impl TryFrom<&str> for GroupColor {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::from_str(value).ok_or_else(|| format!("Invalid group color: {}", value))
    }
}

impl MicGroup {
    pub fn color(&self) -> Option<GroupColor> {
        GroupColor::from_str(&self.color)
    }
}
