use std::time::Duration;

/// How long a notification stays in the corner before it slides out.
pub const NOTIFICATION_TIMEOUT: Duration = Duration::from_secs(3);

/// Row highlight duration after a save.
pub const FLASH_DURATION: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationKind {
    Success,
    Error,
    Warning,
    Info,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Success => "success",
            NotificationKind::Error => "error",
            NotificationKind::Warning => "warning",
            NotificationKind::Info => "info",
        }
    }

    pub fn background(&self) -> &'static str {
        match self {
            NotificationKind::Success => "#4caf50",
            NotificationKind::Error => "#f44336",
            NotificationKind::Warning => "#ff9800",
            NotificationKind::Info => "#2196F3",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Flash {
    Success,
    Error,
}

impl Flash {
    pub fn class(&self) -> &'static str {
        match self {
            Flash::Success => "flash-success",
            Flash::Error => "flash-error",
        }
    }
}
