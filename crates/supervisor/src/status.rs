use chrono::{DateTime, Utc};
use serde::Serialize;

/// Lifecycle phase of the supervised run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Idle,
    Starting,
    Running,
    Stopping,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Starting => "starting",
            Self::Running => "running",
            Self::Stopping => "stopping",
        }
    }
}

/// Point-in-time view of the run, shaped for the status endpoint
#[derive(Debug, Clone, Serialize)]
pub struct StatusSnapshot {
    pub status: RunStatus,
    pub ticker: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub last_tick_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

impl StatusSnapshot {
    pub fn idle() -> Self {
        Self {
            status: RunStatus::Idle,
            ticker: None,
            started_at: None,
            last_tick_at: None,
            last_error: None,
        }
    }
}
