use crate::remote_store::RemoteRef;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use uuid::Uuid;

/// What asked for a trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerSource {
    Timer,
    OnDemand,
}

impl fmt::Display for TriggerSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TriggerSource::Timer => write!(f, "timer"),
            TriggerSource::OnDemand => write!(f, "on-demand"),
        }
    }
}

/// Record of one completed trigger.
///
/// `success` reflects the capture only. Local or remote housekeeping problems
/// after a good capture are listed in `warnings`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TriggerOutcome {
    pub id: Uuid,
    pub source: TriggerSource,
    pub index: usize,
    pub url: String,
    pub success: bool,
    pub local_path: Option<PathBuf>,
    pub remote_ref: Option<RemoteRef>,
    pub error: Option<String>,
    pub warnings: Vec<String>,
    /// Cursor position after this trigger.
    pub next_index: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusSnapshot {
    pub sites: Vec<String>,
    pub next_index: usize,
    pub in_flight: Option<TriggerSource>,
    pub triggers_run: u64,
    pub captures_failed: u64,
    pub last_outcome: Option<TriggerOutcome>,
}
