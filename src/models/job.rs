use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

/// Status of an avatar generation job in the async queue.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Processing,
    Done,
    Failed,
}

impl JobStatus {
    /// A terminal job is never picked up or mutated again.
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Done | JobStatus::Failed)
    }
}

/// An avatar generation job.
///
/// Created with `status = Queued, progress = 0`; mutated only by the
/// scheduler afterwards. Exactly one of `avatar_url` / `error` is set once
/// the job reaches a terminal status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvatarJob {
    pub id: Uuid,
    pub status: JobStatus,
    /// Coarse progress checkpoint, 0-100, monotonically non-decreasing.
    pub progress: u8,
    pub face_path: PathBuf,
    pub body_path: PathBuf,
    pub avatar_url: Option<String>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Partial update merged into an existing job record.
///
/// `None` fields are left untouched. `avatar_url` and `error` are only ever
/// set (never cleared), so a plain `Option` is enough.
#[derive(Debug, Default, Clone)]
pub struct JobUpdate {
    pub status: Option<JobStatus>,
    pub progress: Option<u8>,
    pub avatar_url: Option<String>,
    pub error: Option<String>,
}
