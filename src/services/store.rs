use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;
use uuid::Uuid;

use crate::models::job::{AvatarJob, JobStatus, JobUpdate};

/// In-memory job record store, keyed by job id.
///
/// Records are created by the upload handler and mutated only by the
/// scheduler afterwards; status pollers read clones. Held behind an `Arc`
/// in application state rather than living as a process global, so tests
/// get isolated instances.
#[derive(Default)]
pub struct JobStore {
    jobs: Mutex<HashMap<Uuid, AvatarJob>>,
}

impl JobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new queued job for the given stored uploads and return it.
    pub fn create(&self, face_path: PathBuf, body_path: PathBuf) -> AvatarJob {
        let now = Utc::now();
        let job = AvatarJob {
            id: Uuid::new_v4(),
            status: JobStatus::Queued,
            progress: 0,
            face_path,
            body_path,
            avatar_url: None,
            error: None,
            created_at: now,
            updated_at: now,
        };
        self.jobs
            .lock()
            .expect("job store lock poisoned")
            .insert(job.id, job.clone());
        job
    }

    /// Look up a job by id.
    pub fn get(&self, id: Uuid) -> Option<AvatarJob> {
        self.jobs
            .lock()
            .expect("job store lock poisoned")
            .get(&id)
            .cloned()
    }

    /// Merge a partial update into an existing record. Unknown ids are a
    /// silent no-op: the producing and updating code paths are decoupled,
    /// so an update can race an eviction.
    pub fn update(&self, id: Uuid, update: JobUpdate) {
        let mut jobs = self.jobs.lock().expect("job store lock poisoned");
        if let Some(job) = jobs.get_mut(&id) {
            if let Some(status) = update.status {
                job.status = status;
            }
            if let Some(progress) = update.progress {
                job.progress = progress;
            }
            if let Some(url) = update.avatar_url {
                job.avatar_url = Some(url);
            }
            if let Some(error) = update.error {
                job.error = Some(error);
            }
            job.updated_at = Utc::now();
        }
    }

    /// Atomically pick some queued job and mark it processing (progress 10).
    /// Returns `None` when nothing is queued. Holding the lock across the
    /// find-and-mark is what keeps two drains from claiming the same job.
    pub fn claim_queued(&self) -> Option<AvatarJob> {
        let mut jobs = self.jobs.lock().expect("job store lock poisoned");
        let job = jobs
            .values_mut()
            .find(|j| j.status == JobStatus::Queued)?;
        job.status = JobStatus::Processing;
        job.progress = 10;
        job.updated_at = Utc::now();
        Some(job.clone())
    }

    /// Number of jobs still waiting to be picked up.
    pub fn queued_len(&self) -> usize {
        self.jobs
            .lock()
            .expect("job store lock poisoned")
            .values()
            .filter(|j| j.status == JobStatus::Queued)
            .count()
    }

    /// Remove terminal (done/failed) records last touched before `cutoff`.
    /// Returns the number of records evicted.
    pub fn evict_terminal_before(&self, cutoff: DateTime<Utc>) -> usize {
        let mut jobs = self.jobs.lock().expect("job store lock poisoned");
        let before = jobs.len();
        jobs.retain(|_, j| !(j.status.is_terminal() && j.updated_at < cutoff));
        before - jobs.len()
    }
}
