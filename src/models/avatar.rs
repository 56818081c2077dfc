use serde::Serialize;
use uuid::Uuid;

use crate::models::job::{AvatarJob, JobStatus};

/// Response to a job submission.
#[derive(Debug, Serialize)]
pub struct CreateJobResponse {
    pub job_id: Uuid,
}

/// Response to a job status poll.
#[derive(Debug, Serialize)]
pub struct JobStatusResponse {
    pub job_id: Uuid,
    pub status: JobStatus,
    pub progress: u8,
    pub avatar_url: Option<String>,
    pub error: Option<String>,
}

impl From<AvatarJob> for JobStatusResponse {
    fn from(job: AvatarJob) -> Self {
        Self {
            job_id: job.id,
            status: job.status,
            progress: job.progress,
            avatar_url: job.avatar_url,
            error: job.error,
        }
    }
}
