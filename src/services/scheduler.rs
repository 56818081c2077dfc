use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

use crate::models::job::{AvatarJob, JobStatus, JobUpdate};
use crate::services::glb::{self, GlbError};
use crate::services::store::JobStore;

/// URL prefix under which generated avatars are served.
pub const PUBLIC_AVATAR_PREFIX: &str = "/static/avatars";

/// Generator tag embedded in the GLB asset metadata.
const GENERATOR: &str = concat!("avatar-forge/", env!("CARGO_PKG_VERSION"));

/// Single-worker cooperative job scheduler.
///
/// Submission paths call [`kick`](Self::kick) and return immediately; a
/// dedicated worker task runs [`run`](Self::run), draining the store one job
/// at a time. At most one job is ever in `processing`, and concurrent
/// submissions are serialized, never parallelized.
pub struct JobScheduler {
    store: Arc<JobStore>,
    avatar_dir: PathBuf,
    notify: Notify,
    draining: AtomicBool,
}

#[derive(Debug, thiserror::Error)]
enum GenerateError {
    #[error(transparent)]
    Glb(#[from] GlbError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("generation task panicked: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl JobScheduler {
    pub fn new(store: Arc<JobStore>, avatar_dir: PathBuf) -> Self {
        Self {
            store,
            avatar_dir,
            notify: Notify::new(),
            draining: AtomicBool::new(false),
        }
    }

    /// Signal the worker that queued work may exist. Safe to call from any
    /// number of request handlers; if a drain is already in flight the
    /// stored permit makes the worker re-check after it finishes, so no
    /// wakeup is lost.
    pub fn kick(&self) {
        self.notify.notify_one();
    }

    /// Worker loop: wait for a kick, then drain. Spawn once per scheduler.
    pub async fn run(self: Arc<Self>) {
        loop {
            self.notify.notified().await;
            self.drain().await;
        }
    }

    /// Process queued jobs one at a time until none remain. Guarded by an
    /// in-flight flag so only one logical drain executes at a time.
    async fn drain(&self) {
        if self.draining.swap(true, Ordering::SeqCst) {
            return;
        }

        while let Some(job) = self.store.claim_queued() {
            self.process(job).await;
            metrics::gauge!("avatar_queue_depth").set(self.store.queued_len() as f64);
        }

        self.draining.store(false, Ordering::SeqCst);
    }

    /// Run one claimed job to completion, converting any failure into
    /// terminal record state. Nothing escapes this boundary: one job's
    /// failure must not stop the drain.
    async fn process(&self, job: AvatarJob) {
        tracing::info!(job_id = %job.id, "Processing avatar job");
        let start = std::time::Instant::now();

        match self.generate(&job).await {
            Ok(avatar_url) => {
                self.store.update(
                    job.id,
                    JobUpdate {
                        status: Some(JobStatus::Done),
                        progress: Some(100),
                        avatar_url: Some(avatar_url),
                        error: None,
                    },
                );
                metrics::counter!("avatar_jobs_completed").increment(1);
                metrics::histogram!("avatar_generation_seconds")
                    .record(start.elapsed().as_secs_f64());
                tracing::info!(
                    job_id = %job.id,
                    duration_ms = start.elapsed().as_millis(),
                    "Avatar job completed"
                );
            }
            Err(e) => {
                // Terminal: failed jobs are never retried. Progress stays
                // at the last checkpoint reached.
                tracing::error!(job_id = %job.id, error = %e, "Avatar job failed");
                self.store.update(
                    job.id,
                    JobUpdate {
                        status: Some(JobStatus::Failed),
                        progress: None,
                        avatar_url: None,
                        error: Some(e.to_string()),
                    },
                );
                metrics::counter!("avatar_jobs_failed").increment(1);
            }
        }
    }

    /// Generation step: ensure the output directory exists, encode the mesh,
    /// write `<avatar_dir>/<job-id>.glb`. The geometry is currently the
    /// fixed placeholder box regardless of the uploaded images; the encoder
    /// accepts arbitrary meshes so real generation can slot in later.
    async fn generate(&self, job: &AvatarJob) -> Result<String, GenerateError> {
        tokio::fs::create_dir_all(&self.avatar_dir).await?;

        self.store.update(
            job.id,
            JobUpdate {
                progress: Some(50),
                ..Default::default()
            },
        );

        let path = self.avatar_dir.join(format!("{}.glb", job.id));
        tokio::task::spawn_blocking(move || {
            glb::write_glb(
                &path,
                &glb::PLACEHOLDER_POSITIONS,
                &glb::PLACEHOLDER_INDICES,
                GENERATOR,
            )
        })
        .await??;

        Ok(format!("{}/{}.glb", PUBLIC_AVATAR_PREFIX, job.id))
    }
}
