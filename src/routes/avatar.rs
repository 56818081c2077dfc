use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;
use std::path::PathBuf;
use uuid::Uuid;

use crate::app_state::AppState;
use crate::models::avatar::{CreateJobResponse, JobStatusResponse};

/// POST /avatar/jobs — Submit face + body images for avatar generation.
///
/// Both multipart fields are required; bytes must parse as a supported
/// image format. On success the job is queued and the scheduler kicked;
/// the client polls the returned job id.
pub async fn submit_avatar_job(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<CreateJobResponse>), StatusCode> {
    let mut face: Option<Vec<u8>> = None;
    let mut body: Option<Vec<u8>> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| StatusCode::BAD_REQUEST)?
    {
        let name = field.name().map(str::to_string);
        let data = field.bytes().await.map_err(|_| StatusCode::BAD_REQUEST)?;

        match name.as_deref() {
            Some("face") | Some("body") => {
                // Reject anything that is not a decodable image up front;
                // invalid inputs never enter the queue
                image::guess_format(&data).map_err(|_| StatusCode::UNSUPPORTED_MEDIA_TYPE)?;
                if name.as_deref() == Some("face") {
                    face = Some(data.to_vec());
                } else {
                    body = Some(data.to_vec());
                }
            }
            _ => continue,
        }
    }

    let (face, body) = match (face, body) {
        (Some(f), Some(b)) => (f, b),
        _ => return Err(StatusCode::BAD_REQUEST),
    };

    let face_path = store_upload(&state, "face", &face).await?;
    let body_path = store_upload(&state, "body", &body).await?;

    let job = state.store.create(face_path, body_path);
    metrics::counter!("avatar_jobs_total").increment(1);
    metrics::gauge!("avatar_queue_depth").set(state.store.queued_len() as f64);

    tracing::info!(job_id = %job.id, "Avatar job queued");
    state.scheduler.kick();

    Ok((StatusCode::CREATED, Json(CreateJobResponse { job_id: job.id })))
}

/// GET /avatar/jobs/{job_id} — Poll avatar generation status.
pub async fn get_job_status(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<JobStatusResponse>, StatusCode> {
    state
        .store
        .get(job_id)
        .map(|job| Json(JobStatusResponse::from(job)))
        .ok_or(StatusCode::NOT_FOUND)
}

/// Persist an uploaded image under the configured upload directory with a
/// unique filename.
async fn store_upload(state: &AppState, kind: &str, data: &[u8]) -> Result<PathBuf, StatusCode> {
    let dir = PathBuf::from(&state.config.upload_dir);
    tokio::fs::create_dir_all(&dir).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to create upload directory");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    let path = dir.join(format!("{}-{kind}.img", Uuid::new_v4()));
    tokio::fs::write(&path, data).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to store upload");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    Ok(path)
}
