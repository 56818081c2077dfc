use avatar_forge::models::job::JobStatus;
use avatar_forge::services::glb::{CHUNK_BIN, CHUNK_JSON, GLB_MAGIC, GLB_VERSION};
use avatar_forge::services::scheduler::{JobScheduler, PUBLIC_AVATAR_PREFIX};
use avatar_forge::services::store::JobStore;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Fresh store + scheduler pair writing into an isolated temp directory.
fn test_harness() -> (Arc<JobStore>, Arc<JobScheduler>, PathBuf) {
    let dir = std::env::temp_dir()
        .join("avatar-forge-it")
        .join(Uuid::new_v4().to_string());
    let store = Arc::new(JobStore::new());
    let scheduler = Arc::new(JobScheduler::new(store.clone(), dir.clone()));
    (store, scheduler, dir)
}

fn enqueue(store: &JobStore) -> Uuid {
    store
        .create(
            PathBuf::from("uploads/face.jpg"),
            PathBuf::from("uploads/body.jpg"),
        )
        .id
}

async fn wait_for_terminal(store: &JobStore, id: Uuid) -> JobStatus {
    for _ in 0..500 {
        if let Some(job) = store.get(id) {
            if matches!(job.status, JobStatus::Done | JobStatus::Failed) {
                return job.status;
            }
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("job {id} never reached a terminal state");
}

fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes(bytes[offset..offset + 4].try_into().unwrap())
}

/// Full happy path: submit two jobs in quick succession, both must reach
/// `done` (no starvation), and each produced file must be a well-formed GLB
/// whose declared accessor regions match the binary payload.
#[tokio::test]
async fn test_two_jobs_complete_with_valid_glb() {
    let (store, scheduler, dir) = test_harness();
    let worker = tokio::spawn(scheduler.clone().run());

    let a = enqueue(&store);
    scheduler.kick();
    let b = enqueue(&store);
    scheduler.kick();

    assert_eq!(wait_for_terminal(&store, a).await, JobStatus::Done);
    assert_eq!(wait_for_terminal(&store, b).await, JobStatus::Done);

    for id in [a, b] {
        let job = store.get(id).unwrap();
        assert_eq!(job.progress, 100);
        assert_eq!(
            job.avatar_url.as_deref(),
            Some(format!("{PUBLIC_AVATAR_PREFIX}/{id}.glb").as_str())
        );
        assert!(job.error.is_none());

        let glb = std::fs::read(dir.join(format!("{id}.glb"))).unwrap();

        // Header: magic, version, declared total length
        assert_eq!(read_u32(&glb, 0), GLB_MAGIC);
        assert_eq!(read_u32(&glb, 4), GLB_VERSION);
        assert_eq!(read_u32(&glb, 8) as usize, glb.len());

        // JSON chunk, 4-byte aligned
        let json_len = read_u32(&glb, 12) as usize;
        assert_eq!(read_u32(&glb, 16), CHUNK_JSON);
        assert_eq!(json_len % 4, 0);
        let doc: serde_json::Value = serde_json::from_slice(&glb[20..20 + json_len]).unwrap();

        // BIN chunk, 4-byte aligned
        let bin_start = 20 + json_len;
        let bin_len = read_u32(&glb, bin_start) as usize;
        assert_eq!(read_u32(&glb, bin_start + 4), CHUNK_BIN);
        assert_eq!(bin_len % 4, 0);
        assert_eq!(bin_start + 8 + bin_len, glb.len());

        // Accessor byte regions line up with the actual buffer split
        let views = doc["bufferViews"].as_array().unwrap();
        let pos_len = views[0]["byteLength"].as_u64().unwrap();
        let idx_off = views[1]["byteOffset"].as_u64().unwrap();
        let idx_len = views[1]["byteLength"].as_u64().unwrap();
        assert_eq!(views[0]["byteOffset"].as_u64().unwrap(), 0);
        assert_eq!(idx_off, pos_len);
        assert_eq!(doc["buffers"][0]["byteLength"].as_u64().unwrap() as usize, bin_len);
        assert!(((pos_len + idx_len) as usize) <= bin_len);
        assert_eq!(doc["asset"]["version"], "2.0");
    }

    worker.abort();
    std::fs::remove_dir_all(&dir).ok();
}

/// Under a burst of concurrent submissions, the single-worker invariant
/// holds: no inspection point ever sees two jobs processing at once.
#[tokio::test]
async fn test_at_most_one_processing() {
    let (store, scheduler, dir) = test_harness();
    let worker = tokio::spawn(scheduler.clone().run());

    // Submissions race in from separate tasks, as they would from
    // concurrent request handlers
    let submissions = (0..8).map(|_| {
        let store = store.clone();
        let scheduler = scheduler.clone();
        tokio::spawn(async move {
            let id = enqueue(&store);
            scheduler.kick();
            id
        })
    });
    let ids: Vec<Uuid> = futures::future::join_all(submissions)
        .await
        .into_iter()
        .map(|handle| handle.unwrap())
        .collect();

    let mut all_terminal = false;
    for _ in 0..5000 {
        let jobs: Vec<_> = ids.iter().filter_map(|id| store.get(*id)).collect();
        let processing = jobs
            .iter()
            .filter(|j| j.status == JobStatus::Processing)
            .count();
        assert!(processing <= 1, "observed {processing} jobs processing");

        if jobs
            .iter()
            .all(|j| matches!(j.status, JobStatus::Done | JobStatus::Failed))
        {
            all_terminal = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
    assert!(all_terminal, "jobs never drained");

    for id in ids {
        assert_eq!(store.get(id).unwrap().status, JobStatus::Done);
    }

    worker.abort();
    std::fs::remove_dir_all(&dir).ok();
}

/// A job whose output directory collides with a plain file fails with a
/// recorded error, and later jobs are still attempted.
#[tokio::test]
async fn test_failed_job_does_not_halt_queue() {
    let parent = std::env::temp_dir()
        .join("avatar-forge-it")
        .join(Uuid::new_v4().to_string());
    std::fs::create_dir_all(&parent).unwrap();
    let blocker = parent.join("not-a-dir");
    std::fs::write(&blocker, b"occupied").unwrap();

    let store = Arc::new(JobStore::new());
    let scheduler = Arc::new(JobScheduler::new(store.clone(), blocker));
    let worker = tokio::spawn(scheduler.clone().run());

    let a = enqueue(&store);
    let b = enqueue(&store);
    scheduler.kick();

    assert_eq!(wait_for_terminal(&store, a).await, JobStatus::Failed);
    assert_eq!(wait_for_terminal(&store, b).await, JobStatus::Failed);

    for id in [a, b] {
        let job = store.get(id).unwrap();
        assert!(!job.error.as_deref().unwrap_or_default().is_empty());
        assert!(job.avatar_url.is_none());
        assert!(job.progress < 100);
    }
    assert_eq!(store.queued_len(), 0);

    worker.abort();
    std::fs::remove_dir_all(&parent).ok();
}

/// Polling an unknown id is a clean not-found, and repeated polls of an
/// untouched job return identical state.
#[tokio::test]
async fn test_lookup_semantics() {
    let (store, _scheduler, _dir) = test_harness();

    assert!(store.get(Uuid::new_v4()).is_none());

    let id = enqueue(&store);
    let first = store.get(id).unwrap();
    let second = store.get(id).unwrap();
    assert_eq!(first.status, second.status);
    assert_eq!(first.progress, second.progress);
    assert_eq!(first.avatar_url, second.avatar_url);
    assert_eq!(first.error, second.error);
    assert_eq!(first.updated_at, second.updated_at);
}
