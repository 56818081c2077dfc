mod app_state;
mod config;
mod models;
mod routes;
mod services;

use axum::{routing::get, routing::post, Router};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use app_state::AppState;
use config::AppConfig;
use services::scheduler::{JobScheduler, PUBLIC_AVATAR_PREFIX};
use services::store::JobStore;

#[tokio::main]
async fn main() {
    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    // Load configuration from environment
    let config = AppConfig::from_env().expect("Failed to load configuration from environment");

    tracing::info!("Initializing avatar-forge server");

    // Initialize Prometheus metrics recorder
    let prometheus_handle = PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus metrics recorder");
    let prometheus_handle = Arc::new(prometheus_handle);

    // Register application metrics
    metrics::describe_counter!("avatar_jobs_total", "Total avatar jobs submitted");
    metrics::describe_counter!("avatar_jobs_completed", "Total avatar jobs completed");
    metrics::describe_counter!("avatar_jobs_failed", "Total avatar jobs that failed");
    metrics::describe_gauge!(
        "avatar_queue_depth",
        "Current number of queued avatar jobs"
    );
    metrics::describe_histogram!(
        "avatar_generation_seconds",
        "Time to generate one avatar GLB"
    );

    // Ensure working directories exist up front
    for dir in [&config.upload_dir, &config.avatar_dir] {
        tokio::fs::create_dir_all(dir)
            .await
            .expect("Failed to create working directory");
    }

    // In-memory job store and single-worker scheduler
    let store = Arc::new(JobStore::new());
    let scheduler = Arc::new(JobScheduler::new(
        store.clone(),
        PathBuf::from(&config.avatar_dir),
    ));

    tracing::info!("Starting job scheduler worker");
    tokio::spawn(scheduler.clone().run());

    // Periodic eviction of finished job records
    if config.job_ttl_secs > 0 {
        let store = store.clone();
        let ttl = config.job_ttl_secs;
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(60));
            loop {
                interval.tick().await;
                let cutoff = chrono::Utc::now() - chrono::Duration::seconds(ttl as i64);
                let evicted = store.evict_terminal_before(cutoff);
                if evicted > 0 {
                    tracing::debug!(evicted, "Evicted finished job records");
                }
            }
        });
    }

    let avatar_dir = config.avatar_dir.clone();
    let bind_addr = config.bind_addr.clone();

    // Create shared application state
    let state = AppState::new(config, store, scheduler);

    // Build API routes
    let app = Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/avatar/jobs", post(routes::avatar::submit_avatar_job))
        .route("/avatar/jobs/{job_id}", get(routes::avatar::get_job_status))
        .with_state(state)
        // Generated avatars served as static files
        .nest_service(PUBLIC_AVATAR_PREFIX, ServeDir::new(avatar_dir))
        // Prometheus metrics endpoint (separate state)
        .route(
            "/metrics",
            get(routes::metrics::prometheus_metrics).with_state(prometheus_handle),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(RequestBodyLimitLayer::new(10 * 1024 * 1024)); // 10 MB limit

    tracing::info!("Starting avatar-forge on {}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Server listening on {}", bind_addr);

    axum::serve(listener, app).await.expect("Server error");
}
