use std::sync::Arc;

use crate::config::AppConfig;
use crate::services::{scheduler::JobScheduler, store::JobStore};

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<JobStore>,
    pub scheduler: Arc<JobScheduler>,
}

impl AppState {
    pub fn new(config: AppConfig, store: Arc<JobStore>, scheduler: Arc<JobScheduler>) -> Self {
        Self {
            config: Arc::new(config),
            store,
            scheduler,
        }
    }
}
