use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server bind address (e.g., "0.0.0.0:3001").
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Directory where uploaded face/body images are stored
    #[serde(default = "default_upload_dir")]
    pub upload_dir: String,

    /// Directory where generated GLB avatars are written and served from
    #[serde(default = "default_avatar_dir")]
    pub avatar_dir: String,

    /// Seconds a finished (done/failed) job record is retained before
    /// eviction. 0 disables eviction.
    #[serde(default = "default_job_ttl_secs")]
    pub job_ttl_secs: u64,
}

fn default_bind_addr() -> String {
    "0.0.0.0:3001".to_string()
}

fn default_upload_dir() -> String {
    "uploads".to_string()
}

fn default_avatar_dir() -> String {
    "static/avatars".to_string()
}

fn default_job_ttl_secs() -> u64 {
    3600
}

impl AppConfig {
    pub fn from_env() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }
}
