use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    // Core settings (can override CLI)
    pub db_path: Option<String>,
    pub db_busy_timeout_secs: Option<u64>,
    pub dataset_path: Option<String>,
    pub dataset_format: Option<String>,

    // Feature configs
    pub migration: Option<MigrationConfig>,
    pub images: Option<ImagesConfig>,
    pub storage: Option<StorageConfig>,
    pub spotify: Option<SpotifyConfig>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct MigrationConfig {
    pub progress_interval: Option<usize>,
    pub strict_coordinates: Option<bool>,
    pub error_log_path: Option<String>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct ImagesConfig {
    pub batch_size: Option<usize>,
    pub batch_pause_ms: Option<u64>,
    pub fetch_timeout_secs: Option<u64>,
    pub thumbnail_size: Option<u32>,
    pub thumbnail_quality: Option<u8>,
    pub max_upload_bytes: Option<usize>,
    /// Images whose URL contains this host are migrated.
    pub source_host: Option<String>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct StorageConfig {
    /// "s3", "local" or "memory"
    pub backend: Option<String>,
    pub bucket: Option<String>,
    pub region: Option<String>,
    pub endpoint: Option<String>,
    pub cdn_domain: Option<String>,
    pub local_path: Option<String>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct SpotifyConfig {
    pub client_id: Option<String>,
    pub min_followers: Option<u64>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }
}
