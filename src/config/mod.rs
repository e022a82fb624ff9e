mod file_config;

pub use file_config::{FileConfig, ImagesConfig, MigrationConfig, SpotifyConfig, StorageConfig};

use crate::ingest::DatasetFormat;
use crate::media::image_ingest::{public_base_url, DEFAULT_MAX_UPLOAD_BYTES, DEFAULT_REGION};
use crate::media::image_migration::{ImageMigrationSettings, DEFAULT_SOURCE_HOST};
use crate::media::thumbnail::{DEFAULT_THUMBNAIL_QUALITY, DEFAULT_THUMBNAIL_SIZE};
use crate::migration::{MigrationSettings, DEFAULT_LEDGER_PATH};
use anyhow::{bail, Result};
use clap::ValueEnum;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_DB_PATH: &str = "rapmap.db";
pub const DEFAULT_LOCAL_STORAGE_PATH: &str = "media";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum StorageBackend {
    #[default]
    S3,
    Local,
    Memory,
}

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub db_path: Option<PathBuf>,
    pub db_busy_timeout_secs: u64,
    pub dataset_path: Option<PathBuf>,
    pub dataset_format: DatasetFormat,
    pub error_log_path: Option<PathBuf>,
    pub progress_interval: usize,
    pub strict_coordinates: bool,
    pub batch_size: usize,
    pub batch_pause_ms: u64,
    pub fetch_timeout_secs: u64,
    pub storage_backend: StorageBackend,
    pub bucket: Option<String>,
    pub region: Option<String>,
    pub endpoint: Option<String>,
    pub cdn_domain: Option<String>,
    pub storage_path: Option<PathBuf>,
    pub spotify_client_id: Option<String>,
    pub spotify_client_secret: Option<String>,
    pub min_followers: u64,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            db_busy_timeout_secs: 5,
            dataset_path: None,
            dataset_format: DatasetFormat::Provided,
            error_log_path: None,
            progress_interval: crate::migration::DEFAULT_PROGRESS_INTERVAL,
            strict_coordinates: false,
            batch_size: crate::media::image_migration::DEFAULT_BATCH_SIZE,
            batch_pause_ms: 1000,
            fetch_timeout_secs: 30,
            storage_backend: StorageBackend::S3,
            bucket: None,
            region: None,
            endpoint: None,
            cdn_domain: None,
            storage_path: None,
            spotify_client_id: None,
            spotify_client_secret: None,
            min_followers: crate::spotify::DEFAULT_MIN_FOLLOWERS,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    // Core settings
    pub db_path: PathBuf,
    pub db_busy_timeout: Duration,
    pub dataset_path: Option<PathBuf>,
    pub dataset_format: DatasetFormat,
    pub error_log_path: PathBuf,

    // Feature configs (with defaults)
    pub migration: MigrationSettings,
    pub images: ImageSettings,
    pub storage: StorageSettings,
    pub spotify: SpotifySettings,
}

#[derive(Debug, Clone)]
pub struct ImageSettings {
    pub migration: ImageMigrationSettings,
    pub fetch_timeout: Duration,
    pub thumbnail_size: u32,
    pub thumbnail_quality: u8,
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone)]
pub struct StorageSettings {
    pub backend: StorageBackend,
    pub bucket: Option<String>,
    pub region: String,
    pub endpoint: Option<String>,
    pub cdn_domain: Option<String>,
    pub local_path: PathBuf,
}

impl StorageSettings {
    /// Base of the public URLs handed out for stored images. Needs a CDN
    /// domain, or a bucket to derive the S3 URL from.
    pub fn public_base_url(&self) -> Result<String> {
        let cdn_domain = self.cdn_domain.as_deref().filter(|d| !d.trim().is_empty());
        let bucket = self.bucket.as_deref().filter(|b| !b.trim().is_empty());
        match (cdn_domain, bucket) {
            (None, None) => bail!(
                "Public image URLs need a CDN domain (--cdn-domain, CLOUDFRONT_DOMAIN) \
                 or a bucket (--bucket, S3_BUCKET_NAME)"
            ),
            (cdn_domain, bucket) => Ok(public_base_url(
                bucket.unwrap_or_default(),
                &self.region,
                cdn_domain,
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SpotifySettings {
    pub client_id: Option<String>,
    /// Only ever read from the environment.
    pub client_secret: Option<String>,
    pub min_followers: u64,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let db_path = file
            .db_path
            .map(PathBuf::from)
            .or_else(|| cli.db_path.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PATH));

        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if !parent.is_dir() {
                bail!("Database directory does not exist: {:?}", parent);
            }
        }

        let db_busy_timeout =
            Duration::from_secs(file.db_busy_timeout_secs.unwrap_or(cli.db_busy_timeout_secs));

        let dataset_path = file
            .dataset_path
            .map(PathBuf::from)
            .or_else(|| cli.dataset_path.clone());

        let dataset_format = match file.dataset_format {
            Some(format) => parse_dataset_format(&format)?,
            None => cli.dataset_format,
        };

        // Migration settings - merge file config with CLI values
        let migration_file = file.migration.unwrap_or_default();
        let error_log_path = migration_file
            .error_log_path
            .map(PathBuf::from)
            .or_else(|| cli.error_log_path.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LEDGER_PATH));
        let migration = MigrationSettings {
            progress_interval: migration_file
                .progress_interval
                .unwrap_or(cli.progress_interval),
            strict_coordinates: migration_file
                .strict_coordinates
                .unwrap_or(cli.strict_coordinates),
        };

        let images_file = file.images.unwrap_or_default();
        let batch_size = images_file.batch_size.unwrap_or(cli.batch_size);
        if batch_size == 0 {
            bail!("images.batch_size must be at least 1");
        }
        let thumbnail_size = images_file.thumbnail_size.unwrap_or(DEFAULT_THUMBNAIL_SIZE);
        if thumbnail_size == 0 {
            bail!("images.thumbnail_size must be at least 1");
        }
        let thumbnail_quality = images_file
            .thumbnail_quality
            .unwrap_or(DEFAULT_THUMBNAIL_QUALITY);
        if !(1..=100).contains(&thumbnail_quality) {
            bail!(
                "images.thumbnail_quality must be between 1 and 100, got {}",
                thumbnail_quality
            );
        }
        let images = ImageSettings {
            migration: ImageMigrationSettings {
                batch_size,
                batch_pause: Duration::from_millis(
                    images_file.batch_pause_ms.unwrap_or(cli.batch_pause_ms),
                ),
                source_host: images_file
                    .source_host
                    .unwrap_or_else(|| DEFAULT_SOURCE_HOST.to_string()),
            },
            fetch_timeout: Duration::from_secs(
                images_file
                    .fetch_timeout_secs
                    .unwrap_or(cli.fetch_timeout_secs),
            ),
            thumbnail_size,
            thumbnail_quality,
            max_upload_bytes: images_file
                .max_upload_bytes
                .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES),
        };

        let storage_file = file.storage.unwrap_or_default();
        let backend = match storage_file.backend {
            Some(backend) => parse_storage_backend(&backend)?,
            None => cli.storage_backend,
        };
        let storage = StorageSettings {
            backend,
            bucket: storage_file.bucket.or_else(|| cli.bucket.clone()),
            region: storage_file
                .region
                .or_else(|| cli.region.clone())
                .unwrap_or_else(|| DEFAULT_REGION.to_string()),
            endpoint: storage_file.endpoint.or_else(|| cli.endpoint.clone()),
            cdn_domain: storage_file.cdn_domain.or_else(|| cli.cdn_domain.clone()),
            local_path: storage_file
                .local_path
                .map(PathBuf::from)
                .or_else(|| cli.storage_path.clone())
                .unwrap_or_else(|| PathBuf::from(DEFAULT_LOCAL_STORAGE_PATH)),
        };

        let spotify_file = file.spotify.unwrap_or_default();
        let spotify = SpotifySettings {
            client_id: spotify_file
                .client_id
                .or_else(|| cli.spotify_client_id.clone()),
            client_secret: cli.spotify_client_secret.clone(),
            min_followers: spotify_file.min_followers.unwrap_or(cli.min_followers),
        };

        Ok(Self {
            db_path,
            db_busy_timeout,
            dataset_path,
            dataset_format,
            error_log_path,
            migration,
            images,
            storage,
            spotify,
        })
    }

    /// The dataset path, required by every action that reads the dataset.
    pub fn require_dataset_path(&self) -> Result<&PathBuf> {
        match &self.dataset_path {
            Some(path) => Ok(path),
            None => bail!("A dataset must be specified via --dataset or in config file"),
        }
    }
}

/// Uses clap's ValueEnum trait for parsing.
fn parse_dataset_format(s: &str) -> Result<DatasetFormat> {
    DatasetFormat::from_str(s, true)
        .map_err(|_| anyhow::anyhow!("Unknown dataset_format in config file: {}", s))
}

fn parse_storage_backend(s: &str) -> Result<StorageBackend> {
    StorageBackend::from_str(s, true)
        .map_err(|_| anyhow::anyhow!("Unknown storage backend in config file: {}", s))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_enums() {
        assert_eq!(parse_dataset_format("legacy").unwrap(), DatasetFormat::Legacy);
        assert_eq!(parse_dataset_format("PROVIDED").unwrap(), DatasetFormat::Provided);
        assert!(parse_dataset_format("csv").is_err());
        assert_eq!(parse_storage_backend("local").unwrap(), StorageBackend::Local);
        assert_eq!(parse_storage_backend("S3").unwrap(), StorageBackend::S3);
        assert!(parse_storage_backend("gcs").is_err());
    }

    #[test]
    fn test_resolve_defaults() {
        let config = AppConfig::resolve(&CliConfig::default(), None).unwrap();
        assert_eq!(config.db_path, PathBuf::from(DEFAULT_DB_PATH));
        assert_eq!(config.db_busy_timeout, Duration::from_secs(5));
        assert_eq!(config.error_log_path, PathBuf::from("migration-errors.log"));
        assert_eq!(config.migration.progress_interval, 50);
        assert!(!config.migration.strict_coordinates);
        assert_eq!(config.images.migration.batch_size, 5);
        assert_eq!(config.images.migration.batch_pause, Duration::from_secs(1));
        assert_eq!(config.images.migration.source_host, "i.scdn.co");
        assert_eq!(config.images.fetch_timeout, Duration::from_secs(30));
        assert_eq!(config.images.thumbnail_size, 300);
        assert_eq!(config.images.thumbnail_quality, 85);
        assert_eq!(config.images.max_upload_bytes, 5 * 1024 * 1024);
        assert_eq!(config.storage.region, "ap-northeast-1");
        assert_eq!(config.spotify.min_followers, 10_000);
        assert!(config.dataset_path.is_none());
        assert!(config.require_dataset_path().is_err());
    }

    #[test]
    fn test_resolve_cli_only() {
        let temp_dir = TempDir::new().unwrap();
        let cli = CliConfig {
            db_path: Some(temp_dir.path().join("artists.db")),
            dataset_path: Some(PathBuf::from("data/artists.json")),
            dataset_format: DatasetFormat::Legacy,
            progress_interval: 10,
            strict_coordinates: true,
            batch_size: 3,
            bucket: Some("rapmap-images".to_string()),
            region: Some("us-east-1".to_string()),
            ..Default::default()
        };

        let config = AppConfig::resolve(&cli, None).unwrap();
        assert_eq!(config.db_path, temp_dir.path().join("artists.db"));
        assert_eq!(config.dataset_format, DatasetFormat::Legacy);
        assert_eq!(config.migration.progress_interval, 10);
        assert!(config.migration.strict_coordinates);
        assert_eq!(config.images.migration.batch_size, 3);
        assert_eq!(
            config.storage.public_base_url().unwrap(),
            "https://rapmap-images.s3.us-east-1.amazonaws.com"
        );
    }

    #[test]
    fn test_resolve_toml_overrides_cli() {
        let temp_dir = TempDir::new().unwrap();
        let cli = CliConfig {
            db_path: Some(PathBuf::from("/should/be/overridden/artists.db")),
            progress_interval: 10,
            batch_size: 3,
            bucket: Some("cli-bucket".to_string()),
            cdn_domain: Some("cli.cdn.example".to_string()),
            ..Default::default()
        };

        let toml = format!(
            r#"
            db_path = "{}"
            dataset_format = "legacy"

            [migration]
            strict_coordinates = true
            error_log_path = "retry.log"

            [images]
            batch_size = 8

            [storage]
            backend = "local"
            cdn_domain = "https://images.example.com"
            "#,
            temp_dir.path().join("artists.db").display()
        );
        let file_config: FileConfig = toml::from_str(&toml).unwrap();

        let config = AppConfig::resolve(&cli, Some(file_config)).unwrap();

        // TOML values should override CLI
        assert_eq!(config.db_path, temp_dir.path().join("artists.db"));
        assert_eq!(config.dataset_format, DatasetFormat::Legacy);
        assert!(config.migration.strict_coordinates);
        assert_eq!(config.error_log_path, PathBuf::from("retry.log"));
        assert_eq!(config.images.migration.batch_size, 8);
        assert_eq!(config.storage.backend, StorageBackend::Local);
        assert_eq!(
            config.storage.public_base_url().unwrap(),
            "https://images.example.com"
        );
        // CLI value used when TOML doesn't specify
        assert_eq!(config.migration.progress_interval, 10);
        assert_eq!(config.storage.bucket.as_deref(), Some("cli-bucket"));
    }

    #[test]
    fn test_resolve_rejects_bad_values() {
        let cli = CliConfig {
            batch_size: 0,
            ..Default::default()
        };
        let err = AppConfig::resolve(&cli, None).unwrap_err();
        assert!(err.to_string().contains("batch_size"));

        let file = FileConfig {
            images: Some(ImagesConfig {
                thumbnail_quality: Some(0),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert!(AppConfig::resolve(&CliConfig::default(), Some(file)).is_err());

        let file = FileConfig {
            images: Some(ImagesConfig {
                thumbnail_size: Some(0),
                ..Default::default()
            }),
            ..Default::default()
        };
        let err = AppConfig::resolve(&CliConfig::default(), Some(file)).unwrap_err();
        assert!(err.to_string().contains("thumbnail_size"));

        let file = FileConfig {
            storage: Some(StorageConfig {
                backend: Some("ftp".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert!(AppConfig::resolve(&CliConfig::default(), Some(file)).is_err());
    }

    #[test]
    fn test_public_base_url_needs_cdn_or_bucket() {
        for backend in [StorageBackend::Local, StorageBackend::Memory, StorageBackend::S3] {
            let cli = CliConfig {
                storage_backend: backend,
                ..Default::default()
            };
            let config = AppConfig::resolve(&cli, None).unwrap();
            let err = config.storage.public_base_url().unwrap_err();
            assert!(err.to_string().contains("CDN domain"));
        }

        let cli = CliConfig {
            storage_backend: StorageBackend::Local,
            bucket: Some(String::new()),
            cdn_domain: Some("media.rapmap.example".to_string()),
            ..Default::default()
        };
        let config = AppConfig::resolve(&cli, None).unwrap();
        assert_eq!(
            config.storage.public_base_url().unwrap(),
            "https://media.rapmap.example"
        );
    }

    #[test]
    fn test_resolve_missing_db_dir_error() {
        let cli = CliConfig {
            db_path: Some(PathBuf::from("/nonexistent/path/that/should/not/exist/a.db")),
            ..Default::default()
        };
        let result = AppConfig::resolve(&cli, None);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("does not exist"));
    }

    #[test]
    fn test_spotify_secret_only_from_cli_env() {
        let cli = CliConfig {
            spotify_client_id: Some("cli-id".to_string()),
            spotify_client_secret: Some("secret".to_string()),
            ..Default::default()
        };
        let file = FileConfig {
            spotify: Some(SpotifyConfig {
                client_id: Some("toml-id".to_string()),
                min_followers: Some(500),
            }),
            ..Default::default()
        };
        let config = AppConfig::resolve(&cli, Some(file)).unwrap();
        assert_eq!(config.spotify.client_id.as_deref(), Some("toml-id"));
        assert_eq!(config.spotify.client_secret.as_deref(), Some("secret"));
        assert_eq!(config.spotify.min_followers, 500);
    }
}
