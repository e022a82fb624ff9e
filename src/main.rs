use anyhow::{bail, Context, Result};
use clap::Parser;
use rapmap_ingest::artist_store::{ArtistStore, SqliteArtistStore};
use rapmap_ingest::config::{AppConfig, CliConfig, FileConfig, StorageBackend};
use rapmap_ingest::ingest::{find_duplicate_names, load_dataset, summarize, DatasetFormat};
use rapmap_ingest::media::object_storage::PROBE_KEY;
use rapmap_ingest::media::{
    file_name_from_url, HttpImageFetcher, ImageIngestor, ImageMigrator, ImageThumbnailer,
    ImageUploadResult, ObjectStorage, ObjectStoreStorage, SleepPacer,
};
use rapmap_ingest::migration::{ErrorLedger, MigrationRunner};
use rapmap_ingest::spotify::SpotifyClient;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, level_filters::LevelFilter, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    if path_buf.is_absolute() {
        return Ok(path_buf);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(path_buf))
}

#[derive(Parser, Debug)]
#[clap(about = "Artist dataset ingestion, migration and image tooling")]
struct CliArgs {
    /// Path to a TOML config file. Values in the file override CLI arguments.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// Path to the SQLite artist database.
    #[clap(long, env = "RAPMAP_DB_PATH", value_parser = parse_path)]
    pub db_path: Option<PathBuf>,

    /// Seconds a statement waits on a locked database before failing.
    #[clap(long, default_value_t = 5)]
    pub db_busy_timeout_secs: u64,

    /// Path to the JSON dataset to migrate.
    #[clap(long, value_parser = parse_path)]
    pub dataset: Option<PathBuf>,

    /// Shape of the records in the dataset.
    #[clap(long, value_enum, default_value = "provided")]
    pub dataset_format: DatasetFormat,

    /// Path of the error ledger used for retry runs.
    #[clap(long, value_parser = parse_path)]
    pub error_log: Option<PathBuf>,

    /// Log a running tally every this many records.
    #[clap(long, default_value_t = 50)]
    pub progress_interval: usize,

    /// Reject records whose coordinates cannot be parsed instead of storing (0, 0).
    #[clap(long)]
    pub strict_coordinates: bool,

    /// Number of images migrated concurrently.
    #[clap(long, default_value_t = 5)]
    pub batch_size: usize,

    /// Pause between image chunks, in milliseconds.
    #[clap(long, default_value_t = 1000)]
    pub batch_pause_ms: u64,

    /// Timeout for fetching a source image, in seconds.
    #[clap(long, default_value_t = 30)]
    pub fetch_timeout_secs: u64,

    /// Object storage backend for images.
    #[clap(long, value_enum, default_value = "s3")]
    pub storage_backend: StorageBackend,

    #[clap(long, env = "S3_BUCKET_NAME")]
    pub bucket: Option<String>,

    #[clap(long, env = "AWS_REGION")]
    pub region: Option<String>,

    /// Custom S3-compatible endpoint.
    #[clap(long, env = "S3_ENDPOINT")]
    pub endpoint: Option<String>,

    /// CDN domain used for public image URLs instead of the bucket URL.
    #[clap(long, env = "CLOUDFRONT_DOMAIN")]
    pub cdn_domain: Option<String>,

    /// Root directory for the local storage backend.
    #[clap(long, value_parser = parse_path)]
    pub storage_path: Option<PathBuf>,

    #[clap(long, env = "SPOTIFY_CLIENT_ID")]
    pub spotify_client_id: Option<String>,

    #[clap(long, env = "SPOTIFY_CLIENT_SECRET", hide_env_values = true)]
    pub spotify_client_secret: Option<String>,

    /// Minimum follower count for exported Spotify artists.
    #[clap(long, default_value_t = 10_000)]
    pub min_followers: u64,

    // Actions. The first one given, in this order, is run.
    /// Check that the artist database is reachable.
    #[clap(long)]
    pub test_connection: bool,

    /// Write a probe object to the configured storage.
    #[clap(long)]
    pub test_storage: bool,

    /// Report how many artists are stored.
    #[clap(long)]
    pub check_data: bool,

    /// Summarize the dataset by category and city.
    #[clap(long)]
    pub summary: bool,

    /// List names that occur more than once within the dataset.
    #[clap(long)]
    pub check_duplicates: bool,

    /// List dataset records missing from the store and add them to the error ledger.
    #[clap(long)]
    pub find_missing: bool,

    /// Re-run only the records named in the error ledger.
    #[clap(long)]
    pub retry_errors: bool,

    /// Migrate the whole dataset.
    #[clap(long)]
    pub migrate: bool,

    /// Move externally hosted artist images into object storage.
    #[clap(long)]
    pub migrate_images: bool,

    /// Restrict image actions to this artist.
    #[clap(long)]
    pub artist_id: Option<i64>,

    /// Artist name used to namespace stored images.
    #[clap(long)]
    pub artist_name: Option<String>,

    /// Fetch the image at this URL and store it for an artist.
    #[clap(long, value_name = "URL")]
    pub ingest_image: Option<String>,

    /// Store a local image file for an artist.
    #[clap(long, value_name = "PATH", value_parser = parse_path)]
    pub upload_image: Option<PathBuf>,

    /// Export Spotify artists of this genre as a legacy dataset.
    #[clap(long, value_name = "GENRE")]
    pub spotify_export: Option<String>,

    /// Output file for --spotify-export.
    #[clap(long, default_value = "artists.json", value_parser = parse_path)]
    pub output: PathBuf,
}

#[derive(Debug, Clone, PartialEq)]
enum Action {
    TestConnection,
    TestStorage,
    CheckData,
    Summary,
    CheckDuplicates,
    FindMissing,
    RetryErrors,
    Migrate,
    MigrateImages { artist_id: Option<i64> },
    IngestImage { url: String },
    UploadImage { path: PathBuf },
    SpotifyExport { genre: String },
}

impl CliArgs {
    /// The first recognized action flag wins.
    fn action(&self) -> Option<Action> {
        if self.test_connection {
            Some(Action::TestConnection)
        } else if self.test_storage {
            Some(Action::TestStorage)
        } else if self.check_data {
            Some(Action::CheckData)
        } else if self.summary {
            Some(Action::Summary)
        } else if self.check_duplicates {
            Some(Action::CheckDuplicates)
        } else if self.find_missing {
            Some(Action::FindMissing)
        } else if self.retry_errors {
            Some(Action::RetryErrors)
        } else if self.migrate {
            Some(Action::Migrate)
        } else if self.migrate_images {
            Some(Action::MigrateImages {
                artist_id: self.artist_id,
            })
        } else if let Some(url) = &self.ingest_image {
            Some(Action::IngestImage { url: url.clone() })
        } else if let Some(path) = &self.upload_image {
            Some(Action::UploadImage { path: path.clone() })
        } else {
            self.spotify_export
                .as_ref()
                .map(|genre| Action::SpotifyExport {
                    genre: genre.clone(),
                })
        }
    }

    fn to_cli_config(&self) -> CliConfig {
        CliConfig {
            db_path: self.db_path.clone(),
            db_busy_timeout_secs: self.db_busy_timeout_secs,
            dataset_path: self.dataset.clone(),
            dataset_format: self.dataset_format,
            error_log_path: self.error_log.clone(),
            progress_interval: self.progress_interval,
            strict_coordinates: self.strict_coordinates,
            batch_size: self.batch_size,
            batch_pause_ms: self.batch_pause_ms,
            fetch_timeout_secs: self.fetch_timeout_secs,
            storage_backend: self.storage_backend,
            bucket: self.bucket.clone(),
            region: self.region.clone(),
            endpoint: self.endpoint.clone(),
            cdn_domain: self.cdn_domain.clone(),
            storage_path: self.storage_path.clone(),
            spotify_client_id: self.spotify_client_id.clone(),
            spotify_client_secret: self.spotify_client_secret.clone(),
            min_followers: self.min_followers,
        }
    }
}

fn open_store(config: &AppConfig) -> Result<Arc<SqliteArtistStore>> {
    info!("Opening SQLite artist database at {:?}...", config.db_path);
    Ok(Arc::new(SqliteArtistStore::new(
        &config.db_path,
        config.db_busy_timeout,
    )?))
}

fn build_storage(config: &AppConfig) -> Result<Arc<dyn ObjectStorage>> {
    let storage = &config.storage;
    let built = match storage.backend {
        StorageBackend::S3 => {
            let bucket = storage
                .bucket
                .as_deref()
                .context("An S3 bucket must be specified via --bucket, S3_BUCKET_NAME or in config file")?;
            info!("Using S3 bucket {} in {}", bucket, storage.region);
            ObjectStoreStorage::s3(bucket, &storage.region, storage.endpoint.as_deref())?
        }
        StorageBackend::Local => {
            info!("Using local image storage at {:?}", storage.local_path);
            ObjectStoreStorage::local(&storage.local_path)?
        }
        StorageBackend::Memory => {
            warn!("Using in-memory image storage, nothing will be kept");
            ObjectStoreStorage::in_memory()
        }
    };
    Ok(Arc::new(built))
}

fn build_ingestor(config: &AppConfig) -> Result<ImageIngestor> {
    let base_url = config.storage.public_base_url()?;
    let storage = build_storage(config)?;
    let fetcher = Arc::new(HttpImageFetcher::new(config.images.fetch_timeout)?);
    let thumbnailer = Arc::new(ImageThumbnailer::new(
        config.images.thumbnail_size,
        config.images.thumbnail_quality,
    ));
    Ok(
        ImageIngestor::new(storage, fetcher, thumbnailer, base_url)
            .with_max_upload_bytes(config.images.max_upload_bytes),
    )
}

fn build_runner(config: &AppConfig) -> Result<MigrationRunner> {
    let store = open_store(config)?;
    Ok(MigrationRunner::new(
        store,
        ErrorLedger::new(&config.error_log_path),
        config.migration.clone(),
    ))
}

fn log_upload_result(result: &ImageUploadResult) -> Result<()> {
    if !result.success {
        bail!(
            "Image upload failed: {}",
            result.error.as_deref().unwrap_or("unknown error")
        );
    }
    info!("Original image: {}", result.original_url);
    info!("Small image:    {}", result.small_url);
    if result.degraded {
        warn!("Thumbnail generation failed, the original image is used as the small image");
    }
    Ok(())
}

/// Artist name for an image action: --artist-name, or the stored name of --artist-id.
fn resolve_artist_name(args: &CliArgs, config: &AppConfig) -> Result<String> {
    if let Some(name) = &args.artist_name {
        return Ok(name.clone());
    }
    let Some(artist_id) = args.artist_id else {
        bail!("--artist-name or --artist-id is required");
    };
    let store = open_store(config)?;
    match store.get_artist(artist_id)? {
        Some(artist) => Ok(artist.artist.name),
        None => bail!("Artist {} not found", artist_id),
    }
}

/// Point the artist's image columns at the stored copies when --artist-id was given.
fn update_artist_images(
    args: &CliArgs,
    config: &AppConfig,
    result: &ImageUploadResult,
) -> Result<()> {
    let Some(artist_id) = args.artist_id else {
        return Ok(());
    };
    let store = open_store(config)?;
    let updated = store.update_artist_images(
        artist_id,
        Some(result.original_url.clone()),
        Some(result.small_url.clone()),
        chrono::Utc::now().timestamp(),
    )?;
    if !updated {
        bail!("Artist {} not found", artist_id);
    }
    info!("Updated images of artist {}", artist_id);
    Ok(())
}

fn guess_image_content_type(path: &std::path::Path) -> String {
    image::ImageFormat::from_path(path)
        .map(|format| format.to_mime_type().to_string())
        .unwrap_or_else(|_| "application/octet-stream".to_string())
}

async fn run_action(action: Action, args: &CliArgs, config: &AppConfig) -> Result<()> {
    match action {
        Action::TestConnection => {
            let store = open_store(config)?;
            store.ping()?;
            info!("Connection to {:?} OK", config.db_path);
        }
        Action::TestStorage => {
            let storage = build_storage(config)?;
            storage.probe().await?;
            info!("Storage OK, probe object written to {}", PROBE_KEY);
        }
        Action::CheckData => {
            let store = open_store(config)?;
            info!("{} artists stored", store.count_artists()?);
            info!(
                "{} artists with a location",
                store.list_artists_with_location()?.len()
            );
        }
        Action::Summary => {
            let records = load_dataset(config.require_dataset_path()?, config.dataset_format)?;
            let summary = summarize(&records);
            info!("=== Dataset summary ===");
            info!("Total artists: {}", summary.total);
            info!("By category:");
            for (category, count) in &summary.categories {
                info!("  {}: {}", category, count);
            }
            info!("Top cities:");
            for (city, count) in &summary.top_cities {
                info!("  {}: {}", city, count);
            }
        }
        Action::CheckDuplicates => {
            let records = load_dataset(config.require_dataset_path()?, config.dataset_format)?;
            let duplicates = find_duplicate_names(&records);
            if duplicates.is_empty() {
                info!("No duplicate artist names in dataset");
            } else {
                warn!("Duplicate artist names in dataset:");
                for name in duplicates {
                    warn!("- {}", name);
                }
            }
        }
        Action::FindMissing => {
            let records = load_dataset(config.require_dataset_path()?, config.dataset_format)?;
            let runner = build_runner(config)?;
            runner.preflight()?;
            let missing = runner.find_missing(&records)?;
            info!("{} artists missing from the store", missing.len());
            for (i, record) in missing.iter().enumerate() {
                info!("{}. {} ({})", i + 1, record.name(), record.city());
            }
            if !missing.is_empty() {
                info!(
                    "Added missing artists to {:?}, run --retry-errors to migrate them",
                    config.error_log_path
                );
            }
        }
        Action::RetryErrors => {
            let records = load_dataset(config.require_dataset_path()?, config.dataset_format)?;
            let runner = build_runner(config)?;
            runner.preflight()?;
            runner.run_retry_only(&records)?;
        }
        Action::Migrate => {
            let records = load_dataset(config.require_dataset_path()?, config.dataset_format)?;
            let runner = build_runner(config)?;
            runner.preflight()?;
            runner.run(&records);
        }
        Action::MigrateImages { artist_id } => {
            let store = open_store(config)?;
            let ingestor = Arc::new(build_ingestor(config)?);
            let migrator = ImageMigrator::new(
                store,
                ingestor,
                Arc::new(SleepPacer),
                config.images.migration.clone(),
            );
            match artist_id {
                Some(id) => match migrator.migrate_single(id).await? {
                    Some(outcome) if outcome.success => {
                        info!("Image migration succeeded for {}", outcome.artist_name);
                    }
                    Some(outcome) => bail!(
                        "Image migration failed for {}: {}",
                        outcome.artist_name,
                        outcome.error.unwrap_or_default()
                    ),
                    None => bail!("Artist {} not found", id),
                },
                None => {
                    migrator.migrate_all().await?;
                }
            }
        }
        Action::IngestImage { url } => {
            let artist_name = resolve_artist_name(args, config)?;
            let ingestor = build_ingestor(config)?;
            let file_name = file_name_from_url(&url);
            let result = ingestor.ingest_from_url(&url, &file_name, &artist_name).await;
            log_upload_result(&result)?;
            update_artist_images(args, config, &result)?;
        }
        Action::UploadImage { path } => {
            let artist_name = resolve_artist_name(args, config)?;
            let bytes = tokio::fs::read(&path)
                .await
                .with_context(|| format!("Failed to read image file {:?}", path))?;
            let content_type = guess_image_content_type(&path);
            let original_name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            let ingestor = build_ingestor(config)?;
            let result = ingestor
                .ingest_bytes(bytes.into(), &content_type, &original_name, &artist_name)
                .await;
            log_upload_result(&result)?;
            update_artist_images(args, config, &result)?;
        }
        Action::SpotifyExport { genre } => {
            let (Some(client_id), Some(client_secret)) = (
                config.spotify.client_id.as_deref(),
                config.spotify.client_secret.as_deref(),
            ) else {
                bail!("SPOTIFY_CLIENT_ID and SPOTIFY_CLIENT_SECRET must be set");
            };
            let client = SpotifyClient::new(client_id, client_secret)?;
            let artists = client
                .export_genre(&genre, config.spotify.min_followers)
                .await?;
            let json = serde_json::to_string_pretty(&artists)?;
            tokio::fs::write(&args.output, json)
                .await
                .with_context(|| format!("Failed to write {:?}", args.output))?;
            info!("Saved {} artists to {:?}", artists.len(), args.output);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()?;

    let file_config = match &cli_args.config {
        Some(path) => {
            info!("Loading config file {:?}", path);
            Some(FileConfig::load(path)?)
        }
        None => None,
    };
    let config = AppConfig::resolve(&cli_args.to_cli_config(), file_config)?;

    let Some(action) = cli_args.action() else {
        error!("No action given. Run with --help to see the available actions.");
        bail!("no action specified");
    };

    info!("Running {:?}", action);
    run_action(action, &cli_args, &config).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> CliArgs {
        let mut argv = vec!["rapmap-ingest"];
        argv.extend_from_slice(args);
        CliArgs::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_no_action() {
        assert_eq!(parse(&[]).action(), None);
    }

    #[test]
    fn test_first_recognized_flag_wins() {
        assert_eq!(
            parse(&["--migrate", "--summary"]).action(),
            Some(Action::Summary)
        );
        assert_eq!(
            parse(&["--retry-errors", "--migrate"]).action(),
            Some(Action::RetryErrors)
        );
        assert_eq!(
            parse(&["--migrate", "--test-connection"]).action(),
            Some(Action::TestConnection)
        );
        assert_eq!(
            parse(&["--spotify-export", "j-rap", "--migrate-images"]).action(),
            Some(Action::MigrateImages { artist_id: None })
        );
    }

    #[test]
    fn test_action_arguments() {
        assert_eq!(
            parse(&["--migrate-images", "--artist-id", "42"]).action(),
            Some(Action::MigrateImages {
                artist_id: Some(42)
            })
        );
        assert_eq!(
            parse(&["--ingest-image", "https://i.scdn.co/image/x"]).action(),
            Some(Action::IngestImage {
                url: "https://i.scdn.co/image/x".to_string()
            })
        );
        assert_eq!(
            parse(&["--spotify-export", "j-rap"]).action(),
            Some(Action::SpotifyExport {
                genre: "j-rap".to_string()
            })
        );
    }

    #[test]
    fn test_cli_defaults_resolve() {
        let args = parse(&["--dataset-format", "legacy", "--batch-size", "7"]);
        let cli = args.to_cli_config();
        assert_eq!(cli.dataset_format, DatasetFormat::Legacy);
        assert_eq!(cli.batch_size, 7);
        assert_eq!(cli.progress_interval, 50);
    }

    #[test]
    fn test_guess_image_content_type() {
        assert_eq!(
            guess_image_content_type(std::path::Path::new("a.png")),
            "image/png"
        );
        assert_eq!(
            guess_image_content_type(std::path::Path::new("notes.txt")),
            "application/octet-stream"
        );
    }
}
