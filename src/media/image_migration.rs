//! Moving stored artists' externally hosted images into object storage.
//!
//! Candidates are processed in fixed-size chunks. All of a chunk's uploads run
//! concurrently and are awaited together; a pause separates consecutive chunks
//! to stay under the source host's rate limit.

use super::file_name::file_name_from_url;
use super::image_ingest::ImageIngestor;
use crate::artist_store::{ArtistRecord, ArtistStore};
use anyhow::Result;
use async_trait::async_trait;
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

pub const DEFAULT_BATCH_SIZE: usize = 5;
pub const DEFAULT_BATCH_PAUSE: Duration = Duration::from_secs(1);
pub const DEFAULT_SOURCE_HOST: &str = "i.scdn.co";

/// Waits between chunks.
#[async_trait]
pub trait ChunkPacer: Send + Sync {
    async fn pause(&self, duration: Duration);
}

pub struct SleepPacer;

#[async_trait]
impl ChunkPacer for SleepPacer {
    async fn pause(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

#[derive(Debug, Clone)]
pub struct ImageMigrationSettings {
    pub batch_size: usize,
    pub batch_pause: Duration,
    /// Images whose URL contains this host still need migrating.
    pub source_host: String,
}

impl Default for ImageMigrationSettings {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            batch_pause: DEFAULT_BATCH_PAUSE,
            source_host: DEFAULT_SOURCE_HOST.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageMigrationOutcome {
    pub artist_id: i64,
    pub artist_name: String,
    pub success: bool,
    /// Nothing to do: no image, or already migrated.
    pub skipped: bool,
    pub degraded: bool,
    pub error: Option<String>,
    pub original_url: Option<String>,
    pub small_url: Option<String>,
}

impl ImageMigrationOutcome {
    fn skipped(artist: &ArtistRecord) -> Self {
        Self {
            artist_id: artist.id,
            artist_name: artist.name().to_string(),
            success: true,
            skipped: true,
            degraded: false,
            error: None,
            original_url: None,
            small_url: None,
        }
    }

    fn failed(artist: &ArtistRecord, error: String) -> Self {
        Self {
            artist_id: artist.id,
            artist_name: artist.name().to_string(),
            success: false,
            skipped: false,
            degraded: false,
            error: Some(error),
            original_url: None,
            small_url: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ImageMigrationReport {
    pub outcomes: Vec<ImageMigrationOutcome>,
    pub chunks: usize,
}

impl ImageMigrationReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.success).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.success).count()
    }

    pub fn degraded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.degraded).count()
    }

    pub fn log_summary(&self) {
        info!("=== Image migration summary ===");
        info!("Succeeded: {}", self.succeeded());
        info!("Failed:    {}", self.failed());
        info!("Degraded:  {}", self.degraded());
        for outcome in self.outcomes.iter().filter(|o| !o.success) {
            error!(
                "- {} (id {}): {}",
                outcome.artist_name,
                outcome.artist_id,
                outcome.error.as_deref().unwrap_or("unknown error")
            );
        }
    }
}

pub struct ImageMigrator {
    store: Arc<dyn ArtistStore>,
    ingestor: Arc<ImageIngestor>,
    pacer: Arc<dyn ChunkPacer>,
    settings: ImageMigrationSettings,
}

impl ImageMigrator {
    pub fn new(
        store: Arc<dyn ArtistStore>,
        ingestor: Arc<ImageIngestor>,
        pacer: Arc<dyn ChunkPacer>,
        settings: ImageMigrationSettings,
    ) -> Self {
        Self {
            store,
            ingestor,
            pacer,
            settings,
        }
    }

    fn needs_migration(&self, artist: &ArtistRecord) -> bool {
        artist
            .artist
            .original_image
            .as_deref()
            .map(|url| url.contains(&self.settings.source_host))
            .unwrap_or(false)
    }

    /// Migrate every stored artist whose image is still hosted at the source.
    pub async fn migrate_all(&self) -> Result<ImageMigrationReport> {
        let artists = self.store.list_artists()?;
        let candidates: Vec<ArtistRecord> = artists
            .into_iter()
            .filter(|a| self.needs_migration(a))
            .collect();
        info!("{} artists have images to migrate", candidates.len());

        let report = self.migrate_candidates(&candidates).await;
        report.log_summary();
        Ok(report)
    }

    /// Migrate a single artist by id. `None` if no such artist exists.
    pub async fn migrate_single(&self, artist_id: i64) -> Result<Option<ImageMigrationOutcome>> {
        let Some(artist) = self.store.get_artist(artist_id)? else {
            info!("Artist {} not found", artist_id);
            return Ok(None);
        };
        Ok(Some(self.migrate_artist(&artist).await))
    }

    pub async fn migrate_candidates(&self, candidates: &[ArtistRecord]) -> ImageMigrationReport {
        let batch_size = self.settings.batch_size.max(1);
        let chunk_count = candidates.len().div_ceil(batch_size);
        let mut report = ImageMigrationReport::default();

        for (chunk_index, chunk) in candidates.chunks(batch_size).enumerate() {
            info!("Processing chunk {}/{}", chunk_index + 1, chunk_count);
            let outcomes = join_all(chunk.iter().map(|artist| self.migrate_artist(artist))).await;
            report.outcomes.extend(outcomes);
            report.chunks += 1;

            if chunk_index + 1 < chunk_count {
                self.pacer.pause(self.settings.batch_pause).await;
            }
        }
        report
    }

    pub async fn migrate_artist(&self, artist: &ArtistRecord) -> ImageMigrationOutcome {
        let Some(source_url) = artist.artist.original_image.as_deref() else {
            info!("Skipping {}: no image", artist.name());
            return ImageMigrationOutcome::skipped(artist);
        };
        if !self.needs_migration(artist) {
            info!("Skipping {}: already migrated", artist.name());
            return ImageMigrationOutcome::skipped(artist);
        }

        let file_name = file_name_from_url(source_url);
        let upload = self
            .ingestor
            .ingest_from_url(source_url, &file_name, artist.name())
            .await;
        if !upload.success {
            let message = upload.error.unwrap_or_else(|| "unknown error".to_string());
            error!("Image migration failed for {}: {}", artist.name(), message);
            return ImageMigrationOutcome::failed(artist, message);
        }

        let updated = self.store.update_artist_images(
            artist.id,
            Some(upload.original_url.clone()),
            Some(upload.small_url.clone()),
            chrono::Utc::now().timestamp(),
        );
        match updated {
            Ok(true) => {}
            Ok(false) => {
                return ImageMigrationOutcome::failed(
                    artist,
                    format!("artist {} disappeared before its images were updated", artist.id),
                )
            }
            Err(e) => return ImageMigrationOutcome::failed(artist, format!("{:#}", e)),
        }

        info!("Migrated images for {}", artist.name());
        ImageMigrationOutcome {
            artist_id: artist.id,
            artist_name: artist.name().to_string(),
            success: true,
            skipped: false,
            degraded: upload.degraded,
            error: None,
            original_url: Some(upload.original_url),
            small_url: Some(upload.small_url),
        }
    }
}
