//! Test fixtures for the artist database and the image pipeline

use async_trait::async_trait;
use bytes::Bytes;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use rapmap_ingest::artist_store::{NewArtist, SqliteArtistStore};
use rapmap_ingest::ingest::{load_dataset, DatasetFormat, DatasetRecord};
use rapmap_ingest::media::{ChunkPacer, FetchedImage, ImageFetcher, ThumbnailError, Thumbnailer};
use rapmap_ingest::migration::{ErrorLedger, MigrationRunner, MigrationSettings};
use std::io::Cursor;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

/// A temporary directory holding an artist database, a dataset file and an
/// error ledger.
pub struct TestWorkspace {
    pub dir: TempDir,
    pub store: Arc<SqliteArtistStore>,
}

impl TestWorkspace {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(
            SqliteArtistStore::new(dir.path().join("artists.db"), Duration::from_secs(5)).unwrap(),
        );
        Self { dir, store }
    }

    pub fn db_path(&self) -> PathBuf {
        self.dir.path().join("artists.db")
    }

    pub fn ledger_path(&self) -> PathBuf {
        self.dir.path().join("migration-errors.log")
    }

    /// Writes `content` as the dataset file and loads it back.
    pub fn write_dataset(&self, content: &str) -> Vec<DatasetRecord> {
        let path = self.dir.path().join("artists.json");
        std::fs::write(&path, content).unwrap();
        load_dataset(&path, DatasetFormat::Provided).unwrap()
    }

    pub fn runner(&self) -> MigrationRunner {
        MigrationRunner::new(
            self.store.clone(),
            ErrorLedger::new(self.ledger_path()),
            MigrationSettings::default(),
        )
    }
}

/// A solid-color PNG.
pub fn sample_png(width: u32, height: u32) -> Vec<u8> {
    let image = RgbImage::from_pixel(width, height, Rgb([40, 120, 200]));
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(image)
        .write_to(&mut out, ImageFormat::Png)
        .unwrap();
    out.into_inner()
}

pub fn artist_with_image(name: &str, image_url: Option<&str>) -> NewArtist {
    NewArtist {
        name: name.to_string(),
        city: "Shibuya".to_string(),
        prefecture: "Tokyo".to_string(),
        lat: 35.66,
        lng: 139.70,
        genres: vec!["hip hop".to_string()],
        song_title: String::new(),
        spotify_track_id: None,
        youtube_url: None,
        instagram_url: None,
        twitter_url: None,
        facebook_url: None,
        youtube_channel_url: None,
        tiktok_url: None,
        original_image: image_url.map(str::to_string),
        small_image: None,
        bio_summary: None,
        bio_url: None,
        birthdate: None,
        deathdate: None,
        years_active_start: None,
        years_active_end: None,
    }
}

/// Serves the same PNG for every URL.
pub struct PngFetcher;

#[async_trait]
impl ImageFetcher for PngFetcher {
    async fn fetch(&self, _url: &str) -> anyhow::Result<FetchedImage> {
        Ok(FetchedImage {
            bytes: Bytes::from(sample_png(64, 48)),
            content_type: Some("image/png".to_string()),
        })
    }
}

/// A thumbnailer whose backend is never available.
pub struct FailingThumbnailer;

impl Thumbnailer for FailingThumbnailer {
    fn thumbnail(&self, _source: &[u8]) -> Result<Vec<u8>, ThumbnailError> {
        Err(ThumbnailError::Unavailable("no image backend".to_string()))
    }
}

/// Records pauses instead of sleeping.
#[derive(Default)]
pub struct RecordingPacer {
    pub pauses: Mutex<Vec<Duration>>,
}

#[async_trait]
impl ChunkPacer for RecordingPacer {
    async fn pause(&self, duration: Duration) {
        self.pauses.lock().unwrap().push(duration);
    }
}
