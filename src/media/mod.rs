//! Artist image storage: fetching, thumbnailing and uploading.

pub mod fetcher;
pub mod file_name;
pub mod image_ingest;
pub mod image_migration;
pub mod object_storage;
pub mod thumbnail;

pub use fetcher::{FetchedImage, HttpImageFetcher, ImageFetcher, DEFAULT_FETCH_TIMEOUT};
pub use file_name::{file_name_from_url, upload_file_name};
pub use image_ingest::{
    public_base_url, sanitize_artist_name, ImageIngestError, ImageIngestor, ImageUploadResult,
};
pub use image_migration::{
    ChunkPacer, ImageMigrationOutcome, ImageMigrationReport, ImageMigrationSettings,
    ImageMigrator, SleepPacer,
};
pub use object_storage::{ObjectStorage, ObjectStoreStorage};
pub use thumbnail::{ImageThumbnailer, ThumbnailError, Thumbnailer};
