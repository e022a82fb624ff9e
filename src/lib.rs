//! RapMap artist ingestion library
//!
//! This library exposes the ingestion, migration and image pipelines for the
//! command-line tool and for testing.

pub mod artist_store;
pub mod config;
pub mod ingest;
pub mod media;
pub mod migration;
pub mod spotify;
pub mod sqlite_persistence;

// Re-export commonly used types for convenience
pub use artist_store::{ArtistStore, SqliteArtistStore};
pub use ingest::{DatasetFormat, DatasetRecord};
pub use media::{ImageIngestor, ImageMigrator, ObjectStorage, ObjectStoreStorage};
pub use migration::{ErrorLedger, MigrationReport, MigrationRunner};
