//! Batch migration of dataset records into the artist store.

pub mod duplicate;
pub mod error_ledger;
pub mod outcome;
pub mod runner;

pub use duplicate::DuplicateChecker;
pub use error_ledger::{ErrorLedger, DEFAULT_LEDGER_PATH};
pub use outcome::{ImageUrls, MigrationOutcome, MigrationReport, RecordOutcome};
pub use runner::{select_by_name, MigrationRunner, MigrationSettings, DEFAULT_PROGRESS_INTERVAL};
