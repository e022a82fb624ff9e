//! The per-record migration pass.
//!
//! Records go through validate, duplicate check, map, stamp and insert, in
//! input order. Every per-record failure becomes an outcome; nothing aborts
//! the batch once it has started.

use super::duplicate::DuplicateChecker;
use super::error_ledger::ErrorLedger;
use super::outcome::{ImageUrls, MigrationOutcome, MigrationReport, RecordOutcome};
use crate::artist_store::{ArtistStore, AuditStamp};
use crate::ingest::DatasetRecord;
use anyhow::{Context, Result};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{error, info, warn};

pub const DEFAULT_PROGRESS_INTERVAL: usize = 50;

const MISSING_FROM_STORE: &str = "Missing from production database";

#[derive(Debug, Clone)]
pub struct MigrationSettings {
    /// Log a running tally every this many records. 0 disables progress logs.
    pub progress_interval: usize,
    /// Reject records whose coordinates do not parse instead of storing (0, 0).
    pub strict_coordinates: bool,
}

impl Default for MigrationSettings {
    fn default() -> Self {
        Self {
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            strict_coordinates: false,
        }
    }
}

pub struct MigrationRunner {
    store: Arc<dyn ArtistStore>,
    duplicates: DuplicateChecker,
    ledger: ErrorLedger,
    settings: MigrationSettings,
}

impl MigrationRunner {
    pub fn new(store: Arc<dyn ArtistStore>, ledger: ErrorLedger, settings: MigrationSettings) -> Self {
        Self {
            duplicates: DuplicateChecker::new(store.clone()),
            store,
            ledger,
            settings,
        }
    }

    pub fn ledger(&self) -> &ErrorLedger {
        &self.ledger
    }

    /// Connectivity check, run before any record is touched.
    pub fn preflight(&self) -> Result<()> {
        self.store
            .ping()
            .context("Destination store is unreachable, aborting before migration")?;
        info!("Destination store reachable");
        Ok(())
    }

    /// Migrate every record in `records`.
    pub fn run(&self, records: &[DatasetRecord]) -> MigrationReport {
        info!("Migrating {} records", records.len());
        let mut report = MigrationReport::default();
        for (index, record) in records.iter().enumerate() {
            let outcome = self.process_record(index, record);
            report.push(outcome);

            let processed = index + 1;
            if self.settings.progress_interval > 0
                && processed % self.settings.progress_interval == 0
            {
                report.log_progress(records.len());
            }
        }
        report.log_summary();
        report
    }

    /// Re-run only the records whose names appear in the error ledger.
    pub fn run_retry_only(&self, records: &[DatasetRecord]) -> Result<MigrationReport> {
        let failed_names = self.ledger.failed_names()?;
        if failed_names.is_empty() {
            info!(
                "No failed artists found in {:?}, nothing to retry",
                self.ledger.path()
            );
            return Ok(MigrationReport::default());
        }

        let retry = select_by_name(records, &failed_names);
        info!(
            "Retrying {} records ({} names in the error ledger)",
            retry.len(),
            failed_names.len()
        );
        Ok(self.run(&retry))
    }

    /// Records whose names are not in the store. Each one is also appended to
    /// the error ledger so a retry run picks it up.
    pub fn find_missing<'a>(&self, records: &'a [DatasetRecord]) -> Result<Vec<&'a DatasetRecord>> {
        let stored = self.store.list_artist_names()?;
        info!(
            "{} artists in store, {} records in dataset",
            stored.len(),
            records.len()
        );

        let missing: Vec<&DatasetRecord> = records
            .iter()
            .filter(|record| !stored.contains(record.name()))
            .collect();

        for record in &missing {
            self.ledger.append(record.name(), MISSING_FROM_STORE)?;
        }
        Ok(missing)
    }

    fn process_record(&self, index: usize, record: &DatasetRecord) -> MigrationOutcome {
        let name = record.name().to_string();

        let validation_errors = record.validate(self.settings.strict_coordinates);
        if !validation_errors.is_empty() {
            let message = format!("Validation failed: {}", validation_errors.join("; "));
            return self.failure(index, name, RecordOutcome::ValidationFailed, message);
        }

        match self
            .duplicates
            .is_duplicate(&name, record.match_coordinates())
        {
            Ok(true) => {
                info!("Skipping duplicate: {}", name);
                return MigrationOutcome {
                    index,
                    name,
                    status: RecordOutcome::DuplicateSkipped,
                    error: None,
                    image_urls: None,
                };
            }
            Ok(false) => {}
            Err(e) => {
                let message = format!("Duplicate check failed: {:#}", e);
                return self.failure(index, name, RecordOutcome::InsertFailed, message);
            }
        }

        let Some(mapped) = record.map() else {
            let message = "Validation failed: record could not be read".to_string();
            return self.failure(index, name, RecordOutcome::ValidationFailed, message);
        };
        for warning in &mapped.warnings {
            warn!("{}: {}", name, warning);
        }

        match self.store.insert_artist(&mapped.artist, AuditStamp::now()) {
            Ok(inserted) => {
                info!("Inserted {} as #{}", name, inserted.id);
                let images = &inserted.artist;
                let image_urls = (images.original_image.is_some() || images.small_image.is_some())
                    .then(|| ImageUrls {
                        original: images.original_image.clone(),
                        small: images.small_image.clone(),
                    });
                MigrationOutcome {
                    index,
                    name,
                    status: RecordOutcome::Inserted { id: inserted.id },
                    error: None,
                    image_urls,
                }
            }
            Err(e) => {
                let message = format!("{:#}", e);
                self.failure(index, name, RecordOutcome::InsertFailed, message)
            }
        }
    }

    fn failure(
        &self,
        index: usize,
        name: String,
        status: RecordOutcome,
        message: String,
    ) -> MigrationOutcome {
        error!("{} failed: {}", name, message);
        if let Err(e) = self.ledger.append(&name, &message) {
            error!("Could not record failure of {} in ledger: {:#}", name, e);
        }
        MigrationOutcome {
            index,
            name,
            status,
            error: Some(message),
            image_urls: None,
        }
    }
}

/// Records whose names are in `names`, in input order.
pub fn select_by_name(records: &[DatasetRecord], names: &HashSet<String>) -> Vec<DatasetRecord> {
    records
        .iter()
        .filter(|record| names.contains(record.name()))
        .cloned()
        .collect()
}
