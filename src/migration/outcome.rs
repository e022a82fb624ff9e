//! Per-record outcomes and the aggregated run report.

use tracing::{error, info};

/// What happened to a single input record.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordOutcome {
    Inserted { id: i64 },
    DuplicateSkipped,
    ValidationFailed,
    InsertFailed,
}

impl RecordOutcome {
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            RecordOutcome::ValidationFailed | RecordOutcome::InsertFailed
        )
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ImageUrls {
    pub original: Option<String>,
    pub small: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MigrationOutcome {
    /// Position of the record in the input the run was given.
    pub index: usize,
    pub name: String,
    pub status: RecordOutcome,
    pub error: Option<String>,
    pub image_urls: Option<ImageUrls>,
}

impl MigrationOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self.status, RecordOutcome::Inserted { .. })
    }
}

/// Outcomes of one run, in input order.
#[derive(Debug, Clone, Default)]
pub struct MigrationReport {
    pub outcomes: Vec<MigrationOutcome>,
}

impl MigrationReport {
    pub fn push(&mut self, outcome: MigrationOutcome) {
        self.outcomes.push(outcome);
    }

    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn inserted(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn duplicates(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.status == RecordOutcome::DuplicateSkipped)
            .count()
    }

    pub fn errors(&self) -> usize {
        self.outcomes.iter().filter(|o| o.status.is_error()).count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &MigrationOutcome> {
        self.outcomes.iter().filter(|o| o.status.is_error())
    }

    pub fn log_progress(&self, expected_total: usize) {
        info!(
            "Progress {}/{}: {} inserted, {} duplicates, {} errors",
            self.total(),
            expected_total,
            self.inserted(),
            self.duplicates(),
            self.errors()
        );
    }

    pub fn log_summary(&self) {
        info!("=== Migration summary ===");
        info!("Total:      {}", self.total());
        info!("Inserted:   {}", self.inserted());
        info!("Duplicates: {}", self.duplicates());
        info!("Errors:     {}", self.errors());

        if self.errors() > 0 {
            error!("=== Failed records ===");
            for failure in self.failures() {
                error!(
                    "#{} {}: {}",
                    failure.index,
                    failure.name,
                    failure.error.as_deref().unwrap_or("unknown error")
                );
            }
        }
    }
}
