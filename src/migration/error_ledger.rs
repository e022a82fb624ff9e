//! Append-only text ledger of failed records.
//!
//! One entry per line: `<timestamp>: <artist name> - <message>`, with the
//! timestamp in UTC at millisecond precision. Retry runs parse names back out
//! of this file, so the writer and the reader must agree on the format.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use regex::Regex;
use std::collections::HashSet;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

pub const DEFAULT_LEDGER_PATH: &str = "migration-errors.log";

static ENTRY_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}\.\d{3}Z: (.+?) -")
        .expect("ledger entry regex must compile")
});

pub fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

/// Render one ledger line, without the trailing newline.
pub fn format_entry(timestamp: DateTime<Utc>, artist_name: &str, message: &str) -> String {
    format!(
        "{}: {} - {}",
        format_timestamp(timestamp),
        flatten(artist_name),
        flatten(message)
    )
}

/// The artist name recorded on a ledger line, if the line is an entry.
pub fn parse_entry_name(line: &str) -> Option<String> {
    ENTRY_NAME
        .captures(line)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

fn flatten(text: &str) -> String {
    text.replace("\r\n", " ").replace(['\n', '\r'], " ")
}

#[derive(Debug, Clone)]
pub struct ErrorLedger {
    path: PathBuf,
}

impl ErrorLedger {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, artist_name: &str, message: &str) -> Result<()> {
        self.append_at(Utc::now(), artist_name, message)
    }

    /// Append one entry. The file is opened in append mode for every write.
    pub fn append_at(
        &self,
        timestamp: DateTime<Utc>,
        artist_name: &str,
        message: &str,
    ) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open error ledger {:?}", self.path))?;
        writeln!(file, "{}", format_entry(timestamp, artist_name, message))
            .with_context(|| format!("Failed to write error ledger {:?}", self.path))?;
        Ok(())
    }

    /// Distinct artist names recorded in the ledger. A missing ledger is empty.
    pub fn failed_names(&self) -> Result<HashSet<String>> {
        if !self.path.exists() {
            return Ok(HashSet::new());
        }
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read error ledger {:?}", self.path))?;
        Ok(content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(parse_entry_name)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 7, 6, 10, 0, 0).unwrap()
    }

    #[test]
    fn test_entry_format() {
        let line = format_entry(fixed_time(), "Awich", "constraint violation");
        assert_eq!(line, "2025-07-06T10:00:00.000Z: Awich - constraint violation");
        assert_eq!(parse_entry_name(&line).as_deref(), Some("Awich"));
    }

    #[test]
    fn test_unrelated_lines_ignored() {
        assert!(parse_entry_name("random noise").is_none());
        assert!(parse_entry_name("2025-07-06 10:00:00: Awich - x").is_none());
    }

    #[test]
    fn test_append_does_not_truncate() {
        let dir = TempDir::new().unwrap();
        let ledger = ErrorLedger::new(dir.path().join("errors.log"));
        ledger.append_at(fixed_time(), "A", "first").unwrap();
        ledger.append_at(fixed_time(), "C", "second").unwrap();
        ledger.append_at(fixed_time(), "A", "third").unwrap();

        let content = std::fs::read_to_string(ledger.path()).unwrap();
        assert_eq!(content.lines().count(), 3);

        let names = ledger.failed_names().unwrap();
        assert_eq!(names.len(), 2);
        assert!(names.contains("A"));
        assert!(names.contains("C"));
    }

    #[test]
    fn test_multiline_messages_are_flattened() {
        let dir = TempDir::new().unwrap();
        let ledger = ErrorLedger::new(dir.path().join("errors.log"));
        ledger
            .append_at(fixed_time(), "Multi", "line one\nline two\r\nline three")
            .unwrap();
        let content = std::fs::read_to_string(ledger.path()).unwrap();
        assert_eq!(content.lines().count(), 1);
        assert!(content.contains("line one line two line three"));
    }

    #[test]
    fn test_missing_ledger_is_empty() {
        let dir = TempDir::new().unwrap();
        let ledger = ErrorLedger::new(dir.path().join("absent.log"));
        assert!(ledger.failed_names().unwrap().is_empty());
    }

    #[test]
    fn test_now_timestamp_roundtrips_through_parser() {
        let dir = TempDir::new().unwrap();
        let ledger = ErrorLedger::new(dir.path().join("errors.log"));
        ledger.append("ZORN", "connection reset").unwrap();
        assert!(ledger.failed_names().unwrap().contains("ZORN"));
    }
}
