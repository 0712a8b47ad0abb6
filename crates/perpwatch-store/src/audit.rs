//! JSON Lines audit mirror for check-log entries.
//!
//! The in-memory check log keeps only the 50 newest entries; this writer
//! mirrors every entry to a daily `.jsonl` file so history survives both
//! eviction and restarts. Each line is a complete JSON object, so partial
//! file corruption only affects individual lines.

use crate::error::StoreResult;
use chrono::Utc;
use perpwatch_core::CheckLogEntry;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use tracing::{info, warn};

struct ActiveWriter {
    writer: BufWriter<File>,
    date: String,
    entries_written: usize,
}

/// Append-only daily-rotated check-log writer.
///
/// Entries are flushed to disk immediately; they arrive at most a few per
/// tick, so there is nothing to batch.
pub struct CheckLogWriter {
    base_dir: String,
    active_writer: Option<ActiveWriter>,
}

impl CheckLogWriter {
    pub fn new(base_dir: &str) -> Self {
        if let Err(e) = std::fs::create_dir_all(base_dir) {
            warn!(?e, "Failed to create audit directory: {}", base_dir);
        }

        Self {
            base_dir: base_dir.to_string(),
            active_writer: None,
        }
    }

    /// Append one entry to today's file, rotating at a date change.
    pub fn append(&mut self, entry: &CheckLogEntry) -> StoreResult<()> {
        let today = Utc::now().format("%Y-%m-%d").to_string();

        let needs_rotation = self
            .active_writer
            .as_ref()
            .map(|w| w.date != today)
            .unwrap_or(false);
        if needs_rotation {
            self.close_active_writer();
        }

        if self.active_writer.is_none() {
            self.open_writer(&today)?;
        }

        let active = self
            .active_writer
            .as_mut()
            .expect("active_writer should exist");
        let json = serde_json::to_string(entry)?;
        writeln!(active.writer, "{}", json)?;
        active.writer.flush()?;
        active.entries_written += 1;

        Ok(())
    }

    fn open_writer(&mut self, date: &str) -> StoreResult<()> {
        let filename = format!("{}/checks_{}.jsonl", self.base_dir, date);

        info!(filename = %filename, "Opening check-log writer (append mode)");

        // Append mode - won't truncate existing data
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&filename)?;

        self.active_writer = Some(ActiveWriter {
            writer: BufWriter::new(file),
            date: date.to_string(),
            entries_written: 0,
        });

        Ok(())
    }

    fn close_active_writer(&mut self) {
        if let Some(mut active) = self.active_writer.take() {
            if let Err(e) = active.writer.flush() {
                warn!(?e, "Failed to flush check-log writer on close");
            }
            info!(
                date = %active.date,
                entries = active.entries_written,
                "Closed check-log writer"
            );
        }
    }
}

impl Drop for CheckLogWriter {
    fn drop(&mut self) {
        self.close_active_writer();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader};
    use tempfile::TempDir;

    fn entry(i: i64) -> CheckLogEntry {
        CheckLogEntry::for_alert(1_700_000_000_000 + i, format!("alert {i}"), 100, 2, &[])
    }

    #[test]
    fn test_write_and_read_back() {
        let temp_dir = TempDir::new().unwrap();
        let mut writer = CheckLogWriter::new(temp_dir.path().to_str().unwrap());

        for i in 0..5 {
            writer.append(&entry(i)).unwrap();
        }
        drop(writer);

        let entries: Vec<_> = std::fs::read_dir(temp_dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .collect();
        assert_eq!(entries.len(), 1);
        assert!(entries[0]
            .file_name()
            .to_string_lossy()
            .starts_with("checks_"));

        let file = File::open(entries[0].path()).unwrap();
        let lines: Vec<_> = BufReader::new(file).lines().filter_map(|l| l.ok()).collect();
        assert_eq!(lines.len(), 5);

        let first: CheckLogEntry = serde_json::from_str(&lines[0]).unwrap();
        assert_eq!(first.alert_name, "alert 0");
        assert_eq!(first.checked_coins, 100);
    }

    #[test]
    fn test_append_mode_across_writers() {
        let temp_dir = TempDir::new().unwrap();

        {
            let mut writer = CheckLogWriter::new(temp_dir.path().to_str().unwrap());
            writer.append(&entry(0)).unwrap();
        }
        {
            let mut writer = CheckLogWriter::new(temp_dir.path().to_str().unwrap());
            writer.append(&entry(1)).unwrap();
        }

        let entries: Vec<_> = std::fs::read_dir(temp_dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .collect();
        let file = File::open(entries[0].path()).unwrap();
        let lines: Vec<_> = BufReader::new(file).lines().filter_map(|l| l.ok()).collect();
        assert_eq!(lines.len(), 2, "Second writer should append, not truncate");
    }
}
