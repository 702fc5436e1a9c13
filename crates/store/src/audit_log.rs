use chrono::Utc;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum AuditLogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// One permission-relevant state change. Immutable once written; ordering
/// within a file is append order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub timestamp: String,
    pub action: String,
    pub service_id: String,
    pub previous_value: Value,
    pub new_value: Value,
    pub source: String,
}

#[derive(Debug, Clone)]
pub struct AuditLogConfig {
    /// Rotation threshold for the active file.
    pub max_file_bytes: u64,
    /// Number of rotated backups retained; the oldest is deleted beyond this.
    pub max_backups: usize,
}

impl Default for AuditLogConfig {
    fn default() -> Self {
        Self {
            max_file_bytes: 10 * 1024 * 1024,
            max_backups: 5,
        }
    }
}

/// Append-only JSONL audit trail with size-based rotation.
///
/// This is a log, not a current-state store: entries are never rewritten,
/// and history survives across rotated files until the retention count
/// discards the oldest.
pub struct AuditLogger {
    log_path: PathBuf,
    config: AuditLogConfig,
    file: Mutex<File>,
}

impl AuditLogger {
    pub fn new<P: AsRef<Path>>(
        log_path: P,
        config: AuditLogConfig,
    ) -> Result<Self, AuditLogError> {
        let log_path = log_path.as_ref().to_path_buf();

        if let Some(parent) = log_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)?;

        Ok(Self {
            log_path,
            config,
            file: Mutex::new(file),
        })
    }

    /// Append one entry, stamping `timestamp` if the caller left it empty.
    /// Rotates first when the active file is over the size threshold.
    pub fn log(&self, entry: &AuditEntry) -> Result<(), AuditLogError> {
        let mut entry = entry.clone();
        if entry.timestamp.is_empty() {
            entry.timestamp = Utc::now().to_rfc3339();
        }
        let json = serde_json::to_string(&entry)?;

        let mut file = self.file.lock();
        if file.metadata()?.len() >= self.config.max_file_bytes {
            self.rotate(&mut file)?;
        }
        writeln!(file, "{}", json)?;
        file.sync_all()?;
        Ok(())
    }

    /// Most recent `count` entries, chronological (most-recent-last), read
    /// backward from the active file into progressively older backups.
    pub fn recent_entries(&self, count: usize) -> Result<Vec<AuditEntry>, AuditLogError> {
        // Hold the append lock so rotation cannot shuffle files mid-read.
        let _guard = self.file.lock();

        let mut newest_first: Vec<AuditEntry> = Vec::new();
        let mut paths = vec![self.log_path.clone()];
        for index in 1..=self.config.max_backups {
            paths.push(self.backup_path(index));
        }

        for path in paths {
            if newest_first.len() >= count {
                break;
            }
            if !path.exists() {
                continue;
            }
            for entry in read_entries(&path)?.into_iter().rev() {
                newest_first.push(entry);
                if newest_first.len() >= count {
                    break;
                }
            }
        }

        newest_first.reverse();
        Ok(newest_first)
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    /// Shift `name.N` → `name.N+1` (dropping the oldest), move the active
    /// file to `.1`, and start a fresh active file.
    fn rotate(&self, file: &mut File) -> Result<(), AuditLogError> {
        for index in (1..=self.config.max_backups).rev() {
            let from = self.backup_path(index);
            if !from.exists() {
                continue;
            }
            if index == self.config.max_backups {
                fs::remove_file(&from)?;
            } else {
                fs::rename(&from, self.backup_path(index + 1))?;
            }
        }

        fs::rename(&self.log_path, self.backup_path(1))?;
        *file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)?;
        Ok(())
    }

    fn backup_path(&self, index: usize) -> PathBuf {
        PathBuf::from(format!("{}.{}", self.log_path.display(), index))
    }
}

/// Parse a JSONL file in append order, skipping lines that do not parse.
fn read_entries(path: &Path) -> Result<Vec<AuditEntry>, AuditLogError> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let mut entries = Vec::new();

    for line in reader.lines() {
        let Ok(line) = line else { continue };
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str(&line) {
            Ok(entry) => entries.push(entry),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "skipping unparsable audit line");
            }
        }
    }

    Ok(entries)
}
