use chrono::Utc;
use hostgate_policy::ServiceConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

pub const CONFIG_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum ConfigStoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Whole-file snapshot of every service's persisted settings. Exclusively
/// owned by [`ConfigStore`]; the in-memory providers are the source of truth
/// for current decisions, this document is the source of truth for recovery
/// after restart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedConfigDocument {
    pub version: u32,
    pub last_modified: String,
    pub services: BTreeMap<String, ServiceConfig>,
}

impl PersistedConfigDocument {
    pub fn new(services: BTreeMap<String, ServiceConfig>) -> Self {
        Self {
            version: CONFIG_SCHEMA_VERSION,
            last_modified: Utc::now().to_rfc3339(),
            services,
        }
    }
}

/// Durable JSON-backed store for the persisted config document.
///
/// Saves go through a temp file and an atomic rename so the canonical path
/// is never observed half-written. A file that fails to parse is quarantined
/// to a `.corrupt` sibling and the caller falls back to secure defaults.
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the persisted document. `Ok(None)` means "no usable document":
    /// either the file does not exist yet (it is not created here) or it was
    /// corrupt and has been quarantined.
    pub fn load(&self) -> Result<Option<PersistedConfigDocument>, ConfigStoreError> {
        if !self.path.exists() {
            return Ok(None);
        }

        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "config file unreadable, quarantining");
                self.quarantine();
                return Ok(None);
            }
        };

        match serde_json::from_str::<PersistedConfigDocument>(&raw) {
            Ok(doc) => Ok(Some(doc)),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "config file corrupt, quarantining");
                self.quarantine();
                Ok(None)
            }
        }
    }

    /// Overwrite the whole document. Write-to-temp then rename, so a crash
    /// mid-save cannot truncate the canonical file.
    pub fn save(&self, doc: &PersistedConfigDocument) -> Result<(), ConfigStoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(doc)?;
        let temp_path = self.path.with_extension("tmp");

        {
            let mut file = File::create(&temp_path)?;
            file.write_all(json.as_bytes())?;
            file.write_all(b"\n")?;
            file.sync_all()?;
        }

        fs::rename(&temp_path, &self.path)?;
        Ok(())
    }

    /// Move the offending file aside, never overwriting an earlier
    /// quarantined copy and never deleting the evidence. Best-effort: a
    /// failed rename is logged, the caller still falls back to defaults.
    fn quarantine(&self) {
        let mut target = PathBuf::from(format!("{}.corrupt", self.path.display()));
        let mut index = 1;
        while target.exists() {
            target = PathBuf::from(format!("{}.corrupt.{}", self.path.display(), index));
            index += 1;
        }

        if let Err(e) = fs::rename(&self.path, &target) {
            warn!(path = %self.path.display(), error = %e, "failed to quarantine corrupt config file");
        } else {
            warn!(quarantined = %target.display(), "corrupt config file quarantined");
        }
    }
}
