//! Default on-disk locations. Callers can inject explicit paths instead
//! (tests always do); these helpers resolve the ambient defaults.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("failed to resolve data directory (set HOSTGATE_DATA_DIR or XDG_DATA_HOME)")]
pub struct DataDirUnavailable;

const APP_DIR_NAME: &str = "hostgate";

/// Resolve the application data directory: `HOSTGATE_DATA_DIR` if set,
/// then `$XDG_DATA_HOME/hostgate`, then the platform data directory.
pub fn resolve_data_dir() -> Result<PathBuf, DataDirUnavailable> {
    if let Ok(dir) = std::env::var("HOSTGATE_DATA_DIR") {
        return Ok(PathBuf::from(dir));
    }

    if let Ok(xdg) = std::env::var("XDG_DATA_HOME") {
        return Ok(PathBuf::from(xdg).join(APP_DIR_NAME));
    }

    dirs::data_dir()
        .map(|base| base.join(APP_DIR_NAME))
        .ok_or(DataDirUnavailable)
}
