pub mod audit_log;
pub mod config_store;
pub mod paths;

pub use audit_log::{AuditEntry, AuditLogConfig, AuditLogError, AuditLogger};
pub use config_store::{ConfigStore, ConfigStoreError, PersistedConfigDocument};
pub use paths::{resolve_data_dir, DataDirUnavailable};
