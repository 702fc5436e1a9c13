use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("test overrides are not permitted on this checker instance")]
    OverridesNotPermitted,
}

/// The three-state authorization tier governing which operations a service
/// allows. Anything outside this closed set is treated as a denial for all
/// operations (whitelist semantics, never default-allow).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PermissionLevel {
    Disabled,
    ReadOnly,
    ReadWrite,
}

impl PermissionLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            PermissionLevel::Disabled => "disabled",
            PermissionLevel::ReadOnly => "read-only",
            PermissionLevel::ReadWrite => "read-write",
        }
    }

    /// Exact-match parse against the closed whitelist. Case variants,
    /// surrounding whitespace, and anything else are rejected.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "disabled" => Some(PermissionLevel::Disabled),
            "read-only" => Some(PermissionLevel::ReadOnly),
            "read-write" => Some(PermissionLevel::ReadWrite),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationType {
    Read,
    Write,
}

impl OperationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationType::Read => "read",
            OperationType::Write => "write",
        }
    }
}

/// Per-service configuration. `enabled` is a master switch: when false every
/// operation is denied regardless of `permission_level`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub enabled: bool,
    pub permission_level: PermissionLevel,
    pub enable_anonymization: bool,
    #[serde(default)]
    pub service_specific: BTreeMap<String, Value>,
}

impl Default for ServiceConfig {
    /// Secure defaults: disabled, no permissions, anonymization on.
    fn default() -> Self {
        Self {
            enabled: false,
            permission_level: PermissionLevel::Disabled,
            enable_anonymization: true,
            service_specific: BTreeMap::new(),
        }
    }
}

/// Outcome of a permission check. `reason` is populated only on denial and
/// is sanitized and length-bounded before it leaves the checker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PermissionCheckResult {
    pub allowed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl PermissionCheckResult {
    pub fn allow() -> Self {
        Self {
            allowed: true,
            reason: None,
        }
    }

    pub fn deny(reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            reason: Some(reason.into()),
        }
    }
}

/// Shadow values layered over a provider during tests. Unset fields fall
/// through to the provider (or to secure defaults when the service has no
/// registered provider). The level is a raw string so tests can exercise
/// the unknown-level denial path.
#[derive(Debug, Clone, Default)]
pub struct TestOverride {
    pub enabled: Option<bool>,
    pub permission_level: Option<String>,
}

/// Read-only view of a service's live configuration. Owned by the service's
/// own config manager; the permission checker only ever reads through it.
pub trait ConfigProvider: Send + Sync {
    fn enabled(&self) -> bool;
    fn permission_level(&self) -> PermissionLevel;
    fn snapshot(&self) -> ServiceConfig;
}
