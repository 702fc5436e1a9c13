use crate::contracts::{
    ConfigProvider, OperationType, PermissionCheckResult, PermissionLevel, PolicyError,
    TestOverride,
};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Upper bound on any denial reason leaving the checker.
const MAX_REASON_LEN: usize = 80;

/// Upper bound on a service id embedded inside a reason.
const MAX_ID_LEN: usize = 40;

/// Strip characters usable for reflected-error injection (`<`, `>`, quotes,
/// `=`) and control characters, then truncate so adversarial identifiers
/// cannot inflate error or log payloads.
pub fn sanitize_service_id(service_id: &str) -> String {
    service_id
        .chars()
        .filter(|c| !matches!(c, '<' | '>' | '"' | '\'' | '='))
        .filter(|c| !c.is_control())
        .take(MAX_ID_LEN)
        .collect()
}

fn bounded_reason(reason: String) -> String {
    reason.chars().take(MAX_REASON_LEN).collect()
}

/// Single source of truth for "is this operation allowed right now".
///
/// Decisions are pure reads over the injected provider registry plus an
/// optional test-override shadow map. The registry is built explicitly at
/// startup and injected here; there is no process-wide singleton.
pub struct PermissionChecker {
    providers: HashMap<String, Arc<dyn ConfigProvider>>,
    overrides: RwLock<HashMap<String, TestOverride>>,
    // Captured once at construction. Deliberately not re-read from the
    // environment: a runtime-mutable flag gating a security bypass would let
    // anything that can influence that flag unlock the bypass.
    overrides_permitted: bool,
}

impl PermissionChecker {
    pub fn new(providers: HashMap<String, Arc<dyn ConfigProvider>>) -> Self {
        Self {
            providers,
            overrides: RwLock::new(HashMap::new()),
            overrides_permitted: false,
        }
    }

    /// Construct a checker whose override API is unlocked. The capability is
    /// bound at construction time and cannot be granted afterwards.
    pub fn with_test_overrides(providers: HashMap<String, Arc<dyn ConfigProvider>>) -> Self {
        Self {
            providers,
            overrides: RwLock::new(HashMap::new()),
            overrides_permitted: true,
        }
    }

    pub fn check(&self, service_id: &str, operation: OperationType) -> PermissionCheckResult {
        // Override lookup happens before the unknown-service check so a test
        // override can simulate a service with no registered provider.
        let overridden = self.overrides.read().get(service_id).cloned();
        let provider = self.providers.get(service_id);

        if overridden.is_none() && provider.is_none() {
            return PermissionCheckResult::deny(bounded_reason(format!(
                "Unknown service: {}",
                sanitize_service_id(service_id)
            )));
        }

        let overridden = overridden.unwrap_or_default();
        let enabled = overridden
            .enabled
            .unwrap_or_else(|| provider.map(|p| p.enabled()).unwrap_or(false));
        let level = overridden.permission_level.unwrap_or_else(|| {
            provider
                .map(|p| p.permission_level().as_str().to_string())
                .unwrap_or_else(|| PermissionLevel::Disabled.as_str().to_string())
        });

        if !enabled {
            return PermissionCheckResult::deny("Service is disabled");
        }

        // Closed whitelist: anything unrecognized fails closed.
        let Some(level) = PermissionLevel::parse(&level) else {
            return PermissionCheckResult::deny("Unknown permission level");
        };

        match (level, operation) {
            (PermissionLevel::Disabled, _) => {
                PermissionCheckResult::deny("Service permission level is disabled")
            }
            (PermissionLevel::ReadOnly, OperationType::Read) => PermissionCheckResult::allow(),
            (PermissionLevel::ReadOnly, OperationType::Write) => {
                PermissionCheckResult::deny("Service is read-only")
            }
            (PermissionLevel::ReadWrite, _) => PermissionCheckResult::allow(),
        }
    }

    pub fn set_test_overrides(
        &self,
        overrides: HashMap<String, TestOverride>,
    ) -> Result<(), PolicyError> {
        if !self.overrides_permitted {
            return Err(PolicyError::OverridesNotPermitted);
        }
        *self.overrides.write() = overrides;
        Ok(())
    }

    pub fn clear_test_overrides(&self) -> Result<(), PolicyError> {
        if !self.overrides_permitted {
            return Err(PolicyError::OverridesNotPermitted);
        }
        self.overrides.write().clear();
        Ok(())
    }

    pub fn has_test_overrides(&self) -> bool {
        !self.overrides.read().is_empty()
    }
}
