use crate::error::GatewayError;
use crate::manager::ServiceConfigManager;
use crate::routes::{default_routes, OperationRoute, SERVICE_EVENT_LOG, SERVICE_FILE_SEARCH};
use crate::service::QueryService;
use hostgate_policy::{
    sanitize_service_id, ConfigProvider, OperationType, PermissionCheckResult, PermissionChecker,
    PermissionLevel, ServiceConfig,
};
use hostgate_store::{
    resolve_data_dir, AuditEntry, AuditLogConfig, AuditLogger, ConfigStore, DataDirUnavailable,
    PersistedConfigDocument,
};
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Source tag recorded on audit entries produced by the mutation API.
pub const SOURCE_CONFIG_API: &str = "config-api";

/// Upper bound on a single audit read.
const MAX_AUDIT_READ: usize = 1000;

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub config_path: PathBuf,
    pub audit_path: PathBuf,
    pub audit: AuditLogConfig,
    pub routes: Vec<OperationRoute>,
    /// Services known at startup. Each gets a provider with secure defaults
    /// unless the persisted document says otherwise.
    pub services: Vec<String>,
}

impl GatewayConfig {
    /// Locations resolved from the environment (`HOSTGATE_DATA_DIR`, XDG,
    /// platform data dir), defaults for everything else.
    pub fn from_env() -> Result<Self, DataDirUnavailable> {
        Ok(Self::at_data_dir(resolve_data_dir()?))
    }

    pub fn at_data_dir(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        Self {
            config_path: dir.join("config.json"),
            audit_path: dir.join("logs").join("audit.jsonl"),
            audit: AuditLogConfig::default(),
            routes: default_routes(),
            services: vec![
                SERVICE_EVENT_LOG.to_string(),
                SERVICE_FILE_SEARCH.to_string(),
            ],
        }
    }
}

/// The enforcement integration: the one place external callers reach.
///
/// Binds the permission checker, the config store, and the audit log
/// together. Query dispatch authorizes before delegating to the registered
/// [`QueryService`]; configuration mutations persist first, apply to the
/// live provider second, and audit third.
pub struct Gateway {
    checker: Arc<PermissionChecker>,
    managers: HashMap<String, Arc<ServiceConfigManager>>,
    store: ConfigStore,
    audit: AuditLogger,
    routes: HashMap<String, OperationRoute>,
    services: RwLock<HashMap<String, Arc<dyn QueryService>>>,
    // Serializes the provider-update / persist / audit sequence. Mutations
    // are administrative and rare; one global critical section is enough.
    mutation_lock: Mutex<()>,
}

impl Gateway {
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayError> {
        let store = ConfigStore::new(&config.config_path);
        let persisted = store.load()?.map(|doc| doc.services).unwrap_or_default();

        let mut service_ids: BTreeSet<String> = config.services.iter().cloned().collect();
        service_ids.extend(persisted.keys().cloned());

        let mut managers = HashMap::new();
        let mut registry: HashMap<String, Arc<dyn ConfigProvider>> = HashMap::new();
        for service_id in service_ids {
            let service_config = persisted.get(&service_id).cloned().unwrap_or_default();
            let manager = Arc::new(ServiceConfigManager::new(&service_id, service_config));
            registry.insert(service_id.clone(), manager.clone() as Arc<dyn ConfigProvider>);
            managers.insert(service_id, manager);
        }

        let checker = Arc::new(PermissionChecker::new(registry));
        let audit = AuditLogger::new(&config.audit_path, config.audit.clone())?;
        let routes = config
            .routes
            .iter()
            .map(|route| (route.operation.clone(), route.clone()))
            .collect();

        info!(
            config_path = %config.config_path.display(),
            services = managers.len(),
            "gateway initialized"
        );

        Ok(Self {
            checker,
            managers,
            store,
            audit,
            routes,
            services: RwLock::new(HashMap::new()),
            mutation_lock: Mutex::new(()),
        })
    }

    /// Shared checker handle, for query services that re-check inside their
    /// own paths (defense-in-depth).
    pub fn checker(&self) -> Arc<PermissionChecker> {
        self.checker.clone()
    }

    pub fn register_service(&self, service_id: impl Into<String>, service: Arc<dyn QueryService>) {
        self.services.write().insert(service_id.into(), service);
    }

    /// Decision-shaped check, for callers that want the uniform
    /// allow/deny result rather than an error.
    pub fn check(&self, service_id: &str, operation: OperationType) -> PermissionCheckResult {
        self.checker.check(service_id, operation)
    }

    /// Error-shaped check: denial becomes a structured error carrying the
    /// fixed denial code and the sanitized reason, nothing else.
    pub fn authorize(&self, service_id: &str, operation: OperationType) -> Result<(), GatewayError> {
        let result = self.checker.check(service_id, operation);
        if result.allowed {
            return Ok(());
        }
        let reason = result.reason.unwrap_or_else(|| "Denied".to_string());
        warn!(
            service = service_id,
            operation = operation.as_str(),
            %reason,
            "operation denied"
        );
        Err(GatewayError::denied(reason))
    }

    /// Route an inbound operation, authorize it, and delegate to the
    /// registered query service. A missing route denies exactly like an
    /// unknown service.
    pub async fn dispatch(&self, operation: &str, request: Value) -> Result<Value, GatewayError> {
        let Some(route) = self.routes.get(operation) else {
            warn!(operation, "no route for operation");
            return Err(GatewayError::denied(format!(
                "Unknown operation: {}",
                sanitize_service_id(operation)
            )));
        };

        self.authorize(&route.service_id, route.operation_type)?;

        let service = self.services.read().get(&route.service_id).cloned();
        let Some(service) = service else {
            error!(service = %route.service_id, "no query service registered for routed operation");
            return Err(GatewayError::Internal);
        };

        service.query(operation, request).await
    }

    pub fn enable(&self, service_id: &str) -> Result<ServiceConfig, GatewayError> {
        self.mutate(service_id, "enable", |config| config.enabled = true)
    }

    pub fn disable(&self, service_id: &str) -> Result<ServiceConfig, GatewayError> {
        self.mutate(service_id, "disable", |config| config.enabled = false)
    }

    pub fn set_permission_level(
        &self,
        service_id: &str,
        level: PermissionLevel,
    ) -> Result<ServiceConfig, GatewayError> {
        self.mutate(service_id, "set_permission_level", |config| {
            config.permission_level = level
        })
    }

    pub fn set_anonymization(
        &self,
        service_id: &str,
        enabled: bool,
    ) -> Result<ServiceConfig, GatewayError> {
        self.mutate(service_id, "set_anonymization", |config| {
            config.enable_anonymization = enabled
        })
    }

    /// Restore secure defaults. The service entry survives; only its
    /// settings return to the disabled state.
    pub fn reset_to_defaults(&self, service_id: &str) -> Result<ServiceConfig, GatewayError> {
        self.mutate(service_id, "reset_to_defaults", |config| {
            *config = ServiceConfig::default()
        })
    }

    pub fn service_config(&self, service_id: &str) -> Option<ServiceConfig> {
        self.managers.get(service_id).map(|m| m.snapshot())
    }

    pub fn list_services(&self) -> BTreeMap<String, ServiceConfig> {
        self.managers
            .iter()
            .map(|(id, manager)| (id.clone(), manager.snapshot()))
            .collect()
    }

    pub fn recent_audit(&self, count: usize) -> Result<Vec<AuditEntry>, GatewayError> {
        Ok(self.audit.recent_entries(count.min(MAX_AUDIT_READ))?)
    }

    /// Shared mutation path: stage the change, persist the whole document,
    /// apply to the live provider only after the save succeeds, then make
    /// exactly one audit attempt. A failed save therefore never leaves
    /// memory and disk disagreeing; a failed audit is logged and does not
    /// fail the completed mutation.
    fn mutate<F>(
        &self,
        service_id: &str,
        action: &str,
        apply: F,
    ) -> Result<ServiceConfig, GatewayError>
    where
        F: FnOnce(&mut ServiceConfig),
    {
        let _guard = self.mutation_lock.lock();

        let Some(manager) = self.managers.get(service_id) else {
            return Err(GatewayError::denied(format!(
                "Unknown service: {}",
                sanitize_service_id(service_id)
            )));
        };

        let previous = manager.snapshot();
        let mut updated = previous.clone();
        apply(&mut updated);

        let mut services: BTreeMap<String, ServiceConfig> = self
            .managers
            .iter()
            .map(|(id, m)| (id.clone(), m.snapshot()))
            .collect();
        services.insert(service_id.to_string(), updated.clone());
        self.store.save(&PersistedConfigDocument::new(services))?;

        manager.replace(updated.clone());

        let entry = AuditEntry {
            timestamp: String::new(),
            action: action.to_string(),
            service_id: service_id.to_string(),
            previous_value: serde_json::to_value(&previous).unwrap_or(Value::Null),
            new_value: serde_json::to_value(&updated).unwrap_or(Value::Null),
            source: SOURCE_CONFIG_API.to_string(),
        };
        if let Err(e) = self.audit.log(&entry) {
            warn!(
                service = service_id,
                action,
                error = %e,
                "audit write failed for completed mutation"
            );
        }

        info!(service = service_id, action, "service configuration updated");
        Ok(updated)
    }
}
