use hostgate_policy::{ConfigProvider, PermissionLevel, ServiceConfig};
use parking_lot::RwLock;

/// Owner of one service's live configuration. The permission checker reads
/// through the [`ConfigProvider`] impl; mutation is crate-internal so every
/// change flows through the gateway's persist-then-apply path.
pub struct ServiceConfigManager {
    service_id: String,
    state: RwLock<ServiceConfig>,
}

impl ServiceConfigManager {
    pub fn new(service_id: impl Into<String>, config: ServiceConfig) -> Self {
        Self {
            service_id: service_id.into(),
            state: RwLock::new(config),
        }
    }

    pub fn service_id(&self) -> &str {
        &self.service_id
    }

    /// Swap in a new configuration, returning the previous one.
    pub(crate) fn replace(&self, config: ServiceConfig) -> ServiceConfig {
        std::mem::replace(&mut *self.state.write(), config)
    }
}

impl ConfigProvider for ServiceConfigManager {
    fn enabled(&self) -> bool {
        self.state.read().enabled
    }

    fn permission_level(&self) -> PermissionLevel {
        self.state.read().permission_level
    }

    fn snapshot(&self) -> ServiceConfig {
        self.state.read().clone()
    }
}
