use crate::error::GatewayError;
use async_trait::async_trait;
use serde_json::Value;

/// Seam to the external query engines (event log, file search). The gateway
/// authorizes before delegating here; implementations are expected to
/// re-check through the shared `PermissionChecker` inside their own query
/// path, so a mismapped or bypassed gateway does not defeat enforcement.
#[async_trait]
pub trait QueryService: Send + Sync {
    async fn query(&self, operation: &str, request: Value) -> Result<Value, GatewayError>;
}
