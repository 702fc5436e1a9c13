use hostgate_store::{AuditLogError, ConfigStoreError};
use thiserror::Error;

/// Fixed code carried by every denial, so transports can map denials
/// uniformly without inspecting the reason text.
pub const DENIAL_CODE: &str = "PERMISSION_DENIED";

#[derive(Debug, Error)]
pub enum GatewayError {
    /// Expected, user-facing. The reason is already sanitized and bounded;
    /// nothing else (paths, stack traces, internal ids) is ever attached.
    #[error("Permission denied: {reason}")]
    PermissionDenied { code: &'static str, reason: String },

    /// A mutation could not be persisted. Reported distinctly from denial so
    /// callers never mistake a storage fault for a policy decision.
    #[error("Persistence failure: {0}")]
    Persistence(#[from] ConfigStoreError),

    #[error("Audit log failure: {0}")]
    Audit(#[from] AuditLogError),

    #[error("Internal error")]
    Internal,
}

impl GatewayError {
    pub fn denied(reason: impl Into<String>) -> Self {
        GatewayError::PermissionDenied {
            code: DENIAL_CODE,
            reason: reason.into(),
        }
    }
}
