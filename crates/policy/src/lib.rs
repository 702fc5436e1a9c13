pub mod checker;
pub mod contracts;

pub use checker::{sanitize_service_id, PermissionChecker};
pub use contracts::{
    ConfigProvider, OperationType, PermissionCheckResult, PermissionLevel, PolicyError,
    ServiceConfig, TestOverride,
};
