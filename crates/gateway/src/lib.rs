pub mod error;
pub mod gateway;
pub mod manager;
pub mod routes;
pub mod service;

pub use error::{GatewayError, DENIAL_CODE};
pub use gateway::{Gateway, GatewayConfig, SOURCE_CONFIG_API};
pub use manager::ServiceConfigManager;
pub use routes::{default_routes, OperationRoute, SERVICE_EVENT_LOG, SERVICE_FILE_SEARCH};
pub use service::QueryService;
