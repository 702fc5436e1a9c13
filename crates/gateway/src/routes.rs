use hostgate_policy::OperationType;

pub const SERVICE_EVENT_LOG: &str = "eventlog";
pub const SERVICE_FILE_SEARCH: &str = "filesearch";

/// Static mapping from an inbound operation name to the `(service, operation
/// type)` pair it is authorized as. Maintained alongside the transport layer;
/// an operation with no route is denied exactly like an unknown service.
#[derive(Debug, Clone)]
pub struct OperationRoute {
    pub operation: String,
    pub service_id: String,
    pub operation_type: OperationType,
}

impl OperationRoute {
    pub fn new(operation: &str, service_id: &str, operation_type: OperationType) -> Self {
        Self {
            operation: operation.to_string(),
            service_id: service_id.to_string(),
            operation_type,
        }
    }
}

pub fn default_routes() -> Vec<OperationRoute> {
    vec![
        OperationRoute::new("eventlog.query", SERVICE_EVENT_LOG, OperationType::Read),
        OperationRoute::new("eventlog.channels", SERVICE_EVENT_LOG, OperationType::Read),
        OperationRoute::new("filesearch.search", SERVICE_FILE_SEARCH, OperationType::Read),
        OperationRoute::new("filesearch.content", SERVICE_FILE_SEARCH, OperationType::Read),
        OperationRoute::new("filesearch.reindex", SERVICE_FILE_SEARCH, OperationType::Write),
    ]
}
