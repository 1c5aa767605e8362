use rmcp::model::{ErrorCode, ErrorData};
use serde_json::{json, Value};

use crate::service::ServiceError;

/// Validation is invalid-params, a missing resource is method-not-found and
/// everything else internal. The message keeps the cause chain.
impl From<ServiceError> for ErrorData {
    fn from(err: ServiceError) -> Self {
        let code = match &err {
            ServiceError::Validation(_) => ErrorCode::INVALID_PARAMS,
            ServiceError::NotFound(_) => ErrorCode::METHOD_NOT_FOUND,
            ServiceError::Internal { .. } => ErrorCode::INTERNAL_ERROR,
        };
        ErrorData::new(code, err.to_string(), None)
    }
}

pub fn unknown_tool(name: &str) -> ErrorData {
    ErrorData::new(
        ErrorCode::METHOD_NOT_FOUND,
        format!("Unknown tool: {}", name),
        None,
    )
}

pub fn parse_error(reason: impl std::fmt::Display) -> ErrorData {
    ErrorData::new(ErrorCode::PARSE_ERROR, format!("Parse error: {}", reason), None)
}

pub fn invalid_request(reason: impl std::fmt::Display) -> ErrorData {
    ErrorData::new(
        ErrorCode::INVALID_REQUEST,
        format!("Invalid request: {}", reason),
        None,
    )
}

/// JSON-RPC error response line for a message that never reached the session
pub fn error_response(id: Value, error: ErrorData) -> String {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": error,
    })
    .to_string()
}
