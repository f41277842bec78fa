use super::{ErrorCode, HandlerError, ValidationFailure};
use crate::envelope::RpcErrorObject;
use serde_json::json;
use std::time::Duration;
use thiserror::Error;

/// Every internal failure cause a request can end in.
///
/// `code` and `to_error_object` are the classifier: they map each cause onto
/// the fixed wire taxonomy.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RpcError {
    #[error("parse error: {0}")]
    Parse(String),

    #[error("invalid request: {reason}")]
    InvalidRequest { id: Option<String>, reason: String },

    #[error("method not found: {0}")]
    MethodNotFound(String),

    #[error("invalid params: {0}")]
    InvalidParams(ValidationFailure),

    #[error("execution error: {0}")]
    Execution(HandlerError),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("connection closed")]
    ConnectionClosed,

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("duplicate request id: {0}")]
    DuplicateRequestId(String),

    #[error("too many pending requests (limit {limit})")]
    Overloaded { limit: usize },
}

impl RpcError {
    pub fn invalid_request(id: Option<String>, reason: impl Into<String>) -> Self {
        RpcError::InvalidRequest {
            id,
            reason: reason.into(),
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            RpcError::Parse(_) => ErrorCode::ParseError,
            RpcError::InvalidRequest { .. } => ErrorCode::InvalidRequest,
            RpcError::MethodNotFound(_) => ErrorCode::MethodNotFound,
            RpcError::InvalidParams(_) => ErrorCode::InvalidParams,
            RpcError::Execution(_) => ErrorCode::ExecutionError,
            RpcError::Internal(_) => ErrorCode::InternalError,
            RpcError::ConnectionClosed => ErrorCode::ConnectionClosed,
            RpcError::Timeout(_) => ErrorCode::Timeout,
            RpcError::DuplicateRequestId(_) => ErrorCode::DuplicateRequestId,
            RpcError::Overloaded { .. } => ErrorCode::Overloaded,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.code().is_retryable()
    }

    /// The request id recovered while classifying, when the failure happened
    /// before a request could be fully parsed.
    pub fn request_id(&self) -> Option<&str> {
        match self {
            RpcError::InvalidRequest { id, .. } => id.as_deref(),
            _ => None,
        }
    }

    pub fn to_error_object(&self) -> RpcErrorObject {
        let code = self.code();
        match self {
            RpcError::Parse(detail) => RpcErrorObject::new(code, code.default_message())
                .with_data(json!({ "detail": detail })),
            RpcError::InvalidRequest { reason, .. } => {
                RpcErrorObject::new(code, format!("{}: {reason}", code.default_message()))
            }
            RpcError::MethodNotFound(method) => {
                RpcErrorObject::new(code, format!("{}: {method}", code.default_message()))
                    .with_data(json!({ "method": method }))
            }
            RpcError::InvalidParams(failure) => {
                let error = RpcErrorObject::new(code, failure.reason.clone());
                match &failure.data {
                    Some(data) => error.with_data(data.clone()),
                    None => error,
                }
            }
            RpcError::Execution(failure) => {
                let error = RpcErrorObject::new(code, failure.message.clone());
                match &failure.data {
                    Some(data) => error.with_data(data.clone()),
                    None => error,
                }
            }
            RpcError::Internal(detail) => RpcErrorObject::new(code, code.default_message())
                .with_data(json!({ "detail": detail })),
            RpcError::ConnectionClosed => RpcErrorObject::new(code, code.default_message()),
            RpcError::Timeout(after) => RpcErrorObject::new(code, code.default_message())
                .with_data(json!({ "timeoutMs": after.as_millis() as u64 })),
            RpcError::DuplicateRequestId(id) => {
                RpcErrorObject::new(code, format!("{}: {id}", code.default_message()))
            }
            RpcError::Overloaded { limit } => RpcErrorObject::new(code, code.default_message())
                .with_data(json!({ "limit": limit })),
        }
    }
}
