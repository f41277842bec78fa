use super::{ErrorCode, RpcError};
use crate::envelope::RpcErrorObject;
use thiserror::Error;

/// How a call can fail from the calling side's point of view.
#[derive(Debug, Error)]
pub enum RpcCallerError {
    /// Refused locally before the request was sent.
    #[error("request rejected: {0}")]
    Rejected(RpcError),

    /// The request was answered with an error response.
    #[error("remote error: {0}")]
    Remote(RpcErrorObject),

    /// Typed params or results did not (de)serialize.
    #[error("codec error: {0}")]
    Codec(serde_json::Error),
}

impl RpcCallerError {
    pub fn error_code(&self) -> Option<ErrorCode> {
        match self {
            RpcCallerError::Rejected(err) => Some(err.code()),
            RpcCallerError::Remote(error) => error.error_code(),
            RpcCallerError::Codec(_) => None,
        }
    }
}

impl From<RpcError> for RpcCallerError {
    fn from(err: RpcError) -> Self {
        RpcCallerError::Rejected(err)
    }
}
