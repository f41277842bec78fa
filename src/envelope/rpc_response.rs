use crate::envelope::RpcErrorObject;
use crate::error::RpcError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Exactly one of `result` or `error`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RpcOutcome {
    Result(Value),
    Error(RpcErrorObject),
}

/// The terminal outcome of a request, correlated to it by `id`.
///
/// Serializes as `{"id": ..., "result": ...}` or `{"id": ..., "error": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcResponse {
    pub id: String,
    #[serde(flatten)]
    pub outcome: RpcOutcome,
}

impl RpcResponse {
    pub fn success(id: impl Into<String>, result: Value) -> Self {
        Self {
            id: id.into(),
            outcome: RpcOutcome::Result(result),
        }
    }

    pub fn failure(id: impl Into<String>, error: RpcErrorObject) -> Self {
        Self {
            id: id.into(),
            outcome: RpcOutcome::Error(error),
        }
    }

    /// Classifies `error` and wraps it in a response for `id`.
    pub fn from_error(id: impl Into<String>, error: &RpcError) -> Self {
        Self::failure(id, error.to_error_object())
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, RpcOutcome::Result(_))
    }

    pub fn result(&self) -> Option<&Value> {
        match &self.outcome {
            RpcOutcome::Result(value) => Some(value),
            RpcOutcome::Error(_) => None,
        }
    }

    pub fn error(&self) -> Option<&RpcErrorObject> {
        match &self.outcome {
            RpcOutcome::Result(_) => None,
            RpcOutcome::Error(error) => Some(error),
        }
    }

    pub fn into_result(self) -> Result<Value, RpcErrorObject> {
        match self.outcome {
            RpcOutcome::Result(value) => Ok(value),
            RpcOutcome::Error(error) => Err(error),
        }
    }

    pub fn from_json_str(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    pub fn to_json_string(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
