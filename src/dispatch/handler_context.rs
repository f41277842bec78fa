use crate::envelope::RpcParams;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Everything a handler gets to see about one invocation.
///
/// Handlers receive it by value and must not stash it anywhere that outlives
/// the call.
#[derive(Debug, Clone)]
pub struct HandlerContext {
    pub params: RpcParams,
    pub request_id: String,
    pub client_id: String,
    pub timestamp: DateTime<Utc>,
}

impl HandlerContext {
    pub fn new(
        params: RpcParams,
        request_id: impl Into<String>,
        client_id: impl Into<String>,
    ) -> Self {
        Self {
            params,
            request_id: request_id.into(),
            client_id: client_id.into(),
            timestamp: Utc::now(),
        }
    }

    /// Deserializes the parameter bag into a typed structure.
    pub fn params_as<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_value(Value::Object(self.params.clone()))
    }
}
