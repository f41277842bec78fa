use crate::error::RpcError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Untyped parameter bag carried by a request.
pub type RpcParams = Map<String, Value>;

/// A single command invocation.
///
/// `id` is chosen by the caller and is only ever echoed back; nothing in the
/// dispatch path parses it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcRequest {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: RpcParams,
}

impl RpcRequest {
    pub fn new(id: impl Into<String>, method: impl Into<String>, params: RpcParams) -> Self {
        Self {
            id: id.into(),
            method: method.into(),
            params,
        }
    }

    /// Parses a request from a raw text frame.
    ///
    /// Frames that are not JSON fail with `RpcError::Parse`. Frames that are
    /// JSON but not a well-formed request fail with `RpcError::InvalidRequest`,
    /// which carries the `id` whenever one could be recovered so the error
    /// response can still be correlated.
    pub fn from_json_str(text: &str) -> Result<Self, RpcError> {
        let value: Value =
            serde_json::from_str(text).map_err(|err| RpcError::Parse(err.to_string()))?;

        let Value::Object(mut object) = value else {
            return Err(RpcError::invalid_request(None, "request must be a JSON object"));
        };

        let id = match object.remove("id") {
            Some(Value::String(id)) => id,
            Some(_) => return Err(RpcError::invalid_request(None, "`id` must be a string")),
            None => return Err(RpcError::invalid_request(None, "missing `id`")),
        };

        let method = match object.remove("method") {
            Some(Value::String(method)) if !method.is_empty() => method,
            Some(Value::String(_)) => {
                return Err(RpcError::invalid_request(Some(id), "`method` must not be empty"));
            }
            Some(_) => {
                return Err(RpcError::invalid_request(Some(id), "`method` must be a string"));
            }
            None => return Err(RpcError::invalid_request(Some(id), "missing `method`")),
        };

        let params = match object.remove("params") {
            None | Some(Value::Null) => Map::new(),
            Some(Value::Object(params)) => params,
            Some(_) => {
                return Err(RpcError::invalid_request(Some(id), "`params` must be an object"));
            }
        };

        Ok(Self { id, method, params })
    }

    pub fn to_json_string(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
