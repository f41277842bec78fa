use crate::envelope::{RpcParams, RpcRequest, RpcResponse};
use crate::error::RpcCallerError;
use crate::utils::next_request_id;
use serde_json::Value;

/// Anything that can carry a request to a dispatcher and hand back its
/// correlated response: a network client, or a relay talking to a local
/// sandbox.
#[async_trait::async_trait]
pub trait CommandCaller: Send + Sync {
    /// Sends `request` and waits for its terminal response.
    ///
    /// `Err` means the request was refused before it left this side; every
    /// outcome produced further along (including synthesized timeouts and
    /// connection errors) arrives as an `Ok` response.
    async fn request(&self, request: RpcRequest) -> Result<RpcResponse, RpcCallerError>;

    /// Calls `method` under a freshly generated id and unwraps the result.
    async fn call(&self, method: &str, params: RpcParams) -> Result<Value, RpcCallerError> {
        self.call_with_id(next_request_id(), method, params).await
    }

    /// Calls `method` under a caller-chosen id.
    async fn call_with_id(
        &self,
        id: String,
        method: &str,
        params: RpcParams,
    ) -> Result<Value, RpcCallerError> {
        self.request(RpcRequest::new(id, method, params))
            .await?
            .into_result()
            .map_err(RpcCallerError::Remote)
    }
}
