use crate::dispatch::{DispatchState, HandlerContext, HandlerRegistry};
use crate::envelope::{RpcParams, RpcRequest, RpcResponse};
use crate::error::RpcError;
use futures::FutureExt;
use serde_json::Value;
use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

/// Turns one inbound request into exactly one response.
///
/// The dispatcher owns no mutable state; cloning it is cheap and every clone
/// resolves against the same registry.
#[derive(Clone)]
pub struct RpcDispatcher {
    registry: Arc<HandlerRegistry>,
}

impl RpcDispatcher {
    pub fn new(registry: Arc<HandlerRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<HandlerRegistry> {
        &self.registry
    }

    /// Parses `text` and dispatches it.
    ///
    /// Frames that cannot be parsed still yield a response; it echoes the id
    /// when one could be recovered and the empty string otherwise.
    pub async fn dispatch_json(&self, text: &str, client_id: &str) -> RpcResponse {
        match RpcRequest::from_json_str(text) {
            Ok(request) => self.dispatch(request, client_id).await,
            Err(err) => {
                let id = err.request_id().unwrap_or_default().to_string();
                tracing::debug!("Rejected frame from {}: {}", client_id, err);
                RpcResponse::from_error(id, &err)
            }
        }
    }

    pub async fn dispatch(&self, request: RpcRequest, client_id: &str) -> RpcResponse {
        let RpcRequest { id, method, params } = request;

        match self.run(&id, &method, params, client_id).await {
            Ok(result) => {
                trace_state(&id, &method, DispatchState::Completed);
                RpcResponse::success(id, result)
            }
            Err(err) => {
                trace_state(&id, &method, DispatchState::Failed);
                tracing::debug!("Request {} ({}) failed: {}", id, method, err);
                RpcResponse::from_error(id, &err)
            }
        }
    }

    async fn run(
        &self,
        id: &str,
        method: &str,
        params: RpcParams,
        client_id: &str,
    ) -> Result<Value, RpcError> {
        trace_state(id, method, DispatchState::Received);

        let handler = self
            .registry
            .resolve(method)
            .ok_or_else(|| RpcError::MethodNotFound(method.to_string()))?;
        trace_state(id, method, DispatchState::Resolved);

        catch_unwind(AssertUnwindSafe(|| handler.validate(&params)))
            .map_err(|panic| RpcError::Internal(panic_message(panic)))?
            .map_err(RpcError::InvalidParams)?;
        trace_state(id, method, DispatchState::Validated);

        let context = HandlerContext::new(params, id, client_id);
        trace_state(id, method, DispatchState::Executing);

        match AssertUnwindSafe(handler.execute(context)).catch_unwind().await {
            Ok(Ok(result)) => Ok(result),
            Ok(Err(failure)) => Err(RpcError::Execution(failure)),
            Err(panic) => {
                let detail = panic_message(panic);
                tracing::error!("Handler `{}` panicked on request {}: {}", method, id, detail);
                Err(RpcError::Internal(detail))
            }
        }
    }
}

fn trace_state(id: &str, method: &str, state: DispatchState) {
    tracing::trace!(request_id = id, method = method, state = ?state, "dispatch transition");
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "handler panicked".to_string()
    }
}
