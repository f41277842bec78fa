use crate::envelope::{RpcRequest, RpcResponse};
use serde::{Deserialize, Serialize};

/// Envelope re-wrapped for the intra-process hop between the relay and the
/// sandboxed executor.
///
/// The tag tells the receiving side whether it is being asked to run a
/// command or being handed the outcome of one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "envelope", rename_all = "kebab-case")]
pub enum BridgeMessage {
    ExecuteCommand(RpcRequest),
    CommandResult(RpcResponse),
}

impl BridgeMessage {
    /// The correlation id of the wrapped envelope.
    pub fn id(&self) -> &str {
        match self {
            BridgeMessage::ExecuteCommand(request) => &request.id,
            BridgeMessage::CommandResult(response) => &response.id,
        }
    }
}
