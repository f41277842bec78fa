mod bridge_message;
mod rpc_error_object;
mod rpc_request;
mod rpc_response;

pub use bridge_message::BridgeMessage;
pub use rpc_error_object::RpcErrorObject;
pub use rpc_request::{RpcParams, RpcRequest};
pub use rpc_response::{RpcOutcome, RpcResponse};
