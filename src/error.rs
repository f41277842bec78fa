mod error_code;
mod handler_error;
mod rpc_caller_error;
mod rpc_error;

pub use error_code::ErrorCode;
pub use handler_error::{HandlerError, RegistryError, ValidationFailure};
pub use rpc_caller_error::RpcCallerError;
pub use rpc_error::RpcError;
