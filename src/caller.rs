mod command_call;
mod command_caller;

pub use command_call::CommandCall;
pub use command_caller::CommandCaller;
