mod command_definition;
mod command_handler;
mod dispatch_state;
mod handler_context;
mod handler_registry;
mod rpc_dispatcher;

pub use command_definition::CommandDefinition;
pub use command_handler::{
    CommandHandler, FnCommandHandler, HandlerFn, HandlerFuture, ValidatorFn,
};
pub use dispatch_state::DispatchState;
pub use handler_context::HandlerContext;
pub use handler_registry::{HandlerRegistry, HandlerRegistryBuilder};
pub use rpc_dispatcher::RpcDispatcher;
