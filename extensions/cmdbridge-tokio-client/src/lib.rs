mod rpc_client;
pub use rpc_client::*;

mod rpc_client_config;
pub use rpc_client_config::*;

pub use cmdbridge::relay::ConnectionState;
