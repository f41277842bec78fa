mod relay_server;
pub use relay_server::*;

mod relay_server_config;
pub use relay_server_config::*;

pub mod utils;
