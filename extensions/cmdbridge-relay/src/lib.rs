mod bridge_port;
pub use bridge_port::{BridgePort, bridge_pair};

mod relay_channel;
pub use relay_channel::RelayChannel;

mod relay_config;
pub use relay_config::RelayConfig;

mod sandbox_host;
pub use sandbox_host::SandboxHost;
