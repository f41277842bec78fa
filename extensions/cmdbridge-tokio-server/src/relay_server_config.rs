use cmdbridge_relay::RelayConfig;
use std::time::Duration;

/// The interval at which the server sends Ping messages to the client.
pub const HEARTBEAT_INTERVAL: u64 = 5;

/// The maximum time to wait for a message from the client (including Pong)
/// before considering the connection timed out.
pub const CLIENT_TIMEOUT: u64 = 15;

#[derive(Debug, Clone)]
pub struct RelayServerConfig {
    pub heartbeat_interval: Duration,
    pub client_timeout: Duration,
    /// Applied to the relay channel each connection gets.
    pub relay: RelayConfig,
}

impl Default for RelayServerConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval: Duration::from_secs(HEARTBEAT_INTERVAL),
            client_timeout: Duration::from_secs(CLIENT_TIMEOUT),
            relay: RelayConfig::default(),
        }
    }
}
