use cmdbridge::constants::{
    DEFAULT_BRIDGE_CHANNEL_BUFFER_SIZE, DEFAULT_MAX_PENDING_REQUESTS, DEFAULT_REQUEST_TIMEOUT_MS,
    DEFAULT_TIMEOUT_SWEEP_INTERVAL_MS,
};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Deadline applied to every forwarded request.
    pub request_timeout: Duration,

    /// Bound on outstanding requests; further requests are rejected.
    pub max_pending_requests: usize,

    /// Capacity of each bridge queue, in messages.
    pub bridge_buffer_size: usize,

    /// How often the pending table is scanned for expired deadlines.
    pub timeout_sweep_interval: Duration,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS),
            max_pending_requests: DEFAULT_MAX_PENDING_REQUESTS,
            bridge_buffer_size: DEFAULT_BRIDGE_CHANNEL_BUFFER_SIZE,
            timeout_sweep_interval: Duration::from_millis(DEFAULT_TIMEOUT_SWEEP_INTERVAL_MS),
        }
    }
}
