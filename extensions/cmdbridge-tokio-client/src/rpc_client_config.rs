use cmdbridge::constants::{
    DEFAULT_MAX_PENDING_REQUESTS, DEFAULT_REQUEST_TIMEOUT_MS, DEFAULT_TIMEOUT_SWEEP_INTERVAL_MS,
};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct RpcClientConfig {
    /// How long a call may wait for its response before it fails with a
    /// timeout error.
    pub request_timeout: Duration,
    pub max_pending_requests: usize,
    pub timeout_sweep_interval: Duration,
}

impl Default for RpcClientConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS),
            max_pending_requests: DEFAULT_MAX_PENDING_REQUESTS,
            timeout_sweep_interval: Duration::from_millis(DEFAULT_TIMEOUT_SWEEP_INTERVAL_MS),
        }
    }
}
