// Correlation and relay defaults

/// How long a forwarded request may stay in a pending-request table before a
/// synthetic timeout response is produced for it.
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;

/// Upper bound on concurrently outstanding requests per channel.
///
/// Requests submitted past this bound are rejected with
/// `ErrorCode::Overloaded` instead of being queued.
pub const DEFAULT_MAX_PENDING_REQUESTS: usize = 256;

/// The number of *messages* (not bytes) each intra-process bridge queue can
/// hold before a sender has to wait for capacity.
pub const DEFAULT_BRIDGE_CHANNEL_BUFFER_SIZE: usize = 64;

/// How often a relay scans its pending-request table for expired deadlines.
pub const DEFAULT_TIMEOUT_SWEEP_INTERVAL_MS: u64 = 250;

/// Reserved method name answered by the relay itself with the list of
/// registered handler names.
pub const SYSTEM_LIST_METHODS: &str = "system.listMethods";
