mod connection_state;
mod pending_request_table;

pub use connection_state::ConnectionState;
pub use pending_request_table::{PendingCall, PendingRequestTable};
