pub mod caller;
pub mod constants;
pub mod dispatch;
pub mod envelope;
pub mod error;
pub mod relay;
pub mod utils;
