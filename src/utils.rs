mod increment_id;

pub use increment_id::{next_client_id, next_request_id};
