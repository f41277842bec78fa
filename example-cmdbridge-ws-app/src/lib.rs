mod document;
pub use document::*;

mod handlers;
pub use handlers::*;
